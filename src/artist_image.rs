//! Thumbnail lookup for carousel columns.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

/// Last.fm's grey star, used when no real artist image is wanted.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://lastfm.freetls.fastly.net/i/u/174s/2a96cbd8b46e442fc41c2b86b821562f.png";

const ARTIST_PAGE_ROOT: &str = "https://www.last.fm/music/";

#[async_trait]
pub trait ArtistImageSource: Send + Sync {
    async fn image_url(&self, artist: &str) -> Option<String>;
}

/// Always answers with the placeholder image.
pub struct StaticImage;

#[async_trait]
impl ArtistImageSource for StaticImage {
    async fn image_url(&self, _artist: &str) -> Option<String> {
        Some(PLACEHOLDER_IMAGE_URL.to_string())
    }
}

/// Reads the `og:image` meta tag from the artist's public Last.fm page.
pub struct LastFmPageScraper {
    client: Client,
    patterns: [Regex; 2],
}

impl LastFmPageScraper {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            client: Client::new(),
            patterns: [
                Regex::new(r#"(?i)<meta[^>]*property=["']og:image["'][^>]*content=["']([^"']+)["']"#)?,
                Regex::new(r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:image["']"#)?,
            ],
        })
    }

    fn extract(&self, html: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|re| re.captures(html))
            .map(|caps| caps[1].to_string())
    }
}

#[async_trait]
impl ArtistImageSource for LastFmPageScraper {
    async fn image_url(&self, artist: &str) -> Option<String> {
        let url = format!("{}{}", ARTIST_PAGE_ROOT, plus_slug(artist));

        let res = match self.client.get(&url).send().await {
            Ok(res) if res.status().is_success() => res,
            Ok(res) => {
                tracing::debug!(%url, status = %res.status(), "artist page unavailable");
                return None;
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "artist page request failed");
                return None;
            }
        };

        let html = res.text().await.ok()?;
        let image = self.extract(&html);
        if image.is_none() {
            tracing::debug!(%url, "no og:image on artist page");
        }
        image
    }
}

/// Percent-encodes each word and joins the words with `+`.
pub fn plus_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_whitespace_runs() {
        assert_eq!(plus_slug("Sigur Rós"), "Sigur+R%C3%B3s");
        assert_eq!(plus_slug("  The   National "), "The+National");
        assert_eq!(plus_slug("AC/DC"), "AC%2FDC");
    }

    #[test]
    fn extracts_og_image_in_either_attribute_order() {
        let scraper = LastFmPageScraper::new().unwrap();
        let html = r#"<head><meta property="og:title" content="Radiohead">
            <meta property="og:image" content="https://img.example/radiohead.jpg"></head>"#;
        assert_eq!(
            scraper.extract(html).as_deref(),
            Some("https://img.example/radiohead.jpg")
        );

        let reversed = r#"<meta content='https://img.example/b.png' property='og:image' />"#;
        assert_eq!(scraper.extract(reversed).as_deref(), Some("https://img.example/b.png"));
    }

    #[test]
    fn page_without_og_image_yields_none() {
        let scraper = LastFmPageScraper::new().unwrap();
        assert_eq!(scraper.extract("<html><body>404</body></html>"), None);
    }

    #[tokio::test]
    async fn static_image_is_placeholder() {
        assert_eq!(
            StaticImage.image_url("anyone").await.as_deref(),
            Some(PLACEHOLDER_IMAGE_URL)
        );
    }
}
