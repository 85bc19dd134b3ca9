use std::env;

use crate::reply::ReplyStyle;

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub line_channel_secret: String,
    pub line_channel_token: String,
    pub lastfm_api_key: String,
    pub artist_limit: u32,
    pub carousel_max_columns: usize,
    pub reply_style: ReplyStyle,
    pub image_source: ImageSourceKind,
}

/// Where carousel thumbnails come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSourceKind {
    Static,
    Scrape,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let line_channel_secret = env::var("LINE_CHANNEL_SECRET")
            .map_err(|_| anyhow::anyhow!("LINE_CHANNEL_SECRET is required"))?;

        let line_channel_token = env::var("LINE_CHANNEL_TOKEN")
            .map_err(|_| anyhow::anyhow!("LINE_CHANNEL_TOKEN is required"))?;

        let lastfm_api_key =
            env::var("API_KEY").map_err(|_| anyhow::anyhow!("API_KEY is required"))?;

        let artist_limit = env::var("ARTIST_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10)
            .clamp(5, 10);

        // LINE rejects carousels with more than 10 columns.
        let carousel_max_columns = env::var("CAROUSEL_MAX_COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10)
            .clamp(1, 10);

        let reply_style = env::var("REPLY_STYLE")
            .ok()
            .and_then(|v| parse_reply_style(&v))
            .unwrap_or(ReplyStyle::Carousel);

        let image_source = env::var("ARTIST_IMAGE_SOURCE")
            .ok()
            .and_then(|v| parse_image_source(&v))
            .unwrap_or(ImageSourceKind::Static);

        Ok(Self {
            port,
            line_channel_secret,
            line_channel_token,
            lastfm_api_key,
            artist_limit,
            carousel_max_columns,
            reply_style,
            image_source,
        })
    }
}

fn parse_reply_style(value: &str) -> Option<ReplyStyle> {
    match value.trim().to_ascii_lowercase().as_str() {
        "carousel" => Some(ReplyStyle::Carousel),
        "list" | "text" => Some(ReplyStyle::List),
        _ => None,
    }
}

fn parse_image_source(value: &str) -> Option<ImageSourceKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "static" => Some(ImageSourceKind::Static),
        "scrape" => Some(ImageSourceKind::Scrape),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_style_names() {
        assert_eq!(parse_reply_style("Carousel"), Some(ReplyStyle::Carousel));
        assert_eq!(parse_reply_style(" list "), Some(ReplyStyle::List));
        assert_eq!(parse_reply_style("text"), Some(ReplyStyle::List));
        assert_eq!(parse_reply_style("flex"), None);
    }

    #[test]
    fn image_source_names() {
        assert_eq!(parse_image_source("SCRAPE"), Some(ImageSourceKind::Scrape));
        assert_eq!(parse_image_source("static"), Some(ImageSourceKind::Static));
        assert_eq!(parse_image_source(""), None);
    }
}
