//! Turns a user's message into the reply we send back.
//!
//! Three shapes come out of here: a curated recommendation, a "not found"
//! apology, or the similar-artist results (a carousel, or a numbered list).

use std::sync::Arc;

use futures::future::join_all;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::artist_image::{plus_slug, ArtistImageSource};
use crate::lastfm::{Lookup, MetadataSource, SimilarArtist, TopTrack};

pub const NOT_FOUND_MESSAGE: &str = "ごめん、アーティストが見つかんなかった💦";
pub const DIG_BUTTON_LABEL: &str = "ここからさらにディグる";
pub const SEARCH_BUTTON_LABEL: &str = "YouTubeで検索";

const VIDEO_SEARCH_ROOT: &str = "https://www.youtube.com/results?search_query=";

/// A row (counting its newline) this long or longer gets cut. LINE allows 60
/// characters of column text, and there are three rows.
const MAX_CHARS_PER_ROW: usize = 21;

/// LINE rejects carousel column titles longer than this.
const MAX_TITLE_CHARS: usize = 40;

/// How many similar artists the plain list reply shows.
const LIST_REPLY_LEN: usize = 5;

const RECOMMEND_TRIGGERS: &[&str] = &["おすすめのアーティスト", "おすすめのバンド"];

pub const RECOMMENDED_ARTISTS: [&str; 28] = [
    "Radiohead",
    "Sigur Rós",
    "Mogwai",
    "toe",
    "Cornelius",
    "Boards of Canada",
    "Aphex Twin",
    "Bon Iver",
    "Sufjan Stevens",
    "Fleet Foxes",
    "The National",
    "Arcade Fire",
    "Vampire Weekend",
    "Tame Impala",
    "Mac DeMarco",
    "Khruangbin",
    "Nujabes",
    "cero",
    "never young beach",
    "Suchmos",
    "King Gnu",
    "Vaundy",
    "羊文学",
    "くるり",
    "サニーデイ・サービス",
    "ナンバーガール",
    "スーパーカー",
    "フジファブリック",
];

/// Message to send back, independent of the chat platform's wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMessage {
    PlainText { body: String },
    Carousel { columns: Vec<CarouselColumn> },
}

impl ReplyMessage {
    pub fn text(body: impl Into<String>) -> Self {
        ReplyMessage::PlainText { body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselColumn {
    pub title: String,
    /// `None` when no image could be found for the artist.
    pub image_url: Option<String>,
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Sends `text` back as if the user had typed it.
    Message { label: String, text: String },
    Uri { label: String, uri: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStyle {
    /// One card per similar artist with its top tracks.
    Carousel,
    /// A numbered list of similar artist names.
    List,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplySettings {
    pub style: ReplyStyle,
    pub max_columns: usize,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            style: ReplyStyle::Carousel,
            max_columns: 10,
        }
    }
}

/// Anything with a display name that can go into a numbered ranking.
pub trait Ranked {
    fn name(&self) -> &str;
}

impl Ranked for SimilarArtist {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Ranked for TopTrack {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Builds replies from catalog data.
pub struct ReplyFormatter {
    metadata: Arc<dyn MetadataSource>,
    images: Arc<dyn ArtistImageSource>,
    settings: ReplySettings,
}

impl ReplyFormatter {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        images: Arc<dyn ArtistImageSource>,
        settings: ReplySettings,
    ) -> Self {
        Self {
            metadata,
            images,
            settings,
        }
    }

    /// Answers one user message.
    pub async fn reply_to(&self, query: &str) -> ReplyMessage {
        let query = query.trim();

        if is_recommend_request(query) {
            let pick = {
                let mut rng = rand::rng();
                pick_recommendation(&mut rng)
            };
            tracing::debug!(pick, "answering with a curated recommendation");
            return ReplyMessage::text(pick);
        }

        let artists = match self.metadata.similar_artists(query).await {
            Lookup::Found(artists) => artists,
            Lookup::Empty | Lookup::Malformed => return not_found(),
        };

        match self.settings.style {
            ReplyStyle::List => {
                let shown = &artists[..artists.len().min(LIST_REPLY_LEN)];
                ReplyMessage::text(non_empty_or_not_found(make_reply_text(shown)))
            }
            ReplyStyle::Carousel => self.carousel(artists).await,
        }
    }

    async fn carousel(&self, mut artists: Vec<SimilarArtist>) -> ReplyMessage {
        artists.truncate(self.settings.max_columns);

        // join_all yields results in input order.
        let columns = join_all(artists.iter().map(|artist| self.column(&artist.name))).await;
        ReplyMessage::Carousel { columns }
    }

    async fn column(&self, artist: &str) -> CarouselColumn {
        let (tracks, image_url) = tokio::join!(
            self.metadata.top_tracks(artist),
            self.images.image_url(artist),
        );
        let ranking = match tracks {
            Lookup::Found(tracks) => make_reply_text(&tracks),
            Lookup::Empty | Lookup::Malformed => String::new(),
        };
        carousel_column(artist, image_url, ranking)
    }
}

pub fn not_found() -> ReplyMessage {
    ReplyMessage::text(NOT_FOUND_MESSAGE)
}

/// Plain substring test, so the phrase may sit anywhere in the message.
pub fn is_recommend_request(text: &str) -> bool {
    RECOMMEND_TRIGGERS.iter().any(|trigger| text.contains(trigger))
}

pub fn pick_recommendation<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    RECOMMENDED_ARTISTS
        .choose(rng)
        .copied()
        .unwrap_or(RECOMMENDED_ARTISTS[0])
}

/// Renders `items` as `"1: first\n2: second"`, cutting long rows.
pub fn make_reply_text<T: Ranked>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ranking_row(i + 1, item.name()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn ranking_row(rank: usize, name: &str) -> String {
    let row = format!("{rank}: {name}");
    // +1 for the newline that separates rows on screen.
    if row.chars().count() + 1 >= MAX_CHARS_PER_ROW {
        let cut: String = row.chars().take(MAX_CHARS_PER_ROW - 4).collect();
        format!("{cut}…")
    } else {
        row
    }
}

fn non_empty_or_not_found(text: String) -> String {
    if text.trim().is_empty() {
        NOT_FOUND_MESSAGE.to_string()
    } else {
        text
    }
}

fn column_title(artist: &str) -> String {
    if artist.chars().count() > MAX_TITLE_CHARS {
        let cut: String = artist.chars().take(MAX_TITLE_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        artist.to_string()
    }
}

pub fn video_search_url(artist: &str) -> String {
    format!("{}{}", VIDEO_SEARCH_ROOT, plus_slug(artist))
}

pub fn carousel_column(artist: &str, image_url: Option<String>, ranking: String) -> CarouselColumn {
    CarouselColumn {
        title: column_title(artist),
        image_url,
        text: non_empty_or_not_found(ranking),
        actions: vec![
            Action::Message {
                label: DIG_BUTTON_LABEL.to_string(),
                text: artist.to_string(),
            },
            Action::Uri {
                label: SEARCH_BUTTON_LABEL.to_string(),
                uri: video_search_url(artist),
            },
        ],
    }
}
