//! Last.fm catalog client.
//!
//! Only two read-only methods are used: `artist.getsimilar` and
//! `artist.gettoptracks`. Neither needs authentication beyond the API key.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const API_ROOT: &str = "http://ws.audioscrobbler.com/2.0/";
const TOP_TRACK_LIMIT: u32 = 3;

/// Last.fm error code for "artist could not be found".
const ERROR_INVALID_ARTIST: i64 = 6;

/// Outcome of a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    /// The catalog answered but has nothing for this artist.
    Empty,
    /// Transport failure or a payload we could not make sense of.
    Malformed,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SimilarArtist {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TopTrack {
    pub name: String,
}

/// Read-only catalog lookups the reply formatter depends on.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn similar_artists(&self, artist: &str) -> Lookup<Vec<SimilarArtist>>;
    async fn top_tracks(&self, artist: &str) -> Lookup<Vec<TopTrack>>;
}

#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
}

/// Last.fm API client. Holds only immutable configuration, so it is cheap to
/// clone and share between requests.
#[derive(Clone)]
pub struct LastFmClient {
    client: Client,
    api_key: String,
    base_url: String,
    artist_limit: u32,
}

impl LastFmClient {
    pub fn new(api_key: String, artist_limit: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: API_ROOT.to_string(),
            artist_limit,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, method: &str, artist: &str, limit: u32) -> Result<String, LastFmError> {
        let limit = limit.to_string();
        let params = [
            ("method", method),
            ("artist", artist),
            ("autocorrect", "1"),
            ("limit", limit.as_str()),
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
        ];

        let res = self.client.get(&self.base_url).query(&params).send().await?;
        let status = res.status();
        let body = res.text().await?;

        // Last.fm reports API errors as a JSON envelope, sometimes with a 4xx
        // status. Let the parser see those.
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(LastFmError::HttpStatus { status, body });
        }
        Ok(body)
    }
}

#[async_trait]
impl MetadataSource for LastFmClient {
    #[tracing::instrument(skip(self))]
    async fn similar_artists(&self, artist: &str) -> Lookup<Vec<SimilarArtist>> {
        match self.fetch("artist.getsimilar", artist, self.artist_limit).await {
            Ok(body) => parse_list(&body, "similarartists", "artist"),
            Err(e) => {
                tracing::warn!(error = %e, "artist.getsimilar request failed");
                Lookup::Malformed
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn top_tracks(&self, artist: &str) -> Lookup<Vec<TopTrack>> {
        match self.fetch("artist.gettoptracks", artist, TOP_TRACK_LIMIT).await {
            Ok(body) => parse_list(&body, "toptracks", "track"),
            Err(e) => {
                tracing::warn!(error = %e, "artist.gettoptracks request failed");
                Lookup::Malformed
            }
        }
    }
}

/// Last.fm collapses one-element arrays into a bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Pulls `body[outer][inner]` out of a Last.fm response as a list.
fn parse_list<T: DeserializeOwned>(body: &str, outer: &str, inner: &str) -> Lookup<Vec<T>> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Last.fm response is not JSON");
            return Lookup::Malformed;
        }
    };

    if let Some(code) = value.get("error").and_then(Value::as_i64) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        if code == ERROR_INVALID_ARTIST {
            tracing::debug!(code, reason = message, "Last.fm does not know this artist");
            return Lookup::Empty;
        }
        tracing::warn!(code, reason = message, "Last.fm API error");
        return Lookup::Malformed;
    }

    let Some(items) = value.get(outer).and_then(|v| v.get(inner)) else {
        tracing::warn!(outer, inner, "Last.fm response is missing expected keys");
        return Lookup::Malformed;
    };

    match OneOrMany::<T>::deserialize(items) {
        Ok(items) => {
            let items = items.into_vec();
            if items.is_empty() {
                Lookup::Empty
            } else {
                Lookup::Found(items)
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "unexpected Last.fm item shape");
            Lookup::Malformed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{extract::Query, routing::get, Router};

    use super::*;

    type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

    /// Serves one canned response on a random local port and records every
    /// query string it receives.
    async fn canned_lastfm(status: StatusCode, body: &'static str) -> (String, SeenQueries) {
        let seen: SeenQueries = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/2.0/",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(params);
                    (status, body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/2.0/", addr), seen)
    }

    fn client(base_url: String, artist_limit: u32) -> LastFmClient {
        LastFmClient::new("test-key".into(), artist_limit).with_base_url(base_url)
    }

    #[tokio::test]
    async fn similar_artists_request_carries_configured_limit() {
        let (url, seen) = canned_lastfm(
            StatusCode::OK,
            r#"{"similarartists":{"artist":[{"name":"Mogwai"},{"name":"múm"}]}}"#,
        )
        .await;

        let result = client(url, 7).similar_artists("Sigur Rós").await;
        assert_eq!(
            result,
            Lookup::Found(vec![
                SimilarArtist { name: "Mogwai".into() },
                SimilarArtist { name: "múm".into() },
            ])
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let params = &seen[0];
        assert_eq!(params["method"], "artist.getsimilar");
        assert_eq!(params["artist"], "Sigur Rós");
        assert_eq!(params["autocorrect"], "1");
        assert_eq!(params["limit"], "7");
        assert_eq!(params["api_key"], "test-key");
        assert_eq!(params["format"], "json");
    }

    #[tokio::test]
    async fn top_tracks_request_asks_for_three() {
        let (url, seen) = canned_lastfm(
            StatusCode::OK,
            r#"{"toptracks":{"track":[{"name":"Hoppípolla"},{"name":"Glósóli"},{"name":"Svefn-g-englar"}]}}"#,
        )
        .await;

        let result = client(url, 10).top_tracks("Sigur Rós").await;
        assert!(matches!(result, Lookup::Found(ref tracks) if tracks.len() == 3));

        let seen = seen.lock().unwrap();
        let params = &seen[0];
        assert_eq!(params["method"], "artist.gettoptracks");
        assert_eq!(params["limit"], "3");
        assert_eq!(params["autocorrect"], "1");
        assert_eq!(params["format"], "json");
    }

    #[tokio::test]
    async fn error_envelope_on_4xx_is_empty() {
        let (url, _) = canned_lastfm(
            StatusCode::NOT_FOUND,
            r#"{"error":6,"message":"The artist you supplied could not be found"}"#,
        )
        .await;

        assert_eq!(client(url, 10).similar_artists("zzzz").await, Lookup::Empty);
    }

    #[tokio::test]
    async fn html_error_page_is_malformed() {
        let (url, _) = canned_lastfm(StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>").await;

        assert_eq!(client(url, 10).top_tracks("Radiohead").await, Lookup::Malformed);
    }

    #[test]
    fn similar_artists_keep_api_order() {
        let body = r#"{"similarartists":{"artist":[
            {"name":"Thom Yorke","match":"1"},
            {"name":"Atoms for Peace","match":"0.8"},
            {"name":"Portishead","match":"0.5"}
        ],"@attr":{"artist":"Radiohead"}}}"#;

        let Lookup::Found(artists) = parse_list::<SimilarArtist>(body, "similarartists", "artist") else {
            panic!("expected artists");
        };
        let names: Vec<&str> = artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Thom Yorke", "Atoms for Peace", "Portishead"]);
    }

    #[test]
    fn single_track_object_is_accepted() {
        let body = r#"{"toptracks":{"track":{"name":"Creep","playcount":"1"}}}"#;
        assert_eq!(
            parse_list::<TopTrack>(body, "toptracks", "track"),
            Lookup::Found(vec![TopTrack { name: "Creep".into() }])
        );
    }

    #[test]
    fn empty_array_is_empty() {
        let body = r#"{"similarartists":{"artist":[],"@attr":{"artist":"nobody"}}}"#;
        assert_eq!(
            parse_list::<SimilarArtist>(body, "similarartists", "artist"),
            Lookup::Empty
        );
    }

    #[test]
    fn unknown_artist_error_is_empty() {
        let body = r#"{"error":6,"message":"The artist you supplied could not be found","links":[]}"#;
        assert_eq!(
            parse_list::<SimilarArtist>(body, "similarartists", "artist"),
            Lookup::Empty
        );
    }

    #[test]
    fn other_api_errors_are_malformed() {
        let body = r#"{"error":10,"message":"Invalid API key"}"#;
        assert_eq!(
            parse_list::<TopTrack>(body, "toptracks", "track"),
            Lookup::Malformed
        );
    }

    #[test]
    fn missing_keys_and_garbage_are_malformed() {
        assert_eq!(
            parse_list::<TopTrack>(r#"{"toptracks":{}}"#, "toptracks", "track"),
            Lookup::Malformed
        );
        assert_eq!(
            parse_list::<TopTrack>("<html>502</html>", "toptracks", "track"),
            Lookup::Malformed
        );
        assert_eq!(
            parse_list::<TopTrack>(r#"{"toptracks":{"track":[{"playcount":"3"}]}}"#, "toptracks", "track"),
            Lookup::Malformed
        );
    }
}
