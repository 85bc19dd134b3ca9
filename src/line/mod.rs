//! LINE Messaging API: webhook parsing and the reply/content endpoints.

pub mod message;
pub mod webhook;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::reply::ReplyMessage;

use self::message::{LineMessage, ReplyRequest};

const API_BASE: &str = "https://api.line.me/v2/bot";
const DATA_API_BASE: &str = "https://api-data.line.me/v2/bot";

#[derive(Debug, Error)]
pub enum LineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LINE API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivers a reply correlated with an inbound event.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply(&self, reply_token: &str, message: &ReplyMessage) -> Result<(), LineError>;
}

/// Downloads the binary content of an image or video message.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches the content into a temporary file that is removed right away.
    /// Returns the number of bytes received.
    async fn discard_content(&self, message_id: &str) -> Result<u64, LineError>;
}

/// LINE API client authenticated with the channel access token.
#[derive(Clone)]
pub struct LineClient {
    client: Client,
    channel_token: String,
}

impl LineClient {
    pub fn new(channel_token: String) -> Self {
        Self {
            client: Client::new(),
            channel_token,
        }
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, LineError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(LineError::Api { status, body })
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply(&self, reply_token: &str, message: &ReplyMessage) -> Result<(), LineError> {
        let request = ReplyRequest {
            reply_token,
            messages: vec![LineMessage::from(message)],
        };

        let res = self
            .client
            .post(format!("{}/message/reply", API_BASE))
            .bearer_auth(&self.channel_token)
            .json(&request)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentFetcher for LineClient {
    async fn discard_content(&self, message_id: &str) -> Result<u64, LineError> {
        let res = self
            .client
            .get(format!("{}/message/{}/content", DATA_API_BASE, message_id))
            .bearer_auth(&self.channel_token)
            .send()
            .await?;
        let bytes = Self::check(res).await?.bytes().await?;

        let mut file = tokio::fs::File::from_std(tempfile::tempfile()?);
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(bytes.len() as u64)
    }
}
