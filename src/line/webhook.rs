//! Inbound side of the LINE Messaging API: signature check and event types.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Checks `x-line-signature`, which is base64(HMAC-SHA256(channel secret, body)).
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

/// Computes the signature LINE would send for `body`.
#[cfg(test)]
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    /// Kept raw so one odd event cannot sink the rest of the batch.
    #[serde(default)]
    pub events: Vec<Value>,
}

impl WebhookBody {
    /// Decodes each event on its own, skipping the ones that do not fit.
    pub fn into_events(self) -> Vec<Event> {
        self.events
            .into_iter()
            .filter_map(|raw| match Event::deserialize(&raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        kind = raw.get("type").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        "skipping undecodable webhook event"
                    );
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        message: EventMessage,
    },
    /// follow, unfollow, postback, join, ... are not handled.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text { id: String, text: String },
    Image { id: String },
    Video { id: String },
    #[serde(other)]
    Other,
}
