//! HTTP handlers for the LINE webhook.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::line::webhook::{verify_signature, Event, EventMessage, WebhookBody, SIGNATURE_HEADER};
use crate::line::{ContentFetcher, ReplySender};
use crate::reply::ReplyFormatter;

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub channel_secret: Arc<str>,
    pub formatter: Arc<ReplyFormatter>,
    pub sender: Arc<dyn ReplySender>,
    pub content: Arc<dyn ContentFetcher>,
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /callback - LINE webhook.
///
/// Anything past the signature check answers 200, even when replying fails,
/// so LINE does not redeliver the events.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify_signature(&state.channel_secret, &body, signature) {
        tracing::warn!(
            signature = if signature.is_empty() { "missing" } else { "invalid" },
            "rejected webhook with bad signature"
        );
        return Err(AppError::InvalidSignature);
    }

    let webhook: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook body: {}", e)))?;

    tracing::debug!(
        destination = ?webhook.destination,
        events = webhook.events.len(),
        "webhook received"
    );
    for event in webhook.into_events() {
        handle_event(&state, event).await;
    }

    Ok(StatusCode::OK)
}

async fn handle_event(state: &AppState, event: Event) {
    let Event::Message { reply_token, message } = event else {
        return;
    };

    match message {
        EventMessage::Text { id, text } => {
            let query = text.trim();
            if query.is_empty() {
                return;
            }
            tracing::debug!(message_id = %id, query, "text message");

            let reply = state.formatter.reply_to(query).await;
            if let Err(e) = state.sender.reply(&reply_token, &reply).await {
                tracing::warn!(error = %e, query, "failed to send reply");
            }
        }
        EventMessage::Image { id } | EventMessage::Video { id } => {
            match state.content.discard_content(&id).await {
                Ok(bytes) => tracing::debug!(message_id = %id, bytes, "discarded message content"),
                Err(e) => tracing::warn!(message_id = %id, error = %e, "failed to fetch message content"),
            }
        }
        EventMessage::Other => {}
    }
}

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/callback", post(callback))
}
