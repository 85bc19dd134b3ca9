use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// LINE's sample bots answer a bad signature with this non-standard status.
const SIGNATURE_REJECTED: u16 = 470;

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    InvalidSignature,
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidSignature => (
                StatusCode::from_u16(SIGNATURE_REJECTED).unwrap_or(StatusCode::BAD_REQUEST),
                "invalid signature".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };
        (
            status,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_is_470() {
        assert_eq!(AppError::InvalidSignature.into_response().status().as_u16(), 470);
    }

    #[test]
    fn bad_request_is_400() {
        let res = AppError::BadRequest("nope".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
