use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Faults the chat endpoint can hit after admission.
///
/// The variants exist for logging; on the wire every one of them collapses
/// to the same generic 500 body so no internal detail leaks to the client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request body is not a valid chat message")]
    InvalidRequest,
    #[error("upstream api returned status {0}")]
    UpstreamStatus(u16),
    #[error("upstream request failed: {0}")]
    UpstreamTransport(#[from] reqwest::Error),
    #[error("upstream response missing completion content")]
    MalformedUpstream,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to process request" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_variant_collapses_to_generic_500() {
        for err in [
            ChatError::InvalidRequest,
            ChatError::UpstreamStatus(503),
            ChatError::MalformedUpstream,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "Failed to process request");
        }
    }
}
