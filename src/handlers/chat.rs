use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ChatError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ChatReply, ChatRequest};
use crate::rate_limit::Decision;
use crate::state::AppState;

const CORS_ANY: (header::HeaderName, &str) = (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");

// Best-effort bucketing key for rate limiting; not authenticated
fn client_identity(headers: &HeaderMap) -> String {
    for name in ["x-forwarded-for", "client-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    "unknown".to_string()
}

fn rate_limit_message(limit: u32, window_minutes: u64, retry_after_minutes: u64) -> String {
    format!(
        "You've reached the limit of {} questions per {} minutes. Please try again in {} minute{}.",
        limit,
        window_minutes,
        retry_after_minutes,
        if retry_after_minutes > 1 { "s" } else { "" }
    )
}

/// POST /api/chat
///
/// Admission happens before the body is even parsed, matching the original
/// contract: a throttled client gets a 429 no matter what it sent. Every
/// fault after admission collapses to the generic 500 via `ChatError`.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    REQUEST_TOTAL.inc();

    let identity = client_identity(&headers);
    match state.rate_limiter.check(&identity) {
        Decision::Rejected { retry_after_minutes } => {
            RATE_LIMITED_TOTAL.inc();
            tracing::info!(identity = %identity, retry_after_minutes, "rate limited");
            let window_minutes = state.rate_limiter.window().as_secs() / 60;
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [CORS_ANY],
                Json(serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "message": rate_limit_message(
                        state.rate_limiter.limit(),
                        window_minutes,
                        retry_after_minutes,
                    ),
                })),
            )
                .into_response();
        }
        Decision::Admitted { remaining } => {
            tracing::debug!(identity = %identity, remaining, "admitted");
        }
    }

    let started = Instant::now();
    let result = answer(&state, &body).await;
    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    match result {
        Ok(content) => {
            (StatusCode::OK, [CORS_ANY], Json(ChatReply { message: content })).into_response()
        }
        Err(err) => {
            tracing::error!(identity = %identity, error = %err, "chat request failed");
            err.into_response()
        }
    }
}

async fn answer(state: &AppState, body: &[u8]) -> Result<String, ChatError> {
    let request: ChatRequest =
        serde_json::from_slice(body).map_err(|_| ChatError::InvalidRequest)?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ChatError::InvalidRequest);
    }
    state.upstream.complete(&state.system_context, message).await
}

// MethodRouter fallback: anything but POST on the chat route
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        headers.insert("client-ip", "198.51.100.1".parse().unwrap());
        assert_eq!(client_identity(&headers), "203.0.113.9");
    }

    #[test]
    fn identity_falls_back_to_client_ip_then_sentinel() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", "198.51.100.1".parse().unwrap());
        assert_eq!(client_identity(&headers), "198.51.100.1");
        assert_eq!(client_identity(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn rate_limit_message_pluralizes_only_above_one() {
        assert_eq!(
            rate_limit_message(6, 15, 1),
            "You've reached the limit of 6 questions per 15 minutes. Please try again in 1 minute."
        );
        assert_eq!(
            rate_limit_message(6, 15, 2),
            "You've reached the limit of 6 questions per 15 minutes. Please try again in 2 minutes."
        );
    }
}
