use std::sync::Arc;

use crate::rate_limit::RateLimiter;
use crate::upstream::UpstreamClient;

// app's shared state; the limiter is also held by the sweep task
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub upstream: UpstreamClient,
    pub system_context: String, // profile text sent as the system message
}
