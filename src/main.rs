use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_chat_gateway::config::{Args, api_key_from_env};
use portfolio_chat_gateway::rate_limit::{RateLimiter, sweep_loop};
use portfolio_chat_gateway::state::AppState;
use portfolio_chat_gateway::upstream::UpstreamClient;
use portfolio_chat_gateway::app;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let api_key = api_key_from_env().expect("OPENAI_API_KEY must be set");
    let system_context =
        std::fs::read_to_string(&args.context_file).expect("Failed to read context file");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.request_timeout))
        .build()
        .expect("Failed to build HTTP client");

    let rate_window = Duration::from_secs(args.rate_window);
    let rate_limiter = Arc::new(RateLimiter::new(args.rate_limit, rate_window));
    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        upstream: UpstreamClient::new(
            http,
            args.upstream_url.clone(),
            api_key,
            args.model.clone(),
            args.max_tokens,
            args.temperature,
        ),
        system_context,
    });

    // background eviction of identities whose whole log has aged out
    tokio::spawn(sweep_loop(rate_limiter, rate_window));

    let app = app(Arc::clone(&state));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Forwarding to {} (model {})", args.upstream_url, args.model);
    tracing::info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit,
        args.rate_window
    );
    axum::serve(listener, app).await.expect("Server failed");
}
