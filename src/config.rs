use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-chat-gateway")]
#[command(about = "Rate-limited chat backend for a portfolio website widget")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8787)]
    pub port: u16,

    // Base URL of the chat-completion API
    #[arg(long, default_value = "https://api.openai.com")]
    pub upstream_url: String,

    // Model to request upstream
    #[arg(long, default_value = "gpt-3.5-turbo")]
    pub model: String,

    // Completion length cap
    #[arg(long, default_value_t = 500)]
    pub max_tokens: u32,

    // Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    // Max admitted requests per client per window
    #[arg(long, default_value_t = 6)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 900)]
    pub rate_window: u64,

    // File holding the system-context profile text
    #[arg(long, default_value = "context.txt")]
    pub context_file: String,

    // Upstream request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,
}

/// Read the upstream API credential from the environment. A `.env` file is
/// honored for local runs; the key itself is never compiled in.
pub fn api_key_from_env() -> Result<String, std::env::VarError> {
    dotenv::dotenv().ok();
    std::env::var("OPENAI_API_KEY")
}
