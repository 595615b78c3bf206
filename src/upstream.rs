use crate::error::ChatError;
use crate::metrics::UPSTREAM_FAILURES;
use crate::models::{CompletionRequest, CompletionResponse, Message};

/// Client for the chat-completion API.
///
/// One request in, one answer out: no retries, no streaming. The reqwest
/// client carries a bounded timeout, so a hung upstream surfaces as a
/// transport error instead of stalling the handler forever.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl UpstreamClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }

    pub async fn complete(
        &self,
        system_context: &str,
        user_message: &str,
    ) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_context), Message::user(user_message)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .inspect_err(|_| UPSTREAM_FAILURES.inc())?;

        let status = response.status();
        if !status.is_success() {
            UPSTREAM_FAILURES.inc();
            return Err(ChatError::UpstreamStatus(status.as_u16()));
        }

        let body: CompletionResponse = response.json().await.map_err(|err| {
            UPSTREAM_FAILURES.inc();
            tracing::warn!(error = %err, "upstream response did not parse");
            ChatError::MalformedUpstream
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::MalformedUpstream)
    }
}
