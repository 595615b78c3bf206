use serde::{Deserialize, Serialize};

// Widget request format
#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    pub message: String,
}

// Widget success response format
#[derive(Serialize, Debug)]
pub struct ChatReply {
    pub message: String,
}

// OpenAI-style chat completion request
#[derive(Serialize, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// OpenAI-style chat completion response; only the fields we read
#[derive(Deserialize, Debug)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: Message,
}
