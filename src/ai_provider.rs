use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::chat::FALLBACK_REPLY;
use crate::core::{Notification, NotificationKind};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AIProvider {
    OpenAI,
    Ollama,
}

impl std::fmt::Display for AIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AIProvider::OpenAI => write!(f, "openai"),
            AIProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for AIProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(AIProvider::OpenAI),
            "ollama" => Ok(AIProvider::Ollama),
            _ => Err(anyhow!("Unknown AI provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub model: String,
    pub size: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the single-turn prompt that makes the being answer in character.
pub fn reply_prompt(personality: &str, input: &str) -> String {
    format!(
        "You are a virtual being with the following personality traits: {}. \
         Respond to the following user input with a unique response that reflects your personality:\n\n\
         User Input: {}",
        personality, input
    )
}

/// Turn an images API payload into something displayable.
///
/// Hosted URLs pass through; inline base64 becomes a `data:` URL.
fn image_from_response(response_json: &serde_json::Value) -> Result<String> {
    let entry = &response_json["data"][0];
    if let Some(url) = entry["url"].as_str() {
        return Ok(url.to_string());
    }
    if let Some(b64) = entry["b64_json"].as_str() {
        return Ok(format!("data:image/png;base64,{}", b64));
    }
    Err(anyhow!("Invalid image response format"))
}

pub struct AIProviderClient {
    config: AIConfig,
    http_client: reqwest::Client,
}

impl AIProviderClient {
    pub fn new(config: AIConfig) -> Self {
        AIProviderClient {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        match self.config.provider {
            AIProvider::OpenAI => self.chat_openai(messages).await,
            AIProvider::Ollama => self.chat_ollama(messages).await,
        }
    }

    /// Ask for an in-character reply.
    ///
    /// Never fails: any provider error yields the fallback line together with
    /// a notification describing what went wrong.
    pub async fn generate_reply(&self, personality: &str, input: &str) -> (String, Option<Notification>) {
        let prompt = reply_prompt(personality, input);
        match self.chat(vec![ChatMessage::user(prompt)]).await {
            Ok(reply) if !reply.trim().is_empty() => (reply.trim().to_string(), None),
            Ok(_) => {
                warn!(provider = %self.config.provider, "empty reply from provider");
                (FALLBACK_REPLY.to_string(), Some(reply_failed()))
            }
            Err(e) => {
                warn!(provider = %self.config.provider, error = %e, "reply generation failed");
                (FALLBACK_REPLY.to_string(), Some(reply_failed()))
            }
        }
    }

    async fn chat_openai(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow!("OpenAI API key required"))?;
        let base_url = self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);

        let request_messages: Vec<serde_json::Value> = messages
            .into_iter()
            .map(|msg| serde_json::json!({ "role": msg.role, "content": msg.content }))
            .collect();

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": request_messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });

        debug!(model = %self.config.model, "requesting OpenAI chat completion");
        let response = self.http_client
            .post(format!("{}/v1/chat/completions", base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error: {}", error_text));
        }

        let response_json: serde_json::Value = response.json().await?;
        response_json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid OpenAI response format"))
    }

    async fn chat_ollama(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let base_url = self.config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL);

        let request_messages: Vec<serde_json::Value> = messages
            .into_iter()
            .map(|msg| serde_json::json!({ "role": msg.role, "content": msg.content }))
            .collect();

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": request_messages,
            "stream": false
        });

        debug!(model = %self.config.model, "requesting Ollama chat");
        let response = self.http_client
            .post(format!("{}/api/chat", base_url))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama API error: {}", error_text));
        }

        let response_json: serde_json::Value = response.json().await?;
        response_json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid Ollama response format"))
    }

    pub fn get_model(&self) -> &str {
        &self.config.model
    }

    pub fn get_provider(&self) -> AIProvider {
        self.config.provider
    }
}

pub struct ImageClient {
    config: ImageConfig,
    http_client: reqwest::Client,
}

impl ImageClient {
    pub fn new(config: ImageConfig) -> Self {
        ImageClient {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Generate one image and return a URL (possibly a `data:` URL).
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow!("OpenAI API key required for image generation"))?;
        let base_url = self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);

        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "n": 1,
            "size": self.config.size
        });

        debug!(model = %self.config.model, "requesting image");
        let response = self.http_client
            .post(format!("{}/v1/images/generations", base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI image API error: {}", error_text));
        }

        let response_json: serde_json::Value = response.json().await?;
        image_from_response(&response_json)
    }
}

fn reply_failed() -> Notification {
    Notification::new(
        NotificationKind::ReplyFailed,
        "返事ができませんでした",
        "AIの応答を取得できませんでした。",
    )
}
