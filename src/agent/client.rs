//! Chat-completion clients.
//!
//! This module implements the single narrow seam to a language model:
//! [`LanguageModel::complete`]. [`ChatClient`] speaks two dialects:
//! - OpenAI-compatible `/chat/completions` (Groq)
//! - Ollama `/api/chat`

use crate::config::{ModelConfig, ProviderKind};
use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier for logs and report metadata.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model_name: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub timeout_seconds: u64,
    pub system_prompt: String,
}

impl ChatConfig {
    pub fn from_model_config(
        config: &ModelConfig,
        api_key: Option<String>,
        system_prompt: &str,
    ) -> Self {
        Self {
            provider: config.provider,
            base_url: config.effective_base_url(),
            model_name: config.name.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
            system_prompt: system_prompt.to_string(),
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-style chat completions request.
#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// HTTP chat client for Groq or Ollama.
pub struct ChatClient {
    config: ChatConfig,
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> anyhow::Result<Self> {
        info!(
            "Initializing {:?} client with model {} at {}",
            config.provider, config.model_name, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.config.system_prompt.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ]
    }

    fn map_send_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Request(format!(
                "request timed out after {}s",
                self.config.timeout_seconds
            ))
        } else if e.is_connect() {
            ModelError::Request(format!("cannot connect to {}", self.config.base_url))
        } else {
            ModelError::Request(format!("failed to send request: {}", e))
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, ModelError> {
        let mut request = self.http_client.post(url).json(body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Request(format!("API error {}: {}", status, body)));
        }

        Ok(response)
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionsRequest {
            model: &self.config.model_name,
            messages: self.messages(prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let response: CompletionsResponse = self
            .post(&url, &request)
            .await?
            .json()
            .await
            .map_err(|e| ModelError::Malformed(format!("unexpected response body: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Malformed("response contained no choices".to_string()))
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.config.base_url);
        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages: self.messages(prompt),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let response: OllamaChatResponse = self
            .post(&url, &request)
            .await?
            .json()
            .await
            .map_err(|e| ModelError::Malformed(format!("unexpected response body: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        debug!("Sending prompt ({} chars)", prompt.len());
        match self.config.provider {
            ProviderKind::Groq => self.complete_openai(prompt).await,
            ProviderKind::Ollama => self.complete_ollama(prompt).await,
        }
    }
}
