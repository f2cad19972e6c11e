//! OpenAI-compatible chat-completion client.
//!
//! Works with DeepSeek, OpenAI, OpenRouter, Ollama and any endpoint exposing
//! `POST {base_url}/chat/completions`. Non-streaming only.

use async_trait::async_trait;
use piste_config::{AssistantConfig, DEFAULT_SYSTEM_PROMPT, RemoteConfig};
use piste_core::error::RemoteUnavailable;
use piste_core::message::ConversationTurn;
use piste_core::provider::{CompletionClient, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// A chat-completion client speaking the OpenAI wire format.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    context_turns: usize,
    system_prompt: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client with default sampling, a 30 second timeout and the
    /// built-in fencing persona.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RemoteUnavailable> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RemoteUnavailable::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            context_turns: 10,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            client,
        })
    }

    /// Create a DeepSeek client (convenience constructor).
    pub fn deepseek(api_key: impl Into<String>) -> Result<Self, RemoteUnavailable> {
        Self::new("deepseek", "https://api.deepseek.com/v1", api_key, "deepseek-chat")
    }

    /// Create a client from the `[remote]` and `[assistant]` config sections.
    pub fn from_config(
        api_key: &str,
        remote: &RemoteConfig,
        assistant: &AssistantConfig,
    ) -> Result<Self, RemoteUnavailable> {
        let name = if remote.base_url.contains("deepseek") {
            "deepseek"
        } else {
            "openai-compat"
        };

        Ok(Self::new(name, &remote.base_url, api_key, &remote.model)?
            .with_sampling(remote.max_tokens, remote.temperature)
            .with_timeout(Duration::from_secs(remote.timeout_secs))
            .with_context_pairs(assistant.context_pairs)
            .with_system_prompt(assistant.system_prompt()))
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Hard limit on one request, connect to last byte.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How many user/assistant pairs of history to send.
    pub fn with_context_pairs(mut self, pairs: usize) -> Self {
        self.context_turns = pairs * 2;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The persona, plus a line about the video being watched and one about
    /// how long the conversation has run.
    fn system_message(&self, request: &CompletionRequest) -> String {
        let mut prompt = self.system_prompt.clone();
        let context = request.video_context.trim();
        if !context.is_empty() {
            prompt.push_str(&format!(
                "\n\n当前用户正在观看视频内容：{context}。请结合视频内容提供相关建议和分析。"
            ));
        }
        if request.prior_rounds > 0 {
            prompt.push_str(&format!(
                "\n\n对话历史：用户已经进行了{}轮对话，请保持对话的连贯性。",
                request.prior_rounds
            ));
        }
        prompt
    }

    /// System prompt, then the most recent history turns, then the current
    /// message.
    fn build_messages(&self, request: &CompletionRequest) -> Vec<ApiMessage> {
        let skip = request.history.len().saturating_sub(self.context_turns);
        let history = request.history[skip..].iter().map(ApiMessage::from_turn);

        std::iter::once(ApiMessage::new("system", self.system_message(request)))
            .chain(history)
            .chain(std::iter::once(ApiMessage::new(
                "user",
                request.prefixed_message(),
            )))
            .collect()
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteUnavailable {
        if e.is_timeout() {
            RemoteUnavailable::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RemoteUnavailable::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, RemoteUnavailable> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: &self.model,
            messages: self.build_messages(&request),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        debug!(
            provider = %self.name,
            model = %self.model,
            messages = body.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion endpoint returned error");
            return Err(RemoteUnavailable::Http {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                RemoteUnavailable::Malformed(format!("Failed to parse response: {e}"))
            }
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(RemoteUnavailable::EmptyResponse);
        }

        Ok(content)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl ApiMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
        }
    }

    fn from_turn(turn: &ConversationTurn) -> Self {
        Self::new(turn.speaker.role(), &turn.text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
