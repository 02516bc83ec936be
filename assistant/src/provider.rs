//! Chat model providers.
//!
//! A provider performs exactly one model call per invocation; retries and
//! backoff belong to the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::action::{ActionCall, ActionDecl};
use crate::context::ChatTurn;
use crate::error::{AssistantError, Result};

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default timeout for a single model call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One fully assembled model call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Dialogue history, oldest first.
    pub turns: Vec<ChatTurn>,

    /// System instruction for this turn.
    pub system_instruction: String,

    /// Action vocabulary declared to the model.
    pub declarations: Vec<ActionDecl>,
}

/// What the model replied with.
///
/// Text and action calls can both be present; the model may also reply with
/// actions only, in which case the orchestrator synthesizes a fallback text.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    /// Natural-language reply, if any.
    pub text: Option<String>,

    /// Requested actions, in the order the model emitted them.
    pub calls: Vec<ActionCall>,
}

/// Trait for chat model providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Perform a single model call. No retries.
    async fn chat(&self, request: ChatRequest) -> Result<ModelReply>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Gemini chat provider with function calling.
pub struct GeminiChatProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to call.
    model: String,

    /// Hard timeout for a single call.
    request_timeout: Duration,
}

impl GeminiChatProvider {
    /// Create a new provider, reading the key from `GEMINI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = request
            .turns
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.wire_name(),
                    "parts": [{ "text": turn.text }],
                })
            })
            .collect();

        let declarations: Vec<serde_json::Value> = request
            .declarations
            .iter()
            .map(ActionDecl::to_function_declaration)
            .collect();

        serde_json::json!({
            "contents": contents,
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "tools": [{ "function_declarations": declarations }],
        })
    }
}

impl Default for GeminiChatProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ModelReply> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AssistantError::ProviderNotConfigured)?;

        debug!(
            "Calling model {} with {} turns and {} declared actions",
            self.model,
            request.turns.len(),
            request.declarations.len()
        );

        let body = self.build_body(&request);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", api_key.as_str())])
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(AssistantError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Provider(format!(
                "API error {status}: {error_text}"
            )));
        }

        let result: GeminiChatResponse = response.json().await?;
        parse_reply(result)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_reply(response: GeminiChatResponse) -> Result<ModelReply> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AssistantError::InvalidResponse("no candidates".to_string()))?;

    let mut reply = ModelReply::default();

    for part in candidate.content.parts {
        if let Some(text) = part.text {
            // First text part wins; later ones are usually restatements.
            if reply.text.is_none() && !text.trim().is_empty() {
                reply.text = Some(text);
            }
        }
        if let Some(call) = part.function_call {
            reply.calls.push(ActionCall {
                name: call.name,
                arguments: match call.args {
                    Some(serde_json::Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                },
            });
        }
    }

    Ok(reply)
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiChatResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}
