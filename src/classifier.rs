//! # Classifier Adapter
//!
//! Wraps a single chat-completion call to an external capability and turns
//! its free-form, possibly noisy response into a [`Label`]. The capability
//! is an injected handle behind [`ChatCapability`], so tests substitute a
//! scripted fake and production code plugs in [`OpenAiChatClient`].
//!
//! Failure handling is local and never surfaced past this module: a
//! transport failure or unparsable response triggers a bounded retry with a
//! pause, and exhaustion degrades to [`Label::Unknown`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::ClassifierConfig;
use crate::table::Label;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Errors surfaced by a chat-completion capability
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Request never produced an HTTP response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Capability answered with a non-success status
    #[error("Capability returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Failed to decode capability response: {0}")]
    Decode(String),
}

/// One blocking prompt/completion exchange with an external model
///
/// Implementations are expected to be fallible and possibly slow; the
/// adapter owns all retry policy.
#[async_trait]
pub trait ChatCapability: Send + Sync {
    /// Send a single prompt and return the raw completion text
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CapabilityError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat-completions backend over HTTP
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenAiChatClient {
    /// Create a client against the default API endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_api_url(api_key, DEFAULT_API_URL)
    }

    /// Create a client against a custom endpoint (proxies, compatible APIs)
    pub fn with_api_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ChatCapability for OpenAiChatClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CapabilityError> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CapabilityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Decode(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CapabilityError::Decode("response carried no message content".to_string())
            })
    }
}

/// Best-effort structured-payload extraction
///
/// Scans the raw response for the substring spanning the first `{` to the
/// last `}`, parses it as JSON, and reads a recognizable `sentiment` field.
/// Tolerance for surrounding prose is intentional; any miss simply returns
/// `None`, which the adapter treats as a failed attempt.
pub fn extract_sentiment(response: &str) -> Option<Label> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let payload = &response[start..=end];
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value.get("sentiment")?.as_str().and_then(Label::parse)
}

/// Classifier adapter: one text in, one [`Label`] out
pub struct SentimentAnalyzer<C: ChatCapability> {
    capability: C,
    config: ClassifierConfig,
}

impl<C: ChatCapability> SentimentAnalyzer<C> {
    /// Create an analyzer around an injected capability handle
    pub fn new(capability: C, config: ClassifierConfig) -> Self {
        Self { capability, config }
    }

    /// Access the injected capability handle
    pub fn capability(&self) -> &C {
        &self.capability
    }

    fn prompt_for(comment: &str) -> String {
        format!(
            "Please analyze the sentiment of the following comment and return ONLY a valid JSON \
             with this exact format: {{\"sentiment\": \"Positive\"}} or {{\"sentiment\": \
             \"Negative\"}} or {{\"sentiment\": \"Neutral\"}}\n\nComment: {comment}"
        )
    }

    /// Classify one comment
    ///
    /// Blank or missing text short-circuits to [`Label::NoContent`] without
    /// contacting the capability. Otherwise up to `max_attempts` calls are
    /// made; the first response carrying a recognizable sentiment payload
    /// wins, and exhaustion yields [`Label::Unknown`].
    pub async fn classify(&self, comment: Option<&str>) -> Label {
        let text = match comment {
            Some(text) if !text.trim().is_empty() => text.trim(),
            _ => return Label::NoContent,
        };

        let prompt = Self::prompt_for(text);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let call = self.capability.complete(&self.config.model, &prompt);
            match timeout(self.config.request_timeout(), call).await {
                Ok(Ok(response)) => {
                    if let Some(label) = extract_sentiment(&response) {
                        debug!(attempt, label = %label, "Classified comment");
                        return label;
                    }
                    debug!(attempt, "Response carried no usable sentiment payload");
                    if attempt < max_attempts {
                        sleep(self.config.parse_retry_delay()).await;
                    }
                }
                Ok(Err(error)) => {
                    warn!(attempt, error = %error, "Capability call failed");
                    if attempt < max_attempts {
                        sleep(self.config.transport_retry_delay()).await;
                    }
                }
                Err(_) => {
                    warn!(
                        attempt,
                        timeout_seconds = self.config.request_timeout_seconds,
                        "Capability call timed out"
                    );
                    if attempt < max_attempts {
                        sleep(self.config.transport_retry_delay()).await;
                    }
                }
            }
        }

        Label::Unknown
    }
}
