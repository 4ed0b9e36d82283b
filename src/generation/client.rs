//! Generation collaborator: chat-completion wire types, the client trait and
//! an HTTP implementation for OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::request::Prompt;
use crate::error::GenerationError;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Chat-completion response, reduced to the fields the validator reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// A chat message. `content` may be null in provider responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
        }
    }
}

impl ChatCompletion {
    /// Builds a response with one assistant candidate per text.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: texts
                .into_iter()
                .map(|text| ChatChoice {
                    message: ChatMessage::assistant(text),
                })
                .collect(),
        }
    }

    /// Builds a response with a single assistant candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_texts([text.into()])
    }

    /// Text of the first candidate. `None` when there are no candidates or
    /// the first one carries no content.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// The external service that proposes blocks for a prompt.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends the prompt and returns the raw completion.
    ///
    /// Any failure to obtain a response is reported as
    /// `GenerationError::Transport`.
    async fn complete(&self, prompt: &Prompt) -> Result<ChatCompletion, GenerationError>;
}

#[async_trait]
impl<C: GenerationClient + ?Sized> GenerationClient for Box<C> {
    async fn complete(&self, prompt: &Prompt) -> Result<ChatCompletion, GenerationError> {
        (**self).complete(prompt).await
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

#[cfg(feature = "client")]
pub use http::ChatCompletionsClient;

#[cfg(feature = "client")]
mod http {
    use async_trait::async_trait;
    use reqwest::{header, Client};
    use serde_json::json;
    use tracing::debug;

    use super::{ChatCompletion, ChatMessage, GenerationClient};
    use crate::error::{GenerationError, StepError, StepResult};
    use crate::generation::config::GeneratorConfig;
    use crate::generation::request::Prompt;

    /// Client for `POST {base_url}/chat/completions`.
    ///
    /// The configured timeout bounds each request end to end.
    pub struct ChatCompletionsClient {
        client: Client,
        config: GeneratorConfig,
    }

    impl ChatCompletionsClient {
        /// Create a new client from a validated configuration.
        pub fn new(config: GeneratorConfig) -> StepResult<Self> {
            config.validate()?;

            let mut headers = header::HeaderMap::new();
            let auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| StepError::config(format!("invalid API key header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, auth);

            let client = Client::builder()
                .default_headers(headers)
                .timeout(config.timeout)
                .build()
                .map_err(|e| StepError::config(format!("failed to build HTTP client: {}", e)))?;

            Ok(Self { client, config })
        }

        pub fn config(&self) -> &GeneratorConfig {
            &self.config
        }

        fn endpoint(&self) -> String {
            format!("{}/chat/completions", self.config.base_url)
        }
    }

    #[async_trait]
    impl GenerationClient for ChatCompletionsClient {
        async fn complete(&self, prompt: &Prompt) -> Result<ChatCompletion, GenerationError> {
            let body = json!({
                "model": self.config.model,
                "messages": [
                    ChatMessage::system(prompt.system.clone()),
                    ChatMessage::user(prompt.user.clone()),
                ],
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            });

            debug!(model = %self.config.model, url = %self.endpoint(), "sending completion request");

            let resp = self
                .client
                .post(self.endpoint())
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(e, &self.config))?;

            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let message = resp.text().await.unwrap_or_default();
                return Err(GenerationError::transport(format!(
                    "API error: {} - {}",
                    status, message
                )));
            }

            resp.json::<ChatCompletion>()
                .await
                .map_err(|e| transport_error(e, &self.config))
        }
    }

    fn transport_error(err: reqwest::Error, config: &GeneratorConfig) -> GenerationError {
        if err.is_timeout() {
            GenerationError::transport(format!("request timed out after {:?}", config.timeout))
        } else {
            GenerationError::transport(err.to_string())
        }
    }
}
