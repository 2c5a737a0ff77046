//! Anthropic Messages API backend.

use super::GenerationService;
use crate::errors::{ConfigError, ServiceError};
use crate::moderation::moderation_prompt;
use crate::pipeline::{StageId, StageRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Model used for topic classification.
pub const MODERATION_MODEL: &str = "claude-3-5-haiku-20241022";

/// Default model used for stage generation.
pub const DEFAULT_GENERATION_MODEL: &str = "claude-3-5-sonnet-20241022";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MODERATION_MAX_TOKENS: u32 = 100;
const DEFAULT_GENERATION_MAX_TOKENS: u32 = 4096;

const QUESTIONER_SYSTEM: &str = "You are a Socratic questioner. You examine \
    philosophical questions through patient, probing questions rather than \
    lectures, and you make hidden assumptions visible.";
const JUDGE_SYSTEM: &str = "You are an impartial judge of philosophical \
    dialogue. You evaluate lines of inquiry for rigor, clarity and depth.";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn into_text(self) -> Result<String, ServiceError> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ServiceError::malformed("response has no text content"))
    }
}

/// [`GenerationService`] backed by the Anthropic Messages API.
pub struct AnthropicService {
    client: Client,
    api_key: String,
    base_url: String,
    generation_model: String,
    generation_max_tokens: u32,
}

impl AnthropicService {
    /// Creates a service using `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the key is blank or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("Anthropic API key is empty".to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            generation_max_tokens: DEFAULT_GENERATION_MAX_TOKENS,
        })
    }

    /// Creates a service from `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a service reading the API key through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if `lookup` yields nothing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let key = lookup("ANTHROPIC_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnv("ANTHROPIC_API_KEY".to_string()))?;
        Self::new(key)
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the generation model.
    #[must_use]
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Overrides the generation token limit.
    #[must_use]
    pub fn with_generation_max_tokens(mut self, max_tokens: u32) -> Self {
        self.generation_max_tokens = max_tokens;
        self
    }

    /// Returns the generation model.
    #[must_use]
    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<String, ServiceError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = body.model, max_tokens = body.max_tokens, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::malformed(e.to_string()))?;
        parsed.into_text()
    }
}

impl std::fmt::Debug for AnthropicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicService")
            .field("base_url", &self.base_url)
            .field("generation_model", &self.generation_model)
            .field("generation_max_tokens", &self.generation_max_tokens)
            .finish_non_exhaustive()
    }
}

fn system_prompt(stage: StageId) -> &'static str {
    match stage {
        StageId::Judgment => JUDGE_SYSTEM,
        StageId::TopicStage | StageId::FirstInquiry | StageId::AltInquiry => QUESTIONER_SYSTEM,
    }
}

#[async_trait]
impl GenerationService for AnthropicService {
    async fn classify(&self, topic: &str) -> Result<String, ServiceError> {
        let prompt = moderation_prompt(topic);
        let body = MessagesRequest {
            model: MODERATION_MODEL,
            max_tokens: MODERATION_MAX_TOKENS,
            system: None,
            messages: [Message {
                role: "user",
                content: &prompt,
            }],
        };
        self.send(&body).await
    }

    async fn generate(&self, request: &StageRequest) -> Result<String, ServiceError> {
        let body = MessagesRequest {
            model: &self.generation_model,
            max_tokens: self.generation_max_tokens,
            system: Some(system_prompt(request.stage)),
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };
        self.send(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: MODERATION_MODEL,
            max_tokens: MODERATION_MAX_TOKENS,
            system: None,
            messages: [Message {
                role: "user",
                content: "hello",
            }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 100,
                "messages": [{"role": "user", "content": "hello"}],
            })
        );
    }

    #[test]
    fn test_response_text_is_trimmed() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": "  APPROPRIATE\n"}],
            "model": MODERATION_MODEL,
        }))
        .unwrap();

        assert_eq!(response.into_text().unwrap(), "APPROPRIATE");
    }

    #[test]
    fn test_response_without_text_is_malformed() {
        let response: MessagesResponse =
            serde_json::from_value(json!({"content": []})).unwrap();

        assert!(matches!(
            response.into_text(),
            Err(ServiceError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_lookup_requires_key() {
        let err = AnthropicService::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref name) if name == "ANTHROPIC_API_KEY"));

        let service = AnthropicService::from_lookup(|_| Some("sk-test".to_string()))
            .unwrap()
            .with_generation_model("claude-test")
            .with_base_url("http://localhost:9999/");
        assert_eq!(service.generation_model(), "claude-test");
        assert!(!format!("{service:?}").contains("sk-test"));
    }

    #[test]
    fn test_blank_key_is_rejected() {
        assert!(AnthropicService::new("  ").is_err());
    }

    #[test]
    fn test_judge_uses_judge_persona() {
        assert_eq!(system_prompt(StageId::Judgment), JUDGE_SYSTEM);
        assert_eq!(system_prompt(StageId::AltInquiry), QUESTIONER_SYSTEM);
    }
}
