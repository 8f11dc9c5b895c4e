use std::time::Duration;

use async_trait::async_trait;
use diffsarif_core::{Credential, DiffSarifError, LlmConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Text-in, text-out completion service.
///
/// The pipeline makes exactly one [`complete`](Self::complete) call per
/// changed file. Implementations must not retain the credential.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` to `model` and return the raw reply text.
    ///
    /// # Errors
    ///
    /// [`DiffSarifError::InvalidCredential`] when the service rejects the
    /// credential, [`DiffSarifError::Upstream`] for any other failure.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, DiffSarifError>;

    /// Check that the service accepts `credential` without running a completion.
    ///
    /// # Errors
    ///
    /// Same as [`complete`](Self::complete).
    async fn verify_credential(&self, credential: &Credential) -> Result<(), DiffSarifError>;
}

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use diffsarif_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Analyze this diff".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input; the prompt is sent as a single user message.
    User,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes `/v1/chat/completions` and
/// `/v1/models`: OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use diffsarif_core::LlmConfig;
/// use diffsarif_review::llm::LlmClient;
///
/// let client = LlmClient::new(&LlmConfig::default()).unwrap();
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, DiffSarifError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiffSarifError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn completion_body(&self, model: &str, prompt: &str) -> serde_json::Value {
        let messages = vec![ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];
        serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "n": 1,
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, DiffSarifError> {
        let response = self
            .client
            .post(self.endpoint("/v1/chat/completions"))
            .bearer_auth(credential.expose())
            .json(&self.completion_body(model, prompt))
            .send()
            .await
            .map_err(|e| DiffSarifError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body_text));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DiffSarifError::Upstream(format!("failed to parse response: {e}")))?;

        extract_content(&response_body)
    }

    async fn verify_credential(&self, credential: &Credential) -> Result<(), DiffSarifError> {
        let response = self
            .client
            .get(self.endpoint("/v1/models"))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| DiffSarifError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body_text = response.text().await.unwrap_or_default();
        Err(status_error(status, &body_text))
    }
}

fn status_error(status: StatusCode, body: &str) -> DiffSarifError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DiffSarifError::InvalidCredential(format!("LLM API rejected the key ({status})"))
        }
        _ => DiffSarifError::Upstream(format!("LLM API error {status}: {body}")),
    }
}

fn extract_content(response_body: &serde_json::Value) -> Result<String, DiffSarifError> {
    let content = response_body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            DiffSarifError::Upstream(format!("unexpected response structure: {response_body}"))
        })?;

    Ok(content.trim().to_string())
}
