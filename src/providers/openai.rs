//! OpenAI chat completions client

use crate::models::{CompletionTurn, Message};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Sampling temperature used for every persona request
pub const COMPLETION_TEMPERATURE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport failure or a non-success status from the API.
    #[error("completion request failed: {0}")]
    RequestFailed(String),

    /// The API answered but the body lacks `choices[0].message.content`.
    #[error("failed to parse completion response: {0}")]
    ParseFailed(String),
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<CompletionTurn>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Completion client bound to one API credential.
///
/// Built per request from a freshly retrieved key; the underlying
/// `reqwest::Client` is shared.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl CompletionClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the `messages` array: the system prompt, then every history entry
    /// that has a completion role.
    pub fn build_turns(system_prompt: &str, history: &[Message]) -> Vec<CompletionTurn> {
        std::iter::once(CompletionTurn::system(system_prompt))
            .chain(history.iter().filter_map(Message::to_completion_role))
            .collect()
    }

    /// Ask the model once and return the first choice's text.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        model: &str,
    ) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            model,
            temperature: COMPLETION_TEMPERATURE,
            messages: Self::build_turns(system_prompt, history),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::RequestFailed(format!(
                "status {}: {}",
                status, detail
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::ParseFailed(e.to_string()))?;

        parse_reply(parsed)
    }
}

fn parse_reply(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    let choices = response
        .choices
        .ok_or_else(|| CompletionError::ParseFailed("missing 'choices'".to_string()))?;
    let first = choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::ParseFailed("'choices' is empty".to_string()))?;
    first
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| CompletionError::ParseFailed("missing 'message.content'".to_string()))
}
