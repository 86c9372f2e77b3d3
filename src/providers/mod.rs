//! Completion API providers
//!
//! `ChatCompletion` is the seam the persona fan-out talks to; `openai` is the
//! production implementation.

pub mod openai;

pub use openai::{CompletionClient, CompletionError, COMPLETION_TEMPERATURE};

use crate::models::Message;
use async_trait::async_trait;

/// One system-prompted completion over a message history.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        model: &str,
    ) -> Result<String, CompletionError>;
}

#[async_trait]
impl ChatCompletion for CompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        model: &str,
    ) -> Result<String, CompletionError> {
        CompletionClient::complete(self, system_prompt, history, model).await
    }
}
