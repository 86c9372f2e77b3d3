//! Parallel persona prompting.
//!
//! Every persona runs its own pipeline (prompt lookup, then one completion).
//! All pipelines are joined; a failure only removes that persona.

use crate::models::{Message, Persona};
use crate::providers::{ChatCompletion, CompletionError};
use crate::services::conversation::PersonaRequestMap;
use crate::services::prompts::{PromptError, PromptRepository};
use futures::future::join_all;
use std::collections::BTreeMap;
use thiserror::Error;

/// Placeholder substituted in system prompts when the client sends a language.
pub const STUDENT_LANGUAGE_PLACEHOLDER: &str = "{{student_language}}";

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("prompt lookup failed: {0}")]
    Prompt(#[from] PromptError),

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
}

/// Per-persona result of one fan-out, keyed for deterministic iteration.
pub type DispatchOutcome = BTreeMap<Persona, Result<String, PersonaError>>;

/// Everything a persona pipeline needs besides its own slice.
pub struct Dispatcher<'a, C: ChatCompletion + ?Sized> {
    pub prompts: &'a PromptRepository,
    pub completion: &'a C,
    pub model: &'a str,
    pub student_language: Option<&'a str>,
}

impl<'a, C: ChatCompletion + ?Sized> Dispatcher<'a, C> {
    async fn ask_persona(
        &self,
        persona: Persona,
        messages: &[Message],
    ) -> Result<String, PersonaError> {
        let mut prompt = self.prompts.get_prompt(persona.as_str(), None).await?;
        if let Some(language) = self.student_language {
            prompt = prompt.replace(STUDENT_LANGUAGE_PLACEHOLDER, language);
        }
        let reply = self.completion.complete(&prompt, messages, self.model).await?;
        Ok(reply)
    }

    /// Run every persona concurrently and wait for all of them.
    pub async fn run_all(&self, requests: &PersonaRequestMap) -> DispatchOutcome {
        let pipelines = requests.iter().map(|(persona, messages)| async move {
            (*persona, self.ask_persona(*persona, messages).await)
        });

        join_all(pipelines).await.into_iter().collect()
    }

    /// Run every persona and keep the successful replies, in persona order.
    ///
    /// Failed personas are logged and left out; nothing is retried.
    pub async fn dispatch(&self, requests: &PersonaRequestMap) -> Vec<Message> {
        self.run_all(requests)
            .await
            .into_iter()
            .filter_map(|(persona, outcome)| match outcome {
                Ok(reply) => Some(Message::new(persona, reply)),
                Err(e) => {
                    tracing::warn!(persona = %persona, error = %e, "Persona request failed");
                    None
                }
            })
            .collect()
    }
}

/// Drop replies where the persona declined to comment.
///
/// Only a reply that is exactly the marker counts; surrounding whitespace or
/// other text keeps the reply.
pub fn drop_no_reply(responses: Vec<Message>, marker: &str) -> Vec<Message> {
    responses
        .into_iter()
        .filter(|m| {
            let declined = m.content() == marker;
            if declined {
                tracing::debug!(persona = %m.persona(), "Persona chose not to reply");
            }
            !declined
        })
        .collect()
}
