//! Splitting a conversation into the history each persona sees.

use crate::error::{Error, Result};
use crate::models::{IncomingMessage, Message, Persona};
use std::collections::BTreeMap;

/// Persona → the ordered messages it is asked about.
pub type PersonaRequestMap = BTreeMap<Persona, Vec<Message>>;

/// Build the per-persona slices for one request.
///
/// `chat` and `context` get the last `history_window` user/chat turns;
/// `grammar`, `vocab` and `politeness` only get the current message, which is
/// the one named by `current_id` (which must be a user turn) or else the last
/// message.
pub fn build_persona_requests(
    messages: &[IncomingMessage],
    history_window: usize,
    current_id: Option<&str>,
) -> Result<PersonaRequestMap> {
    let conversational: Vec<Message> = messages
        .iter()
        .map(|m| &m.message)
        .filter(|m| m.persona().is_conversational())
        .cloned()
        .collect();
    let start = conversational.len().saturating_sub(history_window);
    let history = conversational[start..].to_vec();

    let current: Vec<Message> = match current_id {
        Some(id) => {
            let found = messages
                .iter()
                .find(|m| m.id.as_deref() == Some(id))
                .ok_or_else(|| {
                    Error::Validation(format!("No message with id \"{}\" in \"messages\"", id))
                })?;
            if found.message.persona() != Persona::User {
                return Err(Error::Validation(format!(
                    "Message with id \"{}\" is not a user message",
                    id
                )));
            }
            vec![found.message.clone()]
        }
        None => messages.last().map(|m| m.message.clone()).into_iter().collect(),
    };

    let mut requests = PersonaRequestMap::new();
    for persona in Persona::ADVISORS {
        let slice = match persona {
            Persona::Chat | Persona::Context => history.clone(),
            _ => current.clone(),
        };
        requests.insert(persona, slice);
    }
    Ok(requests)
}
