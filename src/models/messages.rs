use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Sender role of a chat turn, and the selector for a persona's system prompt.
///
/// Declaration order is the order personas appear in a proxy response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Persona {
    User,
    Chat,
    Grammar,
    Vocab,
    Politeness,
    Context,
}

impl Persona {
    /// Personas that get their own completion request.
    pub const ADVISORS: [Persona; 5] = [
        Persona::Chat,
        Persona::Grammar,
        Persona::Vocab,
        Persona::Politeness,
        Persona::Context,
    ];

    /// Returns the persona identifier string (also its prompt collection name)
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::User => "user",
            Persona::Chat => "chat",
            Persona::Grammar => "grammar",
            Persona::Vocab => "vocab",
            Persona::Politeness => "politeness",
            Persona::Context => "context",
        }
    }

    /// Whether turns from this persona belong to the user/assistant dialogue.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Persona::User | Persona::Chat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("invalid persona '{0}'")]
    InvalidPersona(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("message sets both 'persona' and 'role'")]
    ConflictingSender,

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Client-side JSON shape of a chat turn.
///
/// Accepts either `{persona, content}` or `{role, content, id?}`. Any other
/// field is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl WireMessage {
    pub fn from_value(value: serde_json::Value) -> Result<Self, MessageError> {
        serde_json::from_value(value).map_err(|e| MessageError::Malformed(e.to_string()))
    }
}

/// Role names understood by the completion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompletionRole {
    System,
    User,
    Assistant,
}

/// One entry of a completion request's `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTurn {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::System,
            content: content.into(),
        }
    }
}

/// A single chat turn tagged with its sender persona. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    persona: Persona,
    content: String,
}

impl Message {
    pub fn new(persona: Persona, content: impl Into<String>) -> Self {
        Self {
            persona,
            content: content.into(),
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Build a message from its client JSON form.
    pub fn from_wire(wire: &WireMessage) -> Result<Self, MessageError> {
        let persona = match (&wire.persona, &wire.role) {
            (Some(_), Some(_)) => return Err(MessageError::ConflictingSender),
            (Some(name), None) => {
                Persona::from_str(name).map_err(|_| MessageError::InvalidPersona(name.clone()))?
            }
            (None, Some(role)) => persona_for_role(role)?,
            (None, None) => return Err(MessageError::MissingField("persona")),
        };
        let content = wire
            .content
            .clone()
            .ok_or(MessageError::MissingField("content"))?;

        Ok(Self { persona, content })
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            persona: Some(self.persona.to_string()),
            content: Some(self.content.clone()),
            ..Default::default()
        }
    }

    /// Map onto the completion API's role schema.
    ///
    /// Only `user` and `chat` turns are replayed; advisor output is never fed
    /// back into another persona's history.
    pub fn to_completion_role(&self) -> Option<CompletionTurn> {
        let role = match self.persona {
            Persona::User => CompletionRole::User,
            Persona::Chat => CompletionRole::Assistant,
            Persona::Grammar | Persona::Vocab | Persona::Politeness | Persona::Context => {
                return None;
            }
        };
        Some(CompletionTurn {
            role,
            content: self.content.clone(),
        })
    }
}

fn persona_for_role(role: &str) -> Result<Persona, MessageError> {
    match role {
        "assistant" => Ok(Persona::Chat),
        other => Persona::from_str(other).map_err(|_| MessageError::UnknownRole(other.to_string())),
    }
}
