use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::models::messages::{Message, MessageError, WireMessage};
use serde::{Deserialize, Serialize};

/// HTTP API request body for the proxy endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyRequest {
    pub messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub student_language: Option<String>,
    #[serde(default)]
    pub last_user_message_id: Option<String>,
}

/// HTTP API response body: one entry per persona that had something to say
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub responses: Vec<Message>,
}

/// A converted message plus the optional client-side id it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: Option<String>,
    pub message: Message,
}

/// Request after decoding, field checks and message conversion.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub messages: Vec<IncomingMessage>,
    pub student_language: Option<String>,
    pub last_user_message_id: Option<String>,
}

fn convert_message(raw: serde_json::Value) -> std::result::Result<IncomingMessage, MessageError> {
    let wire = WireMessage::from_value(raw)?;
    let message = Message::from_wire(&wire)?;
    Ok(IncomingMessage {
        id: wire.id,
        message,
    })
}

fn missing(field: &str) -> Error {
    Error::Validation(format!("Failed to get \"{}\" from request JSON", field))
}

impl ProxyRequest {
    /// Decode and validate a raw request body.
    ///
    /// Fails closed: unknown top-level or message fields are rejected, and the
    /// error names the first missing required field.
    pub fn parse(body: &[u8], rules: &RequestConfig) -> Result<ValidatedRequest> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("Failed to parse request JSON: {}", e)))?;

        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("Request JSON must be an object".to_string()))?;
        if !object.contains_key("messages") {
            return Err(missing("messages"));
        }

        let request: ProxyRequest = serde_json::from_value(value)
            .map_err(|e| Error::Validation(format!("Invalid request JSON: {}", e)))?;

        if rules.require_student_language && request.student_language.is_none() {
            return Err(missing("student_language"));
        }
        if rules.require_last_user_message_id && request.last_user_message_id.is_none() {
            return Err(missing("last_user_message_id"));
        }

        let messages = request
            .messages
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                convert_message(raw).map_err(|e| {
                    Error::Validation(format!("Failed to parse messages: message {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if messages.is_empty() {
            return Err(Error::Validation("\"messages\" must not be empty".to_string()));
        }

        Ok(ValidatedRequest {
            messages,
            student_language: request.student_language,
            last_user_message_id: request.last_user_message_id,
        })
    }
}
