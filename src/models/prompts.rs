use serde::{Deserialize, Serialize};

/// A versioned system prompt as stored for one persona/category.
///
/// Both fields are optional because the store is not schema-checked; the
/// repository decides what a usable document is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptDocument {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

impl PromptDocument {
    pub fn new(version: i64, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            version: Some(version),
        }
    }
}
