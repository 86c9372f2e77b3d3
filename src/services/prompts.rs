//! Versioned system prompts.
//!
//! Stores only answer raw queries; `PromptRepository` applies the selection
//! rules so every backend behaves the same:
//! - no version: the document with the highest `version`
//! - explicit version: exactly one document with that version

use crate::models::PromptDocument;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no prompt for '{category}' (version {version:?})")]
    NotFound {
        category: String,
        version: Option<i64>,
    },

    #[error("{count} prompts for '{category}' share version {version}")]
    Ambiguous {
        category: String,
        version: i64,
        count: usize,
    },

    #[error("prompt for '{category}' (version {version:?}) has no content")]
    FieldMissing {
        category: String,
        version: Option<i64>,
    },

    #[error("prompt store error: {0}")]
    Store(String),
}

/// Read-only access to prompt documents.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Documents under `category`, filtered to `version` when given.
    ///
    /// For `version = None` a store may return only the newest document.
    async fn documents(
        &self,
        category: &str,
        version: Option<i64>,
    ) -> Result<Vec<PromptDocument>, PromptError>;
}

/// Prompt lookup by persona/category.
#[derive(Clone)]
pub struct PromptRepository {
    store: Arc<dyn PromptStore>,
}

impl PromptRepository {
    pub fn new(store: Arc<dyn PromptStore>) -> Self {
        Self { store }
    }

    pub async fn get_prompt(
        &self,
        category: &str,
        version: Option<i64>,
    ) -> Result<String, PromptError> {
        let documents = self.store.documents(category, version).await?;
        let document = select(category, version, documents)?;

        document.content.ok_or_else(|| PromptError::FieldMissing {
            category: category.to_string(),
            version,
        })
    }
}

fn select(
    category: &str,
    version: Option<i64>,
    documents: Vec<PromptDocument>,
) -> Result<PromptDocument, PromptError> {
    let not_found = || PromptError::NotFound {
        category: category.to_string(),
        version,
    };

    match version {
        None => documents
            .into_iter()
            .max_by_key(|doc| doc.version.unwrap_or(i64::MIN))
            .ok_or_else(not_found),
        Some(wanted) => {
            let mut matching: Vec<PromptDocument> = documents
                .into_iter()
                .filter(|doc| doc.version == Some(wanted))
                .collect();
            match matching.len() {
                0 => Err(not_found()),
                1 => Ok(matching.remove(0)),
                count => Err(PromptError::Ambiguous {
                    category: category.to_string(),
                    version: wanted,
                    count,
                }),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PromptFileEntry {
    version: i64,
    content: String,
}

/// In-memory prompt catalogue.
///
/// The YAML file form maps each category to its versions:
///
/// ```yaml
/// chat:
///   - version: 1
///     content: "You are a friendly conversation partner."
/// grammar:
///   - version: 2
///     content: "Point out grammar mistakes, or reply __NO_REPLY__."
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticPromptStore {
    prompts: HashMap<String, Vec<PromptDocument>>,
}

impl StaticPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, category: &str, version: i64, content: &str) -> Self {
        self.insert(category, PromptDocument::new(version, content));
        self
    }

    pub fn insert(&mut self, category: &str, document: PromptDocument) {
        self.prompts
            .entry(category.to_string())
            .or_default()
            .push(document);
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PromptError> {
        let parsed: HashMap<String, Vec<PromptFileEntry>> =
            serde_yaml::from_str(yaml).map_err(|e| PromptError::Store(e.to_string()))?;

        let mut store = Self::new();
        for (category, entries) in parsed {
            for entry in entries {
                store.insert(&category, PromptDocument::new(entry.version, entry.content));
            }
        }
        Ok(store)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| PromptError::Store(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_yaml(&yaml)?;
        tracing::info!(
            path = %path.display(),
            categories = store.prompts.len(),
            "Loaded prompt catalogue"
        );
        Ok(store)
    }
}

#[async_trait]
impl PromptStore for StaticPromptStore {
    async fn documents(
        &self,
        category: &str,
        version: Option<i64>,
    ) -> Result<Vec<PromptDocument>, PromptError> {
        let documents = self.prompts.get(category).cloned().unwrap_or_default();
        Ok(match version {
            None => documents,
            Some(v) => documents
                .into_iter()
                .filter(|doc| doc.version == Some(v))
                .collect(),
        })
    }
}
