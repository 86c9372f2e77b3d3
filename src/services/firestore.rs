//! Firestore-backed prompt store (REST `documents:runQuery`).
//!
//! Each persona/category is a collection; each document carries `content` and
//! `version`. Older documents were written with `version` as a string, so both
//! encodings are read and matched. Firestore orders strings after integers
//! and compares them letter by letter, so the "latest" lookup fetches the whole
//! collection and leaves picking the highest decoded version to the repository.

use crate::models::PromptDocument;
use crate::services::gcp::{TokenSource, authorize};
use crate::services::prompts::{PromptError, PromptStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct RunQueryResult {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl FirestoreDocument {
    fn into_prompt(self) -> PromptDocument {
        PromptDocument {
            content: self
                .fields
                .get("content")
                .and_then(|v| v.get("stringValue"))
                .and_then(Value::as_str)
                .map(str::to_string),
            version: self.fields.get("version").and_then(version_value),
        }
    }
}

/// Decode a Firestore typed value holding a version number.
fn version_value(value: &Value) -> Option<i64> {
    if let Some(v) = value.get("integerValue") {
        return v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_i64());
    }
    if let Some(v) = value.get("stringValue") {
        return v.as_str().and_then(|s| s.trim().parse().ok());
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
}

/// Build the structured query for one category.
///
/// No server-side ordering or limit: mixed integer/string versions do not sort
/// numerically in Firestore.
fn structured_query(category: &str, version: Option<i64>) -> Value {
    let mut query = json!({
        "from": [{"collectionId": category}],
    });

    if let Some(v) = version {
        let filter = |value: Value| {
            json!({
                "fieldFilter": {
                    "field": {"fieldPath": "version"},
                    "op": "EQUAL",
                    "value": value,
                }
            })
        };
        query["where"] = json!({
            "compositeFilter": {
                "op": "OR",
                "filters": [
                    filter(json!({"integerValue": v.to_string()})),
                    filter(json!({"stringValue": v.to_string()})),
                ],
            }
        });
    }

    json!({ "structuredQuery": query })
}

#[derive(Debug, Clone)]
pub struct FirestorePromptStore {
    http: reqwest::Client,
    documents_url: String,
    tokens: TokenSource,
}

impl FirestorePromptStore {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project_id: &str,
        database: &str,
        tokens: TokenSource,
    ) -> Self {
        Self {
            http,
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                base_url.trim_end_matches('/'),
                project_id,
                database
            ),
            tokens,
        }
    }
}

#[async_trait]
impl PromptStore for FirestorePromptStore {
    async fn documents(
        &self,
        category: &str,
        version: Option<i64>,
    ) -> Result<Vec<PromptDocument>, PromptError> {
        let token = self
            .tokens
            .token()
            .await
            .map_err(|e| PromptError::Store(e.to_string()))?;

        let request = self
            .http
            .post(format!("{}:runQuery", self.documents_url))
            .json(&structured_query(category, version));
        let response = authorize(request, &token)
            .send()
            .await
            .map_err(|e| PromptError::Store(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PromptError::Store(format!(
                "Firestore returned {} for '{}'",
                response.status(),
                category
            )));
        }

        let results: Vec<RunQueryResult> = response
            .json()
            .await
            .map_err(|e| PromptError::Store(e.to_string()))?;

        Ok(results
            .into_iter()
            .filter_map(|r| r.document)
            .map(FirestoreDocument::into_prompt)
            .collect())
    }
}
