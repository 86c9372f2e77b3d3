//! Completion API credential retrieval.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::gcp::{TokenSource, authorize};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("no API key configured")]
    NotConfigured,

    #[error("secret store request failed: {0}")]
    Request(String),

    #[error("secret payload is malformed: {0}")]
    Payload(String),
}

/// Source of the completion API key. Asked once per proxied request.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn api_key(&self) -> std::result::Result<SecretString, SecretError>;
}

/// Key taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticSecretStore {
    key: Option<SecretString>,
}

impl StaticSecretStore {
    pub fn new(key: Option<SecretString>) -> Self {
        Self { key }
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn api_key(&self) -> std::result::Result<SecretString, SecretError> {
        self.key.clone().ok_or(SecretError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Google Secret Manager, `versions/{v}:access` over REST.
#[derive(Debug, Clone)]
pub struct SecretManagerStore {
    http: reqwest::Client,
    base_url: String,
    resource_name: String,
    tokens: TokenSource,
}

impl SecretManagerStore {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        resource_name: &str,
        tokens: TokenSource,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            resource_name: resource_name.to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl SecretStore for SecretManagerStore {
    async fn api_key(&self) -> std::result::Result<SecretString, SecretError> {
        let token = self
            .tokens
            .token()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;

        let url = format!("{}/{}:access", self.base_url, self.resource_name);
        let response = authorize(self.http.get(url), &token)
            .send()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SecretError::Request(format!(
                "Secret Manager returned {}",
                response.status()
            )));
        }

        let body: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| SecretError::Payload(e.to_string()))?;
        decode_payload(&body.payload.data)
    }
}

/// Secret Manager payloads are base64; keys are stored with a trailing newline.
fn decode_payload(data: &str) -> std::result::Result<SecretString, SecretError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| SecretError::Payload(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| SecretError::Payload(e.to_string()))?;
    Ok(SecretString::from(text.trim_end().to_string()))
}

/// Build the configured secret store.
pub fn from_config(
    config: &Config,
    http: reqwest::Client,
) -> Result<Arc<dyn SecretStore>> {
    match config.secrets.backend.as_str() {
        "static" => Ok(Arc::new(StaticSecretStore::new(
            config.secrets.api_key.clone(),
        ))),
        "gcp" => {
            let tokens = TokenSource::from_config(&config.gcp, http.clone());
            Ok(Arc::new(SecretManagerStore::new(
                http,
                &config.gcp.secret_manager_url,
                &config.secrets.resource_name,
                tokens,
            )))
        }
        other => Err(Error::InvalidConfig(format!(
            "unknown secrets backend '{}'",
            other
        ))),
    }
}
