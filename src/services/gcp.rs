//! Google Cloud bearer tokens for the REST clients.

use crate::config::GcpConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to obtain GCP access token: {0}")]
pub struct TokenError(pub String);

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Where access tokens come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A token supplied through configuration (local development).
    Static(SecretString),
    /// The instance metadata server of the hosting environment.
    Metadata { http: reqwest::Client, url: String },
}

impl TokenSource {
    pub fn from_config(config: &GcpConfig, http: reqwest::Client) -> Self {
        match &config.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata {
                http,
                url: config.metadata_url.clone(),
            },
        }
    }

    /// Fetch a bearer token. Metadata tokens are not cached.
    pub async fn token(&self) -> Result<SecretString, TokenError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata { http, url } => {
                let response = http
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| TokenError(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(TokenError(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }
                let body: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| TokenError(e.to_string()))?;
                Ok(SecretString::from(body.access_token))
            }
        }
    }
}

/// Attach a bearer token to an outgoing request.
pub(crate) fn authorize(
    request: reqwest::RequestBuilder,
    token: &SecretString,
) -> reqwest::RequestBuilder {
    request.bearer_auth(token.expose_secret())
}
