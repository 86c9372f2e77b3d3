use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::firestore::FirestorePromptStore;
use crate::services::gcp::TokenSource;
use crate::services::prompts::{PromptRepository, PromptStore, StaticPromptStore};
use crate::services::secrets::{self, SecretStore};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers
///
/// Holds no per-request data: the API key is fetched on every request and the
/// completion client is built from it there.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Shared outbound HTTP client (connection pool + timeout)
    pub http: reqwest::Client,
    /// Source of the completion API key
    pub secrets: Arc<dyn SecretStore>,
    /// Versioned system prompts
    pub prompts: PromptRepository,
}

impl AppState {
    /// Create a new AppState instance
    ///
    /// # Arguments
    /// * `config` - Loaded configuration
    /// * `http` - Outbound HTTP client
    /// * `secrets` - Secret store for the API key
    /// * `prompts` - Prompt store backing the repository
    pub fn new(
        config: Config,
        http: reqwest::Client,
        secrets: Arc<dyn SecretStore>,
        prompts: Arc<dyn PromptStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http,
            secrets,
            prompts: PromptRepository::new(prompts),
        }
    }

    /// Build the state with the backends named in the configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let http = build_http_client(&config)?;
        let secrets = secrets::from_config(&config, http.clone())?;
        let prompts = prompt_store_from_config(&config, http.clone())?;
        Ok(Self::new(config, http, secrets, prompts))
    }
}

pub fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.ai.request_timeout_secs))
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))
}

fn prompt_store_from_config(
    config: &Config,
    http: reqwest::Client,
) -> Result<Arc<dyn PromptStore>> {
    match config.prompts.backend.as_str() {
        "firestore" => {
            let project_id = config.prompts.firestore_project_id.as_deref().ok_or_else(|| {
                Error::InvalidConfig(
                    "prompts.firestore_project_id is required for the firestore backend"
                        .to_string(),
                )
            })?;
            let tokens = TokenSource::from_config(&config.gcp, http.clone());
            Ok(Arc::new(FirestorePromptStore::new(
                http,
                &config.gcp.firestore_url,
                project_id,
                &config.prompts.firestore_database,
                tokens,
            )))
        }
        "file" => {
            let path = config.prompts.file_path.as_deref().ok_or_else(|| {
                Error::InvalidConfig("prompts.file_path is required for the file backend".to_string())
            })?;
            let store = StaticPromptStore::from_file(path)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            Ok(Arc::new(store))
        }
        other => Err(Error::InvalidConfig(format!(
            "unknown prompts backend '{}'",
            other
        ))),
    }
}
