use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Default OpenAI model used for every persona request
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Marker a persona prompt returns when it has nothing to say
pub const DEFAULT_NO_REPLY_MARKER: &str = "__NO_REPLY__";

/// Secret Manager resource holding the OpenAI API key
pub const DEFAULT_SECRET_RESOURCE: &str =
    "projects/473139429425/secrets/openai-api/versions/latest";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Completion API settings shared by all personas.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    pub model: String,
    pub base_url: String,
    pub no_reply_marker: String,
    /// Number of user/chat turns forwarded to conversational personas
    pub history_window: usize,
    /// Timeout applied to every outbound HTTP call
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            no_reply_marker: DEFAULT_NO_REPLY_MARKER.to_string(),
            history_window: 10,
            request_timeout_secs: 60,
        }
    }
}

/// Which optional request fields are mandatory.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RequestConfig {
    pub require_student_language: bool,
    pub require_last_user_message_id: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsConfig {
    /// "gcp" (Secret Manager) or "static" (`api_key` below)
    pub backend: String,
    pub resource_name: String,
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: "gcp".to_string(),
            resource_name: DEFAULT_SECRET_RESOURCE.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptsConfig {
    /// "firestore" or "file"
    pub backend: String,
    pub firestore_project_id: Option<String>,
    pub firestore_database: String,
    /// YAML prompt catalogue for the "file" backend
    pub file_path: Option<String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            backend: "firestore".to_string(),
            firestore_project_id: None,
            firestore_database: "(default)".to_string(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcpConfig {
    pub metadata_url: String,
    /// Static bearer token; when unset the metadata server is asked
    #[serde(skip_serializing)]
    pub access_token: Option<SecretString>,
    pub secret_manager_url: String,
    pub firestore_url: String,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            metadata_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".to_string(),
            access_token: None,
            secret_manager_url: "https://secretmanager.googleapis.com/v1".to_string(),
            firestore_url: "https://firestore.googleapis.com/v1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // Override with environment variables using `LINGUA__` prefix and `__` separator
            // e.g., LINGUA__AI__MODEL="gpt-4o-mini"
            .add_source(
                config::Environment::with_prefix("LINGUA")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets are skipped via #[serde(skip_serializing)]
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
