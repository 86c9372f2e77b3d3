use super::MockOpenAi;
use async_trait::async_trait;
use linguafranca::services::prompts::StaticPromptStore;
use linguafranca::services::secrets::{SecretError, SecretStore};
use linguafranca::{AppState, Config, create_router};
use reqwest::Client;
use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;

/// Secret store that counts lookups and can be told to fail.
pub struct CountingSecretStore {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingSecretStore {
    pub fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingSecretStore {
    async fn api_key(&self) -> Result<SecretString, SecretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SecretError::Request("permission denied".to_string()));
        }
        Ok(SecretString::from("sk-test".to_string()))
    }
}

/// One prompt per advisor persona, each replying normally.
pub fn default_prompts() -> StaticPromptStore {
    StaticPromptStore::new()
        .with_prompt("chat", 1, "chat v1")
        .with_prompt("chat", 2, "chat v2")
        .with_prompt("grammar", 1, "grammar v1")
        .with_prompt("vocab", 1, "vocab v1")
        .with_prompt("politeness", 1, "politeness v1")
        .with_prompt("context", 1, "context v1")
}

/// Knobs for a test server
pub struct TestAppOptions {
    pub prompts: StaticPromptStore,
    pub secret_fails: bool,
    pub configure: fn(&mut Config),
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            prompts: default_prompts(),
            secret_fails: false,
            configure: |_| {},
        }
    }
}

/// HTTP test application wrapper
///
/// Runs the real router on a random port, backed by in-memory prompt and
/// secret stores and a mock completion API.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// HTTP client for making requests
    pub client: Client,
    pub openai: MockOpenAi,
    pub secrets: Arc<CountingSecretStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestAppOptions::default()).await
    }

    pub async fn with_options(options: TestAppOptions) -> Self {
        let openai = MockOpenAi::start().await;

        let mut config = Config::default();
        config.ai.base_url = openai.address.clone();
        config.ai.model = "gpt-test".to_string();
        (options.configure)(&mut config);

        let secrets = Arc::new(CountingSecretStore::new(options.secret_fails));
        let state = AppState::new(
            config,
            Client::new(),
            secrets.clone(),
            Arc::new(options.prompts),
        );
        let app = create_router(state);

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            openai,
            secrets,
        }
    }

    /// Get the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// POST a raw body to the proxy endpoint
    pub async fn post_raw(&self, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }
}
