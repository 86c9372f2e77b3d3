pub mod test_app;

pub use mock_openai::MockOpenAi;
pub use test_app::{CountingSecretStore, TestApp, TestAppOptions, default_prompts};
