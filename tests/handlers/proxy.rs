//! Proxy endpoint tests
//!
//! Drives the full request path: parsing, credential lookup, persona slicing,
//! fan-out against a mock completion API and response filtering.

use crate::common::{TestApp, TestAppOptions, default_prompts};
use linguafranca::services::prompts::StaticPromptStore;
use reqwest::Method;
use serde_json::{Value, json};

fn assert_cors(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(headers["access-control-max-age"], "3600");
}

fn content_of<'a>(body: &'a Value, persona: &str) -> Option<&'a str> {
    body["responses"]
        .as_array()?
        .iter()
        .find(|r| r["persona"] == persona)
        .and_then(|r| r["content"].as_str())
}

// ============================================================================
// Preflight
// ============================================================================

#[tokio::test]
async fn test_preflight_returns_204_without_dispatch() {
    let app = TestApp::new().await;

    let response = app
        .client
        .request(Method::OPTIONS, app.url("/"))
        .header("Origin", "https://example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_cors(&response);
    assert!(response.text().await.unwrap().is_empty());
    assert_eq!(app.secrets.calls(), 0);
    assert_eq!(app.openai.calls(), 0);
}

#[tokio::test]
async fn test_preflight_on_function_path() {
    let app = TestApp::new().await;

    let response = app
        .client
        .request(Method::OPTIONS, app.url("/lingua_franca_openai_proxy"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_cors(&response);
}

// ============================================================================
// Successful dispatch
// ============================================================================

#[tokio::test]
async fn test_single_user_message_reaches_every_persona() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/"))
        .json(&json!({"messages": [{"persona": "user", "content": "Hello"}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_cors(&response);

    let body: Value = response.json().await.unwrap();
    let personas: Vec<&str> = body["responses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["persona"].as_str().unwrap())
        .collect();
    assert_eq!(personas, vec!["chat", "grammar", "vocab", "politeness", "context"]);

    // latest prompt version is used
    assert_eq!(content_of(&body, "chat"), Some("chat v2 | Hello"));
    assert_eq!(content_of(&body, "grammar"), Some("grammar v1 | Hello"));
    assert_eq!(app.secrets.calls(), 1);
    assert_eq!(app.openai.calls(), 5);
}

#[tokio::test]
async fn test_function_path_serves_proxy() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/lingua_franca_openai_proxy"))
        .json(&json!({"messages": [{"role": "user", "content": "Bonjour", "id": "m-1"}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(content_of(&body, "vocab"), Some("vocab v1 | Bonjour"));
}

#[tokio::test]
async fn test_failed_and_silent_personas_are_omitted() {
    // k = 5 personas, m = 2 fail (missing prompt, API error), s = 1 declines
    let prompts = StaticPromptStore::new()
        .with_prompt("chat", 1, "chat v1")
        .with_prompt("grammar", 1, "SILENT grammar")
        .with_prompt("vocab", 1, "FAIL vocab")
        .with_prompt("politeness", 1, "politeness v1");
    let app = TestApp::with_options(TestAppOptions {
        prompts,
        ..Default::default()
    })
    .await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"user","content":"Hi"}]}"#)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 5 - 2 - 1);
    assert!(content_of(&body, "chat").is_some());
    assert!(content_of(&body, "politeness").is_some());
    assert!(content_of(&body, "grammar").is_none());
    assert!(content_of(&body, "vocab").is_none());
    assert!(content_of(&body, "context").is_none());
}

#[tokio::test]
async fn test_all_personas_failing_still_returns_200() {
    let app = TestApp::with_options(TestAppOptions {
        prompts: StaticPromptStore::new(),
        ..Default::default()
    })
    .await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"user","content":"Hi"}]}"#)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"responses": []}));
    assert_eq!(app.openai.calls(), 0);
}

#[tokio::test]
async fn test_advisor_turns_are_not_replayed() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/"))
        .json(&json!({"messages": [
            {"persona": "user", "content": "I has a cat"},
            {"persona": "chat", "content": "Tell me about your cat!"},
            {"persona": "grammar", "content": "Use 'have', not 'has'."},
        ]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    // chat history stops at the last user/chat turn
    assert_eq!(
        content_of(&body, "chat"),
        Some("chat v2 | Tell me about your cat!")
    );
    // single-turn personas get the grammar note, which has no completion role
    assert_eq!(content_of(&body, "vocab"), Some("vocab v1 | <none>"));
}

#[tokio::test]
async fn test_last_user_message_id_selects_current_turn() {
    let app = TestApp::with_options(TestAppOptions {
        configure: |config| config.request.require_last_user_message_id = true,
        ..Default::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/"))
        .json(&json!({
            "messages": [
                {"role": "user", "content": "Where is the station?", "id": "u-1"},
                {"role": "assistant", "content": "Turn left.", "id": "a-1"},
            ],
            "last_user_message_id": "u-1"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        content_of(&body, "politeness"),
        Some("politeness v1 | Where is the station?")
    );
}

#[tokio::test]
async fn test_student_language_fills_prompt() {
    let prompts = default_prompts().with_prompt("chat", 3, "Answer in {{student_language}}");
    let app = TestApp::with_options(TestAppOptions {
        prompts,
        configure: |config| config.request.require_student_language = true,
        ..Default::default()
    })
    .await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"user","content":"Hi"}],"student_language":"Spanish"}"#)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(content_of(&body, "chat"), Some("Answer in Spanish | Hi"));
}

// ============================================================================
// Request-level failures
// ============================================================================

#[tokio::test]
async fn test_missing_messages_is_400_without_upstream_calls() {
    let app = TestApp::new().await;

    let response = app.post_raw(r#"{"student_language":"French"}"#).await;

    assert_eq!(response.status(), 400);
    assert_cors(&response);
    let text = response.text().await.unwrap();
    assert!(text.contains("messages"));
    assert_eq!(app.secrets.calls(), 0);
    assert_eq!(app.openai.calls(), 0);
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let app = TestApp::new().await;

    let response = app.post_raw("{\"messages\": [").await;

    assert_eq!(response.status(), 400);
    assert_cors(&response);
    let text = response.text().await.unwrap();
    assert!(text.starts_with("Failed to parse request JSON"));
}

#[tokio::test]
async fn test_invalid_persona_is_400() {
    let app = TestApp::new().await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"narrator","content":"Once upon a time"}]}"#)
        .await;

    assert_eq!(response.status(), 400);
    let text = response.text().await.unwrap();
    assert!(text.contains("narrator"));
    assert_eq!(app.secrets.calls(), 0);
}

#[tokio::test]
async fn test_missing_required_field_is_named() {
    let app = TestApp::with_options(TestAppOptions {
        configure: |config| config.request.require_student_language = true,
        ..Default::default()
    })
    .await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"user","content":"Hi"}]}"#)
        .await;

    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("student_language"));
}

#[tokio::test]
async fn test_unknown_message_id_is_400() {
    let app = TestApp::new().await;

    let response = app
        .post_raw(r#"{"messages":[{"role":"user","content":"Hi","id":"u-1"}],"last_user_message_id":"u-9"}"#)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(app.secrets.calls(), 0);
}

#[tokio::test]
async fn test_message_id_of_assistant_turn_is_400() {
    let app = TestApp::new().await;

    let response = app
        .post_raw(
            r#"{"messages":[{"role":"user","content":"Hi","id":"u-1"},{"role":"assistant","content":"Hello!","id":"a-1"}],"last_user_message_id":"a-1"}"#,
        )
        .await;

    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("not a user message"));
    assert_eq!(app.openai.calls(), 0);
}

#[tokio::test]
async fn test_secret_failure_is_500() {
    let app = TestApp::with_options(TestAppOptions {
        secret_fails: true,
        ..Default::default()
    })
    .await;

    let response = app
        .post_raw(r#"{"messages":[{"persona":"user","content":"Hello"}]}"#)
        .await;

    assert_eq!(response.status(), 500);
    assert_cors(&response);
    let text = response.text().await.unwrap();
    assert!(text.contains("Failed to get"));
    assert_eq!(app.openai.calls(), 0);
}

#[tokio::test]
async fn test_get_is_not_allowed_but_keeps_cors() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/")).send().await.unwrap();

    assert_eq!(response.status(), 405);
    assert_cors(&response);
}
