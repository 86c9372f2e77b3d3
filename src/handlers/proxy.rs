//! The language-learning proxy endpoint.

use crate::error::{Error, Result};
use crate::models::{ProxyRequest, ProxyResponse};
use crate::providers::CompletionClient;
use crate::services::conversation::build_persona_requests;
use crate::services::fanout::{Dispatcher, drop_no_reply};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

/// CORS preflight. Headers are attached by the router layers.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Ask every advisor persona about the conversation and return their replies.
///
/// # Request
/// ```json
/// {"messages": [{"persona": "user", "content": "Hello"}]}
/// ```
///
/// # Response
/// ```json
/// {"responses": [{"persona": "chat", "content": "Hi! How are you?"}]}
/// ```
///
/// Personas that fail or answer with the no-reply marker are omitted.
pub async fn proxy(State(state): State<AppState>, body: Bytes) -> Result<Json<ProxyResponse>> {
    let request = ProxyRequest::parse(&body, &state.config.request)?;

    let requests = build_persona_requests(
        &request.messages,
        state.config.ai.history_window,
        request.last_user_message_id.as_deref(),
    )?;

    for (persona, messages) in &requests {
        tracing::debug!(
            persona = %persona,
            messages = ?messages.iter().map(|m| m.content()).collect::<Vec<_>>(),
            "Persona request"
        );
    }

    let api_key = state
        .secrets
        .api_key()
        .await
        .map_err(|e| Error::UpstreamCredential(e.to_string()))?;

    let completion = CompletionClient::new(state.http.clone(), &state.config.ai.base_url, api_key);
    let dispatcher = Dispatcher {
        prompts: &state.prompts,
        completion: &completion,
        model: &state.config.ai.model,
        student_language: request.student_language.as_deref(),
    };
    let responses = dispatcher.dispatch(&requests).await;
    let responses = drop_no_reply(responses, &state.config.ai.no_reply_marker);

    tracing::info!(
        requested = requests.len(),
        answered = responses.len(),
        "Proxy request completed"
    );
    tracing::debug!(responses = ?responses, "Proxy response");

    Ok(Json(ProxyResponse { responses }))
}
