//! Assistant chat endpoint.
//!
//! The newest user turn decides the path: a GitHub link routes to the insight
//! pipeline, anything else goes to the oracle with an intent-tuned system
//! prompt. The reply body is plain text. Persistence is best-effort: after a
//! successful reply the turn is written to the session store in a background
//! task, and a storage failure never fails the response.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use gitfriend_core::models::{ChatSession, Message, NewSession};
use gitfriend_core::store::{self, StoreError};
use gitfriend_core::{insight, parse_github_link, OracleMessage};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::http::HttpState;

/// Base system prompt: a terse Git/GitHub expert that leads with commands.
const SYSTEM_PROMPT: &str = "You are a concise Git and GitHub expert. Always prioritize showing commands over lengthy explanations.

If someone greets you, simply respond: \"Hi! How can I help with Git/GitHub today?\"

For non-Git/GitHub questions, respond: \"I only help with Git/GitHub questions. Please ask about version control or GitHub.\"

For Git/GitHub questions:
1. Show relevant commands first in code blocks
2. Keep explanations under 2-3 sentences
3. Only explain if the command needs clarification
4. No general resources or links unless specifically requested
5. Do not include any meta-commentary or thought process in your responses
6. Never use <think> tags or similar markup in your responses";

/// What the newest user message is asking for. Detection is a keyword scan;
/// anything unrecognized is `General` and gets the base prompt unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    ErrorHelp,
    Commands,
    CreateRepo,
    Trending,
    General,
}

/// Classify the newest user message. Error markers win over everything else
/// so a failing command pasted together with other keywords still gets
/// troubleshooting treatment.
pub fn detect_intent(text: &str) -> ChatIntent {
    let lower = text.to_lowercase();

    if lower.contains("error")
        || lower.contains("fatal:")
        || lower.contains("rejected")
        || lower.contains("conflict")
    {
        ChatIntent::ErrorHelp
    } else if lower.contains("cheat sheet") || lower.contains("command") {
        ChatIntent::Commands
    } else if lower.contains("create") && lower.contains("repo") {
        ChatIntent::CreateRepo
    } else if lower.contains("trending") {
        ChatIntent::Trending
    } else {
        ChatIntent::General
    }
}

/// The system prompt for one intent: the base persona, plus one extra
/// instruction line for every intent except `General`.
pub fn system_prompt(intent: ChatIntent) -> String {
    let extra = match intent {
        ChatIntent::ErrorHelp => {
            "The user is troubleshooting a failing Git operation. Ask for the exact command and error output if it is missing, otherwise lead with the fix."
        }
        ChatIntent::Commands => {
            "The user wants a command reference. Reply with a compact list of the relevant commands in a single code block."
        }
        ChatIntent::CreateRepo => {
            "The user wants to create a repository. Walk through the full sequence from git init to the first push to GitHub."
        }
        ChatIntent::Trending => {
            "The user is asking about trending repositories. Mention that live rankings come from the trending view and keep the Git advice generic."
        }
        ChatIntent::General => return SYSTEM_PROMPT.to_string(),
    };

    format!("{SYSTEM_PROMPT}\n\n{extra}")
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub chat_id: Option<Uuid>,
    pub user_id: Option<String>,
}

/// Inner chat — returns (status_code, plain_text_body).
pub async fn chat_inner(state: &HttpState, req: ChatRequest) -> (StatusCode, String) {
    let newest = match req.messages.last() {
        Some(m) => m,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                "messages must be a non-empty list".to_string(),
            );
        }
    };

    let reply = if let Some(link) = parse_github_link(&newest.content) {
        match insight::analyze_link(&state.github, &state.oracle, &link).await {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                return (
                    StatusCode::NOT_FOUND,
                    "That GitHub profile or repository does not exist.".to_string(),
                );
            }
            Err(e) => {
                tracing::error!(url = %link.url, error = %e, "Insight pipeline failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing your request".to_string(),
                );
            }
        }
    } else {
        let intent = detect_intent(&newest.content);
        let mut turns = vec![OracleMessage::system(system_prompt(intent))];
        turns.extend(req.messages.iter().map(OracleMessage::from));

        match state.oracle.complete(&turns).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Chat completion failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing your request".to_string(),
                );
            }
        }
    };

    let pool = state.pool.clone();
    let chat_id = req.chat_id;
    let user_id = req.user_id;
    let transcript = req.messages;
    let assistant_turn = Message::assistant(reply.clone());

    tokio::spawn(async move {
        match persist_turn(&pool, chat_id, user_id, transcript, assistant_turn).await {
            Ok(session) => {
                tracing::debug!(session_id = %session.id, "Chat turn persisted");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist chat turn");
            }
        }
    });

    (StatusCode::OK, reply)
}

/// Write one completed exchange to the store: append the assistant turn to an
/// existing session, or create a new session from the whole transcript when
/// no `chat_id` was supplied.
pub async fn persist_turn(
    pool: &PgPool,
    chat_id: Option<Uuid>,
    user_id: Option<String>,
    mut transcript: Vec<Message>,
    reply: Message,
) -> Result<ChatSession, StoreError> {
    match chat_id {
        Some(id) => store::append_message(pool, id, reply).await,
        None => {
            transcript.push(reply);
            store::create_session(
                pool,
                NewSession {
                    user_id,
                    title: None,
                    messages: transcript,
                },
            )
            .await
        }
    }
}

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    chat_inner(&state, req).await
}

// ============================================================================
// Unit Tests
// ============================================================================
