//! Team message handlers
//!
//! Every handler resolves the team by its join token, applies the game rule
//! and answers with the team's refreshed view. Rule violations come back as
//! `ServerMessage::Error` with the error's wire code.

use crate::error::GameResult;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::ws::host::broadcast_teams_to_host;
use std::sync::Arc;

/// Turn a handler result into the reply, logging rejected requests
fn reply(action: &str, result: GameResult<ServerMessage>) -> Option<ServerMessage> {
    match result {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::warn!("Rejected {}: {} ({})", action, e, e.code());
            Some(e.into())
        }
    }
}

pub async fn handle_register_team(
    state: &Arc<AppState>,
    pseudonym: Option<String>,
) -> Option<ServerMessage> {
    let result = state.register_team(pseudonym).await.map(|session| {
        ServerMessage::TeamRegistered {
            team_id: session.id,
            team_token: session.token,
            pseudonym: session.pseudonym,
        }
    });
    if result.is_ok() {
        broadcast_teams_to_host(state).await;
    }
    reply("registration", result)
}

pub async fn handle_start_hunt(state: &Arc<AppState>, token: String) -> Option<ServerMessage> {
    let result = state
        .start_hunt(&token)
        .await
        .map(|session| ServerMessage::TeamState {
            team: state.team_view(&session),
        });
    reply("start", result)
}

pub async fn handle_get_team_state(state: &Arc<AppState>, token: String) -> Option<ServerMessage> {
    let result = state
        .get_session_by_token(&token)
        .await
        .map(|session| ServerMessage::TeamState {
            team: state.team_view(&session),
        });
    reply("state request", result)
}

pub async fn handle_submit_answer(
    state: &Arc<AppState>,
    token: String,
    text: String,
) -> Option<ServerMessage> {
    tracing::debug!(
        "Answer submitted: {}",
        text.chars().take(50).collect::<String>()
    );
    let result = state
        .submit_answer(&token, &text)
        .await
        .map(|outcome| ServerMessage::AnswerResult {
            correct: outcome.correct,
            advanced: outcome.advanced,
            revealed_answer: outcome.revealed_answer,
            penalty_ms: outcome.penalty_ms,
            team: state.team_view(&outcome.session),
        });
    reply("answer", result)
}

pub async fn handle_continue(state: &Arc<AppState>, token: String) -> Option<ServerMessage> {
    let result = state
        .continue_hunt(&token)
        .await
        .map(|session| ServerMessage::TeamState {
            team: state.team_view(&session),
        });
    reply("continue", result)
}

pub async fn handle_request_hint(
    state: &Arc<AppState>,
    token: String,
    index: usize,
) -> Option<ServerMessage> {
    let result = state
        .reveal_hint(&token, index)
        .await
        .map(|hint| ServerMessage::HintRevealed {
            kind: hint.kind,
            index: hint.index,
            text: hint.text,
            charged: hint.charged,
            team: state.team_view(&hint.session),
        });
    reply("hint request", result)
}

pub async fn handle_give_up(state: &Arc<AppState>, token: String) -> Option<ServerMessage> {
    let result = state
        .give_up(&token)
        .await
        .map(|outcome| ServerMessage::GaveUp {
            revealed_answer: outcome.revealed_answer,
            team: state.team_view(&outcome.session),
        });
    reply("give up", result)
}
