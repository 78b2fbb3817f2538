//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::{host, team};

/// Macro to check host authorization and return early if unauthorized
macro_rules! check_host {
    ($role:expr, $action:expr) => {
        if *$role != Role::Host {
            tracing::warn!("{:?} client tried to {}", $role, $action);
            return Some(ServerMessage::error(
                "UNAUTHORIZED",
                format!("Only host can {}", $action),
            ));
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Team messages
        ClientMessage::RegisterTeam { pseudonym } => team::handle_register_team(state, pseudonym).await,

        ClientMessage::StartHunt { team_token } => team::handle_start_hunt(state, team_token).await,

        ClientMessage::GetTeamState { team_token } => {
            team::handle_get_team_state(state, team_token).await
        }

        ClientMessage::SubmitAnswer { team_token, text } => {
            team::handle_submit_answer(state, team_token, text).await
        }

        ClientMessage::Continue { team_token } => team::handle_continue(state, team_token).await,

        ClientMessage::RequestHint { team_token, index } => {
            team::handle_request_hint(state, team_token, index).await
        }

        ClientMessage::GiveUp { team_token } => team::handle_give_up(state, team_token).await,

        // Host-only commands (authorization checked before dispatch)
        ClientMessage::HostListTeams => {
            check_host!(role, "list teams");
            host::handle_list_teams(state).await
        }

        ClientMessage::HostRemoveTeam { team_id } => {
            check_host!(role, "remove teams");
            host::handle_remove_team(state, team_id).await
        }

        ClientMessage::HostResetHunt => {
            check_host!(role, "reset the hunt");
            host::handle_reset_hunt(state).await
        }
    }
}
