//! Host-only command handlers
//!
//! All handlers in this module require the Host role.
//! Authorization is checked in the main dispatch layer before calling these.

use crate::protocol::{HostTeamInfo, ServerMessage};
use crate::state::AppState;
use crate::types::TeamId;
use std::sync::Arc;

/// Every team with its join token, in registration order
pub async fn host_team_list(state: &AppState) -> Vec<HostTeamInfo> {
    let now = chrono::Utc::now();
    state
        .all_sessions()
        .await
        .iter()
        .map(|session| HostTeamInfo::new(session, now))
        .collect()
}

/// Broadcast the current team list to hosts
pub async fn broadcast_teams_to_host(state: &AppState) {
    let teams = host_team_list(state).await;
    state.broadcast_to_host(ServerMessage::HostTeams { teams });
}

pub async fn handle_list_teams(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::HostTeams {
        teams: host_team_list(state).await,
    })
}

pub async fn handle_remove_team(state: &Arc<AppState>, team_id: TeamId) -> Option<ServerMessage> {
    tracing::info!("Host removing team {}", team_id);
    match state.remove_team(&team_id).await {
        Ok(session) => {
            state.broadcast_to_all(ServerMessage::TeamRemoved {
                team_id: session.id,
            });
            broadcast_teams_to_host(state).await;
            handle_list_teams(state).await
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_reset_hunt(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("Host resetting the hunt");
    state.reset_hunt().await;
    state.broadcast_to_all(ServerMessage::HuntReset);
    broadcast_teams_to_host(state).await;
    handle_list_teams(state).await
}
