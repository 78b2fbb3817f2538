use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::ws::host::host_team_list;
use std::sync::Arc;
use std::time::Duration;

const LEADERBOARD_INTERVAL: Duration = Duration::from_secs(2);
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Push the leaderboard to every client, and the team list to hosts, whenever
/// a session changed since the last tick
pub fn spawn_leaderboard_broadcaster(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut last_revision = state.revision();

        loop {
            tokio::time::sleep(LEADERBOARD_INTERVAL).await;

            let revision = state.revision();
            if revision == last_revision {
                continue;
            }
            last_revision = revision;

            let entries = state.leaderboard().await;
            tracing::debug!("Broadcasting leaderboard ({} teams)", entries.len());
            state.broadcast_to_all(ServerMessage::Leaderboard { entries });
            state.broadcast_to_host(ServerMessage::HostTeams {
                teams: host_team_list(&state).await,
            });
        }
    });
}

/// Periodically forget stale rate limiter windows
pub fn spawn_rate_limit_cleanup(state: Arc<AppState>) {
    let Some(limiter) = state.answer_limiter.clone() else {
        return;
    };
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(RATE_LIMIT_CLEANUP_INTERVAL).await;
            limiter.cleanup().await;
            tracing::debug!(
                "Rate limiter cleanup done, {} teams tracked",
                limiter.tracked_keys().await
            );
        }
    });
}
