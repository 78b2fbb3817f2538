use crate::state::AppState;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};

/// Leaderboard order: finished teams by total time, then teams still playing
/// (furthest stage first, then total time), then teams that have not started.
fn rank_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    fn group(status: TeamStatus) -> u8 {
        match status {
            TeamStatus::Finished => 0,
            TeamStatus::Playing => 1,
            TeamStatus::NotStarted => 2,
        }
    }

    group(a.status)
        .cmp(&group(b.status))
        .then_with(|| match a.status {
            TeamStatus::Finished => a.total_ms.cmp(&b.total_ms),
            TeamStatus::Playing => {
                (Reverse(a.stage_rank), a.total_ms).cmp(&(Reverse(b.stage_rank), b.total_ms))
            }
            TeamStatus::NotStarted => Ordering::Equal,
        })
}

pub fn score_entry(session: &Session, now: DateTime<Utc>) -> ScoreEntry {
    ScoreEntry {
        team_id: session.id.clone(),
        pseudonym: session.pseudonym.clone(),
        status: session.status(),
        stage_rank: session.stage_rank,
        elapsed_ms: session.elapsed_ms(now),
        penalty_ms: session.penalty_ms,
        total_ms: session.total_ms(now),
        completed_at: session.completed_at,
    }
}

impl AppState {
    /// Current standings of every team
    pub async fn leaderboard(&self) -> Vec<ScoreEntry> {
        let now = chrono::Utc::now();
        let mut entries: Vec<ScoreEntry> = self
            .all_sessions()
            .await
            .iter()
            .map(|session| score_entry(session, now))
            .collect();

        // Stable sort: ties stay in registration order
        entries.sort_by(rank_order);
        entries
    }
}
