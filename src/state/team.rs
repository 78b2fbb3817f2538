use super::AppState;
use crate::error::{GameError, GameResult};
use crate::progression::Position;
use crate::types::*;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Safe character set for join codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

pub const MAX_PSEUDONYM_CHARS: usize = 40;

/// Generate a random short join code (5 characters)
fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn generate_pseudonym() -> String {
    petname::petname(2, " ").unwrap_or_else(|| format!("Team {}", generate_short_code()))
}

impl AppState {
    /// Register a team under a pseudonym. An empty pseudonym gets a generated one.
    pub async fn register_team(&self, pseudonym: Option<String>) -> GameResult<Session> {
        let pseudonym = pseudonym
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(generate_pseudonym);

        if pseudonym.chars().count() > MAX_PSEUDONYM_CHARS {
            return Err(GameError::forbidden(format!(
                "Pseudonym is longer than {MAX_PSEUDONYM_CHARS} characters"
            )));
        }

        // Hold the token index for the whole registration so two teams cannot
        // claim the same pseudonym or code concurrently
        let mut tokens = self.tokens.write().await;

        let wanted = pseudonym.to_lowercase();
        for existing in self.all_sessions().await {
            if existing.pseudonym.to_lowercase() == wanted {
                return Err(GameError::Conflict(format!(
                    "Pseudonym {pseudonym:?} is already taken"
                )));
            }
        }

        let token = loop {
            let code = generate_short_code();
            if !tokens.contains_key(&code) {
                break code;
            }
        };

        let (stage_rank, sub_step) = match self.catalog.start_position() {
            Position::At { rank, kind } => (rank, kind),
            // A validated catalog always has a final stage
            Position::Finished => (self.catalog.final_stage().rank, SubStepKind::Final),
        };

        let session = Session {
            id: ulid::Ulid::new().to_string(),
            token: token.clone(),
            pseudonym,
            registered_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            stage_rank,
            sub_step,
            penalty_ms: 0,
            stages: Default::default(),
        };

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), Arc::new(Mutex::new(session.clone())));
        tokens.insert(token, session.id.clone());
        drop(tokens);

        self.touch();
        tracing::info!("Registered team {:?} ({})", session.pseudonym, session.id);
        Ok(session)
    }

    /// Get a team's session by join token
    pub async fn get_session_by_token(&self, token: &str) -> GameResult<Session> {
        let handle = self.session_handle(token).await?;
        let session = handle.lock().await.clone();
        Ok(session)
    }

    /// Start the clock for a team. Starting twice is a no-op.
    pub async fn start_hunt(&self, token: &str) -> GameResult<Session> {
        let handle = self.session_handle(token).await?;
        let mut session = handle.lock().await;

        if session.started_at.is_none() {
            session.started_at = Some(chrono::Utc::now());
            self.touch();
            tracing::info!("Team {:?} started the hunt", session.pseudonym);
        }

        Ok(session.clone())
    }

    /// Remove a team from the hunt (host)
    pub async fn remove_team(&self, team_id: &TeamId) -> GameResult<Session> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(team_id)
            .ok_or_else(|| GameError::not_found("Team not found"))?;

        let session = handle.lock().await.clone();
        self.tokens.write().await.remove(&session.token);

        self.touch();
        tracing::info!("Removed team {:?} ({})", session.pseudonym, session.id);
        Ok(session)
    }

    /// Drop every team (host)
    pub async fn reset_hunt(&self) {
        self.sessions.write().await.clear();
        self.tokens.write().await.clear();
        self.touch();
        tracing::info!("Hunt reset, all teams removed");
    }
}
