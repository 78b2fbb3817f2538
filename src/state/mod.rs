pub mod export;
mod hunt;
mod score;
mod team;

pub use hunt::{AnswerOutcome, GiveUpOutcome, HintReveal};

use crate::abuse::RateLimiter;
use crate::catalog::Catalog;
use crate::config::RulesConfig;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Handle to one team's session. Every read-modify-write of a team's progress
/// happens while holding this lock, so concurrent submissions for the same
/// team are applied one after the other.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub rules: RulesConfig,
    pub sessions: Arc<RwLock<HashMap<TeamId, SessionHandle>>>,
    /// Join token -> team id
    pub tokens: Arc<RwLock<HashMap<TeamToken, TeamId>>>,
    /// Per-team limit on answer submissions (None = disabled)
    pub answer_limiter: Option<RateLimiter>,
    /// Broadcast channel for messages to every connected client
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// Broadcast channel for host-only messages
    pub host_broadcast: broadcast::Sender<ServerMessage>,
    /// Bumped on every change to any session
    revision: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(catalog: Catalog, rules: RulesConfig) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let (host_tx, _host_rx) = broadcast::channel(100);
        Self {
            catalog: Arc::new(catalog),
            rules,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
            answer_limiter: None,
            broadcast: tx,
            host_broadcast: host_tx,
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_answer_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.answer_limiter = limiter;
        self
    }

    /// Broadcast a message to all connected clients
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(msg);
    }

    /// Broadcast a message to connected hosts
    pub fn broadcast_to_host(&self, msg: ServerMessage) {
        let _ = self.host_broadcast.send(msg);
    }

    /// Current revision of the session set
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.revision.fetch_add(1, Ordering::Relaxed);
    }

    /// Resolve a join token to the team's session handle
    pub async fn session_handle(&self, token: &str) -> GameResult<SessionHandle> {
        let team_id = self
            .tokens
            .read()
            .await
            .get(token.trim())
            .cloned()
            .ok_or_else(|| GameError::not_found("Unknown team token"))?;

        self.sessions
            .read()
            .await
            .get(&team_id)
            .cloned()
            .ok_or_else(|| GameError::not_found("Team not found"))
    }

    /// Snapshot of every session
    pub async fn all_sessions(&self) -> Vec<Session> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            sessions.push(handle.lock().await.clone());
        }
        sessions.sort_by_key(|s| s.registered_at);
        sessions
    }
}

/// Milliseconds of a penalty duration
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
