//! Errors surfaced to clients by the game state

/// Result type for game state operations
pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    /// Unknown team token or id, stage or sub-step
    #[error("{0}")]
    NotFound(String),

    /// The request breaks a game rule (skipped hint, second bonus attempt, ...)
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many answers, slow down")]
    RateLimited,
}

impl GameError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Stable code sent in `ServerMessage::Error`
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
        }
    }
}
