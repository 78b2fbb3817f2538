use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque ID types for type safety
pub type TeamId = String;
pub type TeamToken = String;
pub type StageRank = u32;

/// The kind of a sub-step within a stage.
///
/// A regular stage walks through `Direction`, `Moving`, `Enigma`, `Bonus`
/// and `Key` (skipping the kinds it does not define). The last stage of a
/// pack only has `Final`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SubStepKind {
    Direction,
    Moving,
    Enigma,
    Bonus,
    Key,
    Final,
}

impl SubStepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direction => "direction",
            Self::Moving => "moving",
            Self::Enigma => "enigma",
            Self::Bonus => "bonus",
            Self::Key => "key",
            Self::Final => "final",
        }
    }

    /// Moving sub-steps only need an acknowledgement.
    pub fn requires_answer(self) -> bool {
        !matches!(self, Self::Moving)
    }

    /// Bonus questions take exactly one submission, right or wrong.
    pub fn single_attempt(self) -> bool {
        matches!(self, Self::Bonus)
    }

    /// Sub-steps whose attempts are counted and capped.
    pub fn retry_limited(self) -> bool {
        matches!(self, Self::Enigma | Self::Final)
    }

    pub fn can_give_up(self) -> bool {
        matches!(self, Self::Direction)
    }

    pub fn has_hints(self) -> bool {
        matches!(
            self,
            Self::Direction | Self::Enigma | Self::Key | Self::Final
        )
    }
}

impl fmt::Display for SubStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for one stage of one team
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StageProgress {
    /// Submissions on the enigma/final sub-step
    pub attempts: u32,
    pub bonus_attempted: bool,
    /// Number of hints unlocked per sub-step
    #[serde(default)]
    pub hints_revealed: BTreeMap<SubStepKind, usize>,
}

impl StageProgress {
    pub fn hints_for(&self, kind: SubStepKind) -> usize {
        self.hints_revealed.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    NotStarted,
    Playing,
    Finished,
}

/// A team's session: identity, position in the hunt and accumulated penalties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: TeamId,
    pub token: TeamToken,
    pub pseudonym: String,
    pub registered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stage_rank: StageRank,
    pub sub_step: SubStepKind,
    pub penalty_ms: u64,
    #[serde(default)]
    pub stages: BTreeMap<StageRank, StageProgress>,
}

impl Session {
    pub fn status(&self) -> TeamStatus {
        match (self.started_at, self.completed_at) {
            (_, Some(_)) => TeamStatus::Finished,
            (Some(_), None) => TeamStatus::Playing,
            (None, None) => TeamStatus::NotStarted,
        }
    }

    pub fn progress(&self, rank: StageRank) -> StageProgress {
        self.stages.get(&rank).cloned().unwrap_or_default()
    }

    pub fn progress_mut(&mut self, rank: StageRank) -> &mut StageProgress {
        self.stages.entry(rank).or_default()
    }

    /// Wall-clock time since the start, frozen once the hunt is completed
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let end = self.completed_at.unwrap_or(now);
        u64::try_from((end - started_at).num_milliseconds()).unwrap_or(0)
    }

    /// Elapsed time plus penalties. There is no bonus-time reduction.
    pub fn total_ms(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed_ms(now).saturating_add(self.penalty_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Team,
    Spectator,
}

/// One leaderboard line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub team_id: TeamId,
    pub pseudonym: String,
    pub status: TeamStatus,
    pub stage_rank: StageRank,
    pub elapsed_ms: u64,
    pub penalty_ms: u64,
    pub total_ms: u64,
    pub completed_at: Option<DateTime<Utc>>,
}
