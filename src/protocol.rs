use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register a new team; an empty pseudonym gets a generated one
    RegisterTeam {
        #[serde(default)]
        pseudonym: Option<String>,
    },
    StartHunt {
        team_token: String,
    },
    /// Fetch the team's current view (used on reconnect)
    GetTeamState {
        team_token: String,
    },
    SubmitAnswer {
        team_token: String,
        text: String,
    },
    /// Acknowledge a step that needs no answer
    Continue {
        team_token: String,
    },
    RequestHint {
        team_token: String,
        index: usize,
    },
    GiveUp {
        team_token: String,
    },
    // Host-only messages
    HostListTeams,
    HostRemoveTeam {
        team_id: TeamId,
    },
    HostResetHunt,
}

impl ClientMessage {
    pub fn is_host_only(&self) -> bool {
        matches!(
            self,
            Self::HostListTeams | Self::HostRemoveTeam { .. } | Self::HostResetHunt
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        pack: PackInfo,
        server_now: String,
    },
    /// Sent to the registering client only; the token is the team's secret
    TeamRegistered {
        team_id: TeamId,
        team_token: TeamToken,
        pseudonym: String,
    },
    TeamState {
        team: TeamView,
    },
    AnswerResult {
        correct: bool,
        advanced: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        revealed_answer: Option<String>,
        penalty_ms: u64,
        team: TeamView,
    },
    HintRevealed {
        #[serde(rename = "type")]
        kind: SubStepKind,
        index: usize,
        text: String,
        charged: bool,
        team: TeamView,
    },
    GaveUp {
        #[serde(skip_serializing_if = "Option::is_none")]
        revealed_answer: Option<String>,
        team: TeamView,
    },
    Leaderboard {
        entries: Vec<ScoreEntry>,
    },
    /// Full team list with join tokens (host only)
    HostTeams {
        teams: Vec<HostTeamInfo>,
    },
    /// Broadcast when the host wipes every team
    HuntReset,
    /// Broadcast when the host removes a team
    TeamRemoved {
        team_id: TeamId,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

impl From<crate::error::GameError> for ServerMessage {
    fn from(err: crate::error::GameError) -> Self {
        Self::error(err.code(), err.to_string())
    }
}

/// Public description of the loaded pack. Answers never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackInfo {
    pub name: String,
    pub title: String,
    pub total_stages: StageRank,
    pub stages: Vec<String>,
}

impl From<&crate::catalog::Catalog> for PackInfo {
    fn from(catalog: &crate::catalog::Catalog) -> Self {
        Self {
            name: catalog.name().to_string(),
            title: catalog.title().to_string(),
            total_stages: catalog.total_stages(),
            stages: catalog.stages().iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// What a team's screen shows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamView {
    pub team_id: TeamId,
    pub pseudonym: String,
    pub status: TeamStatus,
    pub stage_rank: StageRank,
    pub stage_name: Option<String>,
    pub total_stages: StageRank,
    /// Current sub-step, present while the team is playing
    pub step: Option<StepView>,
    pub penalty_ms: u64,
    pub elapsed_ms: u64,
    pub total_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepView {
    #[serde(rename = "type")]
    pub kind: SubStepKind,
    pub text: String,
    pub hint_count: usize,
    pub revealed_hints: Vec<String>,
    pub requires_answer: bool,
    pub single_attempt: bool,
    pub can_give_up: bool,
    pub attempts_used: u32,
    /// None when attempts are unlimited
    pub attempts_left: Option<u32>,
}

/// Team info sent to the host (includes the join token)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostTeamInfo {
    pub id: TeamId,
    pub token: TeamToken,
    pub pseudonym: String,
    pub status: TeamStatus,
    pub stage_rank: StageRank,
    pub sub_step: SubStepKind,
    pub penalty_ms: u64,
    pub total_ms: u64,
}

impl HostTeamInfo {
    pub fn new(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id.clone(),
            token: session.token.clone(),
            pseudonym: session.pseudonym.clone(),
            status: session.status(),
            stage_rank: session.stage_rank,
            sub_step: session.sub_step,
            penalty_ms: session.penalty_ms,
            total_ms: session.total_ms(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"submit_answer","team_token":"ABCDE","text":"Nord"}"#)
                .unwrap();
        assert!(matches!(msg, ClientMessage::SubmitAnswer { ref text, .. } if text == "Nord"));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"register_team"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RegisterTeam { pseudonym: None }));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"continue","team_token":"X"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Continue { .. }));
        assert!(!msg.is_host_only());

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"host_reset_hunt"}"#).unwrap();
        assert!(msg.is_host_only());
    }

    #[test]
    fn test_server_error_shape() {
        let msg: ServerMessage = crate::error::GameError::RateLimited.into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "RATE_LIMITED");
    }

    #[test]
    fn test_revealed_answer_omitted_when_absent() {
        let msg = ServerMessage::GaveUp {
            revealed_answer: None,
            team: TeamView {
                team_id: "t".to_string(),
                pseudonym: "p".to_string(),
                status: TeamStatus::Playing,
                stage_rank: 1,
                stage_name: None,
                total_stages: 1,
                step: None,
                penalty_ms: 0,
                elapsed_ms: 0,
                total_ms: 0,
                started_at: None,
                completed_at: None,
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "gave_up");
        assert!(json.get("revealed_answer").is_none());
    }
}
