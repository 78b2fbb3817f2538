//! Play rules: answers, hints, give-ups and the penalties they cost.
//!
//! Rules per sub-step kind:
//! - direction and key: unlimited free retries; a direction can be abandoned
//!   for a fixed penalty, which reveals the answer
//! - enigma and final: every wrong answer after the first costs a penalty;
//!   once the attempt cap is reached the answer is revealed and the team moves on
//! - bonus: exactly one submission, the team moves on either way
//! - moving: no answer, the team acknowledges arrival with `continue_hunt`
//!
//! Hints unlock in order and each newly revealed hint costs a penalty.

use super::{millis, AppState, SessionHandle};
use crate::catalog::Stage;
use crate::error::{GameError, GameResult};
use crate::progression::{self, Position};
use crate::protocol::{StepView, TeamView};
use crate::types::*;
use chrono::{DateTime, Utc};

/// Result of an answer submission
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// The team left the sub-step (right answer, bonus, or attempts exhausted)
    pub advanced: bool,
    /// Canonical answer, shown when the team moves on without finding it
    pub revealed_answer: Option<String>,
    /// Penalty charged by this submission
    pub penalty_ms: u64,
    pub session: Session,
}

#[derive(Debug, Clone)]
pub struct HintReveal {
    pub kind: SubStepKind,
    pub index: usize,
    pub text: String,
    /// False when the hint had already been revealed
    pub charged: bool,
    pub session: Session,
}

#[derive(Debug, Clone)]
pub struct GiveUpOutcome {
    pub revealed_answer: Option<String>,
    pub session: Session,
}

impl AppState {
    /// The stage and sub-step a playing team is on
    fn current_step(&self, session: &Session) -> GameResult<(&Stage, SubStepKind)> {
        match session.status() {
            TeamStatus::NotStarted => {
                return Err(GameError::forbidden("The hunt has not started for this team"))
            }
            TeamStatus::Finished => {
                return Err(GameError::forbidden("This team has already finished the hunt"))
            }
            TeamStatus::Playing => {}
        }

        let stage = self
            .catalog
            .by_order(session.stage_rank)
            .ok_or_else(|| GameError::not_found(format!("Stage {} not found", session.stage_rank)))?;

        if stage.block(session.sub_step).is_none() {
            return Err(GameError::not_found(format!(
                "Stage {:?} has no {} step",
                stage.name, session.sub_step
            )));
        }

        Ok((stage, session.sub_step))
    }

    /// Move the session to the next sub-step or stage. Returns true when the
    /// hunt is over for this team.
    fn move_on(&self, session: &mut Session, now: DateTime<Utc>) -> bool {
        match self.catalog.advance(session.stage_rank, session.sub_step) {
            Position::At { rank, kind } => {
                session.stage_rank = rank;
                session.sub_step = kind;
                false
            }
            Position::Finished => {
                session.completed_at = Some(now);
                tracing::info!(
                    "Team {:?} finished the hunt with {} ms of penalties",
                    session.pseudonym,
                    session.penalty_ms
                );
                true
            }
        }
    }

    async fn check_rate_limit(&self, session: &Session) -> GameResult<()> {
        if let Some(limiter) = &self.answer_limiter {
            if !limiter.check(&session.id).await {
                tracing::warn!("Rate limited answers from team {:?}", session.pseudonym);
                return Err(GameError::RateLimited);
            }
        }
        Ok(())
    }

    /// Submit an answer for the team's current sub-step
    pub async fn submit_answer(&self, token: &str, text: &str) -> GameResult<AnswerOutcome> {
        let handle: SessionHandle = self.session_handle(token).await?;
        let mut session = handle.lock().await;

        let (stage, kind) = self.current_step(&session)?;
        if !kind.requires_answer() {
            return Err(GameError::forbidden(
                "This step needs no answer, continue instead",
            ));
        }
        self.check_rate_limit(&session).await?;

        let rank = stage.rank;
        let correct = self.catalog.check_answer(&stage.name, kind, text);
        let canonical = self
            .catalog
            .correct_answer(&stage.name, kind)
            .map(str::to_string);
        let mut penalty = 0;

        let advanced = match kind {
            // rejected above, never answered
            SubStepKind::Moving => false,
            SubStepKind::Bonus => {
                let progress = session.progress_mut(rank);
                // A bonus always advances, so this only trips on an imported
                // snapshot that still sits on an attempted bonus
                if progress.bonus_attempted {
                    return Err(GameError::forbidden(
                        "The bonus question only takes one answer",
                    ));
                }
                progress.bonus_attempted = true;
                true
            }
            SubStepKind::Enigma | SubStepKind::Final => {
                let progress = session.progress_mut(rank);
                progress.attempts += 1;
                let attempts = progress.attempts;

                if !correct && attempts > 1 {
                    penalty = millis(self.rules.wrong_answer_penalty);
                }
                correct || attempts >= self.rules.max_attempts
            }
            SubStepKind::Direction | SubStepKind::Key => correct,
        };

        session.penalty_ms = session.penalty_ms.saturating_add(penalty);
        let revealed_answer = if advanced && !correct { canonical } else { None };

        if advanced {
            self.move_on(&mut session, chrono::Utc::now());
        }
        if advanced || penalty > 0 || kind.retry_limited() {
            self.touch();
        }

        tracing::info!(
            "Team {:?} answered {} of stage {}: correct={} advanced={} penalty={}ms",
            session.pseudonym,
            kind,
            rank,
            correct,
            advanced,
            penalty
        );

        Ok(AnswerOutcome {
            correct,
            advanced,
            revealed_answer,
            penalty_ms: penalty,
            session: session.clone(),
        })
    }

    /// Acknowledge a sub-step that needs no answer (moving)
    pub async fn continue_hunt(&self, token: &str) -> GameResult<Session> {
        let handle = self.session_handle(token).await?;
        let mut session = handle.lock().await;

        let (_, kind) = self.current_step(&session)?;
        if kind.requires_answer() {
            return Err(GameError::forbidden(format!(
                "The {kind} step needs an answer"
            )));
        }

        self.move_on(&mut session, chrono::Utc::now());
        self.touch();
        Ok(session.clone())
    }

    /// Reveal hint `index` of the current sub-step.
    ///
    /// Hints unlock in order; re-fetching an unlocked hint is free.
    pub async fn reveal_hint(&self, token: &str, index: usize) -> GameResult<HintReveal> {
        let handle = self.session_handle(token).await?;
        let mut session = handle.lock().await;

        let (stage, kind) = self.current_step(&session)?;
        let hints = stage
            .block(kind)
            .filter(|_| kind.has_hints())
            .map(|block| block.hints.as_slice())
            .unwrap_or_default();
        let text = hints
            .get(index)
            .cloned()
            .ok_or_else(|| GameError::not_found(format!("No hint {index} for this step")))?;

        let rank = stage.rank;
        let unlocked = session.progress(rank).hints_for(kind);
        if index > unlocked {
            return Err(GameError::forbidden(format!(
                "Reveal hint {unlocked} before hint {index}"
            )));
        }

        let charged = index == unlocked;
        if charged {
            session
                .progress_mut(rank)
                .hints_revealed
                .insert(kind, unlocked + 1);
            let penalty = millis(self.rules.hint_penalty);
            session.penalty_ms = session.penalty_ms.saturating_add(penalty);
            self.touch();
            tracing::info!(
                "Team {:?} revealed hint {} of {} on stage {}",
                session.pseudonym,
                index,
                kind,
                rank
            );
        }

        Ok(HintReveal {
            kind,
            index,
            text,
            charged,
            session: session.clone(),
        })
    }

    /// Abandon the current direction: penalty, answer revealed, team moves on
    pub async fn give_up(&self, token: &str) -> GameResult<GiveUpOutcome> {
        let handle = self.session_handle(token).await?;
        let mut session = handle.lock().await;

        let (stage, kind) = self.current_step(&session)?;
        if !kind.can_give_up() {
            return Err(GameError::forbidden(format!("Cannot give up on a {kind} step")));
        }

        let revealed_answer = self
            .catalog
            .correct_answer(&stage.name, kind)
            .map(str::to_string);
        let rank = stage.rank;

        session.penalty_ms = session
            .penalty_ms
            .saturating_add(millis(self.rules.give_up_penalty));
        self.move_on(&mut session, chrono::Utc::now());
        self.touch();

        tracing::info!(
            "Team {:?} gave up on the {} of stage {}",
            session.pseudonym,
            kind,
            rank
        );

        Ok(GiveUpOutcome {
            revealed_answer,
            session: session.clone(),
        })
    }

    /// Everything a team's screen needs
    pub fn team_view(&self, session: &Session) -> TeamView {
        let now = chrono::Utc::now();
        let stage = self.catalog.by_order(session.stage_rank);
        let step = match (session.status(), stage) {
            (TeamStatus::Playing, Some(stage)) => self.step_view(session, stage),
            _ => None,
        };

        TeamView {
            team_id: session.id.clone(),
            pseudonym: session.pseudonym.clone(),
            status: session.status(),
            stage_rank: session.stage_rank,
            stage_name: stage.map(|s| s.name.clone()),
            total_stages: self.catalog.total_stages(),
            step,
            penalty_ms: session.penalty_ms,
            elapsed_ms: session.elapsed_ms(now),
            total_ms: session.total_ms(now),
            started_at: session.started_at,
            completed_at: session.completed_at,
        }
    }

    fn step_view(&self, session: &Session, stage: &Stage) -> Option<StepView> {
        let kind = session.sub_step;
        let payload = progression::payload(stage, kind)?;
        let hints = if kind.has_hints() {
            payload.hints
        } else {
            Vec::new()
        };
        let progress = session.progress(stage.rank);
        let unlocked = progress.hints_for(kind).min(hints.len());

        let attempts_used = if kind.retry_limited() {
            progress.attempts
        } else if kind.single_attempt() {
            u32::from(progress.bonus_attempted)
        } else {
            0
        };
        let attempts_left = if kind.retry_limited() {
            Some(self.rules.max_attempts.saturating_sub(progress.attempts))
        } else if kind.single_attempt() {
            Some(1 - attempts_used)
        } else {
            None
        };

        Some(StepView {
            kind,
            text: payload.text,
            hint_count: hints.len(),
            revealed_hints: hints[..unlocked].to_vec(),
            requires_answer: payload.requires_answer,
            single_attempt: payload.single_attempt,
            can_give_up: kind.can_give_up(),
            attempts_used,
            attempts_left,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::tests::sample_catalog;
    use crate::config::RulesConfig;
    use crate::error::GameError;
    use crate::state::AppState;
    use crate::types::*;
    use std::time::Duration;

    const MINUTE: u64 = 60_000;

    async fn playing_team(state: &AppState) -> String {
        let team = state.register_team(Some("Fouines".to_string())).await.unwrap();
        state.start_hunt(&team.token).await.unwrap();
        team.token
    }

    fn state() -> AppState {
        AppState::new(sample_catalog(), RulesConfig::default())
    }

    /// Walk stage 1 up to its enigma
    async fn to_enigma(state: &AppState, token: &str) {
        state.submit_answer(token, "nord").await.unwrap();
        state.continue_hunt(token).await.unwrap();
    }

    #[tokio::test]
    async fn test_must_start_first() {
        let state = state();
        let team = state.register_team(Some("A".to_string())).await.unwrap();
        let result = state.submit_answer(&team.token, "nord").await;
        assert!(matches!(result, Err(GameError::Forbidden(_))));
        assert!(state.team_view(&team).step.is_none());
    }

    #[tokio::test]
    async fn test_direction_wrong_then_right() {
        let state = state();
        let token = playing_team(&state).await;

        let outcome = state.submit_answer(&token, "sud").await.unwrap();
        assert!(!outcome.correct);
        assert!(!outcome.advanced);
        assert_eq!(outcome.penalty_ms, 0);
        assert_eq!(outcome.session.sub_step, SubStepKind::Direction);

        let outcome = state.submit_answer(&token, "Le Nord").await.unwrap();
        assert!(outcome.correct);
        assert!(outcome.advanced);
        assert!(outcome.revealed_answer.is_none());
        assert_eq!(outcome.session.sub_step, SubStepKind::Moving);
    }

    #[tokio::test]
    async fn test_moving_needs_continue() {
        let state = state();
        let token = playing_team(&state).await;
        state.submit_answer(&token, "nord").await.unwrap();

        let result = state.submit_answer(&token, "arrivés").await;
        assert!(matches!(result, Err(GameError::Forbidden(_))));

        let session = state.continue_hunt(&token).await.unwrap();
        assert_eq!(session.sub_step, SubStepKind::Enigma);

        // continue is only for moving steps
        assert!(matches!(
            state.continue_hunt(&token).await,
            Err(GameError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_enigma_penalties_after_first_wrong() {
        let state = state();
        let token = playing_team(&state).await;
        to_enigma(&state, &token).await;

        let first = state.submit_answer(&token, "louis xiii").await.unwrap();
        assert_eq!(first.penalty_ms, 0);

        let second = state.submit_answer(&token, "louis xiv").await.unwrap();
        assert_eq!(second.penalty_ms, MINUTE);
        assert_eq!(second.session.penalty_ms, MINUTE);

        let right = state.submit_answer(&token, "louis XII le pieux").await.unwrap();
        assert!(right.correct);
        assert_eq!(right.penalty_ms, 0);
        assert_eq!(right.session.sub_step, SubStepKind::Bonus);
        assert_eq!(right.session.progress(1).attempts, 3);
    }

    #[tokio::test]
    async fn test_enigma_attempt_cap_reveals_answer() {
        let state = AppState::new(
            sample_catalog(),
            RulesConfig {
                max_attempts: 3,
                ..RulesConfig::default()
            },
        );
        let token = playing_team(&state).await;
        to_enigma(&state, &token).await;

        state.submit_answer(&token, "a").await.unwrap();
        state.submit_answer(&token, "b").await.unwrap();
        let last = state.submit_answer(&token, "c").await.unwrap();

        assert!(!last.correct);
        assert!(last.advanced);
        assert_eq!(last.revealed_answer.as_deref(), Some("Louis XII"));
        assert_eq!(last.session.sub_step, SubStepKind::Bonus);
        assert_eq!(last.session.penalty_ms, 2 * MINUTE);
    }

    #[tokio::test]
    async fn test_bonus_is_single_attempt() {
        let state = state();
        let token = playing_team(&state).await;
        to_enigma(&state, &token).await;
        state.submit_answer(&token, "louis xii").await.unwrap();

        let bonus = state.submit_answer(&token, "15").await.unwrap();
        assert!(!bonus.correct);
        assert!(bonus.advanced);
        assert_eq!(bonus.penalty_ms, 0);
        assert_eq!(bonus.revealed_answer.as_deref(), Some("13"));
        assert_eq!(bonus.session.sub_step, SubStepKind::Key);
        assert!(bonus.session.progress(1).bonus_attempted);
        // The wrong bonus did not touch the enigma budget
        assert_eq!(bonus.session.progress(1).attempts, 1);
    }

    #[tokio::test]
    async fn test_bonus_resubmission_rejected() {
        let state = state();
        let token = playing_team(&state).await;
        to_enigma(&state, &token).await;
        state.submit_answer(&token, "louis xii").await.unwrap();

        // As restored from a snapshot taken with the bonus already answered
        let handle = state.session_handle(&token).await.unwrap();
        {
            let mut session = handle.lock().await;
            session.progress_mut(1).bonus_attempted = true;
        }

        let result = state.submit_answer(&token, "13").await;
        assert!(matches!(result, Err(GameError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_hint_gating() {
        let state = state();
        let token = playing_team(&state).await;

        // Hint 1 before hint 0
        assert!(matches!(
            state.reveal_hint(&token, 1).await,
            Err(GameError::Forbidden(_))
        ));
        // Out of range
        assert!(matches!(
            state.reveal_hint(&token, 5).await,
            Err(GameError::NotFound(_))
        ));

        let first = state.reveal_hint(&token, 0).await.unwrap();
        assert!(first.charged);
        assert_eq!(first.text, "Regardez le soleil");
        assert_eq!(first.session.penalty_ms, 3 * MINUTE);

        let again = state.reveal_hint(&token, 0).await.unwrap();
        assert!(!again.charged);
        assert_eq!(again.session.penalty_ms, 3 * MINUTE);

        let second = state.reveal_hint(&token, 1).await.unwrap();
        assert!(second.charged);
        assert_eq!(second.session.penalty_ms, 6 * MINUTE);

        let view = state.team_view(&second.session);
        let step = view.step.unwrap();
        assert_eq!(step.hint_count, 2);
        assert_eq!(step.revealed_hints.len(), 2);
    }

    #[tokio::test]
    async fn test_give_up_direction_only() {
        let state = state();
        let token = playing_team(&state).await;

        let outcome = state.give_up(&token).await.unwrap();
        assert_eq!(outcome.revealed_answer.as_deref(), Some("Nord"));
        assert_eq!(outcome.session.penalty_ms, 5 * MINUTE);
        assert_eq!(outcome.session.sub_step, SubStepKind::Moving);

        assert!(matches!(
            state.give_up(&token).await,
            Err(GameError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_full_hunt_and_completion() {
        let state = state();
        let token = playing_team(&state).await;

        to_enigma(&state, &token).await;
        state.submit_answer(&token, "Louis XII").await.unwrap();
        state.submit_answer(&token, "treize").await.unwrap();
        let key = state.submit_answer(&token, "une pintade").await.unwrap();
        assert_eq!(key.session.stage_rank, 2);
        assert_eq!(key.session.sub_step, SubStepKind::Direction);

        state.submit_answer(&token, "est").await.unwrap();
        state.submit_answer(&token, "chauve-souris").await.unwrap();
        let key = state.submit_answer(&token, "1 000").await.unwrap();
        assert_eq!(key.session.stage_rank, 3);
        assert_eq!(key.session.sub_step, SubStepKind::Final);

        let done = state.submit_answer(&token, "le trésor").await.unwrap();
        assert!(done.correct);
        assert_eq!(done.session.status(), TeamStatus::Finished);
        assert!(done.session.completed_at.is_some());

        // A finished session is frozen
        assert!(matches!(
            state.submit_answer(&token, "le trésor").await,
            Err(GameError::Forbidden(_))
        ));
        assert!(matches!(
            state.reveal_hint(&token, 0).await,
            Err(GameError::Forbidden(_))
        ));
        assert!(state.team_view(&done.session).step.is_none());
    }

    #[tokio::test]
    async fn test_team_view() {
        let state = state();
        let token = playing_team(&state).await;
        to_enigma(&state, &token).await;
        state.submit_answer(&token, "nope").await.unwrap();

        let session = state.get_session_by_token(&token).await.unwrap();
        let view = state.team_view(&session);
        assert_eq!(view.status, TeamStatus::Playing);
        assert_eq!(view.stage_name.as_deref(), Some("Départ"));
        assert_eq!(view.total_stages, 3);

        let step = view.step.unwrap();
        assert_eq!(step.kind, SubStepKind::Enigma);
        assert_eq!(step.attempts_used, 1);
        assert_eq!(step.attempts_left, Some(9));
        assert!(step.revealed_hints.is_empty());
        assert!(!step.can_give_up);
    }

    #[tokio::test]
    async fn test_concurrent_hint_requests_charge_once() {
        let state = state();
        let token = playing_team(&state).await;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let state = state.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                state.reveal_hint(&token, 0).await.unwrap().charged
            }));
        }

        let mut charged = 0;
        for task in tasks {
            if task.await.unwrap() {
                charged += 1;
            }
        }
        assert_eq!(charged, 1);

        let session = state.get_session_by_token(&token).await.unwrap();
        assert_eq!(session.penalty_ms, 3 * MINUTE);
    }

    #[tokio::test]
    async fn test_rate_limited_answers() {
        let state = state().with_answer_limiter(Some(crate::abuse::RateLimiter::new(
            2,
            Duration::from_secs(60),
        )));
        let token = playing_team(&state).await;

        state.submit_answer(&token, "a").await.unwrap();
        state.submit_answer(&token, "b").await.unwrap();
        assert!(matches!(
            state.submit_answer(&token, "c").await,
            Err(GameError::RateLimited)
        ));
    }
}
