//! Sub-step progression
//!
//! The transition table is computed from which blocks a stage defines: a
//! regular stage walks the kinds of [`RegularBlocks::SEQUENCE`] that it has,
//! the final stage has only [`SubStepKind::Final`]. Everything here is pure.

use crate::answer;
use crate::catalog::{Catalog, RegularBlocks, Stage, StageContent};
use crate::types::{StageRank, SubStepKind};
use serde::{Deserialize, Serialize};

/// What the presentation layer needs to show a sub-step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    #[serde(rename = "type")]
    pub kind: SubStepKind,
    pub text: String,
    pub hints: Vec<String>,
    pub requires_answer: bool,
    pub single_attempt: bool,
}

/// Where a team stands after moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    At { rank: StageRank, kind: SubStepKind },
    Finished,
}

/// Reachable sub-steps of a stage, in play order
pub fn available_sub_steps(stage: &Stage) -> Vec<SubStepKind> {
    match &stage.content {
        StageContent::Final(_) => vec![SubStepKind::Final],
        StageContent::Regular(blocks) => RegularBlocks::SEQUENCE
            .iter()
            .filter(|(_, block)| block(blocks).is_some())
            .map(|(kind, _)| *kind)
            .collect(),
    }
}

pub fn first_sub_step(stage: &Stage) -> Option<SubStepKind> {
    available_sub_steps(stage).first().copied()
}

/// The sub-step after `current` within the same stage.
///
/// `None` means the stage is done: move on to the next stage, or end the hunt
/// when `stage` is the final one. A kind the stage does not define also yields
/// `None`.
pub fn next(stage: &Stage, current: SubStepKind) -> Option<SubStepKind> {
    if stage.is_final() {
        return None;
    }
    let sequence = available_sub_steps(stage);
    let index = sequence.iter().position(|kind| *kind == current)?;
    sequence.get(index + 1).copied()
}

pub fn payload(stage: &Stage, kind: SubStepKind) -> Option<Payload> {
    let block = stage.block(kind)?;
    Some(Payload {
        kind,
        text: block.text.clone(),
        hints: block.hints.clone(),
        requires_answer: kind.requires_answer(),
        single_attempt: kind.single_attempt(),
    })
}

impl Catalog {
    /// Starting position of a fresh team
    pub fn start_position(&self) -> Position {
        self.position_from(1)
    }

    /// First sub-step of the first stage at or after `rank`
    fn position_from(&self, rank: StageRank) -> Position {
        self.stages()
            .iter()
            .filter(|stage| stage.rank >= rank)
            .find_map(|stage| {
                first_sub_step(stage).map(|kind| Position::At {
                    rank: stage.rank,
                    kind,
                })
            })
            .unwrap_or(Position::Finished)
    }

    /// The position that follows `(rank, kind)`
    pub fn advance(&self, rank: StageRank, kind: SubStepKind) -> Position {
        let Some(stage) = self.by_order(rank) else {
            return Position::Finished;
        };
        if stage.is_final() {
            return Position::Finished;
        }
        match next(stage, kind) {
            Some(kind) => Position::At { rank, kind },
            None => self.position_from(rank + 1),
        }
    }

    /// Check an attempt against the accepted answers of a stage's sub-step.
    /// Unknown stages, missing blocks and blocks without answers all fail.
    pub fn check_answer(&self, stage_name: &str, kind: SubStepKind, attempt: &str) -> bool {
        self.by_name(stage_name)
            .and_then(|stage| stage.block(kind))
            .is_some_and(|block| answer::validate(attempt, &block.answers, block.strict))
    }

    /// The answer revealed when a team gives up or runs out of attempts
    pub fn correct_answer(&self, stage_name: &str, kind: SubStepKind) -> Option<&str> {
        self.by_name(stage_name)?.block(kind)?.canonical_answer()
    }
}
