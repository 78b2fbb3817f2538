//! Step catalog
//!
//! The ordered, read-only list of stages a team walks through. A catalog is
//! built once at startup from a trivia pack (see [`packs`]) and validated so
//! that ranks are dense (1..=N), every answer-bearing block has at least one
//! accepted answer, and exactly the last stage is the final one.

mod packs;

pub use packs::builtin_pack_names;

use crate::types::{StageRank, SubStepKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Content of one sub-step: the text shown to the team, the accepted answers
/// (first one is the canonical answer revealed on give-up), hints in unlock
/// order, and whether matching is strict.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub text: String,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub strict: bool,
}

impl Block {
    pub fn canonical_answer(&self) -> Option<&str> {
        self.answers.first().map(String::as_str)
    }
}

type BlockAccessor = fn(&RegularBlocks) -> Option<&Block>;

/// Blocks of a regular (non-final) stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegularBlocks {
    pub direction: Option<Block>,
    pub moving: Option<Block>,
    pub enigma: Option<Block>,
    pub bonus: Option<Block>,
    pub key: Option<Block>,
}

impl RegularBlocks {
    /// Sub-step order of a regular stage. A kind is reachable when its
    /// accessor finds a block.
    pub const SEQUENCE: [(SubStepKind, BlockAccessor); 5] = [
        (SubStepKind::Direction, |b| b.direction.as_ref()),
        (SubStepKind::Moving, |b| b.moving.as_ref()),
        (SubStepKind::Enigma, |b| b.enigma.as_ref()),
        (SubStepKind::Bonus, |b| b.bonus.as_ref()),
        (SubStepKind::Key, |b| b.key.as_ref()),
    ];

    pub fn get(&self, kind: SubStepKind) -> Option<&Block> {
        Self::SEQUENCE
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, block)| block(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageContent {
    Regular(RegularBlocks),
    /// The last stage: a single enigma-shaped block played as `SubStepKind::Final`
    Final(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub rank: StageRank,
    pub name: String,
    pub content: StageContent,
}

impl Stage {
    pub fn is_final(&self) -> bool {
        matches!(self.content, StageContent::Final(_))
    }

    /// The block backing `kind` on this stage, if the stage defines it
    pub fn block(&self, kind: SubStepKind) -> Option<&Block> {
        match (&self.content, kind) {
            (StageContent::Final(block), SubStepKind::Final) => Some(block),
            (StageContent::Final(_), _) | (StageContent::Regular(_), SubStepKind::Final) => None,
            (StageContent::Regular(blocks), kind) => blocks.get(kind),
        }
    }
}

/// Serialized form of a trivia pack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackDef {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub stages: Vec<StageDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enigma: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Block>,
    #[serde(default, rename = "final", skip_serializing_if = "Option::is_none")]
    pub final_enigma: Option<Block>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid pack JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("pack has no stages")]
    Empty,

    #[error("stage {0} has an empty name")]
    UnnamedStage(StageRank),

    #[error("duplicate stage name {0:?}")]
    DuplicateStage(String),

    #[error("stage {0:?} defines no sub-step")]
    EmptyStage(String),

    #[error("stage {0:?} mixes a final block with regular blocks")]
    MixedFinal(String),

    #[error("stage {0:?} is final but is not the last stage")]
    FinalNotLast(String),

    #[error("last stage {0:?} must define a final block")]
    MissingFinal(String),

    #[error("{kind} block of stage {stage:?} has no accepted answer")]
    MissingAnswers { stage: String, kind: SubStepKind },
}

/// Validated, immutable list of stages
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    title: String,
    stages: Vec<Stage>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let def: PackDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    /// Validate a pack definition and assign ranks from stage order
    pub fn from_def(def: PackDef) -> Result<Self, CatalogError> {
        if def.stages.is_empty() {
            return Err(CatalogError::Empty);
        }

        let last = def.stages.len();
        let mut seen = HashSet::new();
        let mut stages = Vec::with_capacity(last);

        for (index, stage_def) in def.stages.into_iter().enumerate() {
            let rank = StageRank::try_from(index + 1).unwrap_or(StageRank::MAX);
            let stage = Self::build_stage(rank, stage_def, index + 1 == last)?;
            if !seen.insert(stage.name.clone()) {
                return Err(CatalogError::DuplicateStage(stage.name));
            }
            stages.push(stage);
        }

        Ok(Self {
            name: def.name,
            title: def.title,
            stages,
        })
    }

    fn build_stage(rank: StageRank, def: StageDef, is_last: bool) -> Result<Stage, CatalogError> {
        let name = def.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::UnnamedStage(rank));
        }

        let blocks = RegularBlocks {
            direction: def.direction,
            moving: def.moving,
            enigma: def.enigma,
            bonus: def.bonus,
            key: def.key,
        };
        let has_regular = RegularBlocks::SEQUENCE
            .iter()
            .any(|(_, block)| block(&blocks).is_some());

        let content = match def.final_enigma {
            Some(_) if has_regular => return Err(CatalogError::MixedFinal(name)),
            Some(_) if !is_last => return Err(CatalogError::FinalNotLast(name)),
            Some(block) => StageContent::Final(block),
            None if is_last => return Err(CatalogError::MissingFinal(name)),
            None if !has_regular => return Err(CatalogError::EmptyStage(name)),
            None => StageContent::Regular(blocks),
        };

        let stage = Stage {
            rank,
            name,
            content,
        };

        for kind in crate::progression::available_sub_steps(&stage) {
            let missing = kind.requires_answer()
                && stage.block(kind).is_some_and(|block| block.answers.is_empty());
            if missing {
                return Err(CatalogError::MissingAnswers {
                    stage: stage.name.clone(),
                    kind,
                });
            }
        }

        Ok(stage)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn total_stages(&self) -> StageRank {
        StageRank::try_from(self.stages.len()).unwrap_or(StageRank::MAX)
    }

    pub fn by_name(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Look up a stage by its 1-based rank
    pub fn by_order(&self, rank: StageRank) -> Option<&Stage> {
        let index = usize::try_from(rank).ok()?.checked_sub(1)?;
        self.stages.get(index)
    }

    pub fn is_final(&self, rank: StageRank) -> bool {
        rank == self.total_stages()
    }

    pub fn final_stage(&self) -> &Stage {
        // Non-empty and final-terminated by construction
        &self.stages[self.stages.len() - 1]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn block(text: &str, answers: &[&str]) -> Block {
        Block {
            text: text.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            hints: Vec::new(),
            strict: false,
        }
    }

    /// Three stages: a full regular stage, a direction+enigma+key stage and the final
    pub(crate) fn sample_catalog() -> Catalog {
        let def = PackDef {
            name: "sample".to_string(),
            title: "Sample".to_string(),
            stages: vec![
                StageDef {
                    name: "Départ".to_string(),
                    direction: Some(Block {
                        hints: vec!["Regardez le soleil".to_string(), "Le nord".to_string()],
                        ..block("Où aller ?", &["Nord", "N"])
                    }),
                    moving: Some(block("Marchez jusqu'à la fontaine", &[])),
                    enigma: Some(Block {
                        hints: vec!["Un roi".to_string()],
                        ..block("Qui ?", &["Louis XII"])
                    }),
                    bonus: Some(block("Combien ?", &["13", "14", "treize", "quatorze"])),
                    key: Some(block("La clé ?", &["pintade"])),
                    ..Default::default()
                },
                StageDef {
                    name: "Marché".to_string(),
                    direction: Some(block("Où ?", &["Est"])),
                    enigma: Some(Block {
                        strict: true,
                        ..block("Quel animal ?", &["chauve-souris"])
                    }),
                    key: Some(block("Clé ?", &["mille"])),
                    ..Default::default()
                },
                StageDef {
                    name: "Arrivée".to_string(),
                    final_enigma: Some(Block {
                        hints: vec!["Pensez au début".to_string()],
                        ..block("Le mot final ?", &["Trésor"])
                    }),
                    ..Default::default()
                },
            ],
        };
        Catalog::from_def(def).unwrap()
    }

    #[test]
    fn test_ranks_and_lookup() {
        let catalog = sample_catalog();
        assert_eq!(catalog.total_stages(), 3);
        assert_eq!(catalog.by_order(1).unwrap().name, "Départ");
        assert_eq!(catalog.by_order(3).unwrap().rank, 3);
        assert!(catalog.by_order(0).is_none());
        assert!(catalog.by_order(4).is_none());
        assert_eq!(catalog.by_name("Marché").unwrap().rank, 2);
        assert!(catalog.by_name("Nowhere").is_none());
        assert!(catalog.is_final(3));
        assert!(!catalog.is_final(2));
        assert_eq!(catalog.final_stage().name, "Arrivée");
        assert!(catalog.final_stage().is_final());
    }

    #[test]
    fn test_block_lookup() {
        let catalog = sample_catalog();
        let market = catalog.by_name("Marché").unwrap();
        assert!(market.block(SubStepKind::Direction).is_some());
        assert!(market.block(SubStepKind::Moving).is_none());
        assert!(market.block(SubStepKind::Final).is_none());

        let last = catalog.final_stage();
        assert!(last.block(SubStepKind::Final).is_some());
        assert!(last.block(SubStepKind::Enigma).is_none());
    }

    fn stage(name: &str, enigma: Option<Block>, final_enigma: Option<Block>) -> StageDef {
        StageDef {
            name: name.to_string(),
            enigma,
            final_enigma,
            ..Default::default()
        }
    }

    fn pack(stages: Vec<StageDef>) -> PackDef {
        PackDef {
            name: "p".to_string(),
            title: String::new(),
            stages,
        }
    }

    #[test]
    fn test_rejects_structural_errors() {
        let q = || Some(block("?", &["a"]));

        assert!(matches!(
            Catalog::from_def(pack(vec![])),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage("a", q(), None)])),
            Err(CatalogError::MissingFinal(_))
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage("a", None, q()), stage("b", None, q())])),
            Err(CatalogError::FinalNotLast(_))
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage("a", q(), q())])),
            Err(CatalogError::MixedFinal(_))
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage("a", None, None), stage("b", None, q())])),
            Err(CatalogError::EmptyStage(_))
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage("a", q(), None), stage("a", None, q())])),
            Err(CatalogError::DuplicateStage(_))
        ));
        assert!(matches!(
            Catalog::from_def(pack(vec![stage(" ", None, q())])),
            Err(CatalogError::UnnamedStage(1))
        ));
    }

    #[test]
    fn test_rejects_missing_answers() {
        let result = Catalog::from_def(pack(vec![
            stage("a", Some(block("?", &[])), None),
            stage("b", None, Some(block("?", &["x"]))),
        ]));
        match result {
            Err(CatalogError::MissingAnswers { stage, kind }) => {
                assert_eq!(stage, "a");
                assert_eq!(kind, SubStepKind::Enigma);
            }
            other => panic!("expected MissingAnswers, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "mini",
            "title": "Mini",
            "stages": [
                { "name": "Un", "enigma": { "text": "2+2 ?", "answers": ["4"] } },
                { "name": "Fin", "final": { "text": "Le mot ?", "answers": ["fin"], "strict": true } }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.name(), "mini");
        assert_eq!(catalog.title(), "Mini");
        assert!(catalog.final_stage().block(SubStepKind::Final).unwrap().strict);

        let unknown_block = r#"{ "name": "x", "stages": [ { "name": "a", "riddle": {"text": ""} } ] }"#;
        assert!(matches!(
            Catalog::from_json(unknown_block),
            Err(CatalogError::Parse(_))
        ));
    }
}
