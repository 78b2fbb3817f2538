//! Trivia pack registry
//!
//! Built-in packs are compiled into the binary. A packs directory, when
//! configured, is checked first so content can be swapped without a rebuild.

use std::path::Path;

use super::Catalog;
use crate::config::{available_packs, ConfigError, HuntConfig};

const BUILTIN_PACKS: &[(&str, &str)] = &[("demo", include_str!("../../packs/demo.json"))];

/// Names of the packs compiled into the binary
pub fn builtin_pack_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_PACKS.iter().map(|(name, _)| *name)
}

/// Pack names are plain identifiers so they can never escape the packs directory
fn is_valid_pack_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Catalog {
    /// Load the pack selected by the configuration
    pub fn load(config: &HuntConfig) -> Result<Self, ConfigError> {
        Self::load_pack(&config.pack, config.packs_dir.as_deref())
    }

    pub fn load_pack(name: &str, packs_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let unknown = || ConfigError::UnknownPack {
            name: name.to_string(),
            available: available_packs(),
        };

        if !is_valid_pack_name(name) {
            return Err(unknown());
        }

        if let Some(dir) = packs_dir {
            let path = dir.join(format!("{name}.json"));
            if path.is_file() {
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::PackIo { path: path.clone(), source })?;
                tracing::info!("Loading trivia pack {:?} from {}", name, path.display());
                return Self::parse_pack(name, &json);
            }
        }

        let (_, json) = BUILTIN_PACKS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(unknown)?;
        tracing::info!("Loading built-in trivia pack {:?}", name);
        Self::parse_pack(name, json)
    }

    fn parse_pack(name: &str, json: &str) -> Result<Self, ConfigError> {
        let mut catalog = Self::from_json(json).map_err(|source| ConfigError::InvalidPack {
            name: name.to_string(),
            source,
        })?;

        if catalog.name != name {
            tracing::warn!(
                "Pack file declares name {:?}, serving it as {:?}",
                catalog.name,
                name
            );
            catalog.name = name.to_string();
        }

        tracing::info!(
            "Trivia pack {:?} ready with {} stages",
            name,
            catalog.total_stages()
        );
        Ok(catalog)
    }
}
