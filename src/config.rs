//! Hunt configuration
//!
//! Read once at startup from the environment and passed explicitly to the
//! catalog and the game state. Anything malformed is a hard error: the
//! process must not start on a silently defaulted trivia pack or penalty.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{builtin_pack_names, CatalogError};

pub const DEFAULT_PORT: u16 = 6573;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TRIVIA_PACK is not set (available packs: {available})")]
    PackNotSelected { available: String },

    #[error("unknown trivia pack {name:?} (available packs: {available})")]
    UnknownPack { name: String, available: String },

    #[error("failed to read pack file {}: {source}", path.display())]
    PackIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid trivia pack {name:?}: {source}")]
    InvalidPack {
        name: String,
        #[source]
        source: CatalogError,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

/// Penalty and retry rules applied by the game state
#[derive(Debug, Clone, PartialEq)]
pub struct RulesConfig {
    /// Enigma/final submissions allowed before the answer is revealed
    pub max_attempts: u32,
    /// Charged for every wrong enigma/final answer after the first
    pub wrong_answer_penalty: Duration,
    /// Charged when a team gives up on a direction
    pub give_up_penalty: Duration,
    /// Charged for every newly revealed hint
    pub hint_penalty: Duration,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            wrong_answer_penalty: Duration::from_secs(60),
            give_up_penalty: Duration::from_secs(5 * 60),
            hint_penalty: Duration::from_secs(3 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HuntConfig {
    /// Name of the trivia pack to serve
    pub pack: String,
    /// Optional directory of `<name>.json` packs, checked before built-in packs
    pub packs_dir: Option<PathBuf>,
    pub rules: RulesConfig,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl HuntConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let pack = non_empty("TRIVIA_PACK").ok_or_else(|| ConfigError::PackNotSelected {
            available: available_packs(),
        })?;

        let defaults = RulesConfig::default();
        let rules = RulesConfig {
            max_attempts: parse_or(&non_empty, "HUNT_MAX_ATTEMPTS", defaults.max_attempts)?,
            wrong_answer_penalty: secs_or(
                &non_empty,
                "HUNT_WRONG_ANSWER_PENALTY_SECS",
                defaults.wrong_answer_penalty,
            )?,
            give_up_penalty: secs_or(
                &non_empty,
                "HUNT_GIVE_UP_PENALTY_SECS",
                defaults.give_up_penalty,
            )?,
            hint_penalty: secs_or(&non_empty, "HUNT_HINT_PENALTY_SECS", defaults.hint_penalty)?,
        };

        if rules.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                var: "HUNT_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            pack,
            packs_dir: non_empty("TRIVIA_PACKS_DIR").map(PathBuf::from),
            rules,
            port: parse_or(&non_empty, "PORT", DEFAULT_PORT)?,
            static_dir: non_empty("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
        })
    }
}

pub(crate) fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var: key, value }),
        None => Ok(default),
    }
}

pub(crate) fn secs_or<F>(var: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(var, key, default.as_secs()).map(Duration::from_secs)
}

pub(crate) fn available_packs() -> String {
    builtin_pack_names().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_pack_is_required() {
        let result = HuntConfig::from_vars(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::PackNotSelected { .. })));

        let result = HuntConfig::from_vars(lookup(&[("TRIVIA_PACK", "   ")]));
        assert!(matches!(result, Err(ConfigError::PackNotSelected { .. })));
    }

    #[test]
    fn test_defaults() {
        let config = HuntConfig::from_vars(lookup(&[("TRIVIA_PACK", "demo")])).unwrap();
        assert_eq!(config.pack, "demo");
        assert_eq!(config.rules, RulesConfig::default());
        assert_eq!(config.rules.max_attempts, 10);
        assert_eq!(config.rules.hint_penalty, Duration::from_secs(180));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.packs_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = HuntConfig::from_vars(lookup(&[
            ("TRIVIA_PACK", "demo"),
            ("HUNT_MAX_ATTEMPTS", "3"),
            ("HUNT_WRONG_ANSWER_PENALTY_SECS", "30"),
            ("HUNT_GIVE_UP_PENALTY_SECS", "600"),
            ("HUNT_HINT_PENALTY_SECS", "0"),
            ("PORT", "8080"),
            ("TRIVIA_PACKS_DIR", "/srv/packs"),
        ]))
        .unwrap();
        assert_eq!(config.rules.max_attempts, 3);
        assert_eq!(config.rules.wrong_answer_penalty, Duration::from_secs(30));
        assert_eq!(config.rules.give_up_penalty, Duration::from_secs(600));
        assert_eq!(config.rules.hint_penalty, Duration::ZERO);
        assert_eq!(config.port, 8080);
        assert_eq!(config.packs_dir, Some(PathBuf::from("/srv/packs")));
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let result = HuntConfig::from_vars(lookup(&[
            ("TRIVIA_PACK", "demo"),
            ("HUNT_HINT_PENALTY_SECS", "three"),
        ]));
        match result {
            Err(ConfigError::InvalidValue { var, value }) => {
                assert_eq!(var, "HUNT_HINT_PENALTY_SECS");
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }

        let result = HuntConfig::from_vars(lookup(&[
            ("TRIVIA_PACK", "demo"),
            ("HUNT_MAX_ATTEMPTS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("TRIVIA_PACK", "demo");
        std::env::set_var("HUNT_MAX_ATTEMPTS", "5");
        let config = HuntConfig::from_env().unwrap();
        std::env::remove_var("TRIVIA_PACK");
        std::env::remove_var("HUNT_MAX_ATTEMPTS");

        assert_eq!(config.pack, "demo");
        assert_eq!(config.rules.max_attempts, 5);
        assert!(matches!(
            HuntConfig::from_env(),
            Err(ConfigError::PackNotSelected { .. })
        ));
    }
}
