//! State export/import for quick and dirty state restoration.
//!
//! A snapshot holds every team session so a crashed or restarted server can be
//! brought back mid-hunt. Broadcast channels and rate limiter windows are
//! runtime-only and not part of it.

use super::AppState;
use crate::catalog::Catalog;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntStateExport {
    /// Schema version for forward compatibility
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    /// Name of the pack the sessions were played on
    pub pack: String,
    pub sessions: Vec<Session>,
}

impl HuntStateExport {
    pub fn new(pack: impl Into<String>, sessions: Vec<Session>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            pack: pack.into(),
            sessions,
        }
    }

    /// Validate the export against the loaded catalog before import
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Export schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        if self.pack != catalog.name() {
            return Err(format!(
                "Export was made with pack '{}' but the server runs pack '{}'",
                self.pack,
                catalog.name()
            ));
        }

        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();
        let mut names = HashSet::new();
        for session in &self.sessions {
            if !ids.insert(&session.id) {
                return Err(format!("Duplicate team id '{}'", session.id));
            }
            if !tokens.insert(&session.token) {
                return Err(format!("Duplicate token for team '{}'", session.id));
            }
            if !names.insert(session.pseudonym.to_lowercase()) {
                return Err(format!("Duplicate pseudonym '{}'", session.pseudonym));
            }

            let valid_position = catalog
                .by_order(session.stage_rank)
                .is_some_and(|stage| stage.block(session.sub_step).is_some());
            if !valid_position {
                return Err(format!(
                    "Team '{}' is at {} of stage {}, which does not exist in pack '{}'",
                    session.id,
                    session.sub_step,
                    session.stage_rank,
                    catalog.name()
                ));
            }
        }

        Ok(())
    }
}

impl AppState {
    /// Snapshot every team session
    pub async fn export_state(&self) -> HuntStateExport {
        HuntStateExport::new(self.catalog.name(), self.all_sessions().await)
    }

    /// Replace every team session with the snapshot's
    pub async fn import_state(&self, export: HuntStateExport) -> Result<(), String> {
        export.validate(&self.catalog)?;

        let count = export.sessions.len();
        let mut tokens = self.tokens.write().await;
        let mut sessions = self.sessions.write().await;
        tokens.clear();
        sessions.clear();

        for session in export.sessions {
            tokens.insert(session.token.clone(), session.id.clone());
            sessions.insert(session.id.clone(), Arc::new(Mutex::new(session)));
        }
        drop(sessions);
        drop(tokens);

        self.touch();
        tracing::info!("Imported {} team sessions", count);
        Ok(())
    }
}
