//! Session identity and level-result aggregation.
//!
//! A [`Session`] is the single writer for level results: each completed
//! level is stored through [`save_level_data`](Session::save_level_data)
//! (insert or overwrite, last write wins) and read back by the report
//! trigger. The session id is durable per device — created lazily on
//! first access, persisted under a fixed file name in the config dir,
//! and never regenerated once present.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::assess::level::LevelId;
use crate::config::AppPaths;

// ---------------------------------------------------------------------------
// LevelResult
// ---------------------------------------------------------------------------

/// What a completed level contributes to the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelResult {
    pub target_text: String,
    pub transcribed_text: String,
    /// Rounded mean of the level's item accuracies, in `[0, 100]`.
    pub accuracy: u8,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The per-device screening session.
pub struct Session {
    id: String,
    levels: BTreeMap<LevelId, LevelResult>,
}

impl Session {
    /// Open the device session, creating the durable id on first use.
    pub fn open(paths: &AppPaths) -> Result<Self> {
        Self::open_at(&paths.session_id_file)
    }

    /// Open with an explicit id file (useful for tests).
    ///
    /// An existing, non-blank file is read verbatim; otherwise a fresh
    /// UUID is written. Either way the id on disk is authoritative from
    /// here on.
    pub fn open_at(path: &Path) -> Result<Self> {
        let existing = match std::fs::read_to_string(path) {
            Ok(content) => {
                let id = content.trim().to_string();
                if id.is_empty() {
                    None
                } else {
                    Some(id)
                }
            }
            Err(_) => None,
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(path, &id)
                    .with_context(|| format!("writing session id to {}", path.display()))?;
                log::info!("created new session id");
                id
            }
        };

        Ok(Self {
            id,
            levels: BTreeMap::new(),
        })
    }

    /// Build a session around a known id without touching disk (tests).
    #[cfg(test)]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            levels: BTreeMap::new(),
        }
    }

    /// The durable session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store a completed level's result, overwriting any earlier one for
    /// the same level (a retested level re-submits).
    pub fn save_level_data(&mut self, level: LevelId, result: LevelResult) {
        log::debug!("saving {level}: accuracy {}%", result.accuracy);
        self.levels.insert(level, result);
    }

    pub fn level_result(&self, level: LevelId) -> Option<&LevelResult> {
        self.levels.get(&level)
    }

    /// All stored results, keyed in progression order.
    pub fn level_results(&self) -> &BTreeMap<LevelId, LevelResult> {
        &self.levels
    }

    /// `true` once every level has a stored result.
    pub fn has_all_levels(&self) -> bool {
        LevelId::ALL.iter().all(|l| self.levels.contains_key(l))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
