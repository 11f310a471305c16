//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across
//! threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection settings for the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the service, without a trailing path.
    pub base_url: String,
    /// Maximum seconds to wait for any single request.
    pub timeout_secs: u64,
    /// Optional account identifier forwarded to the evaluate endpoints.
    /// `None` means the evaluate calls identify the session only.
    pub user_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 30,
            user_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Maximum length of one take in seconds. Longer takes are trimmed
    /// to the head of the recording before upload.
    pub max_take_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_take_secs: 120.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ScreeningConfig
// ---------------------------------------------------------------------------

/// Content knobs for the four assessment levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Story difficulty requested from the content service.
    pub story_difficulty: String,
    /// Child age forwarded with the story request.
    pub story_age: u8,
    /// Rhyme difficulty requested from the content service.
    pub rhyme_level: String,
    /// How many story sentences the child reads.
    pub sentences_per_story: usize,
    /// How many rhyme pairs the child reads.
    pub rhyme_pair_count: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            story_difficulty: "medium".into(),
            story_age: 8,
            rhyme_level: "easy".into(),
            sentences_per_story: 3,
            rhyme_pair_count: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use lexiscreen::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analysis service connection settings.
    pub backend: BackendConfig,
    /// Audio capture settings.
    pub audio: AudioConfig,
    /// Assessment content settings.
    pub screening: ScreeningConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist
    /// yet (first-run scenario) so callers never need to special-case a
    /// missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
