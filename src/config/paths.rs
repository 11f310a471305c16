//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings + session identity):
//!   Windows: %APPDATA%\lexiscreen\
//!   macOS:   ~/Library/Application Support/lexiscreen/
//!   Linux:   ~/.config/lexiscreen/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and the session id file.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to the durable session id file. Created once, on first
    /// access, and never regenerated (see `assess::session`).
    pub session_id_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "lexiscreen";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide
    /// a standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let session_id_file = config_dir.join("session-id");

        Self {
            config_dir,
            settings_file,
            session_id_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
