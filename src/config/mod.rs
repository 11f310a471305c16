//! Configuration — TOML settings and platform paths.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, AudioConfig, BackendConfig, ScreeningConfig};
