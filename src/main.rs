//! Application entry point — literacy screening session runner.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG` controls verbosity).
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the [`HttpBackend`] from config.
//! 4. Open the device [`Session`] (creates the durable id on first run).
//! 5. Run [`ScreeningApp`] with the interactive microphone source —
//!    levels 1→4, then the composite report.
//!
//! A report failure is the one terminal error of a completed session;
//! it exits non-zero with the cause printed.

use std::sync::Arc;

use lexiscreen::{
    api::{Backend, HttpBackend},
    app::{MicAttempts, ScreeningApp},
    assess::Session,
    config::{AppConfig, AppPaths},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("backend: {}", config.backend.base_url);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config.backend));

    let paths = AppPaths::new();
    let session = Session::open(&paths)?;
    log::info!("session: {}", session.id());

    let mut attempts = MicAttempts::new(Arc::clone(&backend), config.audio.max_take_secs);
    let mut app = ScreeningApp::new(backend, config, session);

    app.run(&mut attempts).await?;
    Ok(())
}
