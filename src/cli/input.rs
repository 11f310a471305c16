//! Terminal input — Enter-gated prompts.
//!
//! Reading stdin blocks, so every read goes through
//! `tokio::task::spawn_blocking` and the async session loop never stalls
//! the runtime.

use anyhow::{Context, Result};
use std::io::Write;

/// Print `prompt` and wait until the user presses Enter.
pub async fn wait_for_enter(prompt: &str) -> Result<()> {
    print!("{prompt}");
    std::io::stdout().flush().ok();

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .context("stdin task failed")?
    .context("reading stdin")?;

    Ok(())
}

/// Ask a yes/no question; empty input counts as yes.
pub async fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [Y/n] ");
    std::io::stdout().flush().ok();

    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin task failed")?
    .context("reading stdin")?;

    let answer = line.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
