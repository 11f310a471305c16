//! Terminal output for the screening session.
//!
//! Plain `println!` formatting — the engine itself never prints; every
//! user-facing line goes through here so the presentation stays in one
//! place.

use crate::api::{WordLabel, WordVerdict};
use crate::assess::level::LevelId;
use crate::pipeline::ItemOutcome;

/// Opening banner.
pub fn banner() {
    println!();
    println!("=== Literacy Screening ===");
    println!("Four short speaking games. Read each prompt out loud.");
    println!();
}

/// Introduce a level before its first item.
pub fn level_intro(level: LevelId, item_count: usize) {
    println!();
    println!("--- Level {}: {} ---", level.number(), level.title());
    match level {
        LevelId::Reading => println!("Read each sentence aloud, one at a time."),
        LevelId::Rhyme => println!("Read each rhyming pair aloud."),
        LevelId::RapidNaming => {
            println!("Name every color in the grid, left to right, top to bottom,");
            println!("as fast as you can — all in one recording.");
        }
        LevelId::NonsenseWords => println!("These are made-up words. Sound each one out."),
    }
    println!("({item_count} item{})", if item_count == 1 { "" } else { "s" });
}

/// Render the rapid-naming color grid.
pub fn show_grid(grid: &[Vec<String>]) {
    println!();
    for row in grid {
        println!("  {}", row.join("  "));
    }
}

/// Prompt line for one item.
pub fn item_prompt(index: usize, count: usize, target: &str) {
    println!();
    println!("[{}/{}]  {target}", index + 1, count);
}

/// Word-by-word verdict line plus the item score.
///
/// Mispronunciations are marked distinctly from outright errors, even
/// though both count against accuracy.
pub fn show_outcome(outcome: &ItemOutcome) {
    let marks: Vec<String> = outcome.verdicts.iter().map(verdict_mark).collect();
    println!("  {}", marks.join("  "));
    println!(
        "  Accuracy: {}%  ({} error{})",
        outcome.score.accuracy_percent,
        outcome.score.error_count,
        if outcome.score.error_count == 1 { "" } else { "s" }
    );
}

fn verdict_mark(verdict: &WordVerdict) -> String {
    let target = verdict.target_word.as_deref().unwrap_or("—");
    match verdict.label {
        WordLabel::Correct => format!("{target} ✓"),
        WordLabel::Mispronunciation => {
            let spoken = verdict.spoken_word.as_deref().unwrap_or("—");
            format!("{target} ≈{spoken}")
        }
        WordLabel::Error => match verdict.spoken_word.as_deref() {
            Some(spoken) => format!("{target} ✗{spoken}"),
            None => format!("{target} ✗"),
        },
    }
}

/// An item attempt failed; the child may try the same item again.
pub fn show_item_error(err: &anyhow::Error) {
    println!("  Something went wrong: {err}");
}

/// The level average did not clear the pass threshold.
pub fn show_threshold_retry(average: u8) {
    println!();
    println!("  Level average was {average}% — let's run this level once more.");
}

/// The evaluation service asked for a retest.
pub fn show_retest(message: Option<&str>) {
    println!();
    match message {
        Some(msg) => println!("  Let's try that level again: {msg}"),
        None => println!("  Let's try that level again."),
    }
}

/// A level finished and was stored.
pub fn show_level_saved(level: LevelId, accuracy: u8) {
    println!();
    println!("  {} complete — level accuracy {accuracy}%.", level.title());
}

/// The composite report, pretty-printed.
pub fn show_report(report: &serde_json::Value) {
    println!();
    println!("=== Screening Report ===");
    match serde_json::to_string_pretty(report) {
        Ok(pretty) => println!("{pretty}"),
        Err(_) => println!("{report}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
