//! Verdict-list reduction to a per-item score.
//!
//! The comparison service does the hard work (alignment, phonetic
//! similarity); this module only folds its verdict list into the two
//! numbers the rest of the engine consumes.

use crate::api::{WordLabel, WordVerdict};

// ---------------------------------------------------------------------------
// ItemScore
// ---------------------------------------------------------------------------

/// Accuracy summary for a single spoken item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemScore {
    /// `round(100 × correct / total)`, or `0` for an empty verdict list.
    pub accuracy_percent: u8,
    /// Words not labelled `correct`. Mispronunciations count here — they
    /// are distinguished visually, not in the score.
    pub error_count: usize,
}

/// Reduce `verdicts` to an [`ItemScore`].
///
/// ```
/// use lexiscreen::api::{WordLabel, WordVerdict};
/// use lexiscreen::score::score_verdicts;
///
/// let verdicts: Vec<WordVerdict> = [WordLabel::Correct, WordLabel::Correct, WordLabel::Error]
///     .into_iter()
///     .map(|label| WordVerdict { target_word: None, spoken_word: None, label })
///     .collect();
/// let score = score_verdicts(&verdicts);
/// assert_eq!(score.accuracy_percent, 67);
/// assert_eq!(score.error_count, 1);
/// ```
pub fn score_verdicts(verdicts: &[WordVerdict]) -> ItemScore {
    let total = verdicts.len();
    if total == 0 {
        return ItemScore {
            accuracy_percent: 0,
            error_count: 0,
        };
    }

    let correct = verdicts
        .iter()
        .filter(|v| v.label == WordLabel::Correct)
        .count();

    ItemScore {
        accuracy_percent: (100.0 * correct as f64 / total as f64).round() as u8,
        error_count: total - correct,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
