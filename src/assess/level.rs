//! Level identity and per-level progression.
//!
//! A screening session walks the four levels in fixed order; within a
//! level, [`LevelController`] steps through an ordered item sequence,
//! accumulates item outcomes, detects completion, and produces the
//! payload submitted for evaluation.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::api::WordTimestamp;
use crate::pipeline::ItemOutcome;

/// Minimum average accuracy to proceed on threshold-gated levels.
pub const PASS_THRESHOLD: u8 = 40;

// ---------------------------------------------------------------------------
// LevelId
// ---------------------------------------------------------------------------

/// The four assessment stages, in their fixed progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LevelId {
    /// Read three story sentences aloud.
    Reading,
    /// Read rhyming word pairs.
    Rhyme,
    /// Name a color grid as fast as possible, in reading order.
    RapidNaming,
    /// Read pronounceable pseudowords.
    NonsenseWords,
}

impl LevelId {
    /// All levels in progression order.
    pub const ALL: [LevelId; 4] = [
        LevelId::Reading,
        LevelId::Rhyme,
        LevelId::RapidNaming,
        LevelId::NonsenseWords,
    ];

    /// Wire-level number (1-based) used by the evaluation endpoints.
    pub fn number(self) -> u8 {
        match self {
            LevelId::Reading => 1,
            LevelId::Rhyme => 2,
            LevelId::RapidNaming => 3,
            LevelId::NonsenseWords => 4,
        }
    }

    /// The level after this one, `None` after the last.
    pub fn next(self) -> Option<LevelId> {
        match self {
            LevelId::Reading => Some(LevelId::Rhyme),
            LevelId::Rhyme => Some(LevelId::RapidNaming),
            LevelId::RapidNaming => Some(LevelId::NonsenseWords),
            LevelId::NonsenseWords => None,
        }
    }

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            LevelId::Reading => "Story Reading",
            LevelId::Rhyme => "Rhyme Pairs",
            LevelId::RapidNaming => "Rapid Color Naming",
            LevelId::NonsenseWords => "Nonsense Words",
        }
    }

    /// Whether the `> 40` average gate applies before submission.
    ///
    /// Reading and rapid naming require it; rhyme and nonsense words
    /// submit unconditionally once every item is attempted. Asymmetric,
    /// but it is the established behavior of the screening flow.
    pub fn threshold_gated(self) -> bool {
        matches!(self, LevelId::Reading | LevelId::RapidNaming)
    }

    /// Whether submission concatenates every item (nonsense words) or
    /// samples the final item (everything else).
    fn aggregates_all_items(self) -> bool {
        matches!(self, LevelId::NonsenseWords)
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title(), self.number())
    }
}

// ---------------------------------------------------------------------------
// LevelError / Attempt / LevelSubmission
// ---------------------------------------------------------------------------

/// Construction failures.
#[derive(Debug, Error)]
pub enum LevelError {
    /// A level cannot run with zero items.
    #[error("level has no items")]
    NoItems,
}

/// Handle tying an in-flight item attempt to the controller state it
/// started under. A reset invalidates all outstanding attempts, so a
/// result that finishes after its level was restarted mutates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt(u32);

/// What a completed level submits for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSubmission {
    pub target_text: String,
    pub transcribed_text: String,
    pub word_timestamps: Vec<WordTimestamp>,
}

// ---------------------------------------------------------------------------
// LevelController
// ---------------------------------------------------------------------------

/// Steps through one level's ordered item sequence.
///
/// Movement is strictly forward — no item may be skipped and the child
/// never moves backward. Completion latches exactly once, when
/// [`advance`](Self::advance) is called on the final item.
pub struct LevelController {
    level: LevelId,
    items: Vec<String>,
    current: usize,
    results: BTreeMap<usize, ItemOutcome>,
    completed: bool,
    generation: u32,
}

impl LevelController {
    /// Create a controller over `items` (target text per item, in order).
    pub fn new(level: LevelId, items: Vec<String>) -> Result<Self, LevelError> {
        if items.is_empty() {
            return Err(LevelError::NoItems);
        }
        Ok(Self {
            level,
            items,
            current: 0,
            results: BTreeMap::new(),
            completed: false,
            generation: 0,
        })
    }

    pub fn level(&self) -> LevelId {
        self.level
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Target text of the item the child is on.
    pub fn current_target(&self) -> &str {
        &self.items[self.current]
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Token for an attempt starting now; invalidated by [`reset`](Self::reset).
    pub fn attempt(&self) -> Attempt {
        Attempt(self.generation)
    }

    /// Store `outcome` for the current item.
    ///
    /// Returns `false` (and stores nothing) when `attempt` predates a
    /// reset — an abandoned attempt's late result must not touch state.
    pub fn on_item_result(&mut self, attempt: Attempt, outcome: ItemOutcome) -> bool {
        if attempt.0 != self.generation {
            log::debug!(
                "discarding stale result for {} item {}",
                self.level,
                self.current
            );
            return false;
        }
        self.results.insert(self.current, outcome);
        true
    }

    /// Move to the next item, or latch completion on the last one.
    pub fn advance(&mut self) {
        if self.current + 1 < self.items.len() {
            self.current += 1;
        } else {
            self.completed = true;
        }
    }

    /// Rounded mean of the stored items' accuracy; `0` with no results.
    pub fn average_accuracy(&self) -> u8 {
        if self.results.is_empty() {
            return 0;
        }
        let sum: f64 = self
            .results
            .values()
            .map(|r| r.score.accuracy_percent as f64)
            .sum();
        (sum / self.results.len() as f64).round() as u8
    }

    /// Whether the level may proceed to submission.
    ///
    /// Always true for non-gated levels; gated levels need an average
    /// strictly above [`PASS_THRESHOLD`].
    pub fn meets_threshold(&self) -> bool {
        !self.level.threshold_gated() || self.average_accuracy() > PASS_THRESHOLD
    }

    /// Build the evaluation payload from the stored outcomes.
    ///
    /// Nonsense words aggregate at the text level: targets and
    /// transcripts of every item are space-joined in item order, with the
    /// timestamps concatenated to match. Every other level is represented
    /// by its final stored item (for rapid naming that is the only item).
    pub fn submission(&self) -> LevelSubmission {
        if self.level.aggregates_all_items() {
            let mut targets = Vec::with_capacity(self.results.len());
            let mut transcripts = Vec::with_capacity(self.results.len());
            let mut timestamps = Vec::new();
            for outcome in self.results.values() {
                targets.push(outcome.target_text.as_str());
                transcripts.push(outcome.transcribed_text.as_str());
                timestamps.extend(outcome.word_timestamps.iter().cloned());
            }
            return LevelSubmission {
                target_text: targets.join(" "),
                transcribed_text: transcripts.join(" "),
                word_timestamps: timestamps,
            };
        }

        match self.results.values().next_back() {
            Some(outcome) => LevelSubmission {
                target_text: outcome.target_text.clone(),
                transcribed_text: outcome.transcribed_text.clone(),
                word_timestamps: outcome.word_timestamps.clone(),
            },
            None => LevelSubmission {
                target_text: String::new(),
                transcribed_text: String::new(),
                word_timestamps: Vec::new(),
            },
        }
    }

    /// Restart the level from item 0, discarding all stored results and
    /// invalidating outstanding attempts. Used for a backend-directed
    /// RETEST and for the local threshold retry.
    pub fn reset(&mut self) {
        self.results.clear();
        self.current = 0;
        self.completed = false;
        self.generation += 1;
        log::info!("{} restarted from the first item", self.level);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
