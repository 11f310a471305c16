//! Level content — fetching and shaping each level's item sequence.
//!
//! Content is generated server-side; this module only turns the four
//! response shapes into ordered item lists. Content is fetched fresh on
//! every level (re)start, so a retest reads new material.

use thiserror::Error;

use crate::api::{ApiError, Backend};
use crate::assess::level::LevelId;
use crate::config::ScreeningConfig;

// ---------------------------------------------------------------------------
// ContentError
// ---------------------------------------------------------------------------

/// Failures while assembling a level's items.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The content endpoint failed.
    #[error("content service failed: {0}")]
    Service(#[from] ApiError),

    /// The service answered, but with nothing a child could read.
    #[error("no usable items for {0}")]
    Empty(&'static str),
}

// ---------------------------------------------------------------------------
// LevelContent
// ---------------------------------------------------------------------------

/// One level's item sequence plus optional display metadata.
#[derive(Debug, Clone)]
pub struct LevelContent {
    /// Target text per item, in reading order.
    pub items: Vec<String>,
    /// The rapid-naming color grid (display only; the utterance target is
    /// already in `items`).
    pub grid: Option<Vec<Vec<String>>>,
}

/// Fetch and shape the items for `level`.
pub async fn fetch_level_content(
    backend: &dyn Backend,
    level: LevelId,
    config: &ScreeningConfig,
) -> Result<LevelContent, ContentError> {
    match level {
        LevelId::Reading => {
            let response = backend
                .fetch_story(&config.story_difficulty, config.story_age)
                .await?;
            let items: Vec<String> = split_sentences(&response.story)
                .into_iter()
                .take(config.sentences_per_story)
                .collect();
            if items.is_empty() {
                return Err(ContentError::Empty("story reading"));
            }
            Ok(LevelContent { items, grid: None })
        }

        LevelId::Rhyme => {
            let response = backend.fetch_rhymes(&config.rhyme_level).await?;
            let items: Vec<String> = response
                .rhymes
                .into_iter()
                .filter(|pair| !pair.trim().is_empty())
                .take(config.rhyme_pair_count)
                .collect();
            if items.is_empty() {
                return Err(ContentError::Empty("rhyme pairs"));
            }
            Ok(LevelContent { items, grid: None })
        }

        LevelId::RapidNaming => {
            let response = backend.fetch_ran().await?;
            if response.target_text.trim().is_empty() {
                return Err(ContentError::Empty("rapid naming"));
            }
            Ok(LevelContent {
                items: vec![response.target_text],
                grid: Some(response.grid),
            })
        }

        LevelId::NonsenseWords => {
            let response = backend.fetch_nonsense().await?;
            let items: Vec<String> = response
                .words
                .split_whitespace()
                .map(|w| w.to_string())
                .collect();
            if items.is_empty() {
                return Err(ContentError::Empty("nonsense words"));
            }
            Ok(LevelContent { items, grid: None })
        }
    }
}

/// Split a story paragraph into sentences on terminal punctuation.
///
/// Each sentence keeps its terminator for display; whitespace-only
/// fragments are dropped.
pub fn split_sentences(story: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut buf = String::new();

    for c in story.chars() {
        buf.push(c);
        if matches!(c, '.' | '?' | '!') {
            let sentence = buf.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            buf.clear();
        }
    }

    // A trailing fragment without punctuation still counts.
    let tail = buf.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
