//! Wire types for the analysis backend.
//!
//! Only the fields the engine consumes are modeled; the backend may send
//! more (it does), and unknown fields are ignored by serde's default
//! behavior. The full-evaluate report is deliberately kept opaque
//! (`serde_json::Value`) — its shape belongs to the reporting service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WordTimestamp
// ---------------------------------------------------------------------------

/// Approximate timing for one transcribed word, in seconds.
///
/// Produced by the transcription service and passed through to the
/// comparison service; never computed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

// ---------------------------------------------------------------------------
// Word verdicts
// ---------------------------------------------------------------------------

/// Per-word classification of a spoken attempt against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordLabel {
    /// Exact match after normalization.
    Correct,
    /// Wrong, missing, or inserted word.
    Error,
    /// Close-but-wrong attempt; shown distinctly but still scored as wrong.
    Mispronunciation,
}

/// One entry of the comparison service's alignment.
///
/// Insertions carry no `target_word`; omissions carry no `spoken_word`
/// (the service aligns with edit-distance and reports both directions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordVerdict {
    pub target_word: Option<String>,
    pub spoken_word: Option<String>,
    pub label: WordLabel,
}

// ---------------------------------------------------------------------------
// Content endpoints
// ---------------------------------------------------------------------------

/// `GET /dyslexia/story` — a short paragraph for the reading level.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryResponse {
    pub story: String,
}

/// `GET /dyslexia/rhymes` — pair strings like `"cat hat"`.
#[derive(Debug, Clone, Deserialize)]
pub struct RhymesResponse {
    pub rhymes: Vec<String>,
}

/// `GET /dyslexia/ran` — the rapid-naming color grid plus the utterance
/// the child is expected to produce (grid in reading order).
#[derive(Debug, Clone, Deserialize)]
pub struct RanResponse {
    pub grid: Vec<Vec<String>>,
    pub target_text: String,
}

/// `GET /dyslexia/nonsense` — pseudowords as one space-separated string.
#[derive(Debug, Clone, Deserialize)]
pub struct NonsenseResponse {
    pub words: String,
}

// ---------------------------------------------------------------------------
// Analysis endpoints
// ---------------------------------------------------------------------------

/// `POST /analyze-audio` — transcript plus word timing for one take.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResponse {
    pub transcribed_text: String,
    #[serde(default)]
    pub word_timestamps: Vec<WordTimestamp>,
}

/// `POST /dyslexia/compare` request body. All three fields must already
/// be normalized (see [`crate::normalize`]).
#[derive(Debug, Clone, Serialize)]
pub struct CompareRequest {
    pub target_text: String,
    pub transcribed_text: String,
    pub word_timestamps: Vec<WordTimestamp>,
}

/// `POST /dyslexia/compare` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareResponse {
    pub word_status: Vec<WordVerdict>,
}

// ---------------------------------------------------------------------------
// Evaluation endpoints
// ---------------------------------------------------------------------------

/// `POST /dyslexia/level-evaluate` request body.
#[derive(Debug, Clone, Serialize)]
pub struct LevelEvaluateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub level: u8,
    pub target_text: String,
    pub transcribed_text: String,
    pub word_timestamps: Vec<WordTimestamp>,
}

/// Verdict of the per-level evaluation.
///
/// The service emits a wider status vocabulary (`IN_PROGRESS`,
/// `COMPLETED`, …); only `RETEST` changes the flow here, so everything
/// unrecognized lands on [`EvalStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvalStatus {
    Pass,
    Retest,
    #[serde(other)]
    Other,
}

/// `POST /dyslexia/level-evaluate` response (used fields).
#[derive(Debug, Clone, Deserialize)]
pub struct LevelEvaluateResponse {
    pub status: EvalStatus,
    #[serde(default)]
    pub next_level: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One level's contribution to the final report request.
#[derive(Debug, Clone, Serialize)]
pub struct LevelPayload {
    pub target_text: String,
    pub transcribed_text: String,
    pub accuracy: u8,
}

/// `POST /dyslexia/full-evaluate` request body. Keys are level numbers.
#[derive(Debug, Clone, Serialize)]
pub struct FullEvaluateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub levels: BTreeMap<u8, LevelPayload>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
