//! External analysis service boundary.
//!
//! The engine never transcribes, aligns, or diagnoses locally — those are
//! remote capabilities reached over HTTP/JSON:
//!
//! * [`Backend`] — async trait covering all eight capabilities (content,
//!   transcription, comparison, evaluation).
//! * [`HttpBackend`] — the `reqwest` implementation.
//! * [`ApiError`] — shared error for every capability.
//! * wire types — request/response structs mirroring the service schema.

pub mod client;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiError, Backend, HttpBackend};
pub use types::{
    CompareRequest, CompareResponse, EvalStatus, FullEvaluateRequest, LevelEvaluateRequest,
    LevelEvaluateResponse, LevelPayload, NonsenseResponse, RanResponse, RhymesResponse,
    StoryResponse, TranscriptionResponse, WordLabel, WordTimestamp, WordVerdict,
};

#[cfg(test)]
pub use client::MockBackend;
