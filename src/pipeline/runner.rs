//! Per-item analysis pipeline.
//!
//! [`ItemRunner`] drives one finalized take through the fixed sequence
//!
//! ```text
//! transcribe (remote) → normalize → compare (remote) → score
//! ```
//!
//! and produces an [`ItemOutcome`]. The stages run strictly in that
//! order for a given item — no comparison starts before the recording
//! has stopped and been finalized — and a failure at any stage emits
//! nothing (no partial result, no score).

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, Backend, CompareRequest, WordTimestamp, WordVerdict};
use crate::normalize::{normalize, normalize_timestamps};
use crate::pipeline::recorder::{ItemRecorder, RecordError};
use crate::score::{score_verdicts, ItemScore};

// ---------------------------------------------------------------------------
// ItemOutcome
// ---------------------------------------------------------------------------

/// Everything one successful item attempt produced.
///
/// Texts and timestamp words are normalized; the verdict list is exactly
/// what the comparison service returned. Held by the level controller
/// only until it is folded into the level aggregate.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub target_text: String,
    pub transcribed_text: String,
    pub word_timestamps: Vec<WordTimestamp>,
    pub verdicts: Vec<WordVerdict>,
    pub score: ItemScore,
}

// ---------------------------------------------------------------------------
// ItemError
// ---------------------------------------------------------------------------

/// Why an item attempt produced no result.
///
/// Every variant is recovered the same way: the child re-attempts the
/// same item when they choose to — never automatically.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Microphone or take finalization failure.
    #[error(transparent)]
    Capture(#[from] RecordError),

    /// The audio upload / transcription call failed.
    #[error("transcription failed: {0}")]
    Transcription(ApiError),

    /// The word comparison call failed after a good transcription.
    #[error("comparison failed: {0}")]
    Comparison(ApiError),
}

// ---------------------------------------------------------------------------
// ItemRunner
// ---------------------------------------------------------------------------

/// Runs finalized takes through the remote analysis sequence.
pub struct ItemRunner {
    backend: Arc<dyn Backend>,
}

impl ItemRunner {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Analyze a finalized take, driving `recorder` through
    /// `Uploading → Done | Failed`.
    pub async fn run_take(
        &self,
        recorder: &mut ItemRecorder,
        wav: Vec<u8>,
        target_text: &str,
    ) -> Result<ItemOutcome, ItemError> {
        recorder.begin_upload();
        match self.analyze(wav, target_text).await {
            Ok(outcome) => {
                recorder.finish();
                Ok(outcome)
            }
            Err(e) => {
                recorder.fail();
                Err(e)
            }
        }
    }

    /// The phase-free core: upload, normalize both sides, compare, score.
    pub async fn analyze(&self, wav: Vec<u8>, target_text: &str) -> Result<ItemOutcome, ItemError> {
        let transcription = self
            .backend
            .transcribe(wav, target_text)
            .await
            .map_err(ItemError::Transcription)?;

        log::debug!("transcript: {:?}", transcription.transcribed_text);

        // Both sides of the comparison must be canonical, including the
        // words inside the timestamp list.
        let target = normalize(target_text);
        let transcribed = normalize(&transcription.transcribed_text);
        let mut timestamps = transcription.word_timestamps;
        normalize_timestamps(&mut timestamps);

        let comparison = self
            .backend
            .compare(&CompareRequest {
                target_text: target.clone(),
                transcribed_text: transcribed.clone(),
                word_timestamps: timestamps.clone(),
            })
            .await
            .map_err(ItemError::Comparison)?;

        let score = score_verdicts(&comparison.word_status);
        log::debug!(
            "item scored {}% ({} errors)",
            score.accuracy_percent,
            score.error_count
        );

        Ok(ItemOutcome {
            target_text: target,
            transcribed_text: transcribed,
            word_timestamps: timestamps,
            verdicts: comparison.word_status,
            score,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;
    use crate::pipeline::state::RecorderPhase;

    fn wav() -> Vec<u8> {
        crate::audio::encode_wav(&[0.0_f32; 1_600]).unwrap()
    }

    #[tokio::test]
    async fn analyze_normalizes_before_compare() {
        let backend = Arc::new(MockBackend::with_transcript("The  cat, sad!"));
        let runner = ItemRunner::new(Arc::clone(&backend) as Arc<dyn Backend>);

        let outcome = runner.analyze(wav(), "The cat sat.").await.unwrap();

        assert_eq!(outcome.target_text, "the cat sat");
        assert_eq!(outcome.transcribed_text, "the cat sad");

        // The comparator must have received the canonical forms.
        let sent = backend.compare_requests.lock().unwrap();
        assert_eq!(sent[0].target_text, "the cat sat");
        assert_eq!(sent[0].transcribed_text, "the cat sad");
    }

    #[tokio::test]
    async fn analyze_scores_the_verdicts() {
        let backend = Arc::new(MockBackend::with_transcript("the cat sad"));
        let runner = ItemRunner::new(backend as Arc<dyn Backend>);

        let outcome = runner.analyze(wav(), "the cat sat").await.unwrap();

        assert_eq!(outcome.score.accuracy_percent, 67);
        assert_eq!(outcome.score.error_count, 1);
        assert_eq!(outcome.verdicts.len(), 3);
    }

    #[tokio::test]
    async fn analyze_normalizes_timestamp_words() {
        let mut backend = MockBackend::with_transcript("The cat");
        backend.timestamps = vec![
            WordTimestamp {
                word: "The".into(),
                start: 0.1,
                end: 0.4,
            },
            WordTimestamp {
                word: "cat,".into(),
                start: 0.5,
                end: 0.9,
            },
        ];
        let backend = Arc::new(backend);
        let runner = ItemRunner::new(Arc::clone(&backend) as Arc<dyn Backend>);

        let outcome = runner.analyze(wav(), "the cat").await.unwrap();
        assert_eq!(outcome.word_timestamps[0].word, "the");
        assert_eq!(outcome.word_timestamps[1].word, "cat");

        let sent = backend.compare_requests.lock().unwrap();
        assert_eq!(sent[0].word_timestamps[1].word, "cat");
    }

    #[tokio::test]
    async fn transcription_failure_aborts_without_compare() {
        let mut backend = MockBackend::with_transcript("irrelevant");
        backend.fail_transcribe = true;
        let backend = Arc::new(backend);
        let runner = ItemRunner::new(Arc::clone(&backend) as Arc<dyn Backend>);

        let err = runner.analyze(wav(), "the cat").await.unwrap_err();
        assert!(matches!(err, ItemError::Transcription(_)));
        // The comparator must never have been reached.
        assert!(backend.compare_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comparison_failure_is_tagged_as_comparison() {
        let mut backend = MockBackend::with_transcript("the cat");
        backend.fail_compare = true;
        let runner = ItemRunner::new(Arc::new(backend) as Arc<dyn Backend>);

        let err = runner.analyze(wav(), "the cat").await.unwrap_err();
        assert!(matches!(err, ItemError::Comparison(_)));
    }

    #[tokio::test]
    async fn run_take_drives_phases_to_done() {
        let backend = Arc::new(MockBackend::with_transcript("the cat"));
        let runner = ItemRunner::new(backend as Arc<dyn Backend>);

        let mut recorder = ItemRecorder::new(120.0);
        // Simulate a finished capture without hardware.
        recorder.set_phase_for_test(RecorderPhase::Stopped);

        let outcome = runner.run_take(&mut recorder, wav(), "the cat").await;
        assert!(outcome.is_ok());
        assert_eq!(recorder.phase(), RecorderPhase::Done);
    }

    #[tokio::test]
    async fn run_take_failure_lands_in_failed_phase() {
        let mut backend = MockBackend::with_transcript("the cat");
        backend.fail_transcribe = true;
        let runner = ItemRunner::new(Arc::new(backend) as Arc<dyn Backend>);

        let mut recorder = ItemRecorder::new(120.0);
        recorder.set_phase_for_test(RecorderPhase::Stopped);

        let outcome = runner.run_take(&mut recorder, wav(), "the cat").await;
        assert!(outcome.is_err());
        assert_eq!(recorder.phase(), RecorderPhase::Failed);
    }
}
