//! One take, one device — the item recorder.
//!
//! [`ItemRecorder`] owns the capture stream, the chunk accumulation, and
//! the [`RecorderPhase`] for a single assessment item. It enforces the
//! process-wide single-flight rule: at most one attempt may hold the
//! recording slot, and a second `start()` is rejected rather than queued.
//!
//! The OS capture device is scoped to the `Recording` phase only: the
//! RAII [`StreamHandle`](crate::audio::StreamHandle) is dropped on stop,
//! on failure, and on teardown, so the microphone is never leaked past an
//! exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use thiserror::Error;

use crate::audio::{self, AudioChunk, Microphone, MicrophoneError, StreamHandle};
use crate::pipeline::state::RecorderPhase;

/// Process-wide recording slot. Claimed in `start()`, released when the
/// attempt reaches a terminal phase (or the recorder is dropped).
static SLOT_TAKEN: AtomicBool = AtomicBool::new(false);

fn claim_slot() -> bool {
    SLOT_TAKEN
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

fn release_slot() {
    SLOT_TAKEN.store(false, Ordering::Release);
}

// ---------------------------------------------------------------------------
// RecordError
// ---------------------------------------------------------------------------

/// Errors while capturing one take.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Another attempt is recording or uploading; only one may be active
    /// process-wide.
    #[error("a recording is already in progress")]
    AlreadyActive,

    /// `stop()` was called outside the `Recording` phase.
    #[error("recorder is not currently recording")]
    NotRecording,

    /// Microphone access failed — denied, missing, or unusable. Blocking
    /// and user-visible; there is no fallback input.
    #[error(transparent)]
    Microphone(#[from] MicrophoneError),

    /// The take could not be finalized into a WAV blob.
    #[error(transparent)]
    Encode(#[from] audio::EncodeError),
}

// ---------------------------------------------------------------------------
// ItemRecorder
// ---------------------------------------------------------------------------

/// Captures the spoken attempt for one assessment item.
///
/// Lifecycle: [`start`](Self::start) → [`stop`](Self::stop) (yields the
/// WAV blob) → [`begin_upload`](Self::begin_upload) →
/// [`finish`](Self::finish) or [`fail`](Self::fail). The runner drives
/// the upload-side transitions; see [`crate::pipeline::ItemRunner`].
pub struct ItemRecorder {
    phase: RecorderPhase,
    stream: Option<StreamHandle>,
    chunks: Option<mpsc::Receiver<AudioChunk>>,
    sample_rate: u32,
    channels: u16,
    max_take_secs: f32,
    holds_slot: bool,
}

impl ItemRecorder {
    /// Create an idle recorder. `max_take_secs` caps the take length;
    /// over-long takes keep the head of the recording.
    pub fn new(max_take_secs: f32) -> Self {
        Self {
            phase: RecorderPhase::Idle,
            stream: None,
            chunks: None,
            sample_rate: 0,
            channels: 0,
            max_take_secs,
            holds_slot: false,
        }
    }

    /// Current phase, for display and gating.
    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    /// Open the microphone and begin accumulating audio.
    ///
    /// # Errors
    ///
    /// * [`RecordError::AlreadyActive`] — this recorder (or any other in
    ///   the process) is already mid-attempt.
    /// * [`RecordError::Microphone`] — the device is denied or missing.
    pub fn start(&mut self) -> Result<(), RecordError> {
        if self.phase.is_busy() {
            return Err(RecordError::AlreadyActive);
        }
        if !claim_slot() {
            return Err(RecordError::AlreadyActive);
        }
        self.holds_slot = true;

        let mic = match Microphone::open() {
            Ok(mic) => mic,
            Err(e) => {
                self.release(RecorderPhase::Failed);
                return Err(e.into());
            }
        };

        let (tx, rx) = mpsc::channel();
        let stream = match mic.start(tx) {
            Ok(stream) => stream,
            Err(e) => {
                self.release(RecorderPhase::Failed);
                return Err(e.into());
            }
        };

        self.sample_rate = mic.sample_rate();
        self.channels = mic.channels();
        self.stream = Some(stream);
        self.chunks = Some(rx);
        self.phase = RecorderPhase::Recording;
        log::debug!(
            "recording started ({} Hz, {} ch)",
            self.sample_rate,
            self.channels
        );
        Ok(())
    }

    /// Stop the stream, release the device, and finalize the take.
    ///
    /// Returns the uploadable WAV blob. On failure the recorder moves to
    /// `Failed` and the slot is freed so the child can re-attempt.
    pub fn stop(&mut self) -> Result<Vec<u8>, RecordError> {
        if self.phase != RecorderPhase::Recording {
            return Err(RecordError::NotRecording);
        }

        // Dropping the handle stops the hardware stream and closes the
        // callback's sender, so the drain below sees every chunk.
        self.stream = None;

        let mut samples = Vec::new();
        if let Some(rx) = self.chunks.take() {
            for chunk in rx.try_iter() {
                samples.extend_from_slice(&chunk.samples);
            }
        }

        match audio::finalize_take(&samples, self.channels, self.sample_rate, self.max_take_secs)
        {
            Ok(wav) => {
                self.phase = RecorderPhase::Stopped;
                log::debug!("take finalized ({} bytes)", wav.len());
                Ok(wav)
            }
            Err(e) => {
                self.release(RecorderPhase::Failed);
                Err(e.into())
            }
        }
    }

    /// Mark the finalized take as uploading.
    pub fn begin_upload(&mut self) {
        debug_assert_eq!(self.phase, RecorderPhase::Stopped);
        self.phase = RecorderPhase::Uploading;
    }

    /// Analysis succeeded; the attempt is over and the slot is freed.
    pub fn finish(&mut self) {
        self.release(RecorderPhase::Done);
    }

    /// Capture or analysis failed; nothing was emitted, slot freed.
    pub fn fail(&mut self) {
        self.release(RecorderPhase::Failed);
    }

    /// Force a phase without touching hardware — lets pipeline tests
    /// exercise the upload-side transitions.
    #[cfg(test)]
    pub(crate) fn set_phase_for_test(&mut self, phase: RecorderPhase) {
        self.phase = phase;
    }

    fn release(&mut self, terminal: RecorderPhase) {
        self.stream = None;
        self.chunks = None;
        self.phase = terminal;
        if self.holds_slot {
            self.holds_slot = false;
            release_slot();
        }
    }
}

impl Drop for ItemRecorder {
    fn drop(&mut self) {
        // Teardown mid-attempt counts as an exit path: stop the stream
        // and free the slot so the next recorder can start.
        if self.holds_slot {
            self.release(RecorderPhase::Failed);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // The slot is process-global, so everything touching it runs inside
    // a single test to avoid cross-test interference.
    #[test]
    fn slot_is_single_flight() {
        assert!(claim_slot());
        assert!(!claim_slot(), "second claim must be rejected");
        release_slot();
        assert!(claim_slot(), "slot must be reusable after release");
        release_slot();

        // Teardown mid-attempt is an exit path too: a dropped recorder
        // must free the slot it holds.
        {
            let mut rec = ItemRecorder::new(120.0);
            assert!(claim_slot());
            rec.holds_slot = true;
            rec.phase = RecorderPhase::Recording;
            // rec dropped here while "recording"
        }
        assert!(claim_slot(), "drop must have released the slot");
        release_slot();
    }

    #[test]
    fn new_recorder_is_idle() {
        let rec = ItemRecorder::new(120.0);
        assert_eq!(rec.phase(), RecorderPhase::Idle);
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let mut rec = ItemRecorder::new(120.0);
        assert!(matches!(rec.stop(), Err(RecordError::NotRecording)));
        assert_eq!(rec.phase(), RecorderPhase::Idle);
    }

    #[test]
    fn upload_transitions_reach_done() {
        let mut rec = ItemRecorder::new(120.0);
        // Drive the post-capture phases directly; capture itself needs
        // hardware and is exercised by the interactive binary.
        rec.phase = RecorderPhase::Stopped;
        rec.begin_upload();
        assert_eq!(rec.phase(), RecorderPhase::Uploading);
        rec.finish();
        assert_eq!(rec.phase(), RecorderPhase::Done);
    }

    #[test]
    fn fail_is_terminal_and_not_busy() {
        let mut rec = ItemRecorder::new(120.0);
        rec.phase = RecorderPhase::Uploading;
        rec.fail();
        assert_eq!(rec.phase(), RecorderPhase::Failed);
        assert!(!rec.phase().is_busy());
    }

}
