//! Recorder state machine.
//!
//! [`RecorderPhase`] drives one item's capture-and-analysis lifecycle.
//! It is independent of any presentation layer — the CLI (or any other
//! front end) merely observes transitions.

// ---------------------------------------------------------------------------
// RecorderPhase
// ---------------------------------------------------------------------------

/// Phases of one item's recording lifecycle.
///
/// ```text
/// Idle ──start()──▶ Recording ──stop()──▶ Stopped ──▶ Uploading
///                                                       ├─▶ Done
///                                                       └─▶ Failed
/// ```
///
/// `Stopped` holds the finalized take before the upload begins; the
/// transition to `Uploading` is automatic (the runner picks the take up
/// immediately). `Done` and `Failed` are terminal for the attempt; a
/// re-attempt starts a fresh cycle from the same phase value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderPhase {
    /// Waiting for the child to start the item.
    #[default]
    Idle,

    /// Microphone is live; audio is accumulating.
    Recording,

    /// The take is finalized into a WAV blob, upload pending.
    Stopped,

    /// The take is being transcribed and compared remotely.
    Uploading,

    /// Analysis succeeded; the item outcome has been emitted.
    Done,

    /// Capture or analysis failed; nothing was emitted.
    Failed,
}

impl RecorderPhase {
    /// Returns `true` while an attempt owns the recording slot.
    ///
    /// Starting a new recording in any busy phase is rejected: the
    /// microphone is exclusive during `Recording`, and a finalized or
    /// uploading take still belongs to the in-flight attempt.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RecorderPhase::Recording | RecorderPhase::Stopped | RecorderPhase::Uploading
        )
    }

    /// A short human-readable label for status display.
    pub fn label(&self) -> &'static str {
        match self {
            RecorderPhase::Idle => "Ready",
            RecorderPhase::Recording => "Recording",
            RecorderPhase::Stopped => "Finishing",
            RecorderPhase::Uploading => "Analyzing",
            RecorderPhase::Done => "Done",
            RecorderPhase::Failed => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
