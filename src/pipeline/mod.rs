//! Item pipeline — capture, phase tracking, remote analysis.
//!
//! One assessment item flows through three pieces:
//!
//! * [`RecorderPhase`] — the observable state machine
//!   (`Idle → Recording → Stopped → Uploading → Done | Failed`).
//! * [`ItemRecorder`] — owns the microphone and the take; enforces the
//!   single-flight recording rule.
//! * [`ItemRunner`] — transcribe → normalize → compare → score, emitting
//!   an [`ItemOutcome`] or nothing.

pub mod recorder;
pub mod runner;
pub mod state;

pub use recorder::{ItemRecorder, RecordError};
pub use runner::{ItemError, ItemOutcome, ItemRunner};
pub use state::RecorderPhase;
