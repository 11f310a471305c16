//! Audio — microphone capture and take finalization.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix_to_mono
//!           → resample_to_16k → trim_to_max_secs → encode_wav → upload
//! ```

pub mod capture;
pub mod encode;

pub use capture::{AudioChunk, Microphone, MicrophoneError, StreamHandle};
pub use encode::{
    downmix_to_mono, encode_wav, finalize_take, resample_to_16k, trim_to_max_secs, EncodeError,
    UPLOAD_SAMPLE_RATE,
};
