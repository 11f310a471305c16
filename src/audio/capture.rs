//! Microphone capture via `cpal`.
//!
//! [`Microphone`] wraps the cpal host/device/stream lifecycle. Call
//! [`Microphone::start`] to begin streaming [`AudioChunk`]s over an mpsc
//! channel. The returned [`StreamHandle`] is a RAII guard — dropping it
//! stops the underlying cpal stream and releases the OS capture device,
//! which is how the recorder guarantees the device is freed on every exit
//! path (normal stop, error, teardown).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]` at the device's native
/// rate; [`crate::audio::encode`] downmixes and resamples a finished take
/// before upload.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the hardware stream and releases the
/// microphone.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// MicrophoneError
// ---------------------------------------------------------------------------

/// Errors while acquiring or running the capture device.
///
/// All of these are fatal to the current item and user-visible — there is
/// no fallback input path when the microphone is denied or missing.
#[derive(Debug, Error)]
pub enum MicrophoneError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Microphone
// ---------------------------------------------------------------------------

/// Capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use lexiscreen::audio::{AudioChunk, Microphone};
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let mic = Microphone::open().unwrap();
/// let _handle = mic.start(tx).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl Microphone {
    /// Open the system default input device.
    ///
    /// Queries the device's preferred stream configuration so no manual
    /// configuration is required.
    ///
    /// # Errors
    ///
    /// Returns [`MicrophoneError::NoDevice`] when no input device is
    /// available, or [`MicrophoneError::DefaultConfig`] when the device
    /// cannot report a default stream configuration.
    pub fn open() -> Result<Self, MicrophoneError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(MicrophoneError::NoDevice)?;

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and send [`AudioChunk`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; send errors
    /// (receiver dropped) are silently ignored so that thread never
    /// panics.
    ///
    /// # Errors
    ///
    /// Returns [`MicrophoneError::BuildStream`] or
    /// [`MicrophoneError::PlayStream`] if the platform rejects the stream
    /// configuration.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, MicrophoneError> {
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = AudioChunk {
                    samples: data.to_vec(),
                };
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(chunk);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each [`AudioChunk`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
