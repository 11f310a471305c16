//! Take finalization — downmix, resample, trim, WAV-encode.
//!
//! The transcription service accepts a plain WAV upload; it is happiest
//! with 16 kHz mono (the rate its speech model runs at), so a finished
//! take is converted before upload:
//!
//! ```text
//! interleaved f32 @ device rate → mono → 16 kHz → head-trim → WAV (i16)
//! ```
//!
//! The resampler is linear interpolation (fast, zero extra deps). For
//! better audio quality replace the inner loop with the `rubato` crate
//! (`SincFixedIn` + `BlackmanHarris2` window) — rubato is already listed
//! in `Cargo.toml` for that upgrade path.

use std::io::Cursor;

use thiserror::Error;

/// Upload sample rate expected by the transcription service.
pub const UPLOAD_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// EncodeError
// ---------------------------------------------------------------------------

/// Errors while finalizing a take into a WAV blob.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The take contained no samples (stopped before any audio arrived).
    #[error("recording is empty")]
    EmptyTake,

    /// WAV container writing failed.
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// Channel downmix
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all
/// channels. The output length is `samples.len() / channels`.
///
/// * `channels == 1` returns the input as an owned `Vec` (fast path).
/// * `channels == 0` returns an empty vector.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 000 Hz using
/// linear interpolation.
///
/// Already-16 kHz input is returned unchanged (no interpolation). The
/// output length is approximately `samples.len() × 16_000 / source_rate`.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == UPLOAD_SAMPLE_RATE {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = UPLOAD_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Head trim
// ---------------------------------------------------------------------------

/// Cap a 16 kHz mono take at `max_secs`, keeping the **head**.
///
/// A read-aloud attempt is scored from its beginning; if the child keeps
/// talking past the cap, the tail is what gets dropped.
pub fn trim_to_max_secs(mut samples: Vec<f32>, max_secs: f32) -> Vec<f32> {
    let max_samples = (max_secs * UPLOAD_SAMPLE_RATE as f32) as usize;
    if samples.len() > max_samples {
        log::warn!(
            "take exceeded {max_secs}s cap ({} samples), trimming tail",
            samples.len()
        );
        samples.truncate(max_samples);
    }
    samples
}

// ---------------------------------------------------------------------------
// WAV encoding
// ---------------------------------------------------------------------------

/// Encode 16 kHz mono `f32` samples as an in-memory 16-bit PCM WAV blob.
///
/// # Errors
///
/// [`EncodeError::EmptyTake`] when `samples` is empty; [`EncodeError::Wav`]
/// if the container writer fails.
pub fn encode_wav(samples: &[f32]) -> Result<Vec<u8>, EncodeError> {
    if samples.is_empty() {
        return Err(EncodeError::EmptyTake);
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: UPLOAD_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Full finalization: interleaved device audio → uploadable WAV blob.
pub fn finalize_take(
    samples: &[f32],
    channels: u16,
    source_rate: u32,
    max_secs: f32,
) -> Result<Vec<u8>, EncodeError> {
    let mono = downmix_to_mono(samples, channels);
    let resampled = resample_to_16k(&mono, source_rate);
    let trimmed = trim_to_max_secs(resampled, max_secs);
    encode_wav(&trimmed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix_to_mono ---

    #[test]
    fn mono_passthrough() {
        let samples = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn stereo_averages_frames() {
        let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn zero_channels_yields_empty() {
        assert!(downmix_to_mono(&[0.1, 0.2], 0).is_empty());
    }

    // ---- resample_to_16k ---

    #[test]
    fn same_rate_is_noop() {
        let samples = vec![0.1_f32; 160];
        assert_eq!(resample_to_16k(&samples, 16_000).len(), 160);
    }

    #[test]
    fn downsample_48k_thirds_length() {
        let samples = vec![0.5_f32; 480];
        assert_eq!(resample_to_16k(&samples, 48_000).len(), 160);
    }

    #[test]
    fn resample_empty_is_empty() {
        assert!(resample_to_16k(&[], 48_000).is_empty());
    }

    // ---- trim_to_max_secs ---

    #[test]
    fn short_take_is_untrimmed() {
        let samples = vec![0.0_f32; 16_000]; // 1 s
        assert_eq!(trim_to_max_secs(samples, 2.0).len(), 16_000);
    }

    #[test]
    fn long_take_keeps_head() {
        let mut samples = vec![0.0_f32; 32_000]; // 2 s
        samples[0] = 1.0; // marker at the head
        let trimmed = trim_to_max_secs(samples, 1.0);
        assert_eq!(trimmed.len(), 16_000);
        assert_eq!(trimmed[0], 1.0);
    }

    // ---- encode_wav ---

    #[test]
    fn empty_take_is_rejected() {
        assert!(matches!(encode_wav(&[]), Err(EncodeError::EmptyTake)));
    }

    #[test]
    fn wav_blob_round_trips_through_hound() {
        let samples = vec![0.0_f32, 0.5, -0.5, 1.0];
        let bytes = encode_wav(&samples).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, UPLOAD_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 4);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let bytes = encode_wav(&[2.0, -2.0]).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded[0], i16::MAX);
        assert_eq!(decoded[1], -i16::MAX);
    }

    // ---- finalize_take ---

    #[test]
    fn finalize_produces_wav_header() {
        let samples = vec![0.1_f32; 48_000 * 2]; // 1 s stereo @ 48 kHz
        let bytes = finalize_take(&samples, 2, 48_000, 120.0).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn finalize_empty_take_errors() {
        assert!(matches!(
            finalize_take(&[], 1, 48_000, 120.0),
            Err(EncodeError::EmptyTake)
        ));
    }
}
