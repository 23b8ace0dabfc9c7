//! # Bitrate Calculation Module
//!
//! Calcola il bitrate video necessario per stare sotto una dimensione target.
//!
//! ## Formula:
//! `bitrate = (target_bytes * 8 - audio_bps * durata) / durata`
//!
//! Il target passato è già ridotto rispetto al limite nominale (9 MiB per un
//! tetto di 10 MiB) per lasciare margine all'overhead del container.

use crate::error::ValidationError;

/// Nominal upload ceiling the compression targets
pub const SIZE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

/// Target handed to the calculator, below the ceiling to absorb mux overhead
pub const TARGET_SIZE_BYTES: u64 = 9 * 1024 * 1024;

/// Audio budget; matches the `-b:a 128k` given to the encoder
pub const AUDIO_BITRATE_BPS: u64 = 128_000;

/// Video bitrate (bits/s) that fits `target_size_bytes` once audio is accounted for
pub fn target_video_bitrate(
    duration_seconds: u64,
    target_size_bytes: u64,
    audio_bitrate_bps: u64,
) -> Result<u64, ValidationError> {
    if duration_seconds == 0 {
        return Err(ValidationError::NonPositiveDuration(duration_seconds));
    }

    let duration = i128::from(duration_seconds);
    let total_bits = i128::from(target_size_bytes) * 8;
    let audio_bits = i128::from(audio_bitrate_bps) * duration;
    let bitrate = (total_bits - audio_bits) / duration;

    if bitrate <= 0 {
        return Err(ValidationError::NonPositiveBitrate {
            bitrate: i64::try_from(bitrate).unwrap_or(i64::MIN),
            duration: duration_seconds,
        });
    }

    u64::try_from(bitrate).map_err(|_| ValidationError::NonPositiveBitrate {
        bitrate: i64::MAX,
        duration: duration_seconds,
    })
}

/// Expected output size in bytes for the given stream bitrates
pub fn estimated_output_size(
    duration_seconds: u64,
    video_bitrate_bps: u64,
    audio_bitrate_bps: u64,
) -> u64 {
    (video_bitrate_bps + audio_bitrate_bps) * duration_seconds / 8
}
