// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! PCM frame feature extraction.
//!
//! Frames are 16-bit little-endian mono. A trailing odd byte is ignored
//! rather than rejected — upstream ring buffers routinely split frames on
//! odd boundaries.

/// Decodes little-endian 16-bit samples, ignoring a trailing odd byte.
#[must_use]
pub fn decode_samples(frame: &[u8]) -> Vec<i16> {
    frame
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Root-mean-square energy normalized to `[0, 1]` against full-scale
/// 16-bit amplitude. Empty input is zero energy.
#[must_use]
pub fn rms_energy(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples
        .iter()
        .map(|s| {
            let v = f64::from(*s);
            v * v
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum_squares / samples.len() as f64;
    (mean.sqrt() / f64::from(i16::MAX)).clamp(0.0, 1.0)
}

/// Fraction of adjacent sample pairs whose signs differ, in `[0, 1]`.
///
/// Zero samples count as non-negative, so silence has a ZCR of zero.
#[must_use]
pub fn zero_crossing_rate(samples: &[i16]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] < 0) != (pair[1] < 0))
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        crossings as f64 / (samples.len() - 1) as f64
    }
}

/// Peak-to-peak amplitude normalized to `[0, 1]`.
#[must_use]
pub fn dynamic_range(samples: &[i16]) -> f64 {
    let Some(max) = samples.iter().max() else {
        return 0.0;
    };
    let Some(min) = samples.iter().min() else {
        return 0.0;
    };
    (f64::from(*max) - f64::from(*min)) / (f64::from(i16::MAX) - f64::from(i16::MIN))
}
