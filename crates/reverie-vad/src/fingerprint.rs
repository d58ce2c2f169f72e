// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-voice acoustic fingerprint.
//!
//! A rolling, bounded baseline of low-dimensional frame features. Matching
//! compares a candidate frame against the baseline by cosine similarity in
//! a baseline-normalized space: each dimension is divided by the baseline
//! mean for that dimension, so a candidate identical to the baseline maps
//! to the all-ones vector and similarity 1.0. This keeps the large
//! speaking-rate dimension from drowning out the small RMS dimension.

use serde::{Deserialize, Serialize};

/// One frame's contribution to the self-voice baseline.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct FingerprintSample {
    /// Normalized RMS energy.
    pub rms: f64,
    /// Zero-crossing rate.
    pub zcr: f64,
    /// Dominant-frequency proxy in hertz (`zcr * sample_rate / 2`).
    pub speaking_rate: f64,
    /// Peak-to-peak amplitude, normalized.
    pub dynamic_range: f64,
    /// Frame duration in milliseconds.
    pub duration_ms: f64,
}

impl FingerprintSample {
    const DIMS: usize = 5;

    fn as_array(&self) -> [f64; Self::DIMS] {
        [
            self.rms,
            self.zcr,
            self.speaking_rate,
            self.dynamic_range,
            self.duration_ms,
        ]
    }
}

/// Rolling bounded baseline of self-voice samples.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelfVoiceProfile {
    samples: Vec<FingerprintSample>,
    max_samples: usize,
}

impl SelfVoiceProfile {
    /// Samples required before matching activates; below this the profile
    /// never matches anything.
    const MIN_SAMPLES: usize = 3;

    /// Creates an empty profile bounded at `max_samples`.
    #[must_use]
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::new(),
            max_samples: max_samples.max(1),
        }
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when no samples have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a sample, evicting the oldest once the bound is reached.
    pub fn register(&mut self, sample: FingerprintSample) {
        if self.samples.len() == self.max_samples {
            self.samples.remove(0);
        }
        self.samples.push(sample);
    }

    /// Drops all retained samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Baseline mean over each feature dimension, or `None` while the
    /// profile is below its minimum sample count.
    #[must_use]
    fn baseline(&self) -> Option<[f64; FingerprintSample::DIMS]> {
        if self.samples.len() < Self::MIN_SAMPLES {
            return None;
        }
        let mut mean = [0.0f64; FingerprintSample::DIMS];
        for sample in &self.samples {
            for (acc, v) in mean.iter_mut().zip(sample.as_array()) {
                *acc += v;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.samples.len() as f64;
        for acc in &mut mean {
            *acc /= n;
        }
        Some(mean)
    }

    /// Cosine similarity between `candidate` and the baseline, in the
    /// baseline-normalized space. `None` while the profile is unprimed.
    #[must_use]
    pub fn similarity(&self, candidate: &FingerprintSample) -> Option<f64> {
        const EPS: f64 = 1e-9;
        let baseline = self.baseline()?;

        let normalized: Vec<f64> = candidate
            .as_array()
            .iter()
            .zip(baseline)
            .map(|(c, b)| c / b.abs().max(EPS))
            .collect();

        let dot: f64 = normalized.iter().sum();
        let mag: f64 = normalized.iter().map(|v| v * v).sum::<f64>().sqrt();
        #[allow(clippy::cast_precision_loss)]
        let ones_mag = (FingerprintSample::DIMS as f64).sqrt();
        if mag < EPS {
            return Some(0.0);
        }
        Some((dot / (mag * ones_mag)).clamp(-1.0, 1.0))
    }

    /// `true` when `candidate` matches the baseline at or above
    /// `threshold`.
    #[must_use]
    pub fn matches(&self, candidate: &FingerprintSample, threshold: f64) -> bool {
        self.similarity(candidate)
            .is_some_and(|similarity| similarity >= threshold)
    }
}
