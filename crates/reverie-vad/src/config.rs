// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Detector configuration.

use serde::{Deserialize, Serialize};

/// Tunables for [`SpeechDetector`].
///
/// The defaults are the reference operating point for 16 kHz close-mic
/// speech; deployments override individual fields rather than rebuilding
/// the whole struct.
///
/// [`SpeechDetector`]: crate::SpeechDetector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VadConfig {
    /// Input sample rate in hertz.
    pub sample_rate_hz: u32,
    /// Frames shorter than this many bytes are discarded unanalyzed.
    pub min_frame_bytes: usize,
    /// Consecutive supra-threshold frames required to confirm speech onset.
    pub onset_frames: u32,
    /// Consecutive sub-threshold frames required to close an utterance.
    pub offset_frames: u32,
    /// Bound on the rolling frame-energy history.
    pub energy_history_len: usize,
    /// EMA rate for noise-floor adaptation, in `(0, 1]`.
    pub adaptation_rate: f64,
    /// Threshold is `noise_floor * speech_to_noise_ratio`, clamped below.
    pub speech_to_noise_ratio: f64,
    /// Lower clamp for the adapted threshold.
    pub min_threshold: f64,
    /// Upper clamp for the adapted threshold.
    pub max_threshold: f64,
    /// Whether zero-crossing rate participates in confidence scoring.
    pub zcr_enabled: bool,
    /// ZCR band considered plausible for speech, `[low, high]`.
    pub zcr_speech_band: (f64, f64),
    /// Default echo-tail cooldown after self-speech ends, in milliseconds.
    pub self_voice_cooldown_ms: u64,
    /// Cosine similarity at or above which a frame counts as self-voice.
    pub fingerprint_similarity_threshold: f64,
    /// Bound on retained fingerprint samples.
    pub max_fingerprint_samples: usize,
    /// Bound on the recent completed-segment list.
    pub max_recent_segments: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            min_frame_bytes: 64,
            onset_frames: 2,
            offset_frames: 8,
            energy_history_len: 100,
            adaptation_rate: 0.02,
            speech_to_noise_ratio: 2.5,
            min_threshold: 0.015,
            max_threshold: 0.15,
            zcr_enabled: true,
            zcr_speech_band: (0.02, 0.35),
            self_voice_cooldown_ms: 400,
            fingerprint_similarity_threshold: 0.82,
            max_fingerprint_samples: 12,
            max_recent_segments: 16,
        }
    }
}
