// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The adaptive speech detector.
//!
//! # State machine
//!
//! ```text
//!            energy >= T                onset_frames consecutive >= T
//! Silence ───────────────> SpeechOnset ─────────────────────────────> Speaking
//!    ^                          │ any frame < T                           │ energy < T
//!    │                          v                                        v
//!    │                       Silence                                   Pause
//!    │                                                                   │ next frame < T
//!    │         offset_frames consecutive < T                             v
//!    └────────────────────────────────────────────────────────── SpeechOffset
//!                     (emits utterance_complete)        (energy >= T resumes Speaking)
//! ```
//!
//! The threshold adapts: non-speech frames pull the noise floor toward the
//! low quantile of recent energies, and the threshold follows at
//! `noise_floor * speech_to_noise_ratio`, clamped to the configured band.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use reverie_codec::{Clock, SystemClock, Timestamp};

use crate::config::VadConfig;
use crate::fingerprint::{FingerprintSample, SelfVoiceProfile};
use crate::frame::{decode_samples, dynamic_range, rms_energy, zero_crossing_rate};
use crate::result::{AnalysisResult, SpeechSegment, SuggestedAction, VadState};

/// Confidence multiplier applied when the ZCR falls outside the speech
/// plausibility band.
const ZCR_IMPLAUSIBLE_FACTOR: f64 = 0.6;

/// Quantile of the energy history the noise floor adapts toward.
const NOISE_QUANTILE: f64 = 0.2;

/// Subscriber interface for utterance boundaries.
///
/// Fired synchronously from inside `analyze`, in the order the triggering
/// frames arrive. Handlers must not call back into the detector.
pub trait VadObserver: Send + Sync {
    /// Called once per completed utterance, with the finished segment.
    fn on_utterance_complete(&self, segment: &SpeechSegment);
}

/// Running detector statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VadStats {
    /// Frames offered to `analyze`, including discarded ones.
    pub total_frames: u64,
    /// Frames that carried (non-self) speech energy.
    pub speech_frames: u64,
    /// `speech_frames / total_frames`, or 0 before the first frame.
    pub speech_ratio: f64,
    /// Current state machine position.
    pub current_state: VadState,
    /// Current adapted noise floor.
    pub noise_floor: f64,
    /// Current adapted threshold.
    pub threshold: f64,
    /// Most recently completed segments, oldest first, bounded.
    pub recent_segments: Vec<SpeechSegment>,
}

/// In-progress speech span, promoted to a [`SpeechSegment`] on completion.
#[derive(Clone, Copy, Debug)]
struct SegmentProgress {
    started_at_frame: u64,
    frames: u64,
    peak_energy: f64,
}

/// Frame-level speech activity detector.
///
/// One instance per audio stream; not thread-safe by design — wrap the
/// whole instance if a stream's frames arrive from multiple threads.
pub struct SpeechDetector {
    config: VadConfig,
    clock: Arc<dyn Clock + Send + Sync>,
    state: VadState,
    noise_floor: f64,
    threshold: f64,
    energy_history: VecDeque<f64>,
    consecutive_speech_frames: u32,
    consecutive_silence_frames: u32,
    self_speech_in_progress: bool,
    self_voice_active_until: Option<Timestamp>,
    profile: SelfVoiceProfile,
    total_frames: u64,
    speech_frames: u64,
    current_segment: Option<SegmentProgress>,
    recent_segments: VecDeque<SpeechSegment>,
    observers: Vec<Arc<dyn VadObserver>>,
}

impl std::fmt::Debug for SpeechDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechDetector")
            .field("state", &self.state)
            .field("noise_floor", &self.noise_floor)
            .field("threshold", &self.threshold)
            .field("total_frames", &self.total_frames)
            .finish()
    }
}

impl Default for SpeechDetector {
    fn default() -> Self {
        Self::new(VadConfig::default())
    }
}

impl SpeechDetector {
    /// Creates a detector on the wall clock.
    #[must_use]
    pub fn new(config: VadConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a detector on an injected clock (tests drive time
    /// explicitly instead of sleeping through cooldowns).
    #[must_use]
    pub fn with_clock(config: VadConfig, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let threshold = config.min_threshold;
        let profile = SelfVoiceProfile::new(config.max_fingerprint_samples);
        Self {
            config,
            clock,
            state: VadState::Silence,
            noise_floor: 0.0,
            threshold,
            energy_history: VecDeque::new(),
            consecutive_speech_frames: 0,
            consecutive_silence_frames: 0,
            self_speech_in_progress: false,
            self_voice_active_until: None,
            profile,
            total_frames: 0,
            speech_frames: 0,
            current_segment: None,
            recent_segments: VecDeque::new(),
            observers: Vec::new(),
        }
    }

    /// Registers a synchronous observer for utterance boundaries.
    pub fn subscribe(&mut self, observer: Arc<dyn VadObserver>) {
        self.observers.push(observer);
    }

    /// Current state machine position.
    #[must_use]
    pub fn state(&self) -> VadState {
        self.state
    }

    /// Current adapted threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Analyzes one 16-bit LE mono PCM frame.
    ///
    /// Never fails: undersized frames and self-voice frames return a
    /// benign discard result.
    pub fn analyze(&mut self, frame: &[u8]) -> AnalysisResult {
        self.total_frames += 1;

        if frame.len() < self.config.min_frame_bytes {
            trace!(len = frame.len(), "frame under minimum, discarded");
            return AnalysisResult::discard(self.state, 0.0);
        }

        let samples = decode_samples(frame);
        let energy = rms_energy(&samples);
        let zcr = zero_crossing_rate(&samples);

        if self.self_voice_active() || self.matches_self_voice(&samples, energy, zcr) {
            self.abort_utterance();
            return AnalysisResult::discard(VadState::Silence, energy);
        }

        self.push_energy(energy);
        let is_speech_energy = energy >= self.threshold;
        let utterance_complete = self.advance_state(is_speech_energy);
        self.track_segment(energy, utterance_complete);

        if !is_speech_energy {
            self.adapt_noise_floor();
        }

        let has_speech = is_speech_energy
            && matches!(self.state, VadState::SpeechOnset | VadState::Speaking);
        if has_speech {
            self.speech_frames += 1;
        }

        let suggested_action = if utterance_complete {
            SuggestedAction::Process
        } else {
            match self.state {
                VadState::Speaking => SuggestedAction::Process,
                VadState::SpeechOnset | VadState::Pause | VadState::SpeechOffset => {
                    SuggestedAction::WaitForMore
                }
                VadState::Silence => SuggestedAction::DiscardSegment,
            }
        };

        AnalysisResult {
            has_speech,
            state: self.state,
            energy,
            confidence: self.confidence(has_speech, energy, zcr),
            suggested_action,
            is_utterance_complete: utterance_complete,
        }
    }

    /// Runs one step of the state machine; returns `true` when an
    /// utterance closed on this frame.
    fn advance_state(&mut self, is_speech_energy: bool) -> bool {
        let previous = self.state;
        let mut utterance_complete = false;

        match self.state {
            VadState::Silence => {
                if is_speech_energy {
                    self.consecutive_speech_frames = 1;
                    self.state = if self.consecutive_speech_frames >= self.config.onset_frames {
                        VadState::Speaking
                    } else {
                        VadState::SpeechOnset
                    };
                }
            }
            VadState::SpeechOnset => {
                if is_speech_energy {
                    self.consecutive_speech_frames += 1;
                    if self.consecutive_speech_frames >= self.config.onset_frames {
                        self.state = VadState::Speaking;
                    }
                } else {
                    self.consecutive_speech_frames = 0;
                    self.state = VadState::Silence;
                }
            }
            VadState::Speaking => {
                if !is_speech_energy {
                    self.consecutive_silence_frames = 1;
                    if self.consecutive_silence_frames >= self.config.offset_frames {
                        utterance_complete = true;
                        self.close_utterance();
                    } else {
                        self.state = VadState::Pause;
                    }
                }
            }
            VadState::Pause | VadState::SpeechOffset => {
                if is_speech_energy {
                    self.consecutive_silence_frames = 0;
                    self.state = VadState::Speaking;
                } else {
                    self.consecutive_silence_frames += 1;
                    if self.consecutive_silence_frames >= self.config.offset_frames {
                        utterance_complete = true;
                        self.close_utterance();
                    } else {
                        self.state = VadState::SpeechOffset;
                    }
                }
            }
        }

        if previous != self.state {
            trace!(?previous, current = ?self.state, "state transition");
        }
        utterance_complete
    }

    /// Transitions to `Silence` after a confirmed utterance end.
    fn close_utterance(&mut self) {
        self.state = VadState::Silence;
        self.consecutive_speech_frames = 0;
        self.consecutive_silence_frames = 0;
        debug!(frames = self.current_segment.map_or(0, |s| s.frames), "utterance complete");
    }

    /// Segment bookkeeping for the current frame.
    fn track_segment(&mut self, energy: f64, utterance_complete: bool) {
        match self.state {
            VadState::Speaking | VadState::Pause | VadState::SpeechOffset => {
                let segment = self.current_segment.get_or_insert(SegmentProgress {
                    started_at_frame: self.total_frames,
                    frames: 0,
                    peak_energy: 0.0,
                });
                segment.frames += 1;
                segment.peak_energy = segment.peak_energy.max(energy);
            }
            VadState::Silence | VadState::SpeechOnset => {}
        }

        if utterance_complete {
            if let Some(progress) = self.current_segment.take() {
                if self.recent_segments.len() == self.config.max_recent_segments {
                    self.recent_segments.pop_front();
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let segment = SpeechSegment {
                    started_at_frame: progress.started_at_frame,
                    frames: progress.frames + 1, // include the closing frame
                    peak_energy_micros: (progress.peak_energy * 1e6) as u64,
                };
                self.recent_segments.push_back(segment);
                for observer in &self.observers {
                    observer.on_utterance_complete(&segment);
                }
            }
        }
    }

    /// Appends to the bounded energy history.
    fn push_energy(&mut self, energy: f64) {
        if self.energy_history.len() == self.config.energy_history_len {
            self.energy_history.pop_front();
        }
        self.energy_history.push_back(energy);
    }

    /// EMA step toward the low quantile of recent energies; recomputes the
    /// clamped threshold.
    fn adapt_noise_floor(&mut self) {
        let Some(quantile) = self.energy_quantile(NOISE_QUANTILE) else {
            return;
        };
        self.noise_floor += self.config.adaptation_rate * (quantile - self.noise_floor);
        self.recompute_threshold();
    }

    fn recompute_threshold(&mut self) {
        self.threshold = (self.noise_floor * self.config.speech_to_noise_ratio)
            .clamp(self.config.min_threshold, self.config.max_threshold);
    }

    fn energy_quantile(&self, q: f64) -> Option<f64> {
        if self.energy_history.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.energy_history.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    /// One-shot ambient calibration from a reference frame.
    ///
    /// The first calibration adopts the frame's energy as the noise floor;
    /// repeated calibrations smooth toward it rather than replacing it.
    /// Returns the resulting threshold.
    pub fn calibrate_to_ambient(&mut self, frame: &[u8]) -> f64 {
        if frame.len() >= self.config.min_frame_bytes {
            let energy = rms_energy(&decode_samples(frame));
            self.push_energy(energy);
            self.noise_floor = if self.noise_floor == 0.0 {
                energy
            } else {
                (self.noise_floor + energy) / 2.0
            };
            self.recompute_threshold();
            debug!(noise_floor = self.noise_floor, threshold = self.threshold, "calibrated");
        }
        self.threshold
    }

    /// Marks the start of the agent's own speech output.
    ///
    /// Forces the state machine to `Silence` (any in-progress utterance is
    /// dropped without an `utterance_complete` signal) and discards every
    /// subsequent frame until [`notify_self_speech_ended`] plus its
    /// cooldown have passed.
    ///
    /// [`notify_self_speech_ended`]: SpeechDetector::notify_self_speech_ended
    pub fn notify_self_speech_started(&mut self) {
        self.self_speech_in_progress = true;
        self.self_voice_active_until = None;
        self.abort_utterance();
        debug!("self speech started, exclusion active");
    }

    /// Marks the end of the agent's own speech output.
    ///
    /// The exclusion flag stays active for `cooldown_ms` (or the
    /// configured default when `None`) to swallow echo tails.
    pub fn notify_self_speech_ended(&mut self, cooldown_ms: Option<u64>) {
        self.self_speech_in_progress = false;
        let cooldown = cooldown_ms.unwrap_or(self.config.self_voice_cooldown_ms);
        self.self_voice_active_until =
            Some(self.clock.now().saturating_add(Duration::from_millis(cooldown)));
        debug!(cooldown_ms = cooldown, "self speech ended, cooldown armed");
    }

    /// Feeds a frame of known self-voice audio into the acoustic
    /// fingerprint baseline.
    pub fn register_self_voice_audio(&mut self, frame: &[u8]) {
        if frame.len() < self.config.min_frame_bytes {
            return;
        }
        let samples = decode_samples(frame);
        let sample = self.fingerprint_of(&samples, rms_energy(&samples), zero_crossing_rate(&samples));
        self.profile.register(sample);
    }

    /// Drops the self-voice fingerprint and resets acoustic adaptation to
    /// its initial state (noise floor, threshold, energy history).
    pub fn clear_self_voice_profile(&mut self) {
        self.profile.clear();
        self.noise_floor = 0.0;
        self.energy_history.clear();
        self.recompute_threshold();
    }

    /// Returns the state machine to `Silence` and clears exclusion flags.
    ///
    /// Adapted noise floor and threshold are preserved; use
    /// [`clear_self_voice_profile`] for a full acoustic reset.
    ///
    /// [`clear_self_voice_profile`]: SpeechDetector::clear_self_voice_profile
    pub fn reset_state(&mut self) {
        self.abort_utterance();
        self.self_speech_in_progress = false;
        self.self_voice_active_until = None;
    }

    /// Running statistics.
    #[must_use]
    pub fn stats(&self) -> VadStats {
        #[allow(clippy::cast_precision_loss)]
        let speech_ratio = if self.total_frames == 0 {
            0.0
        } else {
            self.speech_frames as f64 / self.total_frames as f64
        };
        VadStats {
            total_frames: self.total_frames,
            speech_frames: self.speech_frames,
            speech_ratio,
            current_state: self.state,
            noise_floor: self.noise_floor,
            threshold: self.threshold,
            recent_segments: self.recent_segments.iter().copied().collect(),
        }
    }

    /// `true` while the timed exclusion window is open.
    fn self_voice_active(&self) -> bool {
        self.self_speech_in_progress
            || self
                .self_voice_active_until
                .is_some_and(|until| self.clock.now() < until)
    }

    /// Fingerprint gate: matches the frame against the registered
    /// baseline, if primed.
    fn matches_self_voice(&self, samples: &[i16], energy: f64, zcr: f64) -> bool {
        if self.profile.is_empty() {
            return false;
        }
        let candidate = self.fingerprint_of(samples, energy, zcr);
        self.profile
            .matches(&candidate, self.config.fingerprint_similarity_threshold)
    }

    fn fingerprint_of(&self, samples: &[i16], energy: f64, zcr: f64) -> FingerprintSample {
        #[allow(clippy::cast_precision_loss)]
        let duration_ms = samples.len() as f64 * 1_000.0 / f64::from(self.config.sample_rate_hz);
        FingerprintSample {
            rms: energy,
            zcr,
            speaking_rate: zcr * f64::from(self.config.sample_rate_hz) / 2.0,
            dynamic_range: dynamic_range(samples),
            duration_ms,
        }
    }

    /// Drops any in-progress utterance and returns to `Silence` without
    /// emitting a completion signal.
    fn abort_utterance(&mut self) {
        self.state = VadState::Silence;
        self.consecutive_speech_frames = 0;
        self.consecutive_silence_frames = 0;
        self.current_segment = None;
    }

    fn confidence(&self, has_speech: bool, energy: f64, zcr: f64) -> f64 {
        if !has_speech {
            return 0.0;
        }
        // Bounded in [0, 1): ratio 1 scores 0.5, rising asymptotically.
        let ratio = energy / self.threshold;
        let base = 1.0 - 1.0 / (1.0 + ratio);

        let zcr_factor = if !self.config.zcr_enabled {
            1.0
        } else {
            let (low, high) = self.config.zcr_speech_band;
            if (low..=high).contains(&zcr) {
                1.0
            } else {
                ZCR_IMPLAUSIBLE_FACTOR
            }
        };
        (base * zcr_factor).clamp(0.0, 1.0)
    }
}
