// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame analysis results and detector state.

use serde::{Deserialize, Serialize};

/// Detector state machine position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum VadState {
    /// No speech in progress.
    #[default]
    Silence,
    /// Supra-threshold energy seen, onset not yet confirmed.
    SpeechOnset,
    /// Confirmed speech.
    Speaking,
    /// First sub-threshold frame after speech — possibly just a gap.
    Pause,
    /// Sustained sub-threshold energy, utterance closing.
    SpeechOffset,
}

/// What the caller should do with the analyzed frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SuggestedAction {
    /// Drop the frame: too small, self-voice, or sustained silence.
    DiscardSegment,
    /// Buffer the frame: onset seen but not yet confirmed.
    WaitForMore,
    /// Forward the frame (or the buffered utterance) downstream.
    Process,
}

/// Result of analyzing one frame.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether this frame carries (non-self) speech energy.
    pub has_speech: bool,
    /// Detector state after processing the frame.
    pub state: VadState,
    /// Normalized RMS energy of the frame, `[0, 1]`.
    pub energy: f64,
    /// Speech confidence, `[0, 1]`; zero whenever `has_speech` is false.
    pub confidence: f64,
    /// Recommended handling for the frame.
    pub suggested_action: SuggestedAction,
    /// `true` exactly once per utterance, on the closing frame.
    pub is_utterance_complete: bool,
}

impl AnalysisResult {
    /// The benign result returned for undersized or excluded frames.
    #[must_use]
    pub(crate) fn discard(state: VadState, energy: f64) -> Self {
        Self {
            has_speech: false,
            state,
            energy,
            confidence: 0.0,
            suggested_action: SuggestedAction::DiscardSegment,
            is_utterance_complete: false,
        }
    }
}

/// A completed span of speech.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Frame index (since detector creation) where speech was confirmed.
    pub started_at_frame: u64,
    /// Number of frames from confirmation through the closing frame.
    pub frames: u64,
    /// Peak normalized energy observed during the segment, scaled by 1e6.
    ///
    /// Stored as an integer so segments stay `Eq` and hashable.
    pub peak_energy_micros: u64,
}
