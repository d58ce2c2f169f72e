// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Utterance lifecycle scenarios: silence → speech → silence, self-voice
//! exclusion with cooldown, and ambient calibration.
#![allow(clippy::unwrap_used, clippy::cast_precision_loss)]

use std::sync::Arc;
use std::time::Duration;

use reverie_codec::{ManualClock, Timestamp};
use reverie_vad::{SpeechDetector, SuggestedAction, VadConfig, VadState};

const FRAME_SAMPLES: usize = 320; // 20 ms at 16 kHz

fn silence_frame() -> Vec<u8> {
    vec![0u8; FRAME_SAMPLES * 2]
}

/// A 440 Hz tone at the given fraction of full scale.
fn tone_frame(amplitude: f64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(FRAME_SAMPLES * 2);
    for i in 0..FRAME_SAMPLES {
        let phase = i as f64 * 2.0 * std::f64::consts::PI * 440.0 / 16_000.0;
        #[allow(clippy::cast_possible_truncation)]
        let sample = (amplitude * f64::from(i16::MAX) * phase.sin()) as i16;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn detector_with_clock() -> (SpeechDetector, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000)));
    let detector = SpeechDetector::with_clock(VadConfig::default(), clock.clone());
    (detector, clock)
}

#[test]
fn silence_speech_silence_completes_one_utterance() {
    let (mut detector, _clock) = detector_with_clock();

    for _ in 0..10 {
        let result = detector.analyze(&silence_frame());
        assert_eq!(result.state, VadState::Silence);
        assert!(!result.has_speech);
        assert_eq!(result.suggested_action, SuggestedAction::DiscardSegment);
    }

    let tone = tone_frame(0.5);
    let mut reached_speaking = false;
    for _ in 0..5 {
        let result = detector.analyze(&tone);
        assert!(result.has_speech);
        reached_speaking |= result.state == VadState::Speaking;
    }
    assert!(reached_speaking);
    assert_eq!(detector.state(), VadState::Speaking);

    let mut completions = 0;
    for _ in 0..20 {
        let result = detector.analyze(&silence_frame());
        if result.is_utterance_complete {
            completions += 1;
            assert_eq!(result.suggested_action, SuggestedAction::Process);
        }
    }
    assert_eq!(completions, 1);
    assert_eq!(detector.state(), VadState::Silence);

    let stats = detector.stats();
    assert_eq!(stats.recent_segments.len(), 1);
    assert!(stats.recent_segments[0].frames >= 8);
    assert!(stats.speech_frames >= 5);
}

#[test]
fn onset_aborts_on_a_single_quiet_frame() {
    let (mut detector, _clock) = detector_with_clock();

    // One loud frame enters onset but does not confirm (onset_frames = 2).
    let result = detector.analyze(&tone_frame(0.5));
    assert_eq!(result.state, VadState::SpeechOnset);
    assert_eq!(result.suggested_action, SuggestedAction::WaitForMore);

    // A quiet frame drops straight back to silence.
    let result = detector.analyze(&silence_frame());
    assert_eq!(result.state, VadState::Silence);
    assert!(!result.is_utterance_complete);
}

#[test]
fn brief_pause_resumes_speaking_without_completion() {
    let (mut detector, _clock) = detector_with_clock();
    let tone = tone_frame(0.5);

    for _ in 0..3 {
        detector.analyze(&tone);
    }
    assert_eq!(detector.state(), VadState::Speaking);

    // Three quiet frames: under offset_frames (8), so no completion yet.
    for _ in 0..3 {
        let result = detector.analyze(&silence_frame());
        assert!(!result.is_utterance_complete);
        assert!(matches!(
            result.state,
            VadState::Pause | VadState::SpeechOffset
        ));
    }

    // Speech resumes; the utterance is still open.
    let result = detector.analyze(&tone);
    assert_eq!(result.state, VadState::Speaking);
    assert_eq!(detector.stats().recent_segments.len(), 0);
}

#[test]
fn self_voice_exclusion_discards_loud_frames() {
    let (mut detector, clock) = detector_with_clock();

    detector.notify_self_speech_started();
    let result = detector.analyze(&tone_frame(0.5));
    assert!(!result.has_speech);
    assert_eq!(result.suggested_action, SuggestedAction::DiscardSegment);
    assert_eq!(result.state, VadState::Silence);

    // Zero cooldown: the next frame is processed normally.
    detector.notify_self_speech_ended(Some(0));
    let result = detector.analyze(&tone_frame(0.5));
    assert!(result.has_speech);

    // Positive cooldown: frames are discarded until the clock passes it.
    detector.notify_self_speech_started();
    detector.notify_self_speech_ended(Some(250));
    let result = detector.analyze(&tone_frame(0.5));
    assert!(!result.has_speech);
    assert_eq!(result.suggested_action, SuggestedAction::DiscardSegment);

    clock.advance(Duration::from_millis(251));
    let result = detector.analyze(&tone_frame(0.5));
    assert!(result.has_speech);
}

#[test]
fn self_speech_start_aborts_utterance_without_completion() {
    let (mut detector, _clock) = detector_with_clock();
    let tone = tone_frame(0.5);
    for _ in 0..4 {
        detector.analyze(&tone);
    }
    assert_eq!(detector.state(), VadState::Speaking);

    detector.notify_self_speech_started();
    assert_eq!(detector.state(), VadState::Silence);

    detector.notify_self_speech_ended(Some(0));
    for _ in 0..20 {
        let result = detector.analyze(&silence_frame());
        assert!(!result.is_utterance_complete);
    }
    assert_eq!(detector.stats().recent_segments.len(), 0);
}

#[test]
fn undersized_frames_are_benign() {
    let (mut detector, _clock) = detector_with_clock();
    let result = detector.analyze(&[0u8; 10]);
    assert!(!result.has_speech);
    assert_eq!(result.suggested_action, SuggestedAction::DiscardSegment);
    assert!((result.energy - 0.0).abs() < f64::EPSILON);
    assert_eq!(detector.stats().total_frames, 1);
}

#[test]
fn calibration_raises_threshold_within_clamp() {
    let (mut detector, _clock) = detector_with_clock();
    let initial = detector.threshold();

    // Loud ambient noise pushes the threshold up, but never past the
    // configured maximum.
    let threshold = detector.calibrate_to_ambient(&tone_frame(0.8));
    assert!(threshold >= initial);
    let config = VadConfig::default();
    assert!(threshold >= config.min_threshold && threshold <= config.max_threshold);

    // Repeated calibration smooths rather than replacing.
    let after_quiet = detector.calibrate_to_ambient(&silence_frame());
    assert!(after_quiet <= threshold);
}

#[test]
fn fingerprint_match_discards_registered_voice() {
    let (mut detector, _clock) = detector_with_clock();
    let own_voice = tone_frame(0.5);

    for _ in 0..4 {
        detector.register_self_voice_audio(&own_voice);
    }

    // The registered tone is treated as self-voice outside any cooldown.
    let result = detector.analyze(&own_voice);
    assert!(!result.has_speech);
    assert_eq!(result.suggested_action, SuggestedAction::DiscardSegment);

    // Clearing the profile lets the same audio through again.
    detector.clear_self_voice_profile();
    let result = detector.analyze(&own_voice);
    assert!(result.has_speech);
}

#[test]
fn reset_state_preserves_adapted_threshold() {
    let (mut detector, _clock) = detector_with_clock();
    detector.calibrate_to_ambient(&tone_frame(0.3));
    let adapted = detector.threshold();

    for _ in 0..3 {
        detector.analyze(&tone_frame(0.8));
    }
    detector.reset_state();
    assert_eq!(detector.state(), VadState::Silence);
    assert!((detector.threshold() - adapted).abs() < f64::EPSILON);
}
