// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property checks: result bounds hold for arbitrary byte input, and the
//! adapted threshold never leaves its configured band.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use reverie_vad::{SpeechDetector, VadConfig};

proptest! {
    /// For any input bytes — valid PCM or garbage — energy and confidence
    /// stay within their documented bounds and analyze never panics.
    #[test]
    fn result_bounds_hold_for_arbitrary_bytes(
        frames in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..1024),
            1..32,
        ),
    ) {
        let mut detector = SpeechDetector::new(VadConfig::default());
        for frame in &frames {
            let result = detector.analyze(frame);
            prop_assert!(result.energy >= 0.0 && result.energy <= 1.0);
            prop_assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
            if !result.has_speech {
                prop_assert!(result.confidence == 0.0);
            }
        }
    }

    /// The adapted threshold stays inside `[min_threshold, max_threshold]`
    /// through any mix of analysis and calibration.
    #[test]
    fn threshold_stays_clamped(
        frames in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 64..512),
            1..48,
        ),
        calibrate_every in 1usize..8,
    ) {
        let config = VadConfig::default();
        let (min, max) = (config.min_threshold, config.max_threshold);
        let mut detector = SpeechDetector::new(config);

        for (i, frame) in frames.iter().enumerate() {
            if i % calibrate_every == 0 {
                detector.calibrate_to_ambient(frame);
            } else {
                detector.analyze(frame);
            }
            let threshold = detector.threshold();
            prop_assert!(threshold >= min && threshold <= max);
        }
    }

    /// Total frame count in stats matches the number of analyze calls,
    /// and the speech ratio is a valid fraction.
    #[test]
    fn stats_are_consistent(
        frames in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..256),
            0..24,
        ),
    ) {
        let mut detector = SpeechDetector::new(VadConfig::default());
        for frame in &frames {
            detector.analyze(frame);
        }
        let stats = detector.stats();
        prop_assert_eq!(stats.total_frames, frames.len() as u64);
        prop_assert!(stats.speech_frames <= stats.total_frames);
        prop_assert!((0.0..=1.0).contains(&stats.speech_ratio));
    }
}
