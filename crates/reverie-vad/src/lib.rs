// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adaptive speech-activity detection.
//!
//! A frame-level energy + zero-crossing-rate detector with a five-state
//! machine, noise-floor adaptation, and self-voice exclusion (timed
//! cooldown plus an optional acoustic fingerprint). One detector instance
//! per audio stream; instances are deliberately not thread-safe.
//!
//! Input is 16-bit little-endian mono PCM. There are no error returns:
//! invalid input yields a benign "no speech, discard" result, because an
//! audio pipeline that stops on a short frame is worse than one that
//! skips it.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod detector;
mod fingerprint;
mod frame;
mod result;

pub use config::VadConfig;
pub use detector::{SpeechDetector, VadObserver, VadStats};
pub use fingerprint::{FingerprintSample, SelfVoiceProfile};
pub use frame::{decode_samples, dynamic_range, rms_energy, zero_crossing_rate};
pub use result::{AnalysisResult, SpeechSegment, SuggestedAction, VadState};
