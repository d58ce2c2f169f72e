// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical encoder and the [`Canonical`] trait.
//!
//! The encoder is an append-only byte builder. Records describe their fixed
//! field order by implementing [`Canonical`]; [`compute_hash`] feeds the
//! resulting bytes to BLAKE3 under a domain separator from [`crate::domain`].

use blake3::Hasher;
use thiserror::Error;

use crate::Hash;

/// Upper bound on a single variable-length field.
///
/// Anything larger is refused at record construction with
/// [`CodecError::NotSerializable`] — the substrate stores reasoning
/// artifacts, not bulk media.
pub const MAX_FIELD_LEN: usize = 64 * 1024 * 1024;

/// Errors raised by the codec boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// A payload exceeds the canonical encoding bounds.
    #[error("field of {len} bytes cannot be canonically encoded (max {max})")]
    NotSerializable {
        /// Length of the offending field.
        len: usize,
        /// Maximum encodable length.
        max: usize,
    },
}

/// Checks that a variable-length field fits the canonical bounds.
///
/// Record constructors call this before accepting payload bytes so that
/// encoding itself can stay infallible.
///
/// # Errors
///
/// Returns [`CodecError::NotSerializable`] when `len > MAX_FIELD_LEN`.
pub fn check_field_len(len: usize) -> Result<(), CodecError> {
    if len > MAX_FIELD_LEN {
        return Err(CodecError::NotSerializable {
            len,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

/// Append-only builder for the canonical byte form.
///
/// All multi-byte integers are little-endian. Variable-length fields carry
/// a `u64` length prefix; optional fields carry a one-byte presence tag.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes encoded so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the encoder and returns the canonical bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends a `u8`.
    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Appends a `u32` as 4 little-endian bytes.
    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a `u64` as 8 little-endian bytes.
    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends an element count for a following sequence or map.
    pub fn put_len(&mut self, len: usize) {
        self.put_u64(len as u64);
    }

    /// Appends an `f64` as its IEEE-754 bit pattern (little-endian).
    ///
    /// Never formats floats as text — text is locale-sensitive and not
    /// byte-stable.
    pub fn put_f64_bits(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_le_bytes());
    }

    /// Appends an `f32` as its IEEE-754 bit pattern (little-endian).
    pub fn put_f32_bits(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_bits().to_le_bytes());
    }

    /// Appends a length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Appends a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }

    /// Appends a raw 16-byte identifier (no length prefix — fixed size).
    pub fn put_id(&mut self, id: &[u8; 16]) {
        self.buf.extend_from_slice(id);
    }

    /// Appends a raw 32-byte hash (no length prefix — fixed size).
    pub fn put_hash(&mut self, hash: &Hash) {
        self.buf.extend_from_slice(hash);
    }

    /// Appends an optional `u64`: presence byte, then the value if present.
    pub fn put_opt_u64(&mut self, v: Option<u64>) {
        match v {
            None => self.put_u8(0),
            Some(v) => {
                self.put_u8(1);
                self.put_u64(v);
            }
        }
    }

    /// Appends an optional `f64` bit pattern: presence byte, then the value.
    pub fn put_opt_f64_bits(&mut self, v: Option<f64>) {
        match v {
            None => self.put_u8(0),
            Some(v) => {
                self.put_u8(1);
                self.put_f64_bits(v);
            }
        }
    }

    /// Appends a string map as a count followed by `(key, value)` pairs in
    /// ascending key order.
    ///
    /// Accepts any iterator that is already key-sorted (e.g. `BTreeMap`
    /// iteration). Order-independence over maps is the caller's invariant;
    /// passing an unsorted iterator breaks the hash contract.
    pub fn put_sorted_pairs<'a, I>(&mut self, len: usize, pairs: I)
    where
        I: Iterator<Item = (&'a str, &'a str)>,
    {
        self.put_len(len);
        for (k, v) in pairs {
            self.put_str(k);
            self.put_str(v);
        }
    }
}

/// A record with a canonical byte form.
///
/// Implementations append fields in a fixed order and must route every
/// hashed field through the encoder — a field skipped here is a field an
/// attacker can mutate without detection.
pub trait Canonical {
    /// Appends this record's canonical form to `enc`.
    fn encode_canonical(&self, enc: &mut CanonicalEncoder);
}

/// Returns the canonical bytes of a record (without the domain separator).
///
/// Persistence adapters store exactly these bytes so that hashes round-trip
/// across processes.
#[must_use]
pub fn canonical_bytes<T: Canonical>(value: &T) -> Vec<u8> {
    let mut enc = CanonicalEncoder::new();
    value.encode_canonical(&mut enc);
    enc.into_bytes()
}

/// Computes the BLAKE3 content hash of a record under a domain separator.
#[must_use]
pub fn compute_hash<T: Canonical>(value: &T, domain: &'static [u8]) -> Hash {
    let mut enc = CanonicalEncoder::new();
    value.encode_canonical(&mut enc);
    let mut hasher = Hasher::new();
    hasher.update(domain);
    hasher.update(enc.as_bytes());
    hasher.finalize().into()
}

/// Recomputes a record's hash and compares it to `expected`.
#[must_use]
pub fn verify_hash<T: Canonical>(value: &T, domain: &'static [u8], expected: &Hash) -> bool {
    compute_hash(value, domain) == *expected
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use proptest::prelude::*;

    use super::*;
    use crate::domain;

    struct Record<'a> {
        name: &'a str,
        payload: &'a [u8],
        weight: Option<f64>,
    }

    impl Canonical for Record<'_> {
        fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
            enc.put_str(self.name);
            enc.put_bytes(self.payload);
            enc.put_opt_f64_bits(self.weight);
        }
    }

    #[test]
    fn length_prefix_prevents_field_bleed() {
        // ("ab", "c") and ("a", "bc") must encode differently.
        let a = Record {
            name: "ab",
            payload: b"c",
            weight: None,
        };
        let b = Record {
            name: "a",
            payload: b"bc",
            weight: None,
        };
        assert_ne!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn domain_separation_changes_hash() {
        let r = Record {
            name: "n",
            payload: b"p",
            weight: None,
        };
        assert_ne!(
            compute_hash(&r, domain::NODE_V1),
            compute_hash(&r, domain::EDGE_V1)
        );
    }

    #[test]
    fn verify_matches_compute() {
        let r = Record {
            name: "n",
            payload: b"p",
            weight: Some(0.5),
        };
        let h = compute_hash(&r, domain::NODE_V1);
        assert!(verify_hash(&r, domain::NODE_V1, &h));
        let mut wrong = h;
        wrong[0] ^= 0xff;
        assert!(!verify_hash(&r, domain::NODE_V1, &wrong));
    }

    #[test]
    fn field_len_guard() {
        assert!(check_field_len(MAX_FIELD_LEN).is_ok());
        assert!(matches!(
            check_field_len(MAX_FIELD_LEN + 1),
            Err(CodecError::NotSerializable { .. })
        ));
    }

    #[test]
    fn nan_bit_patterns_are_stable() {
        // Two identical NaN bit patterns hash identically even though
        // NaN != NaN as floats.
        let a = Record {
            name: "n",
            payload: b"",
            weight: Some(f64::NAN),
        };
        let b = Record {
            name: "n",
            payload: b"",
            weight: Some(f64::NAN),
        };
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn golden_vector() {
        // Pins the wire format. If this changes, the encoding changed and
        // needs a new domain version constant.
        let r = Record {
            name: "draft",
            payload: b"draft1",
            weight: Some(0.85),
        };
        let expected = {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&5u64.to_le_bytes());
            bytes.extend_from_slice(b"draft");
            bytes.extend_from_slice(&6u64.to_le_bytes());
            bytes.extend_from_slice(b"draft1");
            bytes.push(1);
            bytes.extend_from_slice(&0.85f64.to_bits().to_le_bytes());
            bytes
        };
        assert_eq!(canonical_bytes(&r), expected);
    }

    proptest! {
        #[test]
        fn hashing_is_pure(name in ".*", payload in proptest::collection::vec(any::<u8>(), 0..256)) {
            let r1 = Record { name: &name, payload: &payload, weight: None };
            let r2 = Record { name: &name, payload: &payload, weight: None };
            prop_assert_eq!(
                compute_hash(&r1, domain::NODE_V1),
                compute_hash(&r2, domain::NODE_V1)
            );
        }

        #[test]
        fn distinct_payloads_distinct_bytes(a in proptest::collection::vec(any::<u8>(), 0..64),
                                            b in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assume!(a != b);
            let ra = Record { name: "n", payload: &a, weight: None };
            let rb = Record { name: "n", payload: &b, weight: None };
            prop_assert_ne!(canonical_bytes(&ra), canonical_bytes(&rb));
        }
    }
}
