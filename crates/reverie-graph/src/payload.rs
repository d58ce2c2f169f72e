// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node payload representation.

use reverie_codec::{check_field_len, Canonical, CanonicalEncoder, CodecError};
use serde::{Deserialize, Serialize};

/// The content carried by a reasoning node.
///
/// A closed sum: text for human-readable artifacts (drafts, critiques,
/// specs) and opaque bytes as the sealed extensibility variant. The node's
/// `type_name` is the semantic discriminator; the payload variant only
/// describes the representation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Payload {
    /// UTF-8 text content.
    Utf8(String),
    /// Opaque byte content the core never interprets.
    Opaque(Vec<u8>),
}

impl Payload {
    /// Canonical variant tag for text payloads.
    const TAG_UTF8: u8 = 1;
    /// Canonical variant tag for opaque payloads.
    const TAG_OPAQUE: u8 = 2;

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Utf8(s) => s.len(),
            Self::Opaque(b) => b.len(),
        }
    }

    /// `true` when the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the payload against the canonical encoding bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSerializable`] for oversize payloads.
    pub fn validate(&self) -> Result<(), CodecError> {
        check_field_len(self.len())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_owned())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Utf8(s)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Opaque(bytes)
    }
}

impl Canonical for Payload {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        match self {
            Self::Utf8(s) => {
                enc.put_u8(Self::TAG_UTF8);
                enc.put_str(s);
            }
            Self::Opaque(b) => {
                enc.put_u8(Self::TAG_OPAQUE);
                enc.put_bytes(b);
            }
        }
    }
}
