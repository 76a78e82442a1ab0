//! Fixed-length content digests.
//!
//! Every revision in a tree is identified by a 20-byte [`Hash`], and every
//! blob a revision describes is referenced by one. Hashes order by raw byte
//! value, which is also the lexicographic order of their hex text, so sorted
//! sets of hashes print in the same order they compare.
//!
//! Revision identity uses BLAKE3 in extendable-output mode truncated to
//! [`Hash::LEN`] bytes. Content hashes are produced by whoever stores the blob
//! and are treated here as opaque 20-byte values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from parsing a hash from its hex text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HashParseError {
    /// Input was not exactly `2 * Hash::LEN` characters.
    #[error("expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Required number of characters.
        expected: usize,
        /// Number of characters supplied.
        actual: usize,
    },

    /// Input contained a non-hex character.
    #[error("invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// A 20-byte digest with a lowercase-hex text form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash, Default)]
pub struct Hash([u8; Hash::LEN]);

impl Hash {
    /// Digest length in bytes.
    pub const LEN: usize = 20;

    /// The all-zero hash.
    pub const ZERO: Self = Self([0; Self::LEN]);

    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Digest arbitrary bytes.
    #[must_use]
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(bytes);
        Self::from_hasher(&hasher)
    }

    /// Finish an in-progress BLAKE3 hasher into a truncated digest.
    #[must_use]
    pub fn from_hasher(hasher: &blake3::Hasher) -> Self {
        let mut out = [0u8; Self::LEN];
        hasher.finalize_xof().fill(&mut out);
        Self(out)
    }

    /// Lowercase hex text of the digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters, for log lines and terse output.
    #[must_use]
    pub fn short(&self, len: usize) -> String {
        let mut text = self.to_hex();
        text.truncate(len.min(Self::LEN * 2));
        text
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN * 2 {
            return Err(HashParseError::InvalidLength {
                expected: Self::LEN * 2,
                actual: s.len(),
            });
        }
        let mut out = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl From<[u8; Hash::LEN]> for Hash {
    fn from(bytes: [u8; Hash::LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let hash = Hash::digest(b"hello");
        let text = hash.to_string();
        assert_eq!(text.len(), 40);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(text.parse::<Hash>().unwrap(), hash);
    }

    #[test]
    fn uppercase_input_is_accepted() {
        let hash = Hash::digest(b"case");
        let upper = hash.to_hex().to_uppercase();
        assert_eq!(upper.parse::<Hash>().unwrap(), hash);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(Hash::digest(b"abc"), Hash::digest(b"abc"));
        assert_ne!(Hash::digest(b"abc"), Hash::digest(b"abd"));
    }

    #[test]
    fn ordering_is_bytewise() {
        let low = Hash::from_bytes([0; 20]);
        let mut bytes = [0; 20];
        bytes[19] = 1;
        let mid = Hash::from_bytes(bytes);
        bytes[0] = 1;
        let high = Hash::from_bytes(bytes);
        assert!(low < mid);
        assert!(mid < high);
        assert!(low.to_string() < mid.to_string());
    }

    #[test]
    fn wrong_length_rejected() {
        let err = "abcd".parse::<Hash>().unwrap_err();
        assert_eq!(
            err,
            HashParseError::InvalidLength {
                expected: 40,
                actual: 4
            }
        );
    }

    #[test]
    fn non_hex_rejected() {
        let text = "zz".repeat(20);
        assert!(matches!(
            text.parse::<Hash>(),
            Err(HashParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn parse_errors_compare() {
        let bad = "zz".repeat(20);
        let first = bad.parse::<Hash>().unwrap_err();
        let second = bad.parse::<Hash>().unwrap_err();
        assert_eq!(first, second);
        assert!(first.to_string().starts_with("invalid hex digest"));
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = Hash::digest(b"serde");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn short_prefix() {
        let hash = Hash::digest(b"short");
        assert_eq!(hash.short(8), hash.to_hex()[..8]);
        assert_eq!(hash.short(100).len(), 40);
    }
}
