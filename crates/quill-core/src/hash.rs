//! BLAKE3 hashing for envelope identifiers.
//!
//! The refhash is the BLAKE3 content address of an envelope, computed once
//! at creation time and never recomputed (see `envelope::compute_refhash`
//! for the exact input layout).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Length of a BLAKE3 hash output in bytes (256 bits).
pub const HASH_LEN: usize = 32;

/// A refhash: the BLAKE3 content address of an envelope (32 bytes).
///
/// Unique across all envelopes; used as the primary key of the envelope
/// store and as the cross-record reference for replies and moderations.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Refhash([u8; HASH_LEN]);

impl Refhash {
    /// Compute the BLAKE3 hash of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Self(*h.as_bytes())
    }

    /// Compute the BLAKE3 hash of several byte slices fed in order.
    ///
    /// Equivalent to hashing the concatenation of the parts.
    pub fn digest_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a Refhash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of this refhash.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Encode as lowercase hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a Refhash from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidRefhash(e.to_string()))?;
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            Error::InvalidRefhash(format!("expected {HASH_LEN} bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Refhash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Refhash({})", self.to_hex())
    }
}

impl std::fmt::Display for Refhash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Refhash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Refhash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Refhash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
