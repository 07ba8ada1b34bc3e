//! # Hashing Utilities
//!
//! The witness protocol uses exactly one composite digest: SHA-256 followed
//! by RIPEMD-160 (a.k.a. "hash160", the same construction Bitcoin uses for
//! addresses). Twenty bytes is enough for a content address, and every peer
//! on the network computes it the same way.
//!
//! - **SHA-256** provides the collision resistance.
//! - **RIPEMD-160** shortens the digest to 20 bytes.
//!
//! Both are RustCrypto implementations from the same `digest` family, so
//! they share one trait and one calling convention.

use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::config::HASH160_LENGTH;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use agewitness_protocol::crypto::sha256;
///
/// let hash = sha256(b"witness");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&result);
    output
}

/// Compute `RIPEMD-160(SHA-256(data))`.
///
/// This is the hash function of the protocol. Witness hashes and signer
/// identity hashes both come out of here.
///
/// # Example
///
/// ```
/// use agewitness_protocol::crypto::sha256_ripemd160;
///
/// let digest = sha256_ripemd160(b"");
/// assert_eq!(digest.to_hex(), "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb");
/// ```
pub fn sha256_ripemd160(data: &[u8]) -> Hash160 {
    Hash160(ripemd160(&sha256(data)))
}

/// Hash multiple byte slices as if they were concatenated.
///
/// Saves the temporary buffer when the input is naturally split, e.g.
/// `(input || salt)`.
pub fn sha256_ripemd160_multi(parts: &[&[u8]]) -> Hash160 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let inner = hasher.finalize();
    Hash160(ripemd160(&inner))
}

// ---------------------------------------------------------------------------
// Hash160
// ---------------------------------------------------------------------------

/// A 20-byte SHA-256+RIPEMD-160 digest.
///
/// Used as the witness store key and as the signer identity hash. Serializes
/// as a lowercase hex string so JSON documents stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash160([u8; HASH160_LENGTH]);

/// Errors from parsing a [`Hash160`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Hash160Error {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid digest length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl Hash160 {
    /// Wraps raw digest bytes.
    pub const fn from_bytes(bytes: [u8; HASH160_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parses a digest from a byte slice of exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Hash160Error> {
        let arr: [u8; HASH160_LENGTH] = bytes
            .try_into()
            .map_err(|_| Hash160Error::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parses a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, Hash160Error> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH160_LENGTH] {
        &self.0
    }

    /// Returns the lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Hash160 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash160 {
    type Err = Hash160Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; HASH160_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}
