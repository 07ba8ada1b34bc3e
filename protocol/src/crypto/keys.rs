//! # Key Management
//!
//! Ed25519 keypairs, public keys and signatures for witness signing.
//!
//! Every account owner signs their witnesses with the signature key of their
//! peer identity. The public key travels with trade messages; its
//! SHA-256+RIPEMD-160 hash is what a witness commits to.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses `OsRng`.
//! - Key bytes are never logged. Public keys and signatures may be, through
//!   the structured diagnostics in the verifier.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::{sha256_ripemd160, Hash160};
use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// An Ed25519 signing keypair.
///
/// Does NOT implement `Serialize`. Writing a private key somewhere should be
/// a deliberate act; use [`secret_key_bytes`](Self::secret_key_bytes).
///
/// # Examples
///
/// ```
/// use agewitness_protocol::crypto::keys::SigningKeypair;
///
/// let kp = SigningKeypair::generate();
/// let sig = kp.sign(b"witness hash");
/// assert!(kp.public_key().verify(b"witness hash", &sig).unwrap());
/// ```
pub struct SigningKeypair {
    signing_key: SigningKey,
}

/// Raw bytes of an Ed25519 public key as received from a peer.
///
/// Not validated on construction: keys arrive off the wire and a malformed
/// key must surface as a verification failure, not as a parse panic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; VERIFYING_KEY_LENGTH],
}

/// An Ed25519 signature as carried on the wire.
///
/// Always 64 bytes when produced locally; remote signatures may be any
/// length, and verification rejects those with [`SignatureError`].
///
/// [`SignatureError`]: super::signatures::SignatureError
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl SigningKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Exports the raw 32-byte secret key. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl Clone for SigningKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material, not even partially.
        write!(f, "SigningKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Wraps raw public key bytes.
    pub fn from_bytes(bytes: [u8; VERIFYING_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parses a public key from a slice of exactly 32 bytes.
    ///
    /// Only the length is checked here; curve validity is checked when the
    /// key is used.
    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; VERIFYING_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_slice(&bytes)
    }

    /// The byte encoding hashed into a witness's signer identity.
    pub fn as_bytes(&self) -> &[u8; VERIFYING_KEY_LENGTH] {
        &self.bytes
    }

    /// SHA-256+RIPEMD-160 of the raw key bytes.
    pub fn identity_hash(&self) -> Hash160 {
        sha256_ripemd160(&self.bytes)
    }

    /// Convert to a `VerifyingKey`. Fails for bytes that are not a point on
    /// the curve.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        VerifyingKey::from_bytes(&self.bytes).map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Verify a signature against this public key.
    ///
    /// `Ok(false)` is an honest mismatch. `Err` means the key or the
    /// signature bytes are malformed and the primitive could not even run.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool, super::signatures::SignatureError> {
        use super::signatures::SignatureError;

        let verifying_key = self
            .to_verifying_key()
            .map_err(|_| SignatureError::InvalidPublicKey)?;
        let dalek_sig = signature
            .to_dalek_signature()
            .ok_or(SignatureError::InvalidSignatureBytes(signature.len()))?;
        Ok(verifying_key.verify(message, &dalek_sig).is_ok())
    }

    /// Hex-encoded representation. 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Wraps signature bytes of any length.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded signature. Length is not checked.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self {
            bytes: hex::decode(s.trim())?,
        })
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the signature, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of signature bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the signature carries no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `None` unless the bytes are exactly 64 long.
    pub fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; SIGNATURE_LENGTH] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }

    /// Hex-encoded signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signatures::SignatureError;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = SigningKeypair::generate();
        let sig = kp.sign(b"witness");
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert_eq!(kp.public_key().verify(b"witness", &sig), Ok(true));
    }

    #[test]
    fn wrong_message_is_honest_mismatch() {
        let kp = SigningKeypair::generate();
        let sig = kp.sign(b"correct");
        assert_eq!(kp.public_key().verify(b"wrong", &sig), Ok(false));
    }

    #[test]
    fn truncated_signature_is_malformed() {
        let kp = SigningKeypair::generate();
        let sig = Signature::from_vec(vec![1, 2, 3]);
        assert_eq!(
            kp.public_key().verify(b"msg", &sig),
            Err(SignatureError::InvalidSignatureBytes(3))
        );
    }

    #[test]
    fn test_roundtrip_hex_secret() {
        let kp = SigningKeypair::generate();
        let restored = SigningKeypair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_invalid_secret_hex_rejected() {
        assert_eq!(
            SigningKeypair::from_hex("deadbeef").unwrap_err(),
            KeyError::InvalidSecretKey
        );
        assert!(SigningKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = SigningKeypair::generate().public_key();
        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
        assert!(PublicKey::from_hex("abcd").is_err());
    }

    #[test]
    fn identity_hash_is_hash160_of_raw_key() {
        let pk = SigningKeypair::from_seed(&[7u8; 32]).public_key();
        assert_eq!(pk.identity_hash(), sha256_ripemd160(pk.as_bytes()));
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        assert_eq!(
            SigningKeypair::from_seed(&seed).public_key(),
            SigningKeypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = SigningKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("SigningKeypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_key_bytes())));
    }
}
