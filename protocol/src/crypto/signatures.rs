//! # Digital Signatures
//!
//! Ed25519 signing and verification for witnesses and nonce proofs.
//!
//! Wrapping ed25519-dalek gives us one place to audit every signing
//! operation and one error type for the "the primitive itself could not
//! run" case, which the verifier turns into a plain `false`.

use thiserror::Error;

use super::keys::{PublicKey, Signature, SigningKeypair};

/// Errors raised by the signature primitive itself.
///
/// A signature that simply does not match is NOT an error; see
/// [`verify`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature bytes: expected 64 bytes, got {0}")]
    InvalidSignatureBytes(usize),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Sign a message using a keypair.
///
/// # Example
///
/// ```
/// use agewitness_protocol::crypto::{sign, verify, SigningKeypair};
///
/// let keypair = SigningKeypair::generate();
/// let signature = sign(&keypair, b"hash bytes");
/// assert_eq!(verify(&keypair.public_key(), b"hash bytes", &signature), Ok(true));
/// ```
pub fn sign(keypair: &SigningKeypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature.
///
/// Returns `Ok(true)` for a valid signature, `Ok(false)` for a well-formed
/// signature that does not verify, and `Err` when the key or the signature
/// bytes are malformed.
pub fn verify(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<bool, SignatureError> {
    public_key.verify(message, signature)
}

/// Verify using raw byte components straight off the wire.
pub fn verify_raw(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, SignatureError> {
    let public_key =
        PublicKey::from_slice(public_key_bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
    verify(
        &public_key,
        message,
        &Signature::from_vec(signature_bytes.to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = SigningKeypair::generate();
        let sig = sign(&kp, b"hello, world");
        assert_eq!(verify(&kp.public_key(), b"hello, world", &sig), Ok(true));
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = SigningKeypair::generate();
        let kp2 = SigningKeypair::generate();
        let sig = sign(&kp1, b"test message");
        assert_eq!(verify(&kp2.public_key(), b"test message", &sig), Ok(false));
    }

    #[test]
    fn test_deterministic_signatures() {
        let kp = SigningKeypair::generate();
        assert_eq!(sign(&kp, b"same"), sign(&kp, b"same"));
    }

    #[test]
    fn test_verify_raw_roundtrip() {
        let kp = SigningKeypair::generate();
        let sig = sign(&kp, b"bytes in");
        assert_eq!(
            verify_raw(kp.public_key().as_bytes(), b"bytes in", sig.as_bytes()),
            Ok(true)
        );
    }

    #[test]
    fn test_verify_raw_with_short_pubkey() {
        assert_eq!(
            verify_raw(&[0u8; 31], b"doesn't matter", &[0u8; 64]),
            Err(SignatureError::InvalidPublicKey)
        );
    }

    #[test]
    fn test_verify_raw_with_long_signature() {
        let kp = SigningKeypair::generate();
        assert_eq!(
            verify_raw(kp.public_key().as_bytes(), b"msg", &[0u8; 65]),
            Err(SignatureError::InvalidSignatureBytes(65))
        );
    }

    #[test]
    fn test_empty_message() {
        let kp = SigningKeypair::generate();
        let sig = sign(&kp, b"");
        assert_eq!(verify(&kp.public_key(), b"", &sig), Ok(true));
    }
}
