//! # Key Ring
//!
//! The peer identity as the witness subsystem sees it: a signature public
//! key and the ability to sign with the matching private key. Key storage,
//! rotation and encryption-at-rest belong to whoever implements the trait.

use crate::crypto::hash::Hash160;
use crate::crypto::keys::{PublicKey, Signature, SigningKeypair};
use crate::crypto::signatures::SignatureError;

/// Source of the local peer's signing identity.
///
/// Implementations must be shareable across request handlers.
pub trait KeyRing: Send + Sync {
    /// The public half of the signature keypair.
    fn public_key(&self) -> PublicKey;

    /// Signs `message` with the private half of the signature keypair.
    ///
    /// Fallible so that hardware- or vault-backed key rings can report
    /// a failure instead of panicking.
    fn sign(&self, message: &[u8]) -> Result<Signature, SignatureError>;

    /// Hash of the signature public key, as committed to in witnesses.
    fn identity_hash(&self) -> Hash160 {
        self.public_key().identity_hash()
    }
}

/// In-process key ring holding an Ed25519 keypair in memory.
#[derive(Debug, Clone)]
pub struct LocalKeyRing {
    keypair: SigningKeypair,
}

impl LocalKeyRing {
    /// Wraps an existing keypair.
    pub fn new(keypair: SigningKeypair) -> Self {
        Self { keypair }
    }

    /// Creates a key ring with a freshly generated keypair.
    pub fn generate() -> Self {
        Self::new(SigningKeypair::generate())
    }

    /// The wrapped keypair.
    pub fn keypair(&self) -> &SigningKeypair {
        &self.keypair
    }
}

impl KeyRing for LocalKeyRing {
    fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SignatureError> {
        Ok(self.keypair.sign(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_key_ring_signs_with_its_key() {
        let ring = LocalKeyRing::generate();
        let sig = ring.sign(b"payload").unwrap();
        assert_eq!(ring.public_key().verify(b"payload", &sig), Ok(true));
    }

    #[test]
    fn identity_hash_matches_public_key() {
        let ring = LocalKeyRing::new(SigningKeypair::from_seed(&[1u8; 32]));
        assert_eq!(ring.identity_hash(), ring.public_key().identity_hash());
    }

    #[test]
    fn public_key_is_reachable_through_the_trait() {
        fn key_of<K: KeyRing + ?Sized>(ring: &K) -> PublicKey {
            ring.public_key()
        }

        let keypair = SigningKeypair::from_seed(&[2u8; 32]);
        let ring: Box<dyn KeyRing> = Box::new(LocalKeyRing::new(keypair.clone()));
        assert_eq!(key_of(ring.as_ref()), keypair.public_key());
    }
}
