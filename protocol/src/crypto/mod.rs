//! # Cryptographic Primitives
//!
//! Everything security-related in the witness protocol flows through here:
//!
//! - **SHA-256 → RIPEMD-160** for witness hashes and signer identity hashes.
//! - **Ed25519** for witness signatures and nonce proofs.
//!
//! These are thin, type-safe wrappers around audited implementations. No
//! home-grown cryptography.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha256, sha256_ripemd160, Hash160, Hash160Error};
pub use keys::{KeyError, PublicKey, Signature, SigningKeypair};
pub use signatures::{sign, verify, verify_raw, SignatureError};
