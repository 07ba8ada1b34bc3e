//! # Identity Module
//!
//! Every peer is identified by an Ed25519 signature keypair. Witnesses never
//! carry the raw public key; they carry its SHA-256+RIPEMD-160 hash, and the
//! peer presents the key itself when it claims the witness during a trade.

pub mod key_ring;

pub use key_ring::{KeyRing, LocalKeyRing};
