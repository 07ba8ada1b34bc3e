//! # Witness Module
//!
//! Account age witnesses: a signed record binding the hash of a payment
//! account to the date it was first seen and to the identity that signed it.
//!
//! - **types** — `Witness`, `AccountAge` and the collaborator traits.
//! - **deriver** — account bytes to 20-byte witness hash.
//! - **store** — deduplicating in-memory cache, first writer wins.
//! - **publisher** — builds, signs and submits the local witness.
//! - **verifier** — the authentication chain for a peer's claim.
//! - **age** — age and category of a witness or an offer's witness.

pub mod age;
pub mod deriver;
pub mod publisher;
pub mod store;
pub mod types;
pub mod verifier;

pub use deriver::{derive_hash, derive_hash_hex, witness_hash_for, witness_hash_hex_for};
pub use publisher::{PublishOutcome, WitnessPublisher};
pub use store::WitnessStore;
pub use types::{AccountAge, OfferWitnessRef, PaymentAccountPayload, RawAccountPayload, Witness};
pub use verifier::{encode_nonce, VerificationFailure, WitnessVerifier};
