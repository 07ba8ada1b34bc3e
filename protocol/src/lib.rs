// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Account Age Witness — Core Library
//!
//! Lets peers in a decentralized trading network prove how long a payment
//! account has existed, with no trusted third party. An account owner
//! publishes a signed witness binding the hash of their account data to a
//! date and to the hash of their public key. Other peers verify the witness
//! against the account data the owner presents, and scale trade limits by
//! the witness's age.
//!
//! ## Architecture
//!
//! - **crypto** — SHA-256 → RIPEMD-160 hashing and Ed25519 signatures.
//! - **identity** — the key ring seam: whoever holds the signing key.
//! - **witness** — derivation, the deduplicating store, publishing,
//!   verification and age.
//! - **trade** — fiat classification and the fade-in trade limit policy.
//! - **network** — payload envelope, the payload store seam and the feed
//!   that keeps the witness store current.
//! - **storage** — sled-backed payload store for a local node.
//! - **config** — protocol constants and overridable policy.
//!
//! ## Ground Rules
//!
//! 1. A mismatch is an answer, not an error. Verification returns a tagged
//!    failure or `false`; it never panics on hostile input.
//! 2. The first witness for an account hash wins, in memory and on disk.
//! 3. Limits are integer arithmetic. No floats near money.

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod network;
pub mod storage;
pub mod trade;
pub mod witness;

pub use error::WitnessError;
