//! # Witness Verification
//!
//! Authenticates a peer's claim that a stored witness belongs to the payment
//! account they present, and that they hold the key that signed it.
//!
//! ## Checks
//!
//! Run in this order, stopping at the first failure:
//!
//! 1. **Epoch**: the witness is dated after the release date minus one day
//!    of clock-skew tolerance. Rejects back-dated witnesses.
//! 2. **Identity binding**: `hash160(peer key)` equals the witness's signer
//!    identity hash.
//! 3. **Hash**: the claimed account bytes hash to the witness hash.
//! 4. **Witness signature**: the peer key signed that hash.
//! 5. **Nonce signature**: the peer key signed the verifier's fresh nonce.
//!
//! Each check is public so callers can pinpoint a failure. A mismatch is a
//! [`VerificationFailure`], never a panic. Malformed keys or signatures that
//! keep the primitive from running become [`VerificationFailure::MalformedCrypto`].
//!
//! Verification holds no mutable state; the same inputs always give the same
//! answer.

use thiserror::Error;
use tracing::warn;

use crate::config::{PolicyConfig, CLOCK_SKEW_TOLERANCE_MS, WITNESS_RELEASE_DATE_MS};
use crate::crypto::hash::Hash160;
use crate::crypto::keys::{PublicKey, Signature};
use crate::crypto::signatures::SignatureError;
use crate::witness::deriver::{derive_hash_with_salt, witness_hash_for, TRACE_TARGET};
use crate::witness::types::{OfferWitnessRef, PaymentAccountPayload, Witness};

// ---------------------------------------------------------------------------
// Failure Type
// ---------------------------------------------------------------------------

/// Which check rejected a witness claim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("witness is dated before the feature release")]
    PredatesRelease,

    #[error("peer key does not match the witness signer")]
    IdentityMismatch,

    #[error("account data does not match the witness hash")]
    HashMismatch,

    #[error("witness signature does not verify")]
    InvalidWitnessSignature,

    #[error("nonce signature does not verify")]
    InvalidNonceSignature,

    #[error("malformed cryptographic input: {0}")]
    MalformedCrypto(#[source] SignatureError),
}

impl VerificationFailure {
    /// Short stable label, used for metrics and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PredatesRelease => "predates_release",
            Self::IdentityMismatch => "identity_mismatch",
            Self::HashMismatch => "hash_mismatch",
            Self::InvalidWitnessSignature => "invalid_witness_signature",
            Self::InvalidNonceSignature => "invalid_nonce_signature",
            Self::MalformedCrypto(_) => "malformed_crypto",
        }
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// Stateless witness verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitnessVerifier {
    release_date_ms: i64,
}

impl Default for WitnessVerifier {
    fn default() -> Self {
        Self::new(WITNESS_RELEASE_DATE_MS)
    }
}

impl WitnessVerifier {
    pub fn new(release_date_ms: i64) -> Self {
        Self { release_date_ms }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(policy.release_date_ms)
    }

    /// Earliest date a witness may carry, exclusive.
    pub fn earliest_valid_date_ms(&self) -> i64 {
        self.release_date_ms.saturating_sub(CLOCK_SKEW_TOLERANCE_MS)
    }

    /// Full verification, reporting the first failing check.
    pub fn verify_detailed(
        &self,
        claimed_input: &[u8],
        witness: &Witness,
        claimed_salt: &[u8],
        peer_key: &PublicKey,
        nonce: i32,
        nonce_signature: &Signature,
    ) -> Result<(), VerificationFailure> {
        self.check_epoch(witness)?;
        self.check_identity_binding(peer_key, witness)?;
        let recomputed = self.check_hash(claimed_input, claimed_salt, witness)?;
        self.check_witness_signature(peer_key, &recomputed, witness.signature())?;
        self.check_nonce_signature(peer_key, nonce, nonce_signature)
    }

    /// Full verification as a plain predicate.
    pub fn verify(
        &self,
        claimed_input: &[u8],
        witness: &Witness,
        claimed_salt: &[u8],
        peer_key: &PublicKey,
        nonce: i32,
        nonce_signature: &Signature,
    ) -> bool {
        self.verify_detailed(
            claimed_input,
            witness,
            claimed_salt,
            peer_key,
            nonce,
            nonce_signature,
        )
        .is_ok()
    }

    /// Check 1: the witness is not back-dated past the release.
    pub fn check_epoch(&self, witness: &Witness) -> Result<(), VerificationFailure> {
        if witness.date() > self.earliest_valid_date_ms() {
            return Ok(());
        }
        warn!(
            target: TRACE_TARGET,
            hash = %witness.hash(),
            date = witness.date(),
            earliest = self.earliest_valid_date_ms(),
            "witness predates release"
        );
        Err(VerificationFailure::PredatesRelease)
    }

    /// Check 2: the presenting peer is the witness signer.
    pub fn check_identity_binding(
        &self,
        peer_key: &PublicKey,
        witness: &Witness,
    ) -> Result<(), VerificationFailure> {
        let peer_identity = peer_key.identity_hash();
        if peer_identity == *witness.signer_identity_hash() {
            return Ok(());
        }
        warn!(
            target: TRACE_TARGET,
            peer_key = %peer_key.to_hex(),
            peer_identity = %peer_identity,
            signer_identity = %witness.signer_identity_hash(),
            "peer identity does not match witness signer"
        );
        Err(VerificationFailure::IdentityMismatch)
    }

    /// Check 3: the claimed account data hashes to the witness hash.
    ///
    /// Returns the recomputed hash for the signature check.
    pub fn check_hash(
        &self,
        claimed_input: &[u8],
        claimed_salt: &[u8],
        witness: &Witness,
    ) -> Result<Hash160, VerificationFailure> {
        let recomputed = derive_hash_with_salt(claimed_input, claimed_salt);
        if recomputed == *witness.hash() {
            return Ok(recomputed);
        }
        warn!(
            target: TRACE_TARGET,
            input = %hex::encode(claimed_input),
            salt = %hex::encode(claimed_salt),
            recomputed = %recomputed,
            witness_hash = %witness.hash(),
            "claimed account data does not match witness hash"
        );
        Err(VerificationFailure::HashMismatch)
    }

    /// Check 4: the peer key signed the witness hash.
    pub fn check_witness_signature(
        &self,
        peer_key: &PublicKey,
        hash: &Hash160,
        signature: &Signature,
    ) -> Result<(), VerificationFailure> {
        self.check_signature(peer_key, hash.as_bytes(), signature)
            .map_err(|failure| match failure {
                SignatureCheck::Mismatch => VerificationFailure::InvalidWitnessSignature,
                SignatureCheck::Malformed(e) => VerificationFailure::MalformedCrypto(e),
            })
    }

    /// Check 5: the peer key signed the verifier's nonce.
    pub fn check_nonce_signature(
        &self,
        peer_key: &PublicKey,
        nonce: i32,
        nonce_signature: &Signature,
    ) -> Result<(), VerificationFailure> {
        self.check_signature(peer_key, &encode_nonce(nonce), nonce_signature)
            .map_err(|failure| match failure {
                SignatureCheck::Mismatch => VerificationFailure::InvalidNonceSignature,
                SignatureCheck::Malformed(e) => VerificationFailure::MalformedCrypto(e),
            })
    }

    fn check_signature(
        &self,
        peer_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<(), SignatureCheck> {
        match peer_key.verify(message, signature) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    target: TRACE_TARGET,
                    peer_key = %peer_key.to_hex(),
                    message = %hex::encode(message),
                    signature = %signature.to_hex(),
                    "signature does not verify"
                );
                Err(SignatureCheck::Mismatch)
            }
            Err(e) => {
                warn!(
                    target: TRACE_TARGET,
                    peer_key = %peer_key.to_hex(),
                    message = %hex::encode(message),
                    signature = %signature.to_hex(),
                    error = %e,
                    "signature verification could not run"
                );
                Err(SignatureCheck::Malformed(e))
            }
        }
    }
}

enum SignatureCheck {
    Mismatch,
    Malformed(SignatureError),
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encodes a nonce the way peers sign it: minimal big-endian two's
/// complement, at least one byte.
///
/// ```
/// use agewitness_protocol::witness::verifier::encode_nonce;
///
/// assert_eq!(encode_nonce(0), vec![0x00]);
/// assert_eq!(encode_nonce(128), vec![0x00, 0x80]);
/// assert_eq!(encode_nonce(-1), vec![0xff]);
/// ```
pub fn encode_nonce(nonce: i32) -> Vec<u8> {
    let bytes = nonce.to_be_bytes();
    let mut start = 0;
    // Drop a leading byte while the next one still carries the sign.
    while start < bytes.len() - 1 {
        let sign_extension = match bytes[start] {
            0x00 => bytes[start + 1] & 0x80 == 0,
            0xff => bytes[start + 1] & 0x80 != 0,
            _ => false,
        };
        if !sign_extension {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Checks the witness hash an offer advertises against the account the
/// maker presents.
pub fn verify_offer_witness_hash<P>(payload: &P, offer_witness_hash: &[u8]) -> bool
where
    P: PaymentAccountPayload + ?Sized,
{
    let derived = witness_hash_for(payload);
    if derived.as_bytes().as_slice() == offer_witness_hash {
        return true;
    }
    warn!(
        target: TRACE_TARGET,
        derived = %derived,
        advertised = %hex::encode(offer_witness_hash),
        "offer witness hash does not match payment account"
    );
    false
}

/// [`verify_offer_witness_hash`] for an offer carrying a hex hash. An offer
/// without one fails.
pub fn verify_offer_witness<P, O>(payload: &P, offer: &O) -> bool
where
    P: PaymentAccountPayload + ?Sized,
    O: OfferWitnessRef + ?Sized,
{
    match offer.account_age_witness_hash().map(hex::decode) {
        Some(Ok(bytes)) => verify_offer_witness_hash(payload, &bytes),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
