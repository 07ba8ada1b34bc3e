//! # Witness Publisher
//!
//! Builds, signs and submits the local peer's witness for a payment account.
//!
//! ```text
//! hash      = witness_hash(account)
//! signer    = hash160(local signature public key)
//! signature = sign(local private key, hash)
//! witness   = { hash, signer, signature, date = now }
//! ```
//!
//! If a witness for the account hash is already known, nothing is submitted:
//! the earliest witness is the valuable one and the network keeps the first
//! writer anyway. Failures are logged and returned once. Retrying is the
//! caller's business.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::WitnessError;
use crate::identity::KeyRing;
use crate::network::payload::{NetworkPayload, PayloadStore};
use crate::witness::deriver::witness_hash_for;
use crate::witness::store::WitnessStore;
use crate::witness::types::{PaymentAccountPayload, Witness};

/// What a publish call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new witness was built and handed to the payload store.
    Submitted(Witness),
    /// A witness with this hash was already in the witness store.
    AlreadyPresent,
}

/// Publishes witnesses for the local peer.
pub struct WitnessPublisher<K, S>
where
    K: KeyRing,
    S: PayloadStore + ?Sized,
{
    key_ring: Arc<K>,
    payloads: Arc<S>,
    store: Arc<WitnessStore>,
}

impl<K, S> WitnessPublisher<K, S>
where
    K: KeyRing,
    S: PayloadStore + ?Sized,
{
    /// Creates a publisher over the given collaborators.
    pub fn new(key_ring: Arc<K>, payloads: Arc<S>, store: Arc<WitnessStore>) -> Self {
        Self {
            key_ring,
            payloads,
            store,
        }
    }

    /// Builds and signs a witness dated `now_ms` without submitting it.
    pub fn build_witness<P>(&self, payload: &P, now_ms: i64) -> Result<Witness, WitnessError>
    where
        P: PaymentAccountPayload + ?Sized,
    {
        let hash = witness_hash_for(payload);
        let signer_identity_hash = self.key_ring.identity_hash();
        let signature = self.key_ring.sign(hash.as_bytes()).map_err(|e| {
            error!(hash = %hash, error = %e, "signing account age witness failed");
            WitnessError::from(e)
        })?;
        Ok(Witness::new(hash, signer_identity_hash, signature, now_ms))
    }

    /// Publishes the witness for `payload`, dated now.
    pub fn publish<P>(&self, payload: &P) -> Result<PublishOutcome, WitnessError>
    where
        P: PaymentAccountPayload + ?Sized,
    {
        self.publish_at(payload, Utc::now().timestamp_millis())
    }

    /// Publishes the witness for `payload` with an explicit date.
    pub fn publish_at<P>(&self, payload: &P, now_ms: i64) -> Result<PublishOutcome, WitnessError>
    where
        P: PaymentAccountPayload + ?Sized,
    {
        let witness = self.build_witness(payload, now_ms)?;
        if self.store.contains(witness.hash()) {
            debug!(hash = %witness.hash(), "witness already present, not publishing");
            return Ok(PublishOutcome::AlreadyPresent);
        }

        self.payloads
            .submit(NetworkPayload::AccountAgeWitness(witness.clone()))
            .map_err(|e| {
                error!(hash = %witness.hash(), error = %e, "submitting account age witness failed");
                WitnessError::from(e)
            })?;

        info!(hash = %witness.hash(), date = witness.date(), "account age witness published");
        Ok(PublishOutcome::Submitted(witness))
    }
}
