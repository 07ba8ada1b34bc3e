//! # Network Payloads
//!
//! The witness subsystem does not own transport or replication. It talks to
//! a [`PayloadStore`]: something that holds the replicated collection of
//! persistable network payloads, accepts new ones for broadcast, and notifies
//! subscribers whenever a payload arrives.
//!
//! Witnesses are one payload kind among many. Everything that is not a
//! witness is carried as [`NetworkPayload::Other`] and ignored here.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::PAYLOAD_CHANNEL_CAPACITY;
use crate::witness::types::Witness;

/// A persistable payload replicated across the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkPayload {
    /// An account age witness.
    AccountAgeWitness(Witness),
    /// Any payload kind the witness subsystem does not interpret.
    Other {
        /// Payload kind tag.
        kind: String,
        /// Opaque payload bytes.
        data: Vec<u8>,
    },
}

impl NetworkPayload {
    /// The witness inside this payload, if it is one.
    pub fn as_witness(&self) -> Option<&Witness> {
        match self {
            Self::AccountAgeWitness(w) => Some(w),
            Self::Other { .. } => None,
        }
    }

    /// Consumes the payload, returning the witness if it is one.
    pub fn into_witness(self) -> Option<Witness> {
        match self {
            Self::AccountAgeWitness(w) => Some(w),
            Self::Other { .. } => None,
        }
    }

    /// Storage key: the witness hash for witnesses, the raw data otherwise.
    pub fn storage_key(&self) -> Vec<u8> {
        match self {
            Self::AccountAgeWitness(w) => w.hash().as_bytes().to_vec(),
            Self::Other { kind, data } => {
                let mut key = Vec::with_capacity(kind.len() + 1 + data.len());
                key.extend_from_slice(kind.as_bytes());
                key.push(0x00);
                key.extend_from_slice(data);
                key
            }
        }
    }
}

/// Errors reported by a payload store.
#[derive(Debug, Error)]
pub enum PayloadStoreError {
    #[error("payload store unavailable: {0}")]
    Unavailable(String),

    #[error("payload rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// The external network data store.
///
/// Implementations must call every subscriber once per newly added payload,
/// and must not notify for payloads they already held.
pub trait PayloadStore: Send + Sync {
    /// Every payload currently known, in no particular order.
    fn enumerate(&self) -> Result<Vec<NetworkPayload>, PayloadStoreError>;

    /// Adds a payload locally and hands it to the network for broadcast.
    fn submit(&self, payload: NetworkPayload) -> Result<(), PayloadStoreError>;

    /// Subscribes to payloads added after this call.
    fn subscribe(&self) -> broadcast::Receiver<NetworkPayload>;
}

// ---------------------------------------------------------------------------
// InMemoryPayloadStore
// ---------------------------------------------------------------------------

/// Payload store kept entirely in memory.
///
/// Stands in for the replicated network store in tests and single-process
/// setups. Network arrivals are simulated with [`receive`](Self::receive).
pub struct InMemoryPayloadStore {
    payloads: RwLock<HashMap<Vec<u8>, NetworkPayload>>,
    events: broadcast::Sender<NetworkPayload>,
    submitted: RwLock<Vec<NetworkPayload>>,
}

impl InMemoryPayloadStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(PAYLOAD_CHANNEL_CAPACITY);
        Self {
            payloads: RwLock::new(HashMap::new()),
            events,
            submitted: RwLock::new(Vec::new()),
        }
    }

    /// Simulates a payload arriving from a remote peer.
    ///
    /// Returns `false` if the payload was already known.
    pub fn receive(&self, payload: NetworkPayload) -> bool {
        self.add(payload)
    }

    /// Payloads handed to [`submit`](PayloadStore::submit), in order.
    pub fn submitted(&self) -> Vec<NetworkPayload> {
        self.submitted.read().clone()
    }

    /// Number of payloads held.
    pub fn len(&self) -> usize {
        self.payloads.read().len()
    }

    /// True when no payload is held.
    pub fn is_empty(&self) -> bool {
        self.payloads.read().is_empty()
    }

    fn add(&self, payload: NetworkPayload) -> bool {
        let key = payload.storage_key();
        {
            let mut payloads = self.payloads.write();
            if payloads.contains_key(&key) {
                return false;
            }
            payloads.insert(key, payload.clone());
        }
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(payload);
        true
    }
}

impl Default for InMemoryPayloadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn enumerate(&self) -> Result<Vec<NetworkPayload>, PayloadStoreError> {
        Ok(self.payloads.read().values().cloned().collect())
    }

    fn submit(&self, payload: NetworkPayload) -> Result<(), PayloadStoreError> {
        self.submitted.write().push(payload.clone());
        if !self.add(payload) {
            debug!("submitted payload already known locally");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkPayload> {
        self.events.subscribe()
    }
}
