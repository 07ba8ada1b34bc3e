//! # WitnessDb — Persistent Payload Store
//!
//! A local, sled-backed [`PayloadStore`]. It persists every network payload
//! this node has seen so that a restart can re-seed the in-memory witness
//! store without waiting for peers.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                      | Value                     |
//! |-------------|--------------------------|---------------------------|
//! | `witnesses` | witness hash (20 bytes)  | `bincode(Witness)`        |
//! | `payloads`  | `kind \0 data`           | `bincode(NetworkPayload)` |
//!
//! Inserts use `compare_and_swap` against an absent value, so first-writer-
//! wins holds on disk just as it does in memory, even with several handles
//! writing at once.

use sled::{Db, Tree};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::PAYLOAD_CHANNEL_CAPACITY;
use crate::network::payload::{NetworkPayload, PayloadStore, PayloadStoreError};
use crate::witness::types::Witness;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for PayloadStoreError {
    fn from(e: DbError) -> Self {
        PayloadStoreError::Storage(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// WitnessDb
// ---------------------------------------------------------------------------

/// Persistent payload store.
///
/// sled is thread-safe; share a `WitnessDb` via `Arc` or clone it (clones
/// share the same database and notification channel).
#[derive(Debug, Clone)]
pub struct WitnessDb {
    db: Db,
    witnesses: Tree,
    payloads: Tree,
    events: broadcast::Sender<NetworkPayload>,
}

impl WitnessDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database, removed when dropped. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let witnesses = db.open_tree("witnesses")?;
        let payloads = db.open_tree("payloads")?;
        let (events, _) = broadcast::channel(PAYLOAD_CHANNEL_CAPACITY);
        Ok(Self {
            db,
            witnesses,
            payloads,
            events,
        })
    }

    /// Stores a payload unless one with the same key exists, then notifies
    /// subscribers. Returns `true` if the payload was new.
    ///
    /// This is also the entry point for payloads delivered by the transport.
    pub fn put_payload(&self, payload: &NetworkPayload) -> DbResult<bool> {
        let tree = match payload {
            NetworkPayload::AccountAgeWitness(_) => &self.witnesses,
            NetworkPayload::Other { .. } => &self.payloads,
        };
        let value = match payload {
            NetworkPayload::AccountAgeWitness(w) => bincode::serialize(w),
            other => bincode::serialize(other),
        }
        .map_err(|e| DbError::Serialization(e.to_string()))?;

        let swapped =
            tree.compare_and_swap(payload.storage_key(), None as Option<&[u8]>, Some(value))?;
        if swapped.is_err() {
            return Ok(false);
        }
        self.db.flush()?;

        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(payload.clone());
        Ok(true)
    }

    /// Reads a witness by its 20 hash bytes.
    pub fn get_witness(&self, hash: &[u8]) -> DbResult<Option<Witness>> {
        match self.witnesses.get(hash)? {
            Some(bytes) => {
                let witness: Witness = bincode::deserialize(&bytes)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                Ok(Some(witness))
            }
            None => Ok(None),
        }
    }

    /// Every persisted witness.
    pub fn all_witnesses(&self) -> DbResult<Vec<Witness>> {
        let mut out = Vec::with_capacity(self.witnesses.len());
        for result in self.witnesses.iter() {
            let (_key, value) = result?;
            let witness: Witness =
                bincode::deserialize(&value).map_err(|e| DbError::Serialization(e.to_string()))?;
            out.push(witness);
        }
        Ok(out)
    }

    /// Number of persisted witnesses.
    pub fn witness_count(&self) -> usize {
        self.witnesses.len()
    }

    /// Number of persisted non-witness payloads.
    pub fn payload_count(&self) -> usize {
        self.payloads.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl PayloadStore for WitnessDb {
    fn enumerate(&self) -> Result<Vec<NetworkPayload>, PayloadStoreError> {
        let mut out: Vec<NetworkPayload> = self
            .all_witnesses()?
            .into_iter()
            .map(NetworkPayload::AccountAgeWitness)
            .collect();
        for result in self.payloads.iter() {
            let (_key, value) = result.map_err(DbError::from)?;
            let payload: NetworkPayload = bincode::deserialize(&value)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            out.push(payload);
        }
        Ok(out)
    }

    fn submit(&self, payload: NetworkPayload) -> Result<(), PayloadStoreError> {
        if !self.put_payload(&payload)? {
            debug!("submitted payload already persisted");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkPayload> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::Hash160;
    use crate::crypto::keys::Signature;
    use crate::witness::deriver::derive_hash;

    fn witness(input: &[u8], date: i64) -> Witness {
        Witness::new(
            derive_hash(input),
            Hash160::from_bytes([5u8; 20]),
            Signature::from_vec(vec![6u8; 64]),
            date,
        )
    }

    #[test]
    fn open_temporary_database() {
        let db = WitnessDb::open_temporary().expect("should create temp db");
        assert_eq!(db.witness_count(), 0);
        assert!(db.enumerate().unwrap().is_empty());
    }

    #[test]
    fn put_and_get_witness() {
        let db = WitnessDb::open_temporary().unwrap();
        let w = witness(b"acct", 10);
        assert!(db
            .put_payload(&NetworkPayload::AccountAgeWitness(w.clone()))
            .unwrap());
        assert_eq!(db.get_witness(w.hash().as_bytes()).unwrap(), Some(w));
        assert_eq!(db.get_witness(&[0u8; 20]).unwrap(), None);
    }

    #[test]
    fn first_writer_wins_on_disk() {
        let db = WitnessDb::open_temporary().unwrap();
        let first = witness(b"acct", 10);
        let second = witness(b"acct", 99);
        assert!(db
            .put_payload(&NetworkPayload::AccountAgeWitness(first.clone()))
            .unwrap());
        assert!(!db
            .put_payload(&NetworkPayload::AccountAgeWitness(second))
            .unwrap());
        assert_eq!(db.witness_count(), 1);
        let stored = db.get_witness(first.hash().as_bytes()).unwrap().unwrap();
        assert_eq!(stored.date(), 10);
    }

    #[test]
    fn witnesses_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let w = witness(b"persisted", 42);
        {
            let db = WitnessDb::open(dir.path()).unwrap();
            db.submit(NetworkPayload::AccountAgeWitness(w.clone())).unwrap();
            db.submit(NetworkPayload::Other {
                kind: "mailbox".into(),
                data: vec![7],
            })
            .unwrap();
        }
        let db = WitnessDb::open(dir.path()).unwrap();
        assert_eq!(db.all_witnesses().unwrap(), vec![w]);
        assert_eq!(db.payload_count(), 1);
        assert_eq!(db.enumerate().unwrap().len(), 2);
    }

    #[test]
    fn subscribers_hear_only_new_payloads() {
        let db = WitnessDb::open_temporary().unwrap();
        let mut rx = db.subscribe();
        let payload = NetworkPayload::AccountAgeWitness(witness(b"acct", 1));

        db.submit(payload.clone()).unwrap();
        db.submit(payload.clone()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), payload);
        assert!(rx.try_recv().is_err());
    }
}
