//! # Witness Store
//!
//! Content-addressed, deduplicating cache of every witness this node knows
//! about. Keyed by witness hash; the first witness stored under a hash wins
//! and later submissions with the same hash are dropped. That is what stops
//! a peer from re-publishing an existing account with a fresher date or a
//! different signer.
//!
//! ## Concurrency
//!
//! The notification stream from the network inserts while request handlers
//! read. `DashMap`'s entry API makes check-then-insert atomic per key, and
//! witnesses are wrapped in `Arc` before they go in, so a reader only ever
//! sees a fully built record.
//!
//! There is no deletion. Lifetime is the process lifetime; a restart
//! re-seeds from the network data store.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::crypto::hash::Hash160;
use crate::witness::deriver::witness_hash_for;
use crate::witness::types::{PaymentAccountPayload, Witness};

/// Process-wide witness cache. Share it as `Arc<WitnessStore>`.
#[derive(Debug, Default)]
pub struct WitnessStore {
    witnesses: DashMap<Hash160, Arc<Witness>>,
}

impl WitnessStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-seeds the store at startup. Returns how many entries were new.
    pub fn load<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = Witness>,
    {
        let inserted = entries
            .into_iter()
            .filter(|w| self.insert_if_absent(w.clone()))
            .count();
        debug!(inserted, total = self.len(), "witness store seeded");
        inserted
    }

    /// Notification hook for a witness freshly received from the network.
    pub fn on_new_witness(&self, witness: Witness) {
        self.insert_if_absent(witness);
    }

    /// Inserts `witness` unless its hash is already present.
    ///
    /// Returns `true` if the witness was stored, `false` if an entry with the
    /// same hash already existed (in which case nothing changes).
    pub fn insert_if_absent(&self, witness: Witness) -> bool {
        match self.witnesses.entry(*witness.hash()) {
            Entry::Occupied(_) => {
                trace!(hash = %witness.hash(), "witness already known, ignoring");
                false
            }
            Entry::Vacant(slot) => {
                debug!(hash = %witness.hash(), date = witness.date(), "witness added");
                slot.insert(Arc::new(witness));
                true
            }
        }
    }

    /// Looks up a witness by hash.
    pub fn lookup_by_hash(&self, hash: &Hash160) -> Option<Arc<Witness>> {
        self.witnesses.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up a witness by hex-encoded hash. Malformed hex is "not found".
    pub fn lookup_by_hex(&self, hash_hex: &str) -> Option<Arc<Witness>> {
        let hash = Hash160::from_hex(hash_hex).ok()?;
        self.lookup_by_hash(&hash)
    }

    /// Looks up the witness of a payment account.
    pub fn lookup_by_payload<P: PaymentAccountPayload + ?Sized>(
        &self,
        payload: &P,
    ) -> Option<Arc<Witness>> {
        self.lookup_by_hash(&witness_hash_for(payload))
    }

    /// Whether a witness with this hash is stored.
    pub fn contains(&self, hash: &Hash160) -> bool {
        self.witnesses.contains_key(hash)
    }

    /// Number of stored witnesses.
    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    /// True when nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Signature;
    use crate::witness::deriver::derive_hash;
    use crate::witness::types::RawAccountPayload;
    use std::thread;

    fn witness(input: &[u8], date: i64, sig_byte: u8) -> Witness {
        Witness::new(
            derive_hash(input),
            Hash160::from_bytes([9u8; 20]),
            Signature::from_vec(vec![sig_byte; 64]),
            date,
        )
    }

    #[test]
    fn test_insert_then_lookup() {
        let store = WitnessStore::new();
        let w = witness(b"acct", 1_000, 1);
        assert!(store.insert_if_absent(w.clone()));
        assert_eq!(store.lookup_by_hash(w.hash()).as_deref(), Some(&w));
        assert!(store.contains(w.hash()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let store = WitnessStore::new();
        let first = witness(b"acct", 1_000, 1);
        let second = witness(b"acct", 9_999, 2);
        assert!(store.insert_if_absent(first.clone()));
        assert!(!store.insert_if_absent(second));

        let stored = store.lookup_by_hash(first.hash()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(stored.date(), 1_000);
        assert_eq!(stored.signature(), first.signature());
    }

    #[test]
    fn test_load_counts_only_new_entries() {
        let store = WitnessStore::new();
        let entries = vec![
            witness(b"a", 1, 1),
            witness(b"b", 2, 1),
            witness(b"a", 3, 2),
        ];
        assert_eq!(store.load(entries), 2);
        assert_eq!(store.lookup_by_hash(&derive_hash(b"a")).unwrap().date(), 1);
    }

    #[test]
    fn test_on_new_witness_is_idempotent() {
        let store = WitnessStore::new();
        let w = witness(b"acct", 5, 1);
        store.on_new_witness(w.clone());
        store.on_new_witness(w);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_by_hex_and_payload() {
        let store = WitnessStore::new();
        let w = witness(b"acct-hex", 7, 1);
        store.insert_if_absent(w.clone());

        assert!(store.lookup_by_hex(&w.hash_hex()).is_some());
        assert!(store.lookup_by_hex("not hex").is_none());
        assert!(store.lookup_by_hex("abcd").is_none());
        assert!(store
            .lookup_by_payload(&RawAccountPayload::new(b"acct-hex".to_vec()))
            .is_some());
        assert!(store
            .lookup_by_payload(&RawAccountPayload::new(b"other".to_vec()))
            .is_none());
    }

    #[test]
    fn test_concurrent_duplicate_inserts_keep_one() {
        let store = Arc::new(WitnessStore::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.insert_if_absent(witness(b"contested", i as i64, i)))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
        let stored = store.lookup_by_hash(&derive_hash(b"contested")).unwrap();
        // Whoever won, the stored record is internally consistent.
        assert_eq!(stored.signature().as_bytes()[0] as i64, stored.date());
    }
}
