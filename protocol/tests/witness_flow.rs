//! End-to-end tests for the account age witness flow.
//!
//! A maker publishes a witness for their payment account, it reaches a
//! taker's store through the payload store and feed, and the taker then
//! verifies the maker's claim and sizes the trade limit. Each test builds
//! its own stores; nothing is shared between tests.

use std::sync::Arc;
use std::time::Duration;

use agewitness_protocol::config::{DAY_MS, FADE_IN_FINAL_BOUNDARY_MS};
use agewitness_protocol::crypto::{PublicKey, Signature};
use agewitness_protocol::identity::{KeyRing, LocalKeyRing};
use agewitness_protocol::network::{bootstrap, InMemoryPayloadStore, NetworkPayload, PayloadStore};
use agewitness_protocol::storage::WitnessDb;
use agewitness_protocol::trade::TradeLimitPolicy;
use agewitness_protocol::witness::{
    derive_hash, encode_nonce, witness_hash_for, PublishOutcome, RawAccountPayload,
    VerificationFailure, Witness, WitnessPublisher, WitnessStore, WitnessVerifier,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const ACCOUNT: &[u8] = b"SEPA|DE89370400440532013000|COBADEFFXXX";

struct Maker {
    ring: Arc<LocalKeyRing>,
    publisher: WitnessPublisher<LocalKeyRing, InMemoryPayloadStore>,
    payloads: Arc<InMemoryPayloadStore>,
    store: Arc<WitnessStore>,
}

fn maker() -> Maker {
    let ring = Arc::new(LocalKeyRing::generate());
    let payloads = Arc::new(InMemoryPayloadStore::new());
    let store = Arc::new(WitnessStore::new());
    let publisher =
        WitnessPublisher::new(Arc::clone(&ring), Arc::clone(&payloads), Arc::clone(&store));
    Maker {
        ring,
        publisher,
        payloads,
        store,
    }
}

fn publish_dated(maker: &Maker, account: &RawAccountPayload, date: i64) -> Witness {
    match maker.publisher.publish_at(account, date).expect("publish") {
        PublishOutcome::Submitted(w) => w,
        PublishOutcome::AlreadyPresent => panic!("witness unexpectedly present"),
    }
}

fn nonce_proof(ring: &LocalKeyRing, nonce: i32) -> Signature {
    ring.sign(&encode_nonce(nonce)).expect("sign nonce")
}

async fn wait_for_len(store: &WitnessStore, len: usize) {
    for _ in 0..200 {
        if store.len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("store never reached {len} entries");
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn published_witness_reaches_taker_and_verifies() {
    let maker = maker();
    let account = RawAccountPayload::new(ACCOUNT.to_vec());

    let taker_store = Arc::new(WitnessStore::new());
    let (loaded, feed) =
        bootstrap(Arc::clone(&taker_store), Arc::clone(&maker.payloads)).unwrap();
    assert_eq!(loaded, 0);

    let published = publish_dated(&maker, &account, FADE_IN_FINAL_BOUNDARY_MS);
    wait_for_len(&taker_store, 1).await;

    let stored = taker_store.lookup_by_payload(&account).expect("witness arrived");
    assert_eq!(*stored, published);

    let nonce = 0x5eed;
    let verifier = WitnessVerifier::default();
    let result = verifier.verify_detailed(
        ACCOUNT,
        &stored,
        &[],
        &maker.ring.public_key(),
        nonce,
        &nonce_proof(&maker.ring, nonce),
    );
    assert_eq!(result, Ok(()));

    feed.abort();
}

#[test]
fn publish_then_lookup_passes_hash_check() {
    let maker = maker();
    let account = RawAccountPayload::new(ACCOUNT.to_vec()).with_salt(b"legacy salt".to_vec());
    publish_dated(&maker, &account, FADE_IN_FINAL_BOUNDARY_MS);

    // The maker's own store only fills through the feed; seed it directly.
    maker.store.load(
        maker
            .payloads
            .enumerate()
            .unwrap()
            .into_iter()
            .filter_map(NetworkPayload::into_witness),
    );
    let found = maker
        .store
        .lookup_by_hash(&derive_hash(ACCOUNT))
        .expect("witness by derived hash");
    assert!(WitnessVerifier::default()
        .check_hash(ACCOUNT, &account.salt, &found)
        .is_ok());
    assert_eq!(*found.hash(), witness_hash_for(&account));
}

#[test]
fn republishing_known_account_is_a_no_op() {
    let maker = maker();
    let account = RawAccountPayload::new(ACCOUNT.to_vec());
    let first = publish_dated(&maker, &account, 1_600_000_000_000);
    maker.store.insert_if_absent(first.clone());

    let outcome = maker.publisher.publish(&account).unwrap();
    assert_eq!(outcome, PublishOutcome::AlreadyPresent);
    assert_eq!(maker.payloads.submitted().len(), 1);
    assert_eq!(maker.store.lookup_by_payload(&account).unwrap().date(), first.date());
}

// ---------------------------------------------------------------------------
// Each check falsified on its own
// ---------------------------------------------------------------------------

struct Honest {
    witness: Witness,
    key: PublicKey,
    nonce: i32,
    nonce_sig: Signature,
    ring: LocalKeyRing,
}

fn honest() -> Honest {
    let ring = LocalKeyRing::generate();
    let hash = derive_hash(ACCOUNT);
    let witness = Witness::new(
        hash,
        ring.identity_hash(),
        ring.sign(hash.as_bytes()).unwrap(),
        FADE_IN_FINAL_BOUNDARY_MS,
    );
    let nonce = -77;
    Honest {
        key: ring.public_key(),
        nonce_sig: nonce_proof(&ring, nonce),
        witness,
        nonce,
        ring,
    }
}

fn run(
    h: &Honest,
    input: &[u8],
    witness: &Witness,
    key: &PublicKey,
    nonce: i32,
) -> Result<(), VerificationFailure> {
    WitnessVerifier::default().verify_detailed(input, witness, &[], key, nonce, &h.nonce_sig)
}

#[test]
fn every_falsified_check_fails_overall() {
    let h = honest();
    assert_eq!(run(&h, ACCOUNT, &h.witness, &h.key, h.nonce), Ok(()));

    let backdated = Witness::new(
        *h.witness.hash(),
        *h.witness.signer_identity_hash(),
        h.witness.signature().clone(),
        0,
    );
    assert_eq!(
        run(&h, ACCOUNT, &backdated, &h.key, h.nonce),
        Err(VerificationFailure::PredatesRelease)
    );

    let other_identity = LocalKeyRing::generate().identity_hash();
    let rebound = Witness::new(
        *h.witness.hash(),
        other_identity,
        h.witness.signature().clone(),
        h.witness.date(),
    );
    assert_eq!(
        run(&h, ACCOUNT, &rebound, &h.key, h.nonce),
        Err(VerificationFailure::IdentityMismatch)
    );

    assert_eq!(
        run(&h, b"tampered account", &h.witness, &h.key, h.nonce),
        Err(VerificationFailure::HashMismatch)
    );

    let bad_sig = Witness::new(
        *h.witness.hash(),
        *h.witness.signer_identity_hash(),
        h.ring.sign(b"not the hash").unwrap(),
        h.witness.date(),
    );
    assert_eq!(
        run(&h, ACCOUNT, &bad_sig, &h.key, h.nonce),
        Err(VerificationFailure::InvalidWitnessSignature)
    );

    assert_eq!(
        run(&h, ACCOUNT, &h.witness, &h.key, h.nonce + 1),
        Err(VerificationFailure::InvalidNonceSignature)
    );
}

#[test]
fn verification_has_no_side_effects() {
    let h = honest();
    let verifier = WitnessVerifier::default();
    let answers: Vec<bool> = (0..3)
        .map(|_| verifier.verify(ACCOUNT, &h.witness, &[], &h.key, h.nonce, &h.nonce_sig))
        .collect();
    assert_eq!(answers, vec![true, true, true]);
}

// ---------------------------------------------------------------------------
// Trade limits
// ---------------------------------------------------------------------------

#[test]
fn trade_limits_follow_witness_age() {
    let now = FADE_IN_FINAL_BOUNDARY_MS + 365 * DAY_MS;
    let maker = maker();
    let old = RawAccountPayload::new(b"old account".to_vec());
    let fresh = RawAccountPayload::new(b"fresh account".to_vec());
    let unknown = RawAccountPayload::new(b"never published".to_vec());

    let w_old = maker.publisher.build_witness(&old, now - 90 * DAY_MS).unwrap();
    let w_fresh = maker.publisher.build_witness(&fresh, now - 3 * DAY_MS).unwrap();
    maker.store.load([w_old, w_fresh]);

    let policy = TradeLimitPolicy::with_default_schedule(Arc::clone(&maker.store));
    assert_eq!(policy.compute_limit(1000, "EUR", &old, now), 1000);
    assert_eq!(policy.compute_limit(1000, "EUR", &fresh, now), 250);
    assert_eq!(policy.compute_limit(1000, "EUR", &unknown, now), 250);
    assert_eq!(policy.compute_limit(1000, "BTC", &unknown, now), 1000);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn node_restart_reseeds_store_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ring = Arc::new(LocalKeyRing::generate());
    let account = RawAccountPayload::new(ACCOUNT.to_vec());

    {
        let db = Arc::new(WitnessDb::open(dir.path()).unwrap());
        let store = Arc::new(WitnessStore::new());
        let publisher = WitnessPublisher::new(Arc::clone(&ring), Arc::clone(&db), store);
        publisher.publish(&account).unwrap();
    }

    let db = Arc::new(WitnessDb::open(dir.path()).unwrap());
    let store = Arc::new(WitnessStore::new());
    let (loaded, feed) = bootstrap(Arc::clone(&store), db).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(
        *store.lookup_by_payload(&account).unwrap().signer_identity_hash(),
        ring.identity_hash()
    );
    feed.abort();
}
