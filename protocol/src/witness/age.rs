//! Account age and category helpers.
//!
//! Ages are milliseconds between a witness's date and "now". The `_at`
//! variants take an explicit instant so callers and tests control the clock.

use chrono::Utc;

use crate::witness::store::WitnessStore;
use crate::witness::types::{AccountAge, OfferWitnessRef, Witness};

/// Age of a witness at `now_ms`.
pub fn account_age_at(witness: &Witness, now_ms: i64) -> i64 {
    now_ms.saturating_sub(witness.date())
}

pub fn account_age(witness: &Witness) -> i64 {
    account_age_at(witness, Utc::now().timestamp_millis())
}

/// Age of the witness an offer advertises, or `0` when the offer carries no
/// hash or the witness has not reached this node.
pub fn account_age_for_offer_at<O>(store: &WitnessStore, offer: &O, now_ms: i64) -> i64
where
    O: OfferWitnessRef + ?Sized,
{
    offer
        .account_age_witness_hash()
        .and_then(|hash| store.lookup_by_hex(hash))
        .map_or(0, |witness| account_age_at(&witness, now_ms))
}

pub fn account_age_for_offer<O>(store: &WitnessStore, offer: &O) -> i64
where
    O: OfferWitnessRef + ?Sized,
{
    account_age_for_offer_at(store, offer, Utc::now().timestamp_millis())
}

/// Category of an optional witness. No witness is the youngest category.
pub fn category_at(witness: Option<&Witness>, now_ms: i64) -> AccountAge {
    witness.map_or(AccountAge::LessThanOneMonth, |w| {
        AccountAge::from_age_ms(account_age_at(w, now_ms))
    })
}

/// Category of the witness an offer advertises.
pub fn category_for_offer_at<O>(store: &WitnessStore, offer: &O, now_ms: i64) -> AccountAge
where
    O: OfferWitnessRef + ?Sized,
{
    let witness = offer
        .account_age_witness_hash()
        .and_then(|hash| store.lookup_by_hex(hash));
    category_at(witness.as_deref(), now_ms)
}
