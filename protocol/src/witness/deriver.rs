//! # Witness Hash Derivation
//!
//! Reduces a payment account to its 20-byte content address:
//!
//! ```text
//! witness_hash = RIPEMD-160(SHA-256(age_witness_input_data || salt))
//! ```
//!
//! where `salt` is always the empty byte string. The salt parameter is part
//! of the interface because accounts carry one, but whatever the caller
//! passes is replaced with the empty salt before hashing. Independently
//! created witnesses for the same account therefore converge on one store
//! entry.

use tracing::debug;

use crate::crypto::hash::{sha256_ripemd160_multi, Hash160};
use crate::witness::types::PaymentAccountPayload;

/// Target for structured diagnostics carrying raw cryptographic material.
///
/// Subscribers can silence or redact these events by target without
/// touching the rest of the crate's logging.
pub const TRACE_TARGET: &str = "agewitness::trace";

/// The salt actually mixed into every witness hash.
const EFFECTIVE_SALT: &[u8] = &[];

/// Derives the witness hash for raw witness input bytes.
///
/// # Example
///
/// ```
/// use agewitness_protocol::witness::deriver::derive_hash;
///
/// let a = derive_hash(b"SEPA|DE89370400440532013000");
/// let b = derive_hash(b"SEPA|DE89370400440532013000");
/// assert_eq!(a, b);
/// ```
pub fn derive_hash(input: &[u8]) -> Hash160 {
    sha256_ripemd160_multi(&[input, EFFECTIVE_SALT])
}

/// Derives the witness hash, accepting and discarding a caller salt.
pub fn derive_hash_with_salt(input: &[u8], _salt: &[u8]) -> Hash160 {
    derive_hash(input)
}

/// Hex convenience for lookup keys.
pub fn derive_hash_hex(input: &[u8]) -> String {
    derive_hash(input).to_hex()
}

/// Witness hash of a payment account payload.
pub fn witness_hash_for<P: PaymentAccountPayload + ?Sized>(payload: &P) -> Hash160 {
    let input = payload.age_witness_input_data();
    let salt = payload.salt();
    let hash = derive_hash_with_salt(&input, &salt);
    debug!(
        target: TRACE_TARGET,
        payment_details = %payload.payment_details(),
        ignored_salt = %hex::encode(&salt),
        input = %hex::encode(&input),
        combined = %hex::encode([input.as_slice(), EFFECTIVE_SALT].concat()),
        hash = %hash,
        "derived witness hash"
    );
    hash
}

/// Hex-encoded witness hash of a payment account payload.
pub fn witness_hash_hex_for<P: PaymentAccountPayload + ?Sized>(payload: &P) -> String {
    witness_hash_for(payload).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha256_ripemd160;
    use crate::witness::types::RawAccountPayload;

    #[test]
    fn test_empty_input_known_vector() {
        assert_eq!(
            derive_hash_hex(b""),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn test_deterministic() {
        let input = b"PERFECT_MONEY|U1234567";
        assert_eq!(derive_hash(input), derive_hash(input));
    }

    #[test]
    fn test_distinct_accounts_distinct_hashes() {
        let pairs: [(&[u8], &[u8]); 3] = [
            (b"SEPA|DE89370400440532013000", b"SEPA|DE89370400440532013001"),
            (b"abc", b"abd"),
            (b"account", b"account\0"),
        ];
        for (a, b) in pairs {
            assert_ne!(derive_hash(a), derive_hash(b));
        }
    }

    #[test]
    fn test_equals_plain_hash160_of_input() {
        assert_eq!(derive_hash(b"abc"), sha256_ripemd160(b"abc"));
    }

    #[test]
    fn test_salt_has_no_effect() {
        let input = b"OKPAY|OK123";
        assert_eq!(derive_hash_with_salt(input, b"any salt"), derive_hash(input));
        assert_eq!(derive_hash_with_salt(input, &[0xff; 32]), derive_hash(input));
    }

    #[test]
    fn test_payload_hash_ignores_payload_salt() {
        let plain = RawAccountPayload::new(b"acct-1".to_vec());
        let salted = RawAccountPayload::new(b"acct-1".to_vec()).with_salt(b"xyz".to_vec());
        assert_eq!(witness_hash_for(&plain), witness_hash_for(&salted));
        assert_eq!(witness_hash_hex_for(&plain), derive_hash_hex(b"acct-1"));
    }
}
