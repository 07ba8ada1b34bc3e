//! Core type definitions for account age witnesses.
//!
//! A [`Witness`] is immutable once built. Fields are private so that nothing
//! downstream of the store can rewrite a date or swap a signature.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ONE_MONTH_MS, TWO_MONTHS_MS};
use crate::crypto::hash::Hash160;
use crate::crypto::keys::Signature;

// ---------------------------------------------------------------------------
// Witness
// ---------------------------------------------------------------------------

/// Signed record binding a hashed payment account to a creation date.
///
/// The three binary fields plus the timestamp are exactly what the network
/// data store exchanges; nothing else travels.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// SHA-256+RIPEMD-160 over the account's witness input bytes.
    hash: Hash160,
    /// SHA-256+RIPEMD-160 over the publisher's raw signature public key.
    signer_identity_hash: Hash160,
    /// Signature over the 20 bytes of `hash`.
    signature: Signature,
    /// Creation time, Unix milliseconds.
    date: i64,
}

impl Witness {
    /// Assembles a witness from its parts.
    ///
    /// No checks happen here; witnesses received from the network are
    /// authenticated by the verifier when a peer claims them.
    pub fn new(hash: Hash160, signer_identity_hash: Hash160, signature: Signature, date: i64) -> Self {
        Self {
            hash,
            signer_identity_hash,
            signature,
            date,
        }
    }

    /// Content address of the witness and its store key.
    pub fn hash(&self) -> &Hash160 {
        &self.hash
    }

    /// Hash of the publisher's signature public key.
    pub fn signer_identity_hash(&self) -> &Hash160 {
        &self.signer_identity_hash
    }

    /// Publisher's signature over the witness hash.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Creation time, Unix milliseconds.
    pub fn date(&self) -> i64 {
        self.date
    }

    /// Hex-encoded witness hash.
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("hash", &self.hash)
            .field("signer_identity_hash", &self.signer_identity_hash)
            .field("date", &self.date)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// AccountAge
// ---------------------------------------------------------------------------

/// Coarse age bucket derived from a witness's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountAge {
    /// Younger than 30 days, or no witness at all.
    LessThanOneMonth,
    /// At least 30 but less than 60 days.
    OneToTwoMonths,
    /// 60 days or more.
    TwoMonthsOrMore,
}

impl AccountAge {
    /// Buckets an age given in milliseconds.
    ///
    /// Negative ages (a witness dated in the future) land in the youngest
    /// bucket.
    pub fn from_age_ms(age_ms: i64) -> Self {
        if age_ms < ONE_MONTH_MS {
            Self::LessThanOneMonth
        } else if age_ms < TWO_MONTHS_MS {
            Self::OneToTwoMonths
        } else {
            Self::TwoMonthsOrMore
        }
    }
}

impl fmt::Display for AccountAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LessThanOneMonth => write!(f, "LESS_THAN_ONE_MONTH"),
            Self::OneToTwoMonths => write!(f, "ONE_TO_TWO_MONTHS"),
            Self::TwoMonthsOrMore => write!(f, "TWO_MONTHS_OR_MORE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator views
// ---------------------------------------------------------------------------

/// The slice of a payment account the witness subsystem consumes.
///
/// Account schemas live elsewhere; all we need is the canonical byte string
/// that identifies the account (e.g. bank code + account number) and a
/// human-readable summary for diagnostics.
pub trait PaymentAccountPayload {
    /// Canonical bytes identifying the account for witness purposes.
    fn age_witness_input_data(&self) -> Vec<u8>;

    /// Per-account salt. Carried for compatibility; hashing ignores it.
    fn salt(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Human-readable account summary, used only in debug logging.
    fn payment_details(&self) -> String {
        String::new()
    }
}

/// The slice of an offer the witness subsystem consumes.
pub trait OfferWitnessRef {
    /// Hex-encoded witness hash advertised by the offer maker, if any.
    fn account_age_witness_hash(&self) -> Option<&str>;
}

/// A payment account reduced to raw witness input bytes.
///
/// Handy for callers that already hold the canonical bytes, and for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAccountPayload {
    /// Canonical witness input bytes.
    pub input: Vec<u8>,
    /// Account salt (ignored by hashing).
    #[serde(default)]
    pub salt: Vec<u8>,
}

impl RawAccountPayload {
    /// Payload with the given input and no salt.
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            salt: Vec::new(),
        }
    }

    /// Attaches a salt.
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = salt.into();
        self
    }
}

impl PaymentAccountPayload for RawAccountPayload {
    fn age_witness_input_data(&self) -> Vec<u8> {
        self.input.clone()
    }

    fn salt(&self) -> Vec<u8> {
        self.salt.clone()
    }

    fn payment_details(&self) -> String {
        format!("raw({} bytes)", self.input.len())
    }
}
