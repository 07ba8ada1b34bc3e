//! Error types for witness publication.
//!
//! Verification never errors: expected mismatches are reported through
//! [`VerificationFailure`](crate::witness::VerificationFailure) instead.

use thiserror::Error;

use crate::crypto::signatures::SignatureError;
use crate::network::payload::PayloadStoreError;

/// Errors that abandon a publish attempt.
#[derive(Debug, Error)]
pub enum WitnessError {
    /// The key ring could not sign the witness hash.
    #[error("signing witness failed: {0}")]
    Signing(#[from] SignatureError),

    /// The network data store refused or failed the submission.
    #[error("submitting witness failed: {0}")]
    Submission(#[from] PayloadStoreError),
}
