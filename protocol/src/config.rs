//! # Protocol Configuration & Constants
//!
//! Every magic number of the account age witness protocol lives here. If
//! you're hardcoding a date or a factor somewhere else, you're doing it wrong.
//!
//! All timestamps are Unix milliseconds in UTC. Calendar boundaries are
//! fixed dates, never relative to when a node was deployed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the witness protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature scheme used for witnesses and nonce proofs.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Composite digest used for witness hashes and signer identity hashes.
pub const WITNESS_HASH_FUNCTION: &str = "SHA-256+RIPEMD-160";

/// Length of a witness hash / signer identity hash in bytes.
pub const HASH160_LENGTH: usize = 20;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes on the wire.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Release date of the witness feature: 2017-10-23T00:00:00Z.
///
/// Witnesses claiming to be older than this (minus the skew tolerance) are
/// backdated and rejected by the verifier.
pub const WITNESS_RELEASE_DATE_MS: i64 = 1_508_716_800_000;

/// Tolerance for peers whose clocks are not in sync.
pub const CLOCK_SKEW_TOLERANCE_MS: i64 = DAY_MS;

/// Accounts younger than this are in the most conservative age bucket.
pub const ONE_MONTH_MS: i64 = 30 * DAY_MS;

/// Accounts at least this old get the full trade limit.
pub const TWO_MONTHS_MS: i64 = 60 * DAY_MS;

// ---------------------------------------------------------------------------
// Fade-in Schedule
// ---------------------------------------------------------------------------

/// First fade-in boundary: 2017-12-01T00:00:00Z. Before it, no reduction.
pub const FADE_IN_FIRST_BOUNDARY_MS: i64 = 1_512_086_400_000;

/// Second fade-in boundary: 2018-01-01T00:00:00Z.
pub const FADE_IN_SECOND_BOUNDARY_MS: i64 = 1_514_764_800_000;

/// Final fade-in boundary: 2018-02-01T00:00:00Z. From here on the
/// steady-state factors apply.
pub const FADE_IN_FINAL_BOUNDARY_MS: i64 = 1_517_443_200_000;

/// Factors are expressed in basis points. 10_000 bps = 1.0.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Factors for one-to-two-month-old accounts, one per schedule range.
pub const ONE_TO_TWO_MONTHS_FACTORS_BPS: [u32; 4] = [10_000, 9_000, 7_500, 5_000];

/// Factors for accounts younger than a month (or without a witness).
pub const LESS_THAN_ONE_MONTH_FACTORS_BPS: [u32; 4] = [10_000, 8_000, 5_000, 2_500];

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port of the witness node.
pub const DEFAULT_API_PORT: u16 = 9750;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9751;

/// Capacity of the payload notification channel. A subscriber that falls
/// further behind than this sees a lag and skips ahead.
pub const PAYLOAD_CHANNEL_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Runtime Policy
// ---------------------------------------------------------------------------

/// Errors from loading a policy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid policy config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("fade-in boundaries must be strictly increasing")]
    UnorderedBoundaries,
}

/// Overridable policy knobs.
///
/// The defaults are the protocol constants above. Test networks override
/// them to exercise the fade-in ramp without waiting for the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Release date of the witness feature (Unix ms).
    pub release_date_ms: i64,
    /// Fade-in boundaries (Unix ms), strictly increasing.
    pub fade_in_boundaries_ms: [i64; 3],
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            release_date_ms: WITNESS_RELEASE_DATE_MS,
            fade_in_boundaries_ms: [
                FADE_IN_FIRST_BOUNDARY_MS,
                FADE_IN_SECOND_BOUNDARY_MS,
                FADE_IN_FINAL_BOUNDARY_MS,
            ],
        }
    }
}

impl PolicyConfig {
    /// Parses a JSON policy document. Missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: PolicyConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects schedules whose boundaries are out of order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [a, b, c] = self.fade_in_boundaries_ms;
        if a < b && b < c {
            Ok(())
        } else {
            Err(ConfigError::UnorderedBoundaries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc_midnight_ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_calendar_constants_match_dates() {
        assert_eq!(WITNESS_RELEASE_DATE_MS, utc_midnight_ms(2017, 10, 23));
        assert_eq!(FADE_IN_FIRST_BOUNDARY_MS, utc_midnight_ms(2017, 12, 1));
        assert_eq!(FADE_IN_SECOND_BOUNDARY_MS, utc_midnight_ms(2018, 1, 1));
        assert_eq!(FADE_IN_FINAL_BOUNDARY_MS, utc_midnight_ms(2018, 2, 1));
    }

    #[test]
    fn test_boundaries_are_ordered() {
        assert!(FADE_IN_FIRST_BOUNDARY_MS < FADE_IN_SECOND_BOUNDARY_MS);
        assert!(FADE_IN_SECOND_BOUNDARY_MS < FADE_IN_FINAL_BOUNDARY_MS);
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_factor_tables_ramp_down() {
        // Steady-state factors are the last entries; the ramp never goes up.
        for table in [ONE_TO_TWO_MONTHS_FACTORS_BPS, LESS_THAN_ONE_MONTH_FACTORS_BPS] {
            assert_eq!(table[0], BPS_DENOMINATOR);
            assert!(table.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_age_buckets_sanity() {
        assert_eq!(ONE_MONTH_MS, 2_592_000_000);
        assert_eq!(TWO_MONTHS_MS, 2 * ONE_MONTH_MS);
    }

    #[test]
    fn test_policy_config_partial_json_uses_defaults() {
        let config = PolicyConfig::from_json_str(r#"{"release_date_ms": 42}"#).unwrap();
        assert_eq!(config.release_date_ms, 42);
        assert_eq!(
            config.fade_in_boundaries_ms,
            PolicyConfig::default().fade_in_boundaries_ms
        );
    }

    #[test]
    fn test_policy_config_rejects_unordered_boundaries() {
        let err = PolicyConfig::from_json_str(r#"{"fade_in_boundaries_ms": [3, 2, 1]}"#);
        assert!(matches!(err, Err(ConfigError::UnorderedBoundaries)));
    }

    #[test]
    fn test_policy_config_rejects_garbage() {
        assert!(matches!(
            PolicyConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
