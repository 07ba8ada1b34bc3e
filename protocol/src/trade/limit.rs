//! # Trade Limit Policy
//!
//! Scales a payment method's base trade limit by how long the account's
//! witness has existed. Only fiat trades are scaled.
//!
//! ## Fade-In Schedule
//!
//! Young accounts were not limited all at once when witnesses shipped. The
//! factor for the two younger categories steps down over three fixed
//! calendar boundaries and then stays at its steady-state value:
//!
//! | as of                   | 1-2 months | < 1 month |
//! |-------------------------|-----------:|----------:|
//! | before 2017-12-01       |       1.00 |      1.00 |
//! | before 2018-01-01       |       0.90 |      0.80 |
//! | before 2018-02-01       |       0.75 |      0.50 |
//! | from 2018-02-01 on      |       0.50 |      0.25 |
//!
//! Two months or more is always 1.0.
//!
//! ## Rounding
//!
//! Factors are held in basis points and applied in `u128`, rounding half
//! away from zero: `(base * bps + 5000) / 10000`. No floating point touches
//! the limit.

use std::sync::Arc;
use tracing::debug;

use crate::config::{
    PolicyConfig, BPS_DENOMINATOR, FADE_IN_FINAL_BOUNDARY_MS, FADE_IN_FIRST_BOUNDARY_MS,
    FADE_IN_SECOND_BOUNDARY_MS, LESS_THAN_ONE_MONTH_FACTORS_BPS, ONE_TO_TWO_MONTHS_FACTORS_BPS,
};
use crate::trade::currency::is_fiat_currency;
use crate::witness::age::category_at;
use crate::witness::store::WitnessStore;
use crate::witness::types::{AccountAge, PaymentAccountPayload, Witness};

// ---------------------------------------------------------------------------
// Fade-In Schedule
// ---------------------------------------------------------------------------

/// The three calendar boundaries of the fade-in ramp (Unix ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeInSchedule {
    pub first: i64,
    pub second: i64,
    pub final_boundary: i64,
}

impl Default for FadeInSchedule {
    fn default() -> Self {
        Self {
            first: FADE_IN_FIRST_BOUNDARY_MS,
            second: FADE_IN_SECOND_BOUNDARY_MS,
            final_boundary: FADE_IN_FINAL_BOUNDARY_MS,
        }
    }
}

impl FadeInSchedule {
    pub fn from_policy(policy: &PolicyConfig) -> Self {
        let [first, second, final_boundary] = policy.fade_in_boundaries_ms;
        Self {
            first,
            second,
            final_boundary,
        }
    }

    /// Which of the four date ranges `as_of` falls in.
    fn phase(&self, as_of_ms: i64) -> usize {
        if as_of_ms < self.first {
            0
        } else if as_of_ms < self.second {
            1
        } else if as_of_ms < self.final_boundary {
            2
        } else {
            3
        }
    }

    /// Factor for `category` at `as_of_ms`, in basis points.
    pub fn schedule_factor_bps(&self, category: AccountAge, as_of_ms: i64) -> u32 {
        match category {
            AccountAge::TwoMonthsOrMore => BPS_DENOMINATOR,
            AccountAge::OneToTwoMonths => ONE_TO_TWO_MONTHS_FACTORS_BPS[self.phase(as_of_ms)],
            AccountAge::LessThanOneMonth => LESS_THAN_ONE_MONTH_FACTORS_BPS[self.phase(as_of_ms)],
        }
    }

    /// Factor for `category` at `as_of_ms`, as a fraction.
    pub fn schedule_factor(&self, category: AccountAge, as_of_ms: i64) -> f64 {
        f64::from(self.schedule_factor_bps(category, as_of_ms)) / f64::from(BPS_DENOMINATOR)
    }
}

/// `round(base * bps / 10000)`, half away from zero.
pub fn apply_factor_bps(base: u64, bps: u32) -> u64 {
    let denominator = u128::from(BPS_DENOMINATOR);
    let scaled = (u128::from(base) * u128::from(bps) + denominator / 2) / denominator;
    // bps never exceeds the denominator, so this fits.
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Computes age-scaled trade limits against the shared witness store.
#[derive(Debug, Clone)]
pub struct TradeLimitPolicy {
    store: Arc<WitnessStore>,
    schedule: FadeInSchedule,
}

impl TradeLimitPolicy {
    pub fn new(store: Arc<WitnessStore>, schedule: FadeInSchedule) -> Self {
        Self { store, schedule }
    }

    pub fn with_default_schedule(store: Arc<WitnessStore>) -> Self {
        Self::new(store, FadeInSchedule::default())
    }

    pub fn schedule(&self) -> &FadeInSchedule {
        &self.schedule
    }

    /// Trade limit for the account behind `payload`, evaluated at `now_ms`.
    ///
    /// Non-fiat currencies get `base_limit` back untouched. An account with
    /// no witness is treated as younger than one month.
    pub fn compute_limit<P>(
        &self,
        base_limit: u64,
        currency_code: &str,
        payload: &P,
        now_ms: i64,
    ) -> u64
    where
        P: PaymentAccountPayload + ?Sized,
    {
        if !is_fiat_currency(currency_code) {
            return base_limit;
        }
        let witness = self.store.lookup_by_payload(payload);
        self.compute_limit_for_witness(base_limit, currency_code, witness.as_deref(), now_ms)
    }

    /// Same as [`compute_limit`](Self::compute_limit) for an already
    /// looked-up witness.
    pub fn compute_limit_for_witness(
        &self,
        base_limit: u64,
        currency_code: &str,
        witness: Option<&Witness>,
        now_ms: i64,
    ) -> u64 {
        if !is_fiat_currency(currency_code) {
            return base_limit;
        }
        let category = category_at(witness, now_ms);
        let factor_bps = self.schedule.schedule_factor_bps(category, now_ms);
        let limit = apply_factor_bps(base_limit, factor_bps);
        debug!(
            currency = currency_code,
            %category,
            factor_bps,
            base_limit,
            limit,
            "trade limit computed"
        );
        limit
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
