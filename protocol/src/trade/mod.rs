//! # Trade Module
//!
//! Turns witness age into a trade limit. See [`limit`] for the fade-in
//! schedule and rounding rule.

pub mod currency;
pub mod limit;

pub use currency::{is_fiat_currency, CurrencyKind};
pub use limit::{apply_factor_bps, FadeInSchedule, TradeLimitPolicy};
