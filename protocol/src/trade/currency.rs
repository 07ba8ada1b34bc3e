//! Currency classification.
//!
//! Age-based limits apply to fiat-settled trades only. A code is fiat when it
//! is an active ISO 4217 national currency; everything else (BTC, XMR, ETH,
//! tokens, unknown tickers) is treated as non-fiat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Active ISO 4217 national currency codes, sorted for binary search.
const ISO_4217_FIAT: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD",
    "CDF", "CHF", "CLP", "CNY", "COP", "CRC", "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD",
    "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ",
    "GYD", "HKD", "HNL", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD",
    "JPY", "KES", "KGS", "KHR", "KMF", "KPW", "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR",
    "LRD", "LSL", "LYD", "MAD", "MDL", "MGA", "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR",
    "MWK", "MXN", "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN",
    "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR",
    "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SVC", "SYP", "SZL", "THB",
    "TJS", "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "UYU", "UZS",
    "VES", "VND", "VUV", "WST", "XAF", "XCD", "XOF", "XPF", "YER", "ZAR", "ZMW", "ZWL",
];

/// Settlement kind of a currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    /// National currency, settled through a payment account.
    Fiat,
    /// Anything else.
    Crypto,
}

impl CurrencyKind {
    /// Classifies a currency code. Case and surrounding whitespace are
    /// ignored.
    pub fn of(code: &str) -> Self {
        if is_fiat_currency(code) {
            Self::Fiat
        } else {
            Self::Crypto
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fiat => write!(f, "fiat"),
            Self::Crypto => write!(f, "crypto"),
        }
    }
}

/// Whether `code` is an ISO 4217 fiat currency.
pub fn is_fiat_currency(code: &str) -> bool {
    let code = code.trim().to_ascii_uppercase();
    ISO_4217_FIAT.binary_search(&code.as_str()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        assert!(ISO_4217_FIAT.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_common_fiat_codes() {
        for code in ["USD", "EUR", "BRL", "JPY", "GBP", "CHF"] {
            assert!(is_fiat_currency(code), "{code} should be fiat");
        }
    }

    #[test]
    fn test_crypto_codes_are_not_fiat() {
        for code in ["BTC", "XMR", "ETH", "USDC", "LTC", ""] {
            assert!(!is_fiat_currency(code), "{code} should not be fiat");
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(is_fiat_currency(" eur "));
        assert_eq!(CurrencyKind::of("usd"), CurrencyKind::Fiat);
        assert_eq!(CurrencyKind::of("btc"), CurrencyKind::Crypto);
    }
}
