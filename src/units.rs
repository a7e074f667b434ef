//! Fixed-point unit conversions.
//!
//! Every amount, price and rate returned by the Morpho contracts is a raw
//! integer scaled by a power of ten. The scale is never part of the value:
//! it comes from the token's decimals or from the convention of the specific
//! contract call (see [`crate::morpho::Conventions`]).
//!
//! Values normalized here are display-grade `f64`s. Contract calls always take
//! the raw [`U256`], use [`try_to_wei`] to build one from a user-entered amount.
//!
//! # Examples
//!
//! ```
//! use morphosdk::units::{self, BlockSchedule};
//! use morphosdk::U256;
//!
//! // 2.5 WBTC (8 decimals)
//! assert_eq!(units::normalize(U256::from(250_000_000u64), 8), 2.5);
//!
//! // 0.0000001 per block, 4 blocks per minute over 365 days
//! let schedule = BlockSchedule::new(4.0, 365.0);
//! let apr = units::annualize_per_block_rate(0.0000001, &schedule);
//! assert!((apr - 0.21024).abs() < 1e-12);
//! ```

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Assumed block production, used to annualize per-block rates.
///
/// This is an estimate: it does not follow observed chain conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSchedule {
    /// Blocks produced per minute.
    pub blocks_per_minute: f64,
    /// Days in a year.
    pub days_per_year: f64,
}

impl BlockSchedule {
    /// 4 blocks per minute over a 365.25 days year.
    pub const DEFAULT: Self = Self::new(4.0, 365.25);

    /// Creates a new schedule.
    #[must_use]
    pub const fn new(blocks_per_minute: f64, days_per_year: f64) -> Self {
        Self {
            blocks_per_minute,
            days_per_year,
        }
    }

    /// Returns the number of blocks in a year.
    #[must_use]
    #[inline]
    pub fn blocks_per_year(&self) -> f64 {
        self.blocks_per_minute * 60.0 * 24.0 * self.days_per_year
    }
}

impl Default for BlockSchedule {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Error returned by [`to_raw`] and [`try_to_wei`].
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum UnitsError {
    /// NaN or infinite input.
    #[display("{_0} is not a finite amount")]
    NotFinite(f64),
    /// Negative input.
    #[display("{_0} is negative")]
    Negative(f64),
    /// The scaled value does not fit in 256 bits.
    #[display("{_0} scaled by 10^{_1} overflows 256 bits")]
    Overflow(f64, u8),
    /// Negative decimal amount.
    #[display("{_0} is negative")]
    NegativeAmount(Decimal),
    /// The amount has more decimals than the token.
    #[display("{_0} has more than {_1} decimals")]
    TooPrecise(Decimal, u8),
    /// The scaled amount does not fit in 256 bits.
    #[display("{_0} scaled by 10^{_1} overflows 256 bits")]
    AmountOverflow(Decimal, u8),
}

impl std::error::Error for UnitsError {}

/// Converts a raw fixed-point integer into a decimal value: `raw / 10^scale`.
///
/// The result is the double closest to the exact quotient, i.e. the same value
/// as printing `raw` with `scale` decimals and parsing the string.
///
/// # Example
///
/// ```
/// use morphosdk::{U256, units::normalize};
///
/// assert_eq!(normalize(U256::from(1_000_000_000_000_000_000u128), 18), 1.0);
/// assert_eq!(normalize(U256::from(100u64), 8), 0.000001);
/// ```
#[must_use]
pub fn normalize(raw: U256, scale: u8) -> f64 {
    format!("{raw}e-{scale}")
        .parse()
        .expect("an integer mantissa with a decimal exponent is a valid float")
}

/// Converts a decimal value back into its raw fixed-point integer,
/// rounding to the nearest unit.
///
/// # Example
///
/// ```
/// use morphosdk::{U256, units::to_raw};
///
/// assert_eq!(to_raw(2.5, 8).unwrap(), U256::from(250_000_000u64));
/// ```
pub fn to_raw(value: f64, scale: u8) -> Result<U256, UnitsError> {
    if !value.is_finite() {
        return Err(UnitsError::NotFinite(value));
    }
    if value < 0.0 {
        return Err(UnitsError::Negative(value));
    }

    // -0.0 formats with a sign
    let formatted = format!("{:.*}", scale as usize, value.abs());
    let digits: String = formatted.chars().filter(|c| *c != '.').collect();
    U256::from_str_radix(&digits, 10).map_err(|_| UnitsError::Overflow(value, scale))
}

/// Annualizes a normalized per-block rate.
///
/// Rates that the contracts already quote per year must not go through here.
#[must_use]
#[inline]
pub fn annualize_per_block_rate(rate_per_block: f64, schedule: &BlockSchedule) -> f64 {
    rate_per_block * schedule.blocks_per_year()
}

/// Normalizes the sum of the peer-to-peer matched and pooled parts of a position.
///
/// Both parts must be amounts of the same asset at the same scale.
#[must_use]
pub fn sum_matched_and_pooled(matched: U256, pooled: U256, scale: u8) -> f64 {
    normalize(matched.saturating_add(pooled), scale)
}

/// Normalizes an oracle price quoted with `base_scale - quote_decimals` decimals.
///
/// Compound's oracle quotes USD prices with `36 - decimals` decimals, pass
/// `quote_decimals = 0` for oracles using a flat scale.
#[must_use]
pub fn convert_underlying_price(price_raw: U256, base_scale: u8, quote_decimals: u8) -> f64 {
    normalize(price_raw, base_scale.saturating_sub(quote_decimals))
}

/// Converts a decimal amount to its raw representation.
///
/// The conversion is exact: amounts with more decimals than the token are
/// rejected instead of rounded.
///
/// # Parameters
///
/// - `size`: The decimal amount to convert
/// - `decimals`: Number of decimal places for the token (e.g., 18 for DAI, 8 for WBTC)
///
/// # Example
///
/// ```
/// use morphosdk::units::try_to_wei;
/// use morphosdk::{U256, dec};
///
/// // 100 WBTC
/// assert_eq!(try_to_wei(dec!(100), 8).unwrap(), U256::from(10_000_000_000u64));
/// // WBTC has no tenth of a satoshi
/// assert!(try_to_wei(dec!(0.000000005), 8).is_err());
/// ```
pub fn try_to_wei(size: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    if size.is_sign_negative() && !size.is_zero() {
        return Err(UnitsError::NegativeAmount(size));
    }

    // trailing zeros do not count as decimals
    let normalized = size.normalize();
    let scale = normalized.scale();
    if scale > decimals as u32 {
        return Err(UnitsError::TooPrecise(size, decimals));
    }

    // scaled in 256 bits, a Decimal mantissa only holds 96
    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    U256::from(10u64)
        .checked_pow(U256::from(decimals as u32 - scale))
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(UnitsError::AmountOverflow(size, decimals))
}

/// Converts a raw amount to an exact decimal.
///
/// # Panics
///
/// When `wei` does not fit in an `i128` or `decimals` exceeds 28.
///
/// # Example
///
/// ```
/// use morphosdk::units::from_wei;
/// use morphosdk::{U256, dec};
///
/// let wei = U256::from(1_500_000_000_000_000_000u128);
/// assert_eq!(from_wei(wei, 18), dec!(1.5));
/// ```
#[must_use]
#[inline]
pub fn from_wei(wei: U256, decimals: u8) -> Decimal {
    Decimal::from_i128_with_scale(wei.to::<i128>(), decimals as u32)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn pow10(exp: u8) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    #[test]
    fn test_normalize() {
        let test_values = [
            (pow10(18), 18, 1.0),
            (pow10(17), 18, 0.1),
            (U256::from(250_000_000u64), 8, 2.5),
            (U256::from(100u64), 8, 0.000001),
            (U256::from(98_996_405u64), 6, 98.996405),
            (U256::from(72_305_406_316_320_073_300u128), 18, 72.3054063163200733),
            (U256::ZERO, 27, 0.0),
        ];
        for (index, (raw, scale, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(normalize(raw, scale), expect, "failed at {index}");
        }
    }

    #[test]
    fn test_normalize_scale_zero_is_identity() {
        for raw in [0u128, 1, 42, 123_456_789, 1 << 53, u64::MAX as u128] {
            assert_eq!(normalize(U256::from(raw), 0), raw as f64);
        }
    }

    #[test]
    fn test_normalize_is_monotonic() {
        let mut previous = normalize(U256::ZERO, 18);
        let mut raw = U256::from(1u64);
        while raw < pow10(30) {
            let current = normalize(raw, 18);
            assert!(current >= previous, "{raw} went backwards");
            previous = current;
            raw = raw * U256::from(3u64) + U256::from(1u64);
        }
    }

    #[test]
    fn test_normalize_huge_values() {
        assert!(normalize(U256::MAX, 0) > 1e77);
        assert!(normalize(U256::MAX, 77) > 1.0);
        assert_eq!(normalize(U256::from(1u64), 255), 1e-255);
    }

    #[test]
    fn test_round_trip() {
        let test_values = [
            (U256::from(250_000_000u64), 8),
            (U256::from(123_456_789u64), 8),
            (U256::from(1_234_567_890_123_456_789u128), 18),
            (U256::from(72_305_406_316_320_073_386u128), 18),
            (U256::from(52_345_678_901_234_567_890_123_456u128), 27),
            (pow10(27), 27),
        ];
        for (index, (raw, scale)) in test_values.into_iter().enumerate() {
            let back = to_raw(normalize(raw, scale), scale).unwrap();
            let diff = if back > raw { back - raw } else { raw - back };
            // within double precision
            assert!(diff * U256::from(1u64 << 50) <= raw, "failed at {index}: {back}");
        }
    }

    #[test]
    fn test_to_raw_rejects_invalid() {
        assert_eq!(to_raw(-1.0, 18), Err(UnitsError::Negative(-1.0)));
        assert!(matches!(to_raw(f64::NAN, 18), Err(UnitsError::NotFinite(_))));
        assert_eq!(
            to_raw(f64::INFINITY, 18),
            Err(UnitsError::NotFinite(f64::INFINITY))
        );
        assert_eq!(to_raw(-0.0, 6), Ok(U256::ZERO));
        assert_eq!(to_raw(1e60, 18), Err(UnitsError::Overflow(1e60, 18)));
    }

    #[test]
    fn test_blocks_per_year() {
        assert_eq!(BlockSchedule::default().blocks_per_year(), 2_103_840.0);
        assert_eq!(BlockSchedule::new(4.0, 365.0).blocks_per_year(), 2_102_400.0);
    }

    #[test]
    fn test_annualize_per_block_rate() {
        let schedule = BlockSchedule::default();
        for rate in [0.0, 0.0000001, 3.17e-9, 1.0] {
            assert_eq!(
                annualize_per_block_rate(rate, &schedule),
                rate * 2_103_840.0
            );
        }

        let apr = annualize_per_block_rate(0.0000001, &BlockSchedule::new(4.0, 365.0));
        assert!((apr - 0.21024).abs() < 1e-12);
    }

    #[test]
    fn test_sum_matched_and_pooled() {
        let matched = U256::from(1_250_000_000_000_000_000u128);
        let pooled = U256::from(750_000_000_000_000_000u128);

        assert_eq!(sum_matched_and_pooled(matched, pooled, 18), 2.0);
        assert_eq!(
            sum_matched_and_pooled(matched, pooled, 18),
            sum_matched_and_pooled(pooled, matched, 18)
        );
        assert_eq!(
            sum_matched_and_pooled(U256::from(99u64), U256::from(1u64), 8),
            normalize(U256::from(100u64), 8)
        );
        assert_eq!(
            sum_matched_and_pooled(U256::MAX, U256::from(1u64), 0),
            normalize(U256::MAX, 0)
        );
    }

    #[test]
    fn test_convert_underlying_price() {
        // $60,000 per WBTC quoted with 36 - 8 decimals
        let wbtc = U256::from(60_000u64) * pow10(28);
        assert_eq!(convert_underlying_price(wbtc, 36, 8), 60_000.0);

        // 0.0005 ETH per DAI on a flat 18 decimals oracle
        let dai = U256::from(500_000_000_000_000u64);
        assert_eq!(convert_underlying_price(dai, 18, 0), 0.0005);
    }

    #[test]
    fn test_from_wei() {
        let test_values = [
            (
                U256::from(72305406316320073300i128),
                18,
                dec!(72.305406316320073300),
            ),
            (U256::from(98996405), 6, dec!(98.996405)),
            (U256::from(250_000_000), 8, dec!(2.5)),
        ];
        for (index, (got, decimals, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(from_wei(got, decimals), expect, "failed at {index}");
        }
    }

    #[test]
    fn test_to_wei() {
        let test_values = [
            (
                dec!(72.305406316320073386),
                18,
                U256::from(72305406316320073386i128),
            ),
            (dec!(100), 8, U256::from(10_000_000_000u64)),
            (dec!(69), 6, U256::from(69000000)),
            (dec!(1.50000000000), 8, U256::from(150_000_000u64)),
            (dec!(0.00000001), 8, U256::from(1u64)),
            (dec!(0), 18, U256::ZERO),
            (dec!(-0), 6, U256::ZERO),
            (dec!(7), 0, U256::from(7u64)),
            (
                dec!(100000000000),
                18,
                U256::from(100_000_000_000u128) * pow10(18),
            ),
            (
                dec!(79228162514264337593543950335),
                27,
                U256::from(79228162514264337593543950335u128) * pow10(27),
            ),
        ];
        for (index, (got, decimals, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(try_to_wei(got, decimals), Ok(expect), "failed at {index}");
        }
    }

    #[test]
    fn test_to_wei_rejects_invalid() {
        let test_values = [
            (dec!(0.000000005), 8, UnitsError::TooPrecise(dec!(0.000000005), 8)),
            (dec!(0.000000004), 8, UnitsError::TooPrecise(dec!(0.000000004), 8)),
            (dec!(1.0000001), 6, UnitsError::TooPrecise(dec!(1.0000001), 6)),
            (dec!(0.5), 0, UnitsError::TooPrecise(dec!(0.5), 0)),
            (dec!(-1), 18, UnitsError::NegativeAmount(dec!(-1))),
            (dec!(-0.000001), 6, UnitsError::NegativeAmount(dec!(-0.000001))),
            (
                dec!(79228162514264337593543950335),
                255,
                UnitsError::AmountOverflow(dec!(79228162514264337593543950335), 255),
            ),
        ];
        for (index, (got, decimals, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(try_to_wei(got, decimals), Err(expect), "failed at {index}");
        }
    }

    #[test]
    fn test_to_wei_inverts_from_wei() {
        for (wei, decimals) in [(U256::from(98_996_405u64), 6), (U256::from(1u64), 18)] {
            assert_eq!(try_to_wei(from_wei(wei, decimals), decimals), Ok(wei));
        }
    }
}
