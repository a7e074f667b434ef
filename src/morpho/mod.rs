//! Morpho peer-to-peer lending.
//!
//! Morpho matches suppliers and borrowers peer-to-peer on top of an underlying
//! lending pool. Two deployments are supported:
//!
//! - [`compound`]: Morpho-Compound, markets identified by cTokens, rates per block.
//! - [`aave_v2`]: Morpho-AaveV2, markets identified by aTokens, rates per year.
//!
//! Both deployments return raw fixed-point integers, but they disagree on
//! scales and on tuple layouts. [`Conventions`] records these differences once
//! per [`Protocol`] so the clients never hard-code them at the call site.
//!
//! # Example
//!
//! ```no_run
//! use morphosdk::morpho::{MorphoClient, Side, compound};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = compound::Client::mainnet().await?;
//! let dai = client.market_total(&compound::markets::DAI, Side::Supply).await?;
//! println!("DAI supplied: {} ({} matched)", dai.total, dai.matched);
//!
//! let apr = client.average_apr(&compound::markets::DAI, Side::Supply).await?;
//! println!("DAI average supply APR: {}%", apr * 100.0);
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionReceipt,
};
use anyhow::Result;

use crate::units::{self, BlockSchedule};

pub mod aave_v2;
pub mod compound;
pub mod contracts;
pub mod vault;

/// Morpho deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Protocol {
    /// Morpho over Compound.
    #[display("compound")]
    Compound,
    /// Morpho over Aave V2.
    #[display("aave-v2")]
    AaveV2,
}

impl Protocol {
    /// Returns the unit conventions of this deployment.
    #[must_use]
    pub const fn conventions(self) -> Conventions {
        match self {
            Protocol::Compound => Conventions::COMPOUND,
            Protocol::AaveV2 => Conventions::AAVE_V2,
        }
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compound" | "morpho-compound" => Ok(Protocol::Compound),
            "aave-v2" | "aavev2" | "aave" | "morpho-aave-v2" => Ok(Protocol::AaveV2),
            _ => Err(anyhow::anyhow!(
                "unknown protocol {s}, expected `compound` or `aave-v2`"
            )),
        }
    }
}

/// Supply or borrow side of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Side {
    #[display("supply")]
    Supply,
    #[display("borrow")]
    Borrow,
}

/// Layout of a `(matched, pooled)` pair returned by a contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleOrder {
    /// `(peer-to-peer, pool, ..)`
    MatchedFirst,
    /// `(pool, peer-to-peer, ..)`
    PoolFirst,
}

impl TupleOrder {
    /// Assigns the two leading values of a response and normalizes them.
    #[must_use]
    pub fn split(self, first: U256, second: U256, scale: u8) -> Split {
        match self {
            TupleOrder::MatchedFirst => Split::new(first, second, scale),
            TupleOrder::PoolFirst => Split::new(second, first, scale),
        }
    }
}

/// How a deployment quotes interest rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateConvention {
    /// Rate per block, to be annualized with a [`BlockSchedule`].
    PerBlock { scale: u8 },
    /// Rate already annualized by the contract.
    PerYear { scale: u8 },
}

/// How a deployment's oracle quotes prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceConvention {
    /// USD price of the underlying, scaled by `36 - decimals`.
    UnderlyingUsd,
    /// Price in a reference asset with a fixed scale.
    ReferenceAsset { scale: u8 },
}

impl PriceConvention {
    /// Returns the scale of a price for an asset with `decimals` decimals.
    #[must_use]
    pub const fn scale(self, decimals: u8) -> u8 {
        match self {
            PriceConvention::UnderlyingUsd => 36u8.saturating_sub(decimals),
            PriceConvention::ReferenceAsset { scale } => scale,
        }
    }
}

/// Unit conventions of a Morpho deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conventions {
    /// Order of `getTotalMarketSupply` / `getTotalMarketBorrow`.
    pub market_totals_order: TupleOrder,
    /// Order of `getCurrentSupplyBalanceInOf` / `getCurrentBorrowBalanceInOf`.
    pub user_balance_order: TupleOrder,
    pub rate: RateConvention,
    pub price: PriceConvention,
    /// Scale of protocol-wide totals (`getTotalSupply` / `getTotalBorrow`).
    pub total_scale: u8,
    /// Unit of protocol-wide totals and prices.
    pub reference: &'static str,
}

impl Conventions {
    /// Morpho-Compound: per-block rates, USD prices scaled by `36 - decimals`.
    pub const COMPOUND: Self = Self {
        market_totals_order: TupleOrder::MatchedFirst,
        user_balance_order: TupleOrder::PoolFirst,
        rate: RateConvention::PerBlock { scale: 18 },
        price: PriceConvention::UnderlyingUsd,
        total_scale: 18,
        reference: "USD",
    };

    /// Morpho-AaveV2: per-year rates in ray, ETH prices with 18 decimals.
    pub const AAVE_V2: Self = Self {
        market_totals_order: TupleOrder::MatchedFirst,
        user_balance_order: TupleOrder::PoolFirst,
        rate: RateConvention::PerYear { scale: 27 },
        price: PriceConvention::ReferenceAsset { scale: 18 },
        total_scale: 18,
        reference: "ETH",
    };

    /// Returns the yearly rate of a raw rate.
    ///
    /// Per-block rates are annualized with `schedule`, per-year rates are only normalized.
    #[must_use]
    pub fn annual_rate(&self, raw: U256, schedule: &BlockSchedule) -> f64 {
        match self.rate {
            RateConvention::PerBlock { scale } => {
                units::annualize_per_block_rate(units::normalize(raw, scale), schedule)
            }
            RateConvention::PerYear { scale } => units::normalize(raw, scale),
        }
    }

    /// Normalizes an oracle price of an asset with `decimals` decimals.
    #[must_use]
    pub fn price(&self, raw: U256, decimals: u8) -> f64 {
        match self.price {
            PriceConvention::UnderlyingUsd => units::convert_underlying_price(raw, 36, decimals),
            PriceConvention::ReferenceAsset { scale } => {
                units::convert_underlying_price(raw, scale, 0)
            }
        }
    }

    /// Normalizes a protocol-wide total.
    #[must_use]
    pub fn total(&self, raw: U256) -> f64 {
        units::normalize(raw, self.total_scale)
    }
}

/// A position or a total split between its peer-to-peer and pool parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Split {
    /// Part matched peer-to-peer.
    pub matched: f64,
    /// Part supplied to or borrowed from the underlying pool.
    pub pooled: f64,
    /// Sum of both parts, computed before normalization.
    pub total: f64,
}

impl Split {
    /// Normalizes raw `matched` and `pooled` amounts sharing the same `scale`.
    #[must_use]
    pub fn new(matched: U256, pooled: U256, scale: u8) -> Self {
        Self {
            matched: units::normalize(matched, scale),
            pooled: units::normalize(pooled, scale),
            total: units::sum_matched_and_pooled(matched, pooled, scale),
        }
    }

    /// Applies `f` to every part, e.g. to value the position with a price.
    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            matched: f(self.matched),
            pooled: f(self.pooled),
            total: f(self.total),
        }
    }

    /// Values every part at `price`.
    #[must_use]
    pub fn value(self, price: f64) -> Self {
        self.map(|amount| amount * price)
    }
}

/// A Morpho market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Market {
    /// Pool token identifying the market (cToken or aToken).
    pub pool_token: Address,
    /// Underlying ERC-20.
    pub underlying: Address,
    /// Decimals of the underlying.
    pub decimals: u8,
}

impl Market {
    /// Creates a new market.
    #[must_use]
    pub const fn new(pool_token: Address, underlying: Address, decimals: u8) -> Self {
        Self {
            pool_token,
            underlying,
            decimals,
        }
    }
}

/// Operations shared by the Morpho deployments.
///
/// Values are normalized with the deployment's [`Conventions`]: amounts in
/// units of the market's underlying, prices and values in
/// [`Conventions::reference`], rates as yearly fractions (`0.05` is 5%).
#[allow(async_fn_in_trait)]
pub trait MorphoClient {
    /// Returns the unit conventions of the deployment.
    fn conventions(&self) -> Conventions;

    /// Returns the protocol-wide total, in the reference unit.
    async fn total(&self, side: Side) -> Result<Split>;

    /// Returns the total supplied to or borrowed from a market.
    async fn market_total(&self, market: &Market, side: Side) -> Result<Split>;

    /// Returns the current supply or borrow balance of `user` on a market.
    async fn balance(&self, market: &Market, user: Address, side: Side) -> Result<Split>;

    /// Returns the oracle price of the market's underlying, in the reference unit.
    async fn price(&self, market: &Market) -> Result<f64>;

    /// Returns the balance of `user` valued in the reference unit.
    ///
    /// The balance and the price are queried concurrently.
    async fn balance_value(&self, market: &Market, user: Address, side: Side) -> Result<Split> {
        let (balance, price) =
            futures::future::try_join(self.balance(market, user, side), self.price(market)).await?;
        Ok(balance.value(price))
    }

    /// Returns the average yearly rate experienced on a market.
    async fn average_apr(&self, market: &Market, side: Side) -> Result<f64>;

    /// Returns the yearly rate currently experienced by `user`.
    ///
    /// It depends on how the user's position is split between peer-to-peer and pool.
    async fn user_apr(&self, market: &Market, user: Address, side: Side) -> Result<f64>;

    /// Returns the yearly rate `user` would experience after supplying or borrowing `amount` more.
    async fn next_user_apr(
        &self,
        market: &Market,
        user: Address,
        side: Side,
        amount: U256,
    ) -> Result<f64>;

    /// Approves and supplies `amount` of the underlying on behalf of `on_behalf`.
    async fn supply(
        &self,
        market: &Market,
        on_behalf: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>;

    /// Withdraws `amount` of the underlying to the sender.
    async fn withdraw(&self, market: &Market, amount: U256) -> Result<TransactionReceipt>;

    /// Borrows `amount` of the underlying to the sender.
    async fn borrow(&self, market: &Market, amount: U256) -> Result<TransactionReceipt>;

    /// Approves and repays `amount` of the underlying on behalf of `on_behalf`.
    async fn repay(
        &self,
        market: &Market,
        on_behalf: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>;

    /// Claims the underlying pool's rewards accrued through Morpho on `pool_tokens`.
    async fn claim_rewards(
        &self,
        pool_tokens: Vec<Address>,
        trade_for_morpho_token: bool,
    ) -> Result<TransactionReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow10(exp: u8) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    #[test]
    fn test_protocol_from_str() {
        let test_values = [
            ("compound", Protocol::Compound),
            ("Compound", Protocol::Compound),
            ("aave-v2", Protocol::AaveV2),
            ("AaveV2", Protocol::AaveV2),
        ];
        for (index, (input, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(input.parse::<Protocol>().unwrap(), expect, "failed at {index}");
        }
        assert!("aave-v3".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_display_round_trip() {
        for protocol in [Protocol::Compound, Protocol::AaveV2] {
            assert_eq!(protocol.to_string().parse::<Protocol>().unwrap(), protocol);
        }
    }

    #[test]
    fn test_tuple_order() {
        let a = U256::from(300_000_000u64);
        let b = U256::from(100_000_000u64);

        let matched_first = TupleOrder::MatchedFirst.split(a, b, 8);
        assert_eq!(matched_first.matched, 3.0);
        assert_eq!(matched_first.pooled, 1.0);

        let pool_first = TupleOrder::PoolFirst.split(a, b, 8);
        assert_eq!(pool_first.matched, 1.0);
        assert_eq!(pool_first.pooled, 3.0);

        assert_eq!(matched_first.total, pool_first.total);
        assert_eq!(matched_first.total, 4.0);
    }

    #[test]
    fn test_price_scales() {
        assert_eq!(PriceConvention::UnderlyingUsd.scale(8), 28);
        assert_eq!(PriceConvention::UnderlyingUsd.scale(18), 18);
        assert_eq!(PriceConvention::ReferenceAsset { scale: 18 }.scale(8), 18);

        // $30,000 per WBTC on Compound's oracle
        let wbtc_usd = U256::from(30_000u64) * pow10(28);
        assert_eq!(Conventions::COMPOUND.price(wbtc_usd, 8), 30_000.0);

        // 15 ETH per WBTC on Aave's oracle, whatever the decimals
        let wbtc_eth = U256::from(15u64) * pow10(18);
        assert_eq!(Conventions::AAVE_V2.price(wbtc_eth, 8), 15.0);
    }

    #[test]
    fn test_annual_rate_is_not_annualized_twice() {
        let schedule = BlockSchedule::default();

        // 1e-9 per block
        let per_block = U256::from(1_000_000_000u64);
        assert_eq!(
            Conventions::COMPOUND.annual_rate(per_block, &schedule),
            1e-9 * schedule.blocks_per_year()
        );

        // 3.5% per year in ray
        let per_year = U256::from(35u64) * pow10(24);
        assert_eq!(Conventions::AAVE_V2.annual_rate(per_year, &schedule), 0.035);
        assert_eq!(
            Conventions::AAVE_V2.annual_rate(per_year, &BlockSchedule::new(1.0, 1.0)),
            0.035
        );
    }

    #[test]
    fn test_totals() {
        let total = U256::from(1_234_500_000_000_000_000_000u128);
        assert_eq!(Conventions::COMPOUND.total(total), 1234.5);
        assert_eq!(Conventions::AAVE_V2.total(total), 1234.5);
        assert_eq!(Protocol::AaveV2.conventions().reference, "ETH");
        assert_eq!(Protocol::Compound.conventions().reference, "USD");
    }

    #[test]
    fn test_split_map() {
        let split = Split::new(pow10(18), pow10(18) * U256::from(3u64), 18);
        let valued = split.map(|amount| amount * 2.5);
        assert_eq!(valued.matched, 2.5);
        assert_eq!(valued.pooled, 7.5);
        assert_eq!(valued.total, 10.0);
    }

    #[test]
    fn test_split_value() {
        let test_values = [
            (Split::new(pow10(8), pow10(8), 8), 60_000.0, (60_000.0, 60_000.0, 120_000.0)),
            (Split::new(U256::ZERO, pow10(17), 18), 2.0, (0.0, 0.2, 0.2)),
            (Split::default(), 1_000.0, (0.0, 0.0, 0.0)),
        ];
        for (index, (split, price, (matched, pooled, total))) in test_values.into_iter().enumerate() {
            let value = split.value(price);
            assert_eq!(value.matched, matched, "failed at {index}");
            assert_eq!(value.pooled, pooled, "failed at {index}");
            assert_eq!(value.total, total, "failed at {index}");
        }
    }
}
