//! Morpho-AaveV2.
//!
//! Markets are identified by their Aave aToken. The Lens quotes rates already
//! annualized, in ray (27 decimals). `AaveOracle` prices every asset in ETH
//! with 18 decimals, whatever the asset's own decimals, so protocol totals
//! are in ETH and can be expressed in any other asset through its ETH price.

use alloy::{
    primitives::{Address, U256, address},
    rpc::types::TransactionReceipt,
    transports::TransportError,
};
use anyhow::Result;

use crate::{
    evm::{self, DynProvider, Provider},
    morpho::{
        Conventions, Market, MorphoClient, Side, Split,
        contracts::{
            IAaveOracle::{self, IAaveOracleInstance},
            IAaveV2Lens::{self, IAaveV2LensInstance},
            IAaveV2Morpho::{self, IAaveV2MorphoInstance},
        },
    },
};

/// Morpho-AaveV2 markets on Ethereum mainnet.
pub mod markets {
    use super::*;

    /// WETH market (aWETH).
    pub const ETH: Market = Market::new(
        address!("0x030bA81f1c18d280636F32af80b9AAd02Cf0854e"),
        evm::WETH,
        18,
    );
    /// DAI market (aDAI).
    pub const DAI: Market = Market::new(
        address!("0x028171bCA77440897B824Ca71D1c56caC55b68A3"),
        evm::DAI,
        18,
    );
    /// WBTC market (aWBTC).
    pub const WBTC: Market = Market::new(
        address!("0x9ff58f4fFB29fA2266Ab25e75e2A8b3503311656"),
        evm::WBTC,
        8,
    );

    /// Every known market with its symbol.
    pub const ALL: [(&str, Market); 3] = [("ETH", ETH), ("DAI", DAI), ("WBTC", WBTC)];

    /// Finds a market by the symbol of its underlying, case-insensitive.
    #[must_use]
    pub fn by_symbol(symbol: &str) -> Option<Market> {
        ALL.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(symbol))
            .map(|(_, market)| *market)
    }
}

/// Morpho-AaveV2 contract addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    /// Read-only Lens.
    pub lens: Address,
    /// Morpho entry point.
    pub morpho: Address,
    /// `AaveOracle`, quoting every asset in ETH.
    pub oracle: Address,
}

impl Contracts {
    /// Ethereum mainnet deployment.
    pub const MAINNET: Self = Self {
        lens: address!("0x507fA343d0A90786d86C7cd885f5C49263A91FF4"),
        morpho: address!("0x777777c9898d384f785ee44acfe945efdff5f3e0"),
        oracle: address!("0xA50ba011c48153De246E5192C8f9258A2ba79Ca9"),
    };
}

impl Default for Contracts {
    fn default() -> Self {
        Self::MAINNET
    }
}

/// Morpho-AaveV2 client
pub struct Client<P>
where
    P: Provider,
{
    provider: P,
    contracts: Contracts,
}

impl Client<DynProvider> {
    /// Creates a client for mainnet.
    pub async fn mainnet() -> Result<Self, TransportError> {
        let provider = DynProvider::new(evm::mainnet().await?);
        Ok(Self::new(provider, Contracts::MAINNET))
    }

    /// Creates a client for mainnet.
    pub async fn mainnet_with_url(url: &str) -> Result<Self, TransportError> {
        let provider = DynProvider::new(evm::mainnet_with_url(url).await?);
        Ok(Self::new(provider, Contracts::MAINNET))
    }
}

impl<P> Client<P>
where
    P: Provider,
{
    /// Create a Morpho-AaveV2 client.
    pub fn new(provider: P, contracts: Contracts) -> Self {
        Self {
            provider,
            contracts,
        }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the contract addresses in use.
    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    /// Returns the Lens.
    pub fn lens(&self) -> IAaveV2LensInstance<P> {
        IAaveV2Lens::new(self.contracts.lens, self.provider.clone())
    }

    /// Returns the Morpho entry point.
    pub fn morpho(&self) -> IAaveV2MorphoInstance<P> {
        IAaveV2Morpho::new(self.contracts.morpho, self.provider.clone())
    }

    /// Returns `AaveOracle`.
    pub fn oracle(&self) -> IAaveOracleInstance<P> {
        IAaveOracle::new(self.contracts.oracle, self.provider.clone())
    }

    /// Returns the ETH price of any asset known to `AaveOracle`.
    pub async fn asset_price(&self, asset: Address) -> Result<f64> {
        log::debug!("getAssetPrice({asset})");
        let price = self.oracle().getAssetPrice(asset).call().await?;
        // decimals are irrelevant, ETH prices always have 18
        Ok(self.conventions().price(price, 0))
    }

    /// Returns the protocol-wide total, expressed in `asset`.
    pub async fn total_in(&self, side: Side, asset: Address) -> Result<Split> {
        let (total, price) =
            futures::future::try_join(self.total(side), self.asset_price(asset)).await?;
        Ok(total.map(|eth| eth / price))
    }

    /// Returns the balance of `user` on a market, expressed in `asset`.
    pub async fn balance_in(
        &self,
        market: &Market,
        user: Address,
        side: Side,
        asset: Address,
    ) -> Result<Split> {
        let (value, price) = futures::future::try_join(
            self.balance_value(market, user, side),
            self.asset_price(asset),
        )
        .await?;
        Ok(value.map(|eth| eth / price))
    }
}

impl<P> MorphoClient for Client<P>
where
    P: Provider,
{
    fn conventions(&self) -> Conventions {
        Conventions::AAVE_V2
    }

    async fn total(&self, side: Side) -> Result<Split> {
        log::debug!("{side} total");
        let lens = self.lens();
        let (p2p, pool, total) = match side {
            Side::Supply => {
                let ret = lens.getTotalSupply().call().await?;
                (ret.p2pSupplyAmount, ret.poolSupplyAmount, ret.totalSupplyAmount)
            }
            Side::Borrow => {
                let ret = lens.getTotalBorrow().call().await?;
                (ret.p2pBorrowAmount, ret.poolBorrowAmount, ret.totalBorrowAmount)
            }
        };

        let conventions = self.conventions();
        Ok(Split {
            total: conventions.total(total),
            ..Split::new(p2p, pool, conventions.total_scale)
        })
    }

    async fn market_total(&self, market: &Market, side: Side) -> Result<Split> {
        log::debug!("{side} total of market {}", market.pool_token);
        let lens = self.lens();
        let (first, second) = match side {
            Side::Supply => {
                let ret = lens.getTotalMarketSupply(market.pool_token).call().await?;
                (ret.p2pSupplyAmount, ret.poolSupplyAmount)
            }
            Side::Borrow => {
                let ret = lens.getTotalMarketBorrow(market.pool_token).call().await?;
                (ret.p2pBorrowAmount, ret.poolBorrowAmount)
            }
        };
        Ok(self
            .conventions()
            .market_totals_order
            .split(first, second, market.decimals))
    }

    async fn balance(&self, market: &Market, user: Address, side: Side) -> Result<Split> {
        log::debug!("{side} balance of {user} on market {}", market.pool_token);
        let lens = self.lens();
        let (first, second) = match side {
            Side::Supply => {
                let ret = lens
                    .getCurrentSupplyBalanceInOf(market.pool_token, user)
                    .call()
                    .await?;
                (ret.balanceOnPool, ret.balanceInP2P)
            }
            Side::Borrow => {
                let ret = lens
                    .getCurrentBorrowBalanceInOf(market.pool_token, user)
                    .call()
                    .await?;
                (ret.balanceOnPool, ret.balanceInP2P)
            }
        };
        Ok(self
            .conventions()
            .user_balance_order
            .split(first, second, market.decimals))
    }

    async fn price(&self, market: &Market) -> Result<f64> {
        self.asset_price(market.underlying).await
    }

    async fn average_apr(&self, market: &Market, side: Side) -> Result<f64> {
        let lens = self.lens();
        let rate = match side {
            Side::Supply => {
                lens.getAverageSupplyRatePerYear(market.pool_token)
                    .call()
                    .await?
                    .avgSupplyRatePerYear
            }
            Side::Borrow => {
                lens.getAverageBorrowRatePerYear(market.pool_token)
                    .call()
                    .await?
                    .avgBorrowRatePerYear
            }
        };
        // per-year rates ignore the block schedule
        Ok(self.conventions().annual_rate(rate, &Default::default()))
    }

    async fn user_apr(&self, market: &Market, user: Address, side: Side) -> Result<f64> {
        let lens = self.lens();
        let rate = match side {
            Side::Supply => {
                lens.getCurrentUserSupplyRatePerYear(market.pool_token, user)
                    .call()
                    .await?
            }
            Side::Borrow => {
                lens.getCurrentUserBorrowRatePerYear(market.pool_token, user)
                    .call()
                    .await?
            }
        };
        Ok(self.conventions().annual_rate(rate, &Default::default()))
    }

    async fn next_user_apr(
        &self,
        market: &Market,
        user: Address,
        side: Side,
        amount: U256,
    ) -> Result<f64> {
        let lens = self.lens();
        let rate = match side {
            Side::Supply => {
                lens.getNextUserSupplyRatePerYear(market.pool_token, user, amount)
                    .call()
                    .await?
                    .nextSupplyRatePerYear
            }
            Side::Borrow => {
                lens.getNextUserBorrowRatePerYear(market.pool_token, user, amount)
                    .call()
                    .await?
                    .nextBorrowRatePerYear
            }
        };
        Ok(self.conventions().annual_rate(rate, &Default::default()))
    }

    async fn supply(
        &self,
        market: &Market,
        on_behalf: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        evm::approve(&self.provider, market.underlying, self.contracts.morpho, amount).await?;
        let receipt = self
            .morpho()
            .supply(market.pool_token, on_behalf, amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("supplied {amount} to {}: {}", market.pool_token, receipt.transaction_hash);
        Ok(receipt)
    }

    async fn withdraw(&self, market: &Market, amount: U256) -> Result<TransactionReceipt> {
        let receipt = self
            .morpho()
            .withdraw(market.pool_token, amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("withdrew {amount} from {}: {}", market.pool_token, receipt.transaction_hash);
        Ok(receipt)
    }

    async fn borrow(&self, market: &Market, amount: U256) -> Result<TransactionReceipt> {
        let receipt = self
            .morpho()
            .borrow(market.pool_token, amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("borrowed {amount} from {}: {}", market.pool_token, receipt.transaction_hash);
        Ok(receipt)
    }

    async fn repay(
        &self,
        market: &Market,
        on_behalf: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        evm::approve(&self.provider, market.underlying, self.contracts.morpho, amount).await?;
        let receipt = self
            .morpho()
            .repay(market.pool_token, on_behalf, amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("repaid {amount} to {}: {}", market.pool_token, receipt.transaction_hash);
        Ok(receipt)
    }

    async fn claim_rewards(
        &self,
        pool_tokens: Vec<Address>,
        trade_for_morpho_token: bool,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .morpho()
            .claimRewards(pool_tokens, trade_for_morpho_token)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("claimed rewards: {}", receipt.transaction_hash);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units;

    #[test]
    fn test_markets_by_symbol() {
        assert_eq!(markets::by_symbol("eth"), Some(markets::ETH));
        assert_eq!(markets::by_symbol("WBTC").map(|m| m.decimals), Some(8));
        // no COMP market on Aave
        assert_eq!(markets::by_symbol("COMP"), None);
    }

    #[test]
    fn test_conversion_through_eth() {
        // 10 WBTC borrowed at 15 ETH per WBTC, DAI at 2^-10 ETH
        let conventions = Conventions::AAVE_V2;
        let wbtc_eth =
            conventions.price(U256::from(15u64) * U256::from(10u64).pow(U256::from(18)), 8);
        let dai_eth = conventions.price(U256::from(976_562_500_000_000u64), 18);

        let borrowed = Split::new(U256::from(600_000_000u64), U256::from(400_000_000u64), 8);
        let in_dai = borrowed.map(|wbtc| wbtc * wbtc_eth).map(|eth| eth / dai_eth);

        assert_eq!(borrowed.total, 10.0);
        assert_eq!(in_dai.total, 153_600.0);
        assert_eq!(in_dai.matched, 92_160.0);
    }

    #[test]
    fn test_ray_rate() {
        let rate = U256::from(123u64) * U256::from(10u64).pow(U256::from(23));
        assert_eq!(units::normalize(rate, 27), 0.0123);
        assert_eq!(
            Conventions::AAVE_V2.annual_rate(rate, &Default::default()),
            0.0123
        );
    }

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_query() {
        let client = Client::mainnet().await.unwrap();
        let weth = client.asset_price(evm::WETH).await.unwrap();
        assert!((weth - 1.0).abs() < 1e-9);
    }
}
