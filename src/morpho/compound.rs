//! Morpho-Compound.
//!
//! Markets are identified by their Compound cToken. The Lens quotes rates per
//! block with 18 decimals and the oracle (Compound's `UniswapAnchoredView`)
//! quotes USD prices with `36 - decimals` decimals.
//!
//! # Example
//!
//! ```no_run
//! use morphosdk::morpho::{MorphoClient, Side, compound::{self, markets}};
//! use morphosdk::Address;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = compound::Client::mainnet().await?;
//! let user: Address = "0x...".parse()?;
//!
//! let wbtc = client.balance_value(&markets::WBTC, user, Side::Supply).await?;
//! println!("WBTC supplied: ${}", wbtc.total);
//!
//! let comp = client.unclaimed_rewards(&[markets::DAI.pool_token], user).await?;
//! println!("unclaimed COMP: {comp}");
//! # Ok(())
//! # }
//! ```

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
            ICompoundLens::{self, ICompoundLensInstance},
            ICompoundMorpho::{self, ICompoundMorphoInstance},
            ICompoundOracle::{self, ICompoundOracleInstance},
        },
    },
    units::{self, BlockSchedule},
};

/// Decimals of the COMP reward token.
pub const COMP_DECIMALS: u8 = 18;

/// Morpho-Compound markets on Ethereum mainnet.
pub mod markets {
    use super::*;

    /// WETH market (cETH).
    pub const ETH: Market = Market::new(
        address!("0x4Ddc2D193948926D02f9B1fE9e1daa0718270ED5"),
        evm::WETH,
        18,
    );
    /// DAI market (cDAI).
    pub const DAI: Market = Market::new(
        address!("0x5d3a536E4D6DbD6114cc1Ead35777bAB948E3643"),
        evm::DAI,
        18,
    );
    /// WBTC market (cWBTC2).
    pub const WBTC: Market = Market::new(
        address!("0xccF4429DB6322D5C611ee964527D42E5d685DD6a"),
        evm::WBTC,
        8,
    );
    /// COMP market (cCOMP).
    pub const COMP: Market = Market::new(
        address!("0x70e36f6BF80a52b3B46b3aF8e106CC0ed743E8e4"),
        evm::COMP,
        super::COMP_DECIMALS,
    );

    /// Every known market with its symbol.
    pub const ALL: [(&str, Market); 4] = [("ETH", ETH), ("DAI", DAI), ("WBTC", WBTC), ("COMP", COMP)];

    /// Finds a market by the symbol of its underlying, case-insensitive.
    #[must_use]
    pub fn by_symbol(symbol: &str) -> Option<Market> {
        ALL.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(symbol))
            .map(|(_, market)| *market)
    }
}

/// Morpho-Compound contract addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    /// Read-only Lens.
    pub lens: Address,
    /// Morpho entry point.
    pub morpho: Address,
    /// Compound price oracle.
    pub oracle: Address,
}

impl Contracts {
    /// Ethereum mainnet deployment.
    pub const MAINNET: Self = Self {
        lens: address!("0x930f1b46e1D081Ec1524efD95752bE3eCe51EF67"),
        morpho: address!("0x8888882f8f843896699869179fB6E4f7e3B58888"),
        oracle: address!("0x65c816077C29b557BEE980ae3cC2dCE80204A0C5"),
    };
}

impl Default for Contracts {
    fn default() -> Self {
        Self::MAINNET
    }
}

/// Morpho-Compound client
pub struct Client<P>
where
    P: Provider,
{
    provider: P,
    contracts: Contracts,
    schedule: BlockSchedule,
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
    /// Create a Morpho-Compound client.
    pub fn new(provider: P, contracts: Contracts) -> Self {
        Self {
            provider,
            contracts,
            schedule: BlockSchedule::DEFAULT,
        }
    }

    /// Sets the block schedule used to annualize per-block rates.
    #[must_use]
    pub fn with_schedule(self, schedule: BlockSchedule) -> Self {
        Self { schedule, ..self }
    }

    /// Returns the root provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the contract addresses.
    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    /// Returns the block schedule.
    pub fn schedule(&self) -> &BlockSchedule {
        &self.schedule
    }

    /// Returns the Lens.
    pub fn lens(&self) -> ICompoundLensInstance<P> {
        ICompoundLens::new(self.contracts.lens, self.provider.clone())
    }

    /// Returns the Morpho entry point.
    pub fn morpho(&self) -> ICompoundMorphoInstance<P> {
        ICompoundMorpho::new(self.contracts.morpho, self.provider.clone())
    }

    /// Returns the price oracle.
    pub fn oracle(&self) -> ICompoundOracleInstance<P> {
        ICompoundOracle::new(self.contracts.oracle, self.provider.clone())
    }

    /// Returns the COMP rewards `user` accrued on `pool_tokens` and not claimed yet.
    pub async fn unclaimed_rewards(&self, pool_tokens: &[Address], user: Address) -> Result<f64> {
        log::debug!("getUserUnclaimedRewards({pool_tokens:?}, {user})");
        let rewards = self
            .lens()
            .getUserUnclaimedRewards(pool_tokens.to_vec(), user)
            .call()
            .await?;
        Ok(units::normalize(rewards, COMP_DECIMALS))
    }

    /// Returns the COMP rewards `user` has not claimed yet, along with their USD value.
    ///
    /// Rewards and price are read in a single multicall.
    pub async fn unclaimed_rewards_usd(
        &self,
        pool_tokens: &[Address],
        user: Address,
    ) -> Result<(f64, f64)> {
        let lens = self.lens();
        let oracle = self.oracle();
        let (rewards, price) = self
            .provider
            .multicall()
            .add(lens.getUserUnclaimedRewards(pool_tokens.to_vec(), user))
            .add(oracle.getUnderlyingPrice(markets::COMP.pool_token))
            .aggregate()
            .await?;
        Ok(rewards_value(rewards, price))
    }

    /// Supplies `amount` and lets Morpho spend at most `max_gas_for_matching` on matching.
    pub async fn supply_with_max_gas(
        &self,
        market: &Market,
        on_behalf: Address,
        amount: U256,
        max_gas_for_matching: U256,
    ) -> Result<TransactionReceipt> {
        evm::approve(&self.provider, market.underlying, self.contracts.morpho, amount).await?;
        let receipt = self
            .morpho()
            .supply_1(market.pool_token, on_behalf, amount, max_gas_for_matching)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("supplied {amount} to {}: {}", market.pool_token, receipt.transaction_hash);
        Ok(receipt)
    }
}

/// Normalized COMP amount and its USD value.
fn rewards_value(rewards: U256, price: U256) -> (f64, f64) {
    let comp = units::normalize(rewards, COMP_DECIMALS);
    (comp, comp * Conventions::COMPOUND.price(price, COMP_DECIMALS))
}

impl<P> MorphoClient for Client<P>
where
    P: Provider,
{
    fn conventions(&self) -> Conventions {
        Conventions::COMPOUND
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
        let price = self
            .oracle()
            .getUnderlyingPrice(market.pool_token)
            .call()
            .await?;
        Ok(self.conventions().price(price, market.decimals))
    }

    async fn average_apr(&self, market: &Market, side: Side) -> Result<f64> {
        let lens = self.lens();
        let rate = match side {
            Side::Supply => {
                lens.getAverageSupplyRatePerBlock(market.pool_token)
                    .call()
                    .await?
                    .avgSupplyRatePerBlock
            }
            Side::Borrow => {
                lens.getAverageBorrowRatePerBlock(market.pool_token)
                    .call()
                    .await?
                    .avgBorrowRatePerBlock
            }
        };
        Ok(self.conventions().annual_rate(rate, &self.schedule))
    }

    async fn user_apr(&self, market: &Market, user: Address, side: Side) -> Result<f64> {
        let lens = self.lens();
        let rate = match side {
            Side::Supply => {
                lens.getCurrentUserSupplyRatePerBlock(market.pool_token, user)
                    .call()
                    .await?
            }
            Side::Borrow => {
                lens.getCurrentUserBorrowRatePerBlock(market.pool_token, user)
                    .call()
                    .await?
            }
        };
        Ok(self.conventions().annual_rate(rate, &self.schedule))
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
                lens.getNextUserSupplyRatePerBlock(market.pool_token, user, amount)
                    .call()
                    .await?
                    .nextSupplyRatePerBlock
            }
            Side::Borrow => {
                lens.getNextUserBorrowRatePerBlock(market.pool_token, user, amount)
                    .call()
                    .await?
                    .nextBorrowRatePerBlock
            }
        };
        Ok(self.conventions().annual_rate(rate, &self.schedule))
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
            .supply_0(market.pool_token, on_behalf, amount)
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

    #[test]
    fn test_markets_by_symbol() {
        assert_eq!(markets::by_symbol("dai"), Some(markets::DAI));
        assert_eq!(markets::by_symbol("WBTC").map(|m| m.decimals), Some(8));
        assert_eq!(markets::by_symbol("USDT"), None);
    }

    #[test]
    fn test_markets_are_distinct() {
        for (i, (_, a)) in markets::ALL.iter().enumerate() {
            for (_, b) in markets::ALL.iter().skip(i + 1) {
                assert_ne!(a.pool_token, b.pool_token);
                assert_ne!(a.underlying, b.underlying);
            }
        }
    }

    #[test]
    fn test_wbtc_price_scale() {
        // the oracle quotes WBTC with 36 - 8 = 28 decimals
        let raw = U256::from(2_712_345u64) * U256::from(10u64).pow(U256::from(26));
        assert_eq!(
            Conventions::COMPOUND.price(raw, markets::WBTC.decimals),
            27_123.45
        );
    }

    #[test]
    fn test_rewards_value() {
        let comp = U256::from(10u64).pow(U256::from(18));
        let test_values = [
            // $50 per COMP quoted with 36 - 18 decimals
            (comp * U256::from(3u64), U256::from(50u64) * comp, (3.0, 150.0)),
            (comp / U256::from(4u64), U256::from(50u64) * comp, (0.25, 12.5)),
            (U256::ZERO, U256::from(50u64) * comp, (0.0, 0.0)),
        ];
        for (index, (rewards, price, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(rewards_value(rewards, price), expect, "failed at {index}");
        }
    }

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_query() {
        let client = Client::mainnet().await.unwrap();
        let dai = client
            .market_total(&markets::DAI, Side::Supply)
            .await
            .unwrap();
        assert!(dai.total >= dai.matched);
    }
}
