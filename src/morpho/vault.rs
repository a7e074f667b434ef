//! Morpho supply vaults.
//!
//! Supply vaults are ERC-4626 tokens wrapping a Morpho supply position on a
//! single market. Shares are converted back to the underlying with
//! `convertToAssets`, so a balance query takes two dependent calls.
//!
//! ```no_run
//! use morphosdk::morpho::vault::{self, SupplyVault};
//! use morphosdk::{Address, evm};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = evm::mainnet().await?;
//! let vault = SupplyVault::load(provider, vault::MA_DAI).await?;
//! let owner: Address = "0x...".parse()?;
//! println!("{} DAI", vault.assets_of(owner).await?);
//! # Ok(())
//! # }
//! ```

use alloy::{
    primitives::{Address, U256, address},
    rpc::types::TransactionReceipt,
};
use anyhow::Result;

use crate::{
    evm::{self, ERC20, Provider},
    morpho::contracts::{
        ISupplyHarvestVault,
        ISupplyVault::{self, ISupplyVaultInstance},
    },
    units,
};

/// Morpho-AaveV2 DAI supply vault.
pub const MA_DAI: Address = address!("0xd99D793B8FDaE42C1867293C172b9CBBD3ea49FF");
/// Morpho-Compound DAI supply harvest vault.
///
/// Its COMP rewards are swapped back into DAI with [`SupplyVault::harvest`].
pub const MCH_DAI: Address = address!("0x5CBead740564A2173983E48f94F36357C1954EAE");

/// An ERC-4626 supply vault.
#[derive(Debug, Clone)]
pub struct SupplyVault<P>
where
    P: Provider,
{
    provider: P,
    address: Address,
    asset: Address,
    decimals: u8,
}

impl<P> SupplyVault<P>
where
    P: Provider,
{
    /// Creates a vault whose underlying is already known.
    pub fn new(provider: P, address: Address, asset: Address, decimals: u8) -> Self {
        Self {
            provider,
            address,
            asset,
            decimals,
        }
    }

    /// Loads the vault's underlying and its decimals.
    pub async fn load(provider: P, address: Address) -> Result<Self> {
        let asset = ISupplyVault::new(address, provider.clone())
            .asset()
            .call()
            .await?;
        let decimals = ERC20::new(asset, provider.clone())
            .decimals()
            .call()
            .await?;
        log::debug!("vault {address}: asset {asset} with {decimals} decimals");
        Ok(Self::new(provider, address, asset, decimals))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Underlying asset.
    pub fn asset(&self) -> Address {
        self.asset
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn instance(&self) -> ISupplyVaultInstance<P> {
        ISupplyVault::new(self.address, self.provider.clone())
    }

    /// Returns the amount of underlying `owner` can redeem.
    pub async fn assets_of(&self, owner: Address) -> Result<f64> {
        let vault = self.instance();
        let shares = vault.balanceOf(owner).call().await?;
        let assets = vault.convertToAssets(shares).call().await?;
        log::debug!("{owner} holds {shares} shares of {}, {assets} assets", self.address);
        Ok(units::normalize(assets, self.decimals))
    }

    /// Returns the total underlying managed by the vault.
    pub async fn total_assets(&self) -> Result<f64> {
        let assets = self.instance().totalAssets().call().await?;
        Ok(units::normalize(assets, self.decimals))
    }

    /// Returns the rewards accrued by `owner` and not claimed yet.
    ///
    /// Only supply vaults that distribute rewards implement `userRewards`.
    pub async fn unclaimed_rewards(&self, owner: Address, reward_decimals: u8) -> Result<f64> {
        let rewards = self.instance().userRewards(owner).call().await?;
        Ok(units::normalize(U256::from(rewards.unclaimed), reward_decimals))
    }

    /// Approves and deposits `amount` of the underlying, minting shares to `receiver`.
    pub async fn deposit(&self, amount: U256, receiver: Address) -> Result<TransactionReceipt> {
        evm::approve(&self.provider, self.asset, self.address, amount).await?;
        let receipt = self
            .instance()
            .deposit(amount, receiver)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("deposited {amount} into {}: {}", self.address, receipt.transaction_hash);
        Ok(receipt)
    }

    /// Withdraws `amount` of the underlying from `owner`'s shares to `receiver`.
    pub async fn withdraw(
        &self,
        amount: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .instance()
            .withdraw(amount, receiver, owner)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("withdrew {amount} from {}: {}", self.address, receipt.transaction_hash);
        Ok(receipt)
    }

    /// Claims the rewards of `user`.
    pub async fn claim_rewards(&self, user: Address) -> Result<TransactionReceipt> {
        let receipt = self
            .instance()
            .claimRewards(user)
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("claimed rewards of {user}: {}", receipt.transaction_hash);
        Ok(receipt)
    }

    /// Swaps the vault's rewards into the underlying and supplies them.
    pub async fn harvest(&self) -> Result<TransactionReceipt> {
        let receipt = ISupplyHarvestVault::new(self.address, self.provider.clone())
            .harvest()
            .send()
            .await?
            .get_receipt()
            .await?;
        log::info!("harvested {}: {}", self.address, receipt.transaction_hash);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_load() {
        let provider = evm::mainnet().await.unwrap();
        let vault = SupplyVault::load(provider, MA_DAI).await.unwrap();
        assert_eq!(vault.asset(), evm::DAI);
        assert_eq!(vault.decimals(), 18);
        assert!(vault.total_assets().await.unwrap() >= 0.0);
    }

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_assets_of_nobody() {
        let provider = evm::mainnet().await.unwrap();
        let vault = SupplyVault::new(provider, MCH_DAI, evm::DAI, 18);
        assert_eq!(vault.assets_of(Address::ZERO).await.unwrap(), 0.0);
    }
}
