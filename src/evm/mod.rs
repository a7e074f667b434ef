//! Ethereum provider setup and token helpers.
//!
//! The Morpho clients are generic over any Alloy provider. This module builds
//! mainnet providers, with or without a wallet, and exposes the ERC-20 and
//! WETH9 bindings used around Morpho calls.
//!
//! # Examples
//!
//! ## Create a Provider
//!
//! ```no_run
//! use morphosdk::evm::{self, ProviderTrait};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = evm::mainnet().await?;
//! let block = provider.get_block_number().await?;
//! println!("Current block: {}", block);
//! # Ok(())
//! # }
//! ```
//!
//! ## Interact with ERC-20 Tokens
//!
//! ```no_run
//! use morphosdk::evm::{self, DAI, ERC20};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = evm::mainnet().await?;
//! let dai = ERC20::new(DAI, provider);
//!
//! let symbol = dai.symbol().call().await?;
//! let decimals = dai.decimals().call().await?;
//! println!("{symbol} has {decimals} decimals");
//! # Ok(())
//! # }
//! ```

// reimport
pub use alloy::providers::ProviderBuilder;
use alloy::{
    network::{Ethereum, IntoWallet},
    primitives::{B256, b256},
    rpc::types::TransactionReceipt,
    transports::TransportError,
};
/// reimport primitives
pub use alloy::{
    primitives::{Address, U256, address},
    providers::Provider as ProviderTrait,
    sol,
};

/// Default Ethereum mainnet RPC URL.
pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

/// DAI token address.
pub const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
/// WETH9 (Wrapped Ether) contract address.
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
/// WBTC token address.
pub const WBTC: Address = address!("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
/// COMP token address.
pub const COMP: Address = address!("0xc00e94Cb662C3520282E6f5717214004A7f26888");

/// `keccak256("eip1967.proxy.implementation") - 1`
pub const EIP1967_IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// Provider trait for Ethereum mainnet.
///
/// This trait is implemented by all Alloy providers and ensures they can be
/// used with the Morpho clients.
pub trait Provider: alloy::providers::Provider<Ethereum> + Send + Clone + 'static {}

/// Dynamic provider type.
///
/// Use this when you need type erasure for providers.
pub type DynProvider = alloy::providers::DynProvider<Ethereum>;

impl<T> Provider for T where T: alloy::providers::Provider<Ethereum> + Send + Clone + 'static {}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface ERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface WETH9 {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Creates a provider for Ethereum mainnet.
///
/// Connects to [`DEFAULT_RPC_URL`].
#[inline(always)]
pub async fn mainnet() -> Result<impl Provider, TransportError> {
    mainnet_with_url(DEFAULT_RPC_URL).await
}

/// Creates a provider with a signer for Ethereum mainnet.
///
/// This allows you to send transactions that modify blockchain state.
///
/// # Example
///
/// ```no_run
/// use morphosdk::evm;
/// use alloy::signers::local::PrivateKeySigner;
///
/// # async fn example() -> anyhow::Result<()> {
/// let signer: PrivateKeySigner = "your_key".parse()?;
/// let provider = evm::mainnet_with_signer(signer).await?;
/// // Can now send transactions
/// # Ok(())
/// # }
/// ```
#[inline(always)]
pub async fn mainnet_with_signer<S>(signer: S) -> Result<impl Provider, TransportError>
where
    S: IntoWallet<Ethereum>,
    <S as IntoWallet<Ethereum>>::NetworkWallet: Clone + 'static,
{
    mainnet_with_signer_and_url(DEFAULT_RPC_URL, signer).await
}

/// Creates a provider with a custom RPC URL.
#[inline(always)]
pub async fn mainnet_with_url(url: &str) -> Result<impl Provider, TransportError> {
    let p = ProviderBuilder::new().connect(url).await?;
    Ok(p)
}

/// Creates a provider with a custom RPC URL and signer.
#[inline(always)]
pub async fn mainnet_with_signer_and_url<S>(
    url: &str,
    signer: S,
) -> Result<impl Provider, TransportError>
where
    S: IntoWallet<Ethereum>,
    <S as IntoWallet<Ethereum>>::NetworkWallet: Clone + 'static,
{
    let provider = ProviderBuilder::new().wallet(signer).connect(url).await?;
    Ok(provider)
}

/// Approves `spender` to move `amount` of `token` from the provider's wallet.
pub async fn approve<P: Provider>(
    provider: &P,
    token: Address,
    spender: Address,
    amount: U256,
) -> anyhow::Result<TransactionReceipt> {
    log::debug!("approve {amount} of {token} to {spender}");
    let receipt = ERC20::new(token, provider.clone())
        .approve(spender, amount)
        .send()
        .await?
        .get_receipt()
        .await?;
    log::info!("approved {token}: {}", receipt.transaction_hash);
    Ok(receipt)
}

/// Wraps `amount` wei of ETH into WETH.
pub async fn wrap_eth<P: Provider>(
    provider: &P,
    amount: U256,
) -> anyhow::Result<TransactionReceipt> {
    log::debug!("wrapping {amount} wei");
    let receipt = WETH9::new(WETH, provider.clone())
        .deposit()
        .value(amount)
        .send()
        .await?
        .get_receipt()
        .await?;
    log::info!("wrapped ETH: {}", receipt.transaction_hash);
    Ok(receipt)
}

/// Unwraps `amount` wei of WETH back into ETH.
pub async fn unwrap_eth<P: Provider>(
    provider: &P,
    amount: U256,
) -> anyhow::Result<TransactionReceipt> {
    log::debug!("unwrapping {amount} wei");
    let receipt = WETH9::new(WETH, provider.clone())
        .withdraw(amount)
        .send()
        .await?
        .get_receipt()
        .await?;
    log::info!("unwrapped WETH: {}", receipt.transaction_hash);
    Ok(receipt)
}

/// Returns the implementation behind an EIP-1967 proxy.
///
/// Returns `None` when the implementation slot is empty, i.e. `proxy` is not a proxy.
pub async fn implementation_address<P: Provider>(
    provider: &P,
    proxy: Address,
) -> Result<Option<Address>, TransportError> {
    let slot = provider
        .get_storage_at(proxy, U256::from_be_bytes(EIP1967_IMPLEMENTATION_SLOT.0))
        .await?;
    let implementation = address_from_slot(slot);
    Ok((!implementation.is_zero()).then_some(implementation))
}

/// Addresses are stored in the low 20 bytes of a storage word.
fn address_from_slot(slot: U256) -> Address {
    Address::from_slice(&slot.to_be_bytes::<32>()[12..])
}

#[cfg(test)]
mod tests {
    use alloy::primitives::keccak256;

    use super::*;

    fn eip1967_slot(label: &str) -> B256 {
        let slot = U256::from_be_bytes(keccak256(label).0) - U256::from(1);
        B256::from(slot.to_be_bytes::<32>())
    }

    #[test]
    fn test_implementation_slot() {
        assert_eq!(
            eip1967_slot("eip1967.proxy.implementation"),
            EIP1967_IMPLEMENTATION_SLOT
        );
    }

    #[test]
    fn test_address_from_slot() {
        let implementation = address!("0x1dd6bD8f8CDc96bBe42Ec09a2d5f08c7E0e7C85b");
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(implementation.as_slice());

        assert_eq!(address_from_slot(U256::from_be_bytes(word)), implementation);
        assert!(address_from_slot(U256::ZERO).is_zero());
    }

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_query() {
        let provider = ProviderBuilder::new().connect_http(DEFAULT_RPC_URL.parse().unwrap());
        let wbtc = ERC20::new(WBTC, provider.clone());
        let decimals = wbtc.decimals().call().await.unwrap();
        assert_eq!(decimals, 8);
    }
}
