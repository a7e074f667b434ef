//! Deposits into a Morpho supply vault and reports the resulting balance.
//!
//! Without `--amount` the example only reads the balance. Depositing needs a
//! private key, taken from `--private-key` or the `PRIVATE_KEY` variable.
//!
//! # Usage
//!
//! ```bash
//! # Balance in the maDAI vault
//! cargo run --example vault_supplier -- --owner 0x...
//!
//! # Deposit 100 DAI into the mchDAI vault
//! cargo run --example vault_supplier -- \
//!   --vault 0x5CBead740564A2173983E48f94F36357C1954EAE \
//!   --amount 100
//! ```

use alloy::signers::{Signer, local::PrivateKeySigner};
use clap::Parser;
use morphosdk::{
    Address, Decimal,
    evm::{self, DynProvider},
    morpho::vault::{self, SupplyVault},
    units,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vault address.
    #[arg(long, default_value_t = vault::MA_DAI)]
    vault: Address,
    /// Account to inspect, the signer by default.
    #[arg(long)]
    owner: Option<Address>,
    /// Amount of the underlying to deposit.
    #[arg(long)]
    amount: Option<Decimal>,
    /// Private key of the depositor.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    /// RPC url
    #[arg(short, long, env = "RPC_URL", default_value = evm::DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Cli::parse();

    let signer: Option<PrivateKeySigner> =
        args.private_key.as_deref().map(str::parse).transpose()?;
    let owner = args
        .owner
        .or_else(|| signer.as_ref().map(|s| s.address()))
        .ok_or(anyhow::anyhow!("pass --owner or a private key"))?;

    let provider = match signer {
        Some(signer) => DynProvider::new(
            evm::mainnet_with_signer_and_url(&args.rpc_url, signer).await?,
        ),
        None => DynProvider::new(evm::mainnet_with_url(&args.rpc_url).await?),
    };
    let vault = SupplyVault::load(provider, args.vault).await?;

    if let Some(amount) = args.amount {
        let raw = units::try_to_wei(amount, vault.decimals())?;
        let receipt = vault.deposit(raw, owner).await?;
        println!("deposited {amount}: {}", receipt.transaction_hash);
    }

    println!("balance: {:.6}", vault.assets_of(owner).await?);
    println!("vault total: {:.2}", vault.total_assets().await?);

    Ok(())
}
