//! Borrow-side view of Morpho-AaveV2 for one account.
//!
//! AaveV2 values everything in ETH. This example also expresses the totals
//! and the account's WBTC borrow in DAI, dividing ETH values by DAI's ETH price.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example aave_v2_borrower -- --user 0x...
//! ```

use clap::Parser;
use morphosdk::{
    Address,
    evm::{self, DynProvider},
    morpho::{
        MorphoClient, Side,
        aave_v2::{self, markets},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account to inspect.
    #[arg(short, long)]
    user: Address,
    /// RPC url
    #[arg(short, long, env = "RPC_URL", default_value = evm::DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Cli::parse();

    let provider = DynProvider::new(evm::mainnet_with_url(&args.rpc_url).await?);
    let client = aave_v2::Client::new(provider, aave_v2::Contracts::MAINNET);

    let total = client.total(Side::Borrow).await?;
    let total_dai = client.total_in(Side::Borrow, evm::DAI).await?;
    println!("total borrow: {:.4} ETH, {:.2} DAI", total.total, total_dai.total);

    let dai = client.market_total(&markets::DAI, Side::Borrow).await?;
    let dai_apr = client.average_apr(&markets::DAI, Side::Borrow).await?;
    println!(
        "DAI borrow: {:.2} ({:.2} matched), average APR {:.3}%",
        dai.total,
        dai.matched,
        dai_apr * 100.0
    );

    let wbtc = client.balance(&markets::WBTC, args.user, Side::Borrow).await?;
    let wbtc_eth = client
        .balance_value(&markets::WBTC, args.user, Side::Borrow)
        .await?;
    let wbtc_dai = client
        .balance_in(&markets::WBTC, args.user, Side::Borrow, evm::DAI)
        .await?;
    let wbtc_apr = client.user_apr(&markets::WBTC, args.user, Side::Borrow).await?;
    println!(
        "WBTC borrowed: {:.8} ({:.4} ETH, {:.2} DAI) at {:.3}%",
        wbtc.total,
        wbtc_eth.total,
        wbtc_dai.total,
        wbtc_apr * 100.0
    );

    Ok(())
}
