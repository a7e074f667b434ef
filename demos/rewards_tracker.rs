//! Tracks the COMP rewards an account accrued through Morpho-Compound.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example rewards_tracker -- --user 0x...
//!
//! # Poll every 5 minutes
//! cargo run --example rewards_tracker -- --user 0x... --interval 300
//! ```

use std::time::Duration;

use clap::Parser;
use morphosdk::{
    Address,
    evm::{self, DynProvider},
    morpho::compound::{self, markets},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account to track.
    #[arg(short, long)]
    user: Address,
    /// Seconds between two polls, a single poll when omitted.
    #[arg(short, long)]
    interval: Option<u64>,
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
    let client = compound::Client::new(provider, compound::Contracts::MAINNET);
    let pool_tokens: Vec<Address> = markets::ALL.iter().map(|(_, m)| m.pool_token).collect();

    loop {
        let (comp, usd) = client.unclaimed_rewards_usd(&pool_tokens, args.user).await?;
        println!("unclaimed COMP rewards: {comp:.6} (${usd:.2})");

        let Some(interval) = args.interval else {
            break;
        };
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }

    Ok(())
}
