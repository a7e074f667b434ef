//! Supply-side view of Morpho-Compound for one account.
//!
//! Prints the protocol-wide supply, the supply of each market, and the
//! account's balances with their USD value and the rate they earn.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example compound_supplier -- --user 0x...
//!
//! # Simulate the rate after supplying 100 more of each asset
//! cargo run --example compound_supplier -- --user 0x... --amount 100
//! ```
//!
//! # Output
//!
//! ```text
//! total supply: $1234567.89 (456789.01 matched)
//! DAI: 120034.55 supplied, average APR 2.314%
//! DAI: 1000.000000 ($1000.12), APR 2.402%, next 2.398%
//! ```

use clap::Parser;
use morphosdk::{
    Address, Decimal,
    evm::{self, DynProvider},
    morpho::{
        MorphoClient, Side,
        compound::{self, markets},
    },
    units,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account to inspect.
    #[arg(short, long)]
    user: Address,
    /// Amount to simulate an extra supply with.
    #[arg(short, long)]
    amount: Option<Decimal>,
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

    let total = client.total(Side::Supply).await?;
    println!("total supply: ${:.2} ({:.2} matched)", total.total, total.matched);

    for (symbol, market) in markets::ALL {
        let supplied = client.market_total(&market, Side::Supply).await?;
        let apr = client.average_apr(&market, Side::Supply).await?;
        println!(
            "{symbol}: {:.2} supplied, average APR {:.3}%",
            supplied.total,
            apr * 100.0
        );

        let balance = client.balance(&market, args.user, Side::Supply).await?;
        if balance.total == 0.0 {
            continue;
        }
        let value = balance.value(client.price(&market).await?);
        let apr = client.user_apr(&market, args.user, Side::Supply).await?;
        print!(
            "{symbol}: {:.6} (${:.2}), APR {:.3}%",
            balance.total,
            value.total,
            apr * 100.0
        );
        if let Some(amount) = args.amount {
            let raw = units::try_to_wei(amount, market.decimals)?;
            let next = client
                .next_user_apr(&market, args.user, Side::Supply, raw)
                .await?;
            print!(", next {:.3}%", next * 100.0);
        }
        println!();
    }

    Ok(())
}
