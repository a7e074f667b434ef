use clap::{ArgAction, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use morphosdk::{evm, morpho::Protocol};

mod abis;
mod rewards;
mod stats;
mod tx;
mod utils;
mod vault;

use abis::FetchAbisCmd;
use rewards::RewardsCmd;
use stats::{BorrowStatsCmd, SupplyStatsCmd};
use tx::{BorrowCmd, ClaimRewardsCmd, RepayCmd, SupplyCmd, WithdrawCmd};
use vault::VaultCmd;

#[derive(Parser)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log more (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[enum_dispatch]
trait Run {
    async fn run(&self) -> anyhow::Result<()>;
}

#[derive(Subcommand)]
#[enum_dispatch(Run)]
enum Commands {
    /// Supply side of Morpho markets, optionally for a user.
    SupplyStats(SupplyStatsCmd),
    /// Borrow side of Morpho markets, optionally for a user.
    BorrowStats(BorrowStatsCmd),
    /// Approve and supply to a market.
    Supply(SupplyCmd),
    /// Withdraw from a market.
    Withdraw(WithdrawCmd),
    /// Borrow from a market.
    Borrow(BorrowCmd),
    /// Approve and repay a borrow.
    Repay(RepayCmd),
    /// Claim the rewards accrued through Morpho.
    ClaimRewards(ClaimRewardsCmd),
    /// Unclaimed COMP rewards of a user on Morpho-Compound.
    Rewards(RewardsCmd),
    /// ERC-4626 supply vaults.
    #[command(subcommand)]
    Vault(VaultCmd),
    /// Download the verified ABIs of the Morpho contracts.
    FetchAbis(FetchAbisCmd),
}

/// Connection to an Ethereum node.
#[derive(Args, Clone)]
pub struct RpcArgs {
    /// Ethereum JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL", default_value = evm::DEFAULT_RPC_URL)]
    pub rpc_url: String,
}

/// Connection and credentials for commands sending transactions.
#[derive(Args, Clone, derive_more::Deref)]
pub struct SignerArgs {
    #[deref]
    #[command(flatten)]
    pub rpc: RpcArgs,
    /// Private key of the sender.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// Foundry keystore name, looked up in `~/.foundry/keystores`.
    #[arg(long, conflicts_with = "private_key")]
    pub keystore: Option<String>,
    /// Keystore password, prompted when missing.
    #[arg(long, requires = "keystore")]
    pub password: Option<String>,
}

/// Deployment selector shared by the market commands.
#[derive(Args, Clone)]
pub struct ProtocolArgs {
    /// `compound` or `aave-v2`.
    #[arg(long, default_value = "compound")]
    pub protocol: Protocol,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let level = match args.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)?;

    args.command.run().await
}
