use alloy::rpc::types::TransactionReceipt;
use clap::Args;
use morphosdk::{
    Address, Decimal, U256,
    evm::{self, DynProvider},
    morpho::{Market, MorphoClient, Protocol, aave_v2, compound},
};

use crate::{ProtocolArgs, Run, SignerArgs, utils};

/// Arguments shared by the single-market transactions.
#[derive(Args)]
pub struct MarketTxArgs {
    #[command(flatten)]
    pub signer: SignerArgs,
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Market symbol, e.g. DAI.
    pub market: String,
    /// Amount of the underlying, e.g. 100.5
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Supply { on_behalf: Address },
    Withdraw,
    Borrow,
    Repay { on_behalf: Address },
}

async fn execute<C: MorphoClient>(
    client: &C,
    action: Action,
    market: &Market,
    amount: U256,
) -> anyhow::Result<TransactionReceipt> {
    match action {
        Action::Supply { on_behalf } => client.supply(market, on_behalf, amount).await,
        Action::Withdraw => client.withdraw(market, amount).await,
        Action::Borrow => client.borrow(market, amount).await,
        Action::Repay { on_behalf } => client.repay(market, on_behalf, amount).await,
    }
}

/// Resolves the market and amount, builds the right client and sends `action`.
async fn send(
    args: &MarketTxArgs,
    action: impl FnOnce(Address) -> Action,
    wrap: bool,
    unwrap: bool,
) -> anyhow::Result<()> {
    let protocol = args.protocol.protocol;
    let market = utils::market(protocol, &args.market)?;
    let amount = utils::raw_amount(args.amount, market.decimals)?;
    anyhow::ensure!(
        !(wrap || unwrap) || market.underlying == evm::WETH,
        "only the ETH market can be wrapped or unwrapped"
    );

    let (provider, sender) = utils::signing_provider(&args.signer).await?;
    let action = action(sender);

    if wrap {
        evm::wrap_eth(&provider, amount).await?;
    }

    let receipt = match protocol {
        Protocol::Compound => {
            let client = compound::Client::new(provider.clone(), compound::Contracts::MAINNET);
            execute(&client, action, &market, amount).await?
        }
        Protocol::AaveV2 => {
            let client = aave_v2::Client::new(provider.clone(), aave_v2::Contracts::MAINNET);
            execute(&client, action, &market, amount).await?
        }
    };
    print_receipt(&receipt);

    if unwrap {
        evm::unwrap_eth(&provider, amount).await?;
    }

    Ok(())
}

fn print_receipt(receipt: &TransactionReceipt) {
    let status = if receipt.status() { "ok" } else { "reverted" };
    println!("{} {status}", receipt.transaction_hash);
}

#[derive(Args)]
pub struct SupplyCmd {
    #[command(flatten)]
    args: MarketTxArgs,
    /// Supply on behalf of this address instead of the sender.
    #[arg(long)]
    on_behalf: Option<Address>,
    /// Wrap ETH into WETH before supplying.
    #[arg(long)]
    wrap: bool,
    /// Gas Morpho may spend matching the supply (compound only).
    #[arg(long)]
    max_gas: Option<U256>,
}

impl Run for SupplyCmd {
    async fn run(&self) -> anyhow::Result<()> {
        let Some(max_gas) = self.max_gas else {
            let on_behalf = self.on_behalf;
            return send(
                &self.args,
                |sender| Action::Supply {
                    on_behalf: on_behalf.unwrap_or(sender),
                },
                self.wrap,
                false,
            )
            .await;
        };

        anyhow::ensure!(
            self.args.protocol.protocol == Protocol::Compound,
            "--max-gas is only supported on compound"
        );
        let market = utils::market(Protocol::Compound, &self.args.market)?;
        let amount = utils::raw_amount(self.args.amount, market.decimals)?;
        let (provider, sender) = utils::signing_provider(&self.args.signer).await?;
        if self.wrap {
            anyhow::ensure!(market.underlying == evm::WETH, "only ETH can be wrapped");
            evm::wrap_eth(&provider, amount).await?;
        }

        let client: compound::Client<DynProvider> =
            compound::Client::new(provider, compound::Contracts::MAINNET);
        let receipt = client
            .supply_with_max_gas(&market, self.on_behalf.unwrap_or(sender), amount, max_gas)
            .await?;
        print_receipt(&receipt);
        Ok(())
    }
}

#[derive(Args)]
pub struct WithdrawCmd {
    #[command(flatten)]
    args: MarketTxArgs,
    /// Unwrap the withdrawn WETH into ETH.
    #[arg(long)]
    unwrap: bool,
}

impl Run for WithdrawCmd {
    async fn run(&self) -> anyhow::Result<()> {
        send(&self.args, |_| Action::Withdraw, false, self.unwrap).await
    }
}

#[derive(Args)]
pub struct BorrowCmd {
    #[command(flatten)]
    args: MarketTxArgs,
    /// Unwrap the borrowed WETH into ETH.
    #[arg(long)]
    unwrap: bool,
}

impl Run for BorrowCmd {
    async fn run(&self) -> anyhow::Result<()> {
        send(&self.args, |_| Action::Borrow, false, self.unwrap).await
    }
}

#[derive(Args)]
pub struct RepayCmd {
    #[command(flatten)]
    args: MarketTxArgs,
    /// Repay on behalf of this address instead of the sender.
    #[arg(long)]
    on_behalf: Option<Address>,
    /// Wrap ETH into WETH before repaying.
    #[arg(long)]
    wrap: bool,
}

impl Run for RepayCmd {
    async fn run(&self) -> anyhow::Result<()> {
        let on_behalf = self.on_behalf;
        send(
            &self.args,
            |sender| Action::Repay {
                on_behalf: on_behalf.unwrap_or(sender),
            },
            self.wrap,
            false,
        )
        .await
    }
}

#[derive(Args)]
pub struct ClaimRewardsCmd {
    #[command(flatten)]
    signer: SignerArgs,
    #[command(flatten)]
    protocol: ProtocolArgs,
    /// Markets to claim on, all markets when omitted.
    #[arg(long, value_delimiter = ',')]
    markets: Vec<String>,
    /// Swap the rewards for MORPHO.
    #[arg(long)]
    trade_for_morpho: bool,
}

impl Run for ClaimRewardsCmd {
    async fn run(&self) -> anyhow::Result<()> {
        let protocol = self.protocol.protocol;
        let symbols = if self.markets.is_empty() {
            utils::symbols(protocol).into_iter().map(String::from).collect()
        } else {
            self.markets.clone()
        };
        let pool_tokens = symbols
            .iter()
            .map(|symbol| utils::market(protocol, symbol).map(|m| m.pool_token))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let (provider, _) = utils::signing_provider(&self.signer).await?;
        let receipt = match protocol {
            Protocol::Compound => {
                compound::Client::new(provider, compound::Contracts::MAINNET)
                    .claim_rewards(pool_tokens, self.trade_for_morpho)
                    .await?
            }
            Protocol::AaveV2 => {
                aave_v2::Client::new(provider, aave_v2::Contracts::MAINNET)
                    .claim_rewards(pool_tokens, self.trade_for_morpho)
                    .await?
            }
        };
        print_receipt(&receipt);
        Ok(())
    }
}
