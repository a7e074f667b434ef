use std::io::{Write, stdout};

use clap::Args;
use morphosdk::{
    Address, Decimal,
    morpho::{MorphoClient, Protocol, Side, aave_v2, compound},
};
use tabwriter::TabWriter;

use crate::{
    ProtocolArgs, Run, RpcArgs,
    utils::{self, percent, split_cells},
};

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub rpc: RpcArgs,
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Market symbols, all markets when omitted.
    #[arg(long, value_delimiter = ',')]
    pub markets: Vec<String>,
    /// Show the positions of this user.
    #[arg(long)]
    pub user: Option<Address>,
    /// Simulate the user's rate after supplying or borrowing this much more.
    #[arg(long, requires = "user")]
    pub amount: Option<Decimal>,
    /// Also express totals and positions in this asset (aave-v2 only).
    #[arg(long = "in", value_name = "SYMBOL")]
    pub denomination: Option<String>,
}

#[derive(Args)]
pub struct SupplyStatsCmd {
    #[command(flatten)]
    args: StatsArgs,
}

impl Run for SupplyStatsCmd {
    async fn run(&self) -> anyhow::Result<()> {
        run_stats(&self.args, Side::Supply).await
    }
}

#[derive(Args)]
pub struct BorrowStatsCmd {
    #[command(flatten)]
    args: StatsArgs,
}

impl Run for BorrowStatsCmd {
    async fn run(&self) -> anyhow::Result<()> {
        run_stats(&self.args, Side::Borrow).await
    }
}

async fn run_stats(args: &StatsArgs, side: Side) -> anyhow::Result<()> {
    let protocol = args.protocol.protocol;
    let provider = utils::provider(&args.rpc).await?;
    match protocol {
        Protocol::Compound => {
            anyhow::ensure!(
                args.denomination.is_none(),
                "--in is only supported on aave-v2"
            );
            let client = compound::Client::new(provider, compound::Contracts::MAINNET);
            print_stats(&client, protocol, args, side).await
        }
        Protocol::AaveV2 => {
            let client = aave_v2::Client::new(provider, aave_v2::Contracts::MAINNET);
            print_stats(&client, protocol, args, side).await?;
            if let Some(symbol) = args.denomination.as_deref() {
                print_denominated(&client, args, side, symbol).await?;
            }
            Ok(())
        }
    }
}

fn selected_symbols(args: &StatsArgs) -> Vec<String> {
    if args.markets.is_empty() {
        utils::symbols(args.protocol.protocol)
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        args.markets.clone()
    }
}

async fn print_stats<C: MorphoClient>(
    client: &C,
    protocol: Protocol,
    args: &StatsArgs,
    side: Side,
) -> anyhow::Result<()> {
    let reference = client.conventions().reference;
    let total = client.total(side).await?;

    let mut writer = TabWriter::new(stdout());
    writeln!(
        &mut writer,
        "{protocol} {side}\tmatched\tpooled\ttotal\tavg apr\tprice ({reference})"
    )?;
    writeln!(
        &mut writer,
        "all markets ({reference})\t{}\t-\t-",
        split_cells(&total)
    )?;

    let symbols = selected_symbols(args);
    for symbol in &symbols {
        let market = utils::market(protocol, symbol)?;
        let (split, (apr, price)) = futures::future::try_join(
            client.market_total(&market, side),
            futures::future::try_join(
                client.average_apr(&market, side),
                client.price(&market),
            ),
        )
        .await?;
        writeln!(
            &mut writer,
            "{symbol}\t{}\t{}\t{price:.6}",
            split_cells(&split),
            percent(apr),
        )?;
    }
    writer.flush()?;

    let Some(user) = args.user else {
        return Ok(());
    };

    let mut writer = TabWriter::new(stdout());
    writeln!(&mut writer)?;
    writeln!(
        &mut writer,
        "{user} {side}\tmatched\tpooled\ttotal\tvalue ({reference})\tapr\tnext apr"
    )?;
    for symbol in &symbols {
        let market = utils::market(protocol, symbol)?;
        // one balance read, valued with the price
        let ((balance, price), apr) = futures::future::try_join(
            futures::future::try_join(
                client.balance(&market, user, side),
                client.price(&market),
            ),
            client.user_apr(&market, user, side),
        )
        .await?;
        let value = balance.value(price);
        let next = match args.amount {
            Some(amount) => {
                let raw = utils::raw_amount(amount, market.decimals)?;
                percent(client.next_user_apr(&market, user, side, raw).await?)
            }
            None => "-".to_owned(),
        };
        writeln!(
            &mut writer,
            "{symbol}\t{}\t{:.4}\t{}\t{next}",
            split_cells(&balance),
            value.total,
            percent(apr),
        )?;
    }
    writer.flush()?;

    Ok(())
}

async fn print_denominated<P: morphosdk::evm::Provider>(
    client: &aave_v2::Client<P>,
    args: &StatsArgs,
    side: Side,
    symbol: &str,
) -> anyhow::Result<()> {
    let asset = utils::market(Protocol::AaveV2, symbol)?.underlying;
    let total = client.total_in(side, asset).await?;

    let mut writer = TabWriter::new(stdout());
    writeln!(&mut writer)?;
    writeln!(&mut writer, "in {symbol}\tmatched\tpooled\ttotal")?;
    writeln!(&mut writer, "all markets\t{}", split_cells(&total))?;

    if let Some(user) = args.user {
        for market_symbol in selected_symbols(args) {
            let market = utils::market(Protocol::AaveV2, &market_symbol)?;
            let balance = client.balance_in(&market, user, side, asset).await?;
            writeln!(
                &mut writer,
                "{user} on {market_symbol}\t{}",
                split_cells(&balance)
            )?;
        }
    }
    writer.flush()?;

    Ok(())
}
