use std::io::{Write, stdout};

use clap::Args;
use morphosdk::{
    Address,
    morpho::{Protocol, compound},
};
use tabwriter::TabWriter;

use crate::{Run, RpcArgs, utils};

#[derive(Args)]
pub struct RewardsCmd {
    #[command(flatten)]
    rpc: RpcArgs,
    /// User to query.
    user: Address,
    /// Morpho-Compound markets accruing rewards, all markets when omitted.
    #[arg(long, value_delimiter = ',')]
    markets: Vec<String>,
}

impl Run for RewardsCmd {
    async fn run(&self) -> anyhow::Result<()> {
        let symbols = if self.markets.is_empty() {
            utils::symbols(Protocol::Compound)
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            self.markets.clone()
        };
        let pool_tokens = symbols
            .iter()
            .map(|symbol| utils::market(Protocol::Compound, symbol).map(|m| m.pool_token))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let provider = utils::provider(&self.rpc).await?;
        let client = compound::Client::new(provider, compound::Contracts::MAINNET);
        let (comp, usd) = client.unclaimed_rewards_usd(&pool_tokens, self.user).await?;

        let mut writer = TabWriter::new(stdout());
        writeln!(&mut writer, "markets\tunclaimed COMP\tUSD")?;
        writeln!(&mut writer, "{}\t{comp:.6}\t{usd:.2}", symbols.join(","))?;
        writer.flush()?;

        Ok(())
    }
}
