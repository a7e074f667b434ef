use std::io::{Write, stdout};

use clap::{Args, Subcommand};
use morphosdk::{
    Address, Decimal,
    evm::DynProvider,
    morpho::vault::{self, SupplyVault},
};
use tabwriter::TabWriter;

use crate::{Run, RpcArgs, SignerArgs, utils};

/// Morpho supply vaults (maDAI, mchDAI, ...).
#[derive(Subcommand)]
pub enum VaultCmd {
    /// Underlying balance of an owner.
    Balance(VaultBalance),
    /// Approve and deposit the underlying.
    Deposit(VaultDeposit),
    /// Withdraw the underlying.
    Withdraw(VaultWithdraw),
    /// Claim the rewards of a user.
    Claim(VaultClaim),
    /// Swap the vault's rewards into the underlying.
    Harvest(VaultHarvest),
}

impl Run for VaultCmd {
    async fn run(&self) -> anyhow::Result<()> {
        match self {
            VaultCmd::Balance(cmd) => cmd.run().await,
            VaultCmd::Deposit(cmd) => cmd.run().await,
            VaultCmd::Withdraw(cmd) => cmd.run().await,
            VaultCmd::Claim(cmd) => cmd.run().await,
            VaultCmd::Harvest(cmd) => cmd.run().await,
        }
    }
}

#[derive(Args)]
pub struct VaultArgs {
    /// Vault address, maDAI by default.
    #[arg(long, default_value_t = vault::MA_DAI)]
    pub vault: Address,
}

async fn load(provider: DynProvider, args: &VaultArgs) -> anyhow::Result<SupplyVault<DynProvider>> {
    SupplyVault::load(provider, args.vault).await
}

#[derive(Args)]
pub struct VaultBalance {
    #[command(flatten)]
    rpc: RpcArgs,
    #[command(flatten)]
    vault: VaultArgs,
    owner: Address,
    /// Also show unclaimed rewards, using this many decimals (18 for COMP).
    #[arg(long)]
    reward_decimals: Option<u8>,
}

impl VaultBalance {
    async fn run(&self) -> anyhow::Result<()> {
        let vault = load(utils::provider(&self.rpc).await?, &self.vault).await?;
        let assets = vault.assets_of(self.owner).await?;
        let rewards = match self.reward_decimals {
            Some(decimals) => format!("{:.6}", vault.unclaimed_rewards(self.owner, decimals).await?),
            None => "-".to_owned(),
        };

        let mut writer = TabWriter::new(stdout());
        writeln!(&mut writer, "vault\tasset\tbalance\tunclaimed rewards")?;
        writeln!(
            &mut writer,
            "{}\t{}\t{assets:.6}\t{rewards}",
            vault.address(),
            vault.asset()
        )?;
        writer.flush()?;

        Ok(())
    }
}

#[derive(Args)]
pub struct VaultDeposit {
    #[command(flatten)]
    signer: SignerArgs,
    #[command(flatten)]
    vault: VaultArgs,
    amount: Decimal,
    /// Receiver of the shares, the sender by default.
    #[arg(long)]
    receiver: Option<Address>,
}

impl VaultDeposit {
    async fn run(&self) -> anyhow::Result<()> {
        let (provider, sender) = utils::signing_provider(&self.signer).await?;
        let vault = load(provider, &self.vault).await?;
        let amount = utils::raw_amount(self.amount, vault.decimals())?;
        let receipt = vault
            .deposit(amount, self.receiver.unwrap_or(sender))
            .await?;
        println!("{}", receipt.transaction_hash);
        Ok(())
    }
}

#[derive(Args)]
pub struct VaultWithdraw {
    #[command(flatten)]
    signer: SignerArgs,
    #[command(flatten)]
    vault: VaultArgs,
    amount: Decimal,
    /// Receiver of the underlying, the sender by default.
    #[arg(long)]
    receiver: Option<Address>,
    /// Owner of the shares, the sender by default.
    #[arg(long)]
    owner: Option<Address>,
}

impl VaultWithdraw {
    async fn run(&self) -> anyhow::Result<()> {
        let (provider, sender) = utils::signing_provider(&self.signer).await?;
        let vault = load(provider, &self.vault).await?;
        let amount = utils::raw_amount(self.amount, vault.decimals())?;
        let receipt = vault
            .withdraw(
                amount,
                self.receiver.unwrap_or(sender),
                self.owner.unwrap_or(sender),
            )
            .await?;
        println!("{}", receipt.transaction_hash);
        Ok(())
    }
}

#[derive(Args)]
pub struct VaultClaim {
    #[command(flatten)]
    signer: SignerArgs,
    #[command(flatten)]
    vault: VaultArgs,
    /// User whose rewards are claimed, the sender by default.
    #[arg(long)]
    user: Option<Address>,
}

impl VaultClaim {
    async fn run(&self) -> anyhow::Result<()> {
        let (provider, sender) = utils::signing_provider(&self.signer).await?;
        let vault = load(provider, &self.vault).await?;
        let receipt = vault.claim_rewards(self.user.unwrap_or(sender)).await?;
        println!("{}", receipt.transaction_hash);
        Ok(())
    }
}

#[derive(Args)]
pub struct VaultHarvest {
    #[command(flatten)]
    signer: SignerArgs,
    /// Harvest vault address, mchDAI by default.
    #[arg(long, default_value_t = vault::MCH_DAI)]
    vault: Address,
}

impl VaultHarvest {
    async fn run(&self) -> anyhow::Result<()> {
        let (provider, _) = utils::signing_provider(&self.signer).await?;
        let vault = load(provider, &VaultArgs { vault: self.vault }).await?;
        let receipt = vault.harvest().await?;
        println!("{}", receipt.transaction_hash);
        Ok(())
    }
}
