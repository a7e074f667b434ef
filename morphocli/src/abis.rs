use std::{fs, path::PathBuf, str::FromStr};

use clap::Args;
use morphosdk::{
    Address, etherscan, evm,
    morpho::{aave_v2, compound, vault},
};

use crate::{Run, RpcArgs, utils};

/// A contract to download, written as `NAME=ADDRESS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedContract {
    pub name: String,
    pub address: Address,
}

impl FromStr for NamedContract {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) = s
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected NAME=ADDRESS, got {s}"))?;
        anyhow::ensure!(!name.is_empty(), "empty contract name in {s}");
        Ok(Self {
            name: name.to_owned(),
            address: address.parse()?,
        })
    }
}

/// Contracts used by this SDK.
fn default_contracts() -> Vec<NamedContract> {
    [
        ("DAI", evm::DAI),
        ("WETH9", evm::WETH),
        ("compound/Lens", compound::Contracts::MAINNET.lens),
        ("compound/Morpho", compound::Contracts::MAINNET.morpho),
        ("compound/Oracle", compound::Contracts::MAINNET.oracle),
        ("compound/SupplyHarvestVault", vault::MCH_DAI),
        ("aave-v2/Lens", aave_v2::Contracts::MAINNET.lens),
        ("aave-v2/Morpho", aave_v2::Contracts::MAINNET.morpho),
        ("aave-v2/AaveOracle", aave_v2::Contracts::MAINNET.oracle),
        ("aave-v2/SupplyVault", vault::MA_DAI),
    ]
    .into_iter()
    .map(|(name, address)| NamedContract {
        name: name.to_owned(),
        address,
    })
    .collect()
}

#[derive(Args)]
pub struct FetchAbisCmd {
    #[command(flatten)]
    rpc: RpcArgs,
    /// Etherscan API key.
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Output directory.
    #[arg(long, default_value = "abis")]
    out: PathBuf,
    /// Contracts to download as NAME=ADDRESS, the Morpho contracts by default.
    #[arg(long = "contract")]
    contracts: Vec<NamedContract>,
}

impl Run for FetchAbisCmd {
    async fn run(&self) -> anyhow::Result<()> {
        let provider = utils::provider(&self.rpc).await?;
        let client = etherscan::Client::new(self.api_key.clone());
        let contracts = if self.contracts.is_empty() {
            default_contracts()
        } else {
            self.contracts.clone()
        };

        for contract in contracts {
            // proxies expose the ABI of their implementation
            let address = match evm::implementation_address(&provider, contract.address).await? {
                Some(implementation) => {
                    log::info!("{} is a proxy to {implementation}", contract.name);
                    implementation
                }
                None => contract.address,
            };

            let abi = client.abi(address).await?;
            let path = self.out.join(format!("{}.json", contract.name));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_json::to_string_pretty(&abi)?)?;
            println!("{}", path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use morphosdk::address;

    use super::*;

    #[test]
    fn test_named_contract() {
        let contract: NamedContract = "Lens=0x930f1b46e1D081Ec1524efD95752bE3eCe51EF67"
            .parse()
            .unwrap();
        assert_eq!(contract.name, "Lens");
        assert_eq!(
            contract.address,
            address!("0x930f1b46e1D081Ec1524efD95752bE3eCe51EF67")
        );

        assert!("Lens".parse::<NamedContract>().is_err());
        assert!("=0x930f1b46e1D081Ec1524efD95752bE3eCe51EF67".parse::<NamedContract>().is_err());
        assert!("Lens=0x1234".parse::<NamedContract>().is_err());
    }

    #[test]
    fn test_default_contracts_are_unique() {
        let contracts = default_contracts();
        for (i, a) in contracts.iter().enumerate() {
            for b in &contracts[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.address, b.address);
            }
        }
    }
}
