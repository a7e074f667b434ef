//! Signer loading and market lookup shared by the commands.

use std::{env::home_dir, str::FromStr};

use alloy::signers::{Signer, local::PrivateKeySigner};
use morphosdk::{
    Address, Decimal, U256,
    evm::{self, DynProvider},
    morpho::{Market, Protocol, Split, aave_v2, compound},
    units,
};

use crate::{RpcArgs, SignerArgs};

/// Loads the signer from `--private-key` or a Foundry keystore.
///
/// The keystore password is prompted for when `--password` is missing.
pub fn find_signer(cmd: &SignerArgs) -> anyhow::Result<PrivateKeySigner> {
    if let Some(key) = cmd.private_key.as_ref() {
        Ok(PrivateKeySigner::from_str(key)?)
    } else if let Some(filename) = cmd.keystore.as_ref() {
        let home_dir = home_dir().ok_or(anyhow::anyhow!("unable to locate home dir"))?;
        let keypath = home_dir.join(".foundry").join("keystores").join(filename);
        let password = cmd
            .password
            .clone()
            .or_else(|| {
                rpassword::prompt_password(format!("{} password: ", keypath.display())).ok()
            })
            .ok_or(anyhow::anyhow!("keystores require a password!"))?;
        Ok(PrivateKeySigner::decrypt_keystore(keypath, password)?)
    } else {
        Err(anyhow::anyhow!(
            "no signer: pass --private-key, set PRIVATE_KEY or use --keystore"
        ))
    }
}

/// Read-only provider.
pub async fn provider(cmd: &RpcArgs) -> anyhow::Result<DynProvider> {
    let provider = evm::mainnet_with_url(&cmd.rpc_url).await?;
    Ok(DynProvider::new(provider))
}

/// Provider able to send transactions, along with the sender's address.
pub async fn signing_provider(cmd: &SignerArgs) -> anyhow::Result<(DynProvider, Address)> {
    let signer = find_signer(cmd)?;
    let sender = signer.address();
    let provider = evm::mainnet_with_signer_and_url(&cmd.rpc_url, signer).await?;
    log::info!("sending from {sender}");
    Ok((DynProvider::new(provider), sender))
}

/// Finds a market of `protocol` by the symbol of its underlying.
pub fn market(protocol: Protocol, symbol: &str) -> anyhow::Result<Market> {
    let market = match protocol {
        Protocol::Compound => compound::markets::by_symbol(symbol),
        Protocol::AaveV2 => aave_v2::markets::by_symbol(symbol),
    };
    market.ok_or_else(|| anyhow::anyhow!("no {symbol} market on {protocol}"))
}

/// Symbols of every market of `protocol`.
pub fn symbols(protocol: Protocol) -> Vec<&'static str> {
    match protocol {
        Protocol::Compound => compound::markets::ALL.iter().map(|(s, _)| *s).collect(),
        Protocol::AaveV2 => aave_v2::markets::ALL.iter().map(|(s, _)| *s).collect(),
    }
}

/// Scales a user-entered amount to a token with `decimals` decimals.
pub fn raw_amount(amount: Decimal, decimals: u8) -> anyhow::Result<U256> {
    units::try_to_wei(amount, decimals).map_err(|err| anyhow::anyhow!("invalid amount: {err}"))
}

/// `matched\tpooled\ttotal` cells.
pub fn split_cells(split: &Split) -> String {
    format!("{:.4}\t{:.4}\t{:.4}", split.matched, split.pooled, split.total)
}

/// Formats a yearly rate as a percentage.
pub fn percent(rate: f64) -> String {
    format!("{:.3}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use morphosdk::dec;

    use super::*;

    #[test]
    fn test_market_lookup() {
        let test_values = [
            (Protocol::Compound, "dai", Some(compound::markets::DAI)),
            (Protocol::Compound, "COMP", Some(compound::markets::COMP)),
            (Protocol::AaveV2, "wbtc", Some(aave_v2::markets::WBTC)),
            (Protocol::AaveV2, "COMP", None),
        ];
        for (index, (protocol, symbol, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(market(protocol, symbol).ok(), expect, "failed at {index}");
        }
    }

    #[test]
    fn test_raw_amount() {
        let wbtc = compound::markets::WBTC.decimals;
        let test_values = [
            (dec!(1.5), wbtc, Some(U256::from(150_000_000u64))),
            (dec!(0.00000001), wbtc, Some(U256::from(1u64))),
            (dec!(0.000000005), wbtc, None),
            (dec!(-1), wbtc, None),
            (dec!(-1), 18, None),
            (
                dec!(100000000000),
                18,
                Some(U256::from(100_000_000_000u128) * U256::from(10u64).pow(U256::from(18))),
            ),
        ];
        for (index, (amount, decimals, expect)) in test_values.into_iter().enumerate() {
            assert_eq!(raw_amount(amount, decimals).ok(), expect, "failed at {index}");
        }
    }

    #[test]
    fn test_raw_amount_error_names_the_amount() {
        let err = raw_amount(dec!(-1), 18).unwrap_err();
        assert_eq!(err.to_string(), "invalid amount: -1 is negative");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.0325), "3.250%");
        assert_eq!(percent(0.0), "0.000%");
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbols(Protocol::Compound), ["ETH", "DAI", "WBTC", "COMP"]);
        assert_eq!(symbols(Protocol::AaveV2), ["ETH", "DAI", "WBTC"]);
    }
}
