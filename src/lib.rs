//! # morphosdk
//!
//! A Rust SDK for the [Morpho](https://morpho.org) peer-to-peer lending
//! optimizers on Ethereum mainnet.
//!
//! Morpho sits on top of an underlying lending pool and matches suppliers
//! with borrowers directly when it can. Every position is therefore split
//! between a peer-to-peer part and a pool part, and the Lens contracts report
//! both. This crate reads those reports, turns their raw fixed-point
//! integers into human-scale numbers and submits the usual lending
//! transactions.
//!
//! ## Quick Navigation
//!
//! | Module | Description | Common Use Cases |
//! |--------|-------------|------------------|
//! | [`units`] | Fixed-point normalization | Scale raw amounts, annualize per-block rates |
//! | [`morpho`] | Conventions and shared client trait | Compare deployments |
//! | [`morpho::compound`] | Morpho-Compound | Balances, APRs, COMP rewards |
//! | [`morpho::aave_v2`] | Morpho-AaveV2 | Balances, APRs, ETH-denominated values |
//! | [`morpho::vault`] | ERC-4626 supply vaults | Deposit, withdraw, harvest |
//! | [`evm`] | Providers and ERC-20 helpers | Connect, approve, wrap ETH |
//! | [`etherscan`] | ABI fetcher | Download verified ABIs |
//!
//! ## Getting Started
//!
//! ```no_run
//! use morphosdk::morpho::{MorphoClient, Side, compound};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = compound::Client::mainnet().await?;
//!
//!     for (symbol, market) in compound::markets::ALL {
//!         let supply = client.market_total(&market, Side::Supply).await?;
//!         let apr = client.average_apr(&market, Side::Supply).await?;
//!         println!("{symbol}: {:.2} supplied at {:.2}%", supply.total, apr * 100.0);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Numbers
//!
//! Contract values travel as [`U256`] and are converted once, at the edge,
//! into `f64` for display with [`units::normalize`]. Amounts typed by a user
//! are parsed into [`Decimal`] and scaled back with [`units::try_to_wei`], which
//! never goes through a float and rejects what the token cannot represent.

pub mod etherscan;
pub mod evm;
pub mod morpho;
pub mod units;

/// Re-exported Ethereum primitives from Alloy.
pub use alloy::primitives::{Address, U256, address};
/// Re-exported decimal type from rust_decimal.
///
/// Used for exact user-entered amounts.
pub use rust_decimal::{Decimal, dec};
