//! Etherscan ABI fetcher.
//!
//! # Example
//!
//! ```no_run
//! use morphosdk::{etherscan, evm};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = etherscan::Client::new("your_api_key");
//! let abi = client.abi(evm::DAI).await?;
//! println!("{}", serde_json::to_string_pretty(&abi)?);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Result;
use serde::Deserialize;
use url::Url;

/// Etherscan multichain API endpoint.
pub const DEFAULT_URL: &str = "https://api.etherscan.io/v2/api";

/// Chain id queried by default.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Envelope of every Etherscan API response.
///
/// `status` is `"1"` on success, in which case `result` holds the payload.
/// Otherwise `result` holds the error message.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub status: String,
    pub message: String,
    pub result: String,
}

impl Response {
    /// Returns the payload, or an error carrying the API's message.
    pub fn into_result(self) -> Result<String> {
        if self.status == "1" {
            Ok(self.result)
        } else {
            Err(anyhow::anyhow!("etherscan: {} ({})", self.result, self.message))
        }
    }
}

/// Etherscan client.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
    chain_id: u64,
}

impl Client {
    /// Creates a client for Ethereum mainnet.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            // constant URL
            base_url: DEFAULT_URL.parse().unwrap(),
            api_key: api_key.into(),
            chain_id: MAINNET_CHAIN_ID,
        }
    }

    /// Overrides the API endpoint.
    #[must_use]
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Overrides the chain queried.
    #[must_use]
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        Self { chain_id, ..self }
    }

    /// Fetches the verified ABI of `address`.
    pub async fn abi(&self, address: Address) -> Result<serde_json::Value> {
        log::debug!("getabi {address}");
        let address = address.to_string();
        let chain_id = self.chain_id.to_string();
        let res: Response = self
            .http_client
            .get(self.base_url.clone())
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "contract"),
                ("action", "getabi"),
                ("address", address.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .json()
            .await?;

        parse_abi(res)
    }
}

/// The ABI is returned as a JSON document serialized inside `result`.
fn parse_abi(res: Response) -> Result<serde_json::Value> {
    let abi = res.into_result()?;
    Ok(serde_json::from_str(&abi)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abi() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": "[{\"type\":\"function\",\"name\":\"decimals\",\"inputs\":[],\"outputs\":[{\"type\":\"uint8\"}]}]"
        }"#;
        let res: Response = serde_json::from_str(body).unwrap();
        let abi = parse_abi(res).unwrap();
        assert_eq!(abi[0]["name"], "decimals");
        assert_eq!(abi.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_parse_error() {
        let body = r#"{
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified"
        }"#;
        let res: Response = serde_json::from_str(body).unwrap();
        let err = parse_abi(res).unwrap_err();
        assert!(err.to_string().contains("not verified"));
    }

    #[test]
    fn test_with_url() {
        let url: Url = "http://localhost:8080/api".parse().unwrap();
        let client = Client::new("key").with_url(url.clone()).with_chain_id(10);
        assert_eq!(client.base_url, url);
        assert_eq!(client.chain_id, 10);
    }
}
