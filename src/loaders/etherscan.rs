use alloy::{primitives::Address, transports::http::reqwest};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{types::DeployedContract, DeploymentRegistry};
use crate::abi::ContractAbi;

const ETHERSCAN_V2_API_URL: &str = "https://api.etherscan.io/v2/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtherscanConfig {
    pub api_key: String,
    pub api_url: String,
}

impl EtherscanConfig {
    pub fn new(api_key: String, api_url: Option<String>) -> Self {
        EtherscanConfig {
            api_key,
            api_url: api_url.unwrap_or(ETHERSCAN_V2_API_URL.to_string()),
        }
    }

    pub fn with_key(api_key: String) -> Self {
        Self::new(api_key, None)
    }
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

pub async fn load_abi(config: &EtherscanConfig, chain_id: u64, address: Address) -> Result<ContractAbi> {
    let url = format!(
        "{}?chainid={}&module=contract&action=getabi&address={}&apikey={}",
        config.api_url, chain_id, address, config.api_key
    );
    let response = reqwest::get(&url)
        .await?
        .json::<ExplorerResponse>()
        .await?;
    if response.status != "1" {
        bail!("explorer returned an error: {} {}", response.message, response.result);
    }
    ContractAbi::from_json_str(&response.result)
}

/// Fills in ABIs that a deployment artifact left empty by asking the block
/// explorer for the verified source of the deployed address.
pub struct ExplorerAbiFallback {
    inner: Box<dyn DeploymentRegistry>,
    config: EtherscanConfig,
}

impl ExplorerAbiFallback {
    pub fn new(inner: Box<dyn DeploymentRegistry>, config: EtherscanConfig) -> Self {
        ExplorerAbiFallback { inner, config }
    }
}

#[async_trait]
impl DeploymentRegistry for ExplorerAbiFallback {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch(&self, artifact: &str, chain_id: u64) -> Result<Option<DeployedContract>> {
        let mut deployed = match self.inner.fetch(artifact, chain_id).await? {
            Some(deployed) => deployed,
            None => return Ok(None),
        };
        if deployed.abi.is_empty() {
            match load_abi(&self.config, chain_id, deployed.address).await {
                Ok(abi) => {
                    tracing::info!(artifact, address = %deployed.address, "fetched verified ABI from explorer");
                    deployed.abi = abi;
                }
                Err(e) => {
                    tracing::warn!(artifact, address = %deployed.address, error = %e, "explorer ABI lookup failed");
                }
            }
        }
        Ok(Some(deployed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<DeployedContract>);

    #[async_trait]
    impl DeploymentRegistry for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _artifact: &str, _chain_id: u64) -> Result<Option<DeployedContract>> {
            Ok(self.0.clone())
        }
    }

    fn unreachable_explorer() -> EtherscanConfig {
        EtherscanConfig::new("key".to_string(), Some("http://127.0.0.1:1/api".to_string()))
    }

    #[tokio::test]
    async fn test_non_empty_abi_is_kept() {
        let abi = ContractAbi::parse(["function owner() view returns (address)"]).unwrap();
        let deployed = DeployedContract {
            address: Address::with_last_byte(7),
            abi: abi.clone(),
        };
        let registry = ExplorerAbiFallback::new(Box::new(Fixed(Some(deployed))), unreachable_explorer());
        let fetched = registry.fetch("Diamond", 1).await.unwrap().unwrap();
        assert_eq!(fetched.abi, abi);
    }

    #[tokio::test]
    async fn test_explorer_failure_keeps_empty_abi() {
        let deployed = DeployedContract {
            address: Address::with_last_byte(7),
            abi: ContractAbi::default(),
        };
        let registry = ExplorerAbiFallback::new(Box::new(Fixed(Some(deployed))), unreachable_explorer());
        let fetched = registry.fetch("Diamond", 1).await.unwrap().unwrap();
        assert!(fetched.abi.is_empty());
    }

    #[tokio::test]
    async fn test_missing_deployment_passes_through() {
        let registry = ExplorerAbiFallback::new(Box::new(Fixed(None)), unreachable_explorer());
        assert!(registry.fetch("Diamond", 1).await.unwrap().is_none());
    }
}
