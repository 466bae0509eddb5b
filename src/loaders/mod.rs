mod deployments_dir;
pub mod etherscan;
mod manifest;
pub mod types;

use std::path::Path;

use alloy::primitives::Address;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

pub use deployments_dir::DeploymentsDir;
pub use etherscan::{EtherscanConfig, ExplorerAbiFallback};
pub use manifest::ManifestFile;
use types::{ContractDescriptor, ContractSlot, DeployedContract, Registry};

use crate::abi::{ContractAbi, ContractName};

/// Source of deployed-contract metadata for a network.
#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    fn name(&self) -> &'static str;

    /// Address and ABI of `artifact` on `chain_id`, `None` if not deployed there.
    async fn fetch(&self, artifact: &str, chain_id: u64) -> Result<Option<DeployedContract>>;
}

/// Opens the registry at `path`: a directory of per-network artifacts or a
/// single JSON manifest.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn DeploymentRegistry>> {
    let expanded_path = shellexpand::path::full(path.as_ref())?;
    if DeploymentsDir::is_valid(&expanded_path) {
        Ok(Box::new(DeploymentsDir::new(expanded_path)))
    } else if expanded_path.is_file() {
        Ok(Box::new(ManifestFile::load(expanded_path)?))
    } else {
        bail!("no deployments found at {}", expanded_path.display())
    }
}

/// Fetches every configured contract for `chain_id`. A failure for one
/// contract only marks that contract unavailable.
pub async fn load_registry(source: &dyn DeploymentRegistry, chain_id: u64) -> Registry {
    let fetches = ContractName::ALL.iter().map(|name| async move {
        let slot = match source.fetch(name.artifact_name(), chain_id).await {
            Ok(Some(deployed)) => {
                tracing::debug!(contract = %name, address = %deployed.address, items = deployed.abi.len(), "loaded deployment");
                if name.is_primary() && deployed.abi.is_empty() {
                    tracing::error!(contract = %name, chain_id, "primary contract has an empty ABI");
                }
                ContractSlot::Ready(ContractDescriptor::new(*name, deployed))
            }
            Ok(None) => {
                if name.is_primary() {
                    tracing::error!(contract = %name, chain_id, "primary contract not deployed on this network");
                } else {
                    tracing::debug!(contract = %name, chain_id, "contract not deployed on this network");
                }
                ContractSlot::Unavailable
            }
            Err(e) => {
                if name.is_primary() {
                    tracing::error!(contract = %name, source = source.name(), error = %e, "failed to load primary contract");
                } else {
                    tracing::warn!(contract = %name, source = source.name(), error = %e, "failed to load contract");
                }
                ContractSlot::Unavailable
            }
        };
        (*name, slot)
    });

    let mut registry = Registry::pending(chain_id);
    for (name, slot) in join_all(fetches).await {
        registry.set(name, slot);
    }
    registry
}

/// Reads the `address` and `abi` keys of a deployment artifact, keeping the
/// ABI items in artifact order. A missing ABI yields an empty one.
pub(crate) fn parse_deployment(json: &Value) -> Result<DeployedContract> {
    let address = json["address"]
        .as_str()
        .ok_or(anyhow!("missing deployment address"))?
        .parse::<Address>()?;
    let abi = match &json["abi"] {
        Value::Null => ContractAbi::default(),
        abi => ContractAbi::from_json_value(abi)?,
    };
    Ok(DeployedContract { address, abi })
}
