use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{parse_deployment, types::DeployedContract, DeploymentRegistry};

/// A single JSON file listing every deployment per chain:
/// `{ "<chainId>": { "<Artifact>": { "address": "0x..", "abi": [..] } } }`.
pub struct ManifestFile {
    chains: HashMap<u64, HashMap<String, Value>>,
}

impl ManifestFile {
    pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let expanded_path = shellexpand::path::full(filepath.as_ref())?;
        let file_content = fs::read_to_string(&expanded_path)
            .with_context(|| format!("reading {}", expanded_path.display()))?;
        Self::from_json_str(&file_content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, Value>> = serde_json::from_str(json)?;
        let chains = raw
            .into_iter()
            .map(|(chain, contracts)| {
                chain
                    .parse::<u64>()
                    .map(|id| (id, contracts))
                    .map_err(|_| anyhow!("invalid chain id {} in manifest", chain))
            })
            .collect::<Result<_>>()?;
        Ok(ManifestFile { chains })
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids = self.chains.keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }
}

#[async_trait]
impl DeploymentRegistry for ManifestFile {
    fn name(&self) -> &'static str {
        "manifest"
    }

    async fn fetch(&self, artifact: &str, chain_id: u64) -> Result<Option<DeployedContract>> {
        match self.chains.get(&chain_id).and_then(|c| c.get(artifact)) {
            Some(json) => parse_deployment(json)
                .with_context(|| format!("invalid deployment for {}", artifact))
                .map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "31337": {
            "Diamond": {
                "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "abi": [
                    {
                        "type": "function",
                        "name": "owner",
                        "inputs": [],
                        "outputs": [{"name": "", "type": "address"}],
                        "stateMutability": "view"
                    }
                ]
            },
            "MockUSDC": { "address": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512" }
        },
        "11155111": {}
    }"#;

    #[tokio::test]
    async fn test_fetch_from_manifest() {
        let manifest = ManifestFile::from_json_str(MANIFEST).unwrap();
        assert_eq!(manifest.chain_ids(), vec![31337, 11155111]);

        let diamond = manifest.fetch("Diamond", 31337).await.unwrap().unwrap();
        assert_eq!(
            diamond.address.to_string(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert!(diamond.abi.function("owner").is_some());

        let token = manifest.fetch("MockUSDC", 31337).await.unwrap().unwrap();
        assert!(token.abi.is_empty());

        assert!(manifest.fetch("Diamond", 11155111).await.unwrap().is_none());
        assert!(manifest.fetch("Diamond", 1).await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_chain_id() {
        assert!(ManifestFile::from_json_str(r#"{"mainnet": {}}"#).is_err());
    }

    #[tokio::test]
    async fn test_invalid_address_is_an_error() {
        let manifest =
            ManifestFile::from_json_str(r#"{"1": {"Diamond": {"address": "nope", "abi": []}}}"#)
                .unwrap();
        assert!(manifest.fetch("Diamond", 1).await.is_err());
    }
}
