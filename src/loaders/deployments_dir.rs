use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{parse_deployment, types::DeployedContract, DeploymentRegistry};
use crate::config::KnownNetwork;

const CHAIN_ID_FILE: &str = ".chainId";

/// A hardhat-deploy style tree: `<root>/<network>/<Artifact>.json`.
pub struct DeploymentsDir {
    root: PathBuf,
}

impl DeploymentsDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DeploymentsDir {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn is_valid(directory: &Path) -> bool {
        directory.is_dir()
    }

    fn matches_chain(network_dir: &Path, chain_id: u64) -> bool {
        if let Ok(content) = std::fs::read_to_string(network_dir.join(CHAIN_ID_FILE)) {
            return content.trim().parse::<u64>().ok() == Some(chain_id);
        }
        let dir_name = match network_dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        dir_name == chain_id.to_string()
            || KnownNetwork::from_chain_id(chain_id)
                .map_or(false, |n| n.aliases.iter().any(|a| a.eq_ignore_ascii_case(dir_name)))
    }

    fn artifact_files(&self, artifact: &str, chain_id: u64) -> Result<Vec<PathBuf>> {
        let pattern = self.root.join("*").join(format!("{}.json", artifact));
        let files = glob::glob(pattern.to_str().ok_or(anyhow!("invalid deployments path"))?)?;
        let mut result = vec![];
        for file in files {
            let file = file?;
            if file
                .parent()
                .map_or(false, |dir| Self::matches_chain(dir, chain_id))
            {
                result.push(file);
            }
        }
        result.sort();
        Ok(result)
    }

    fn load_deployment_file(filepath: &Path) -> Result<DeployedContract> {
        let file = File::open(filepath)?;
        let reader = BufReader::new(file);
        let json: Value = serde_json::from_reader(reader)?;
        parse_deployment(&json)
    }
}

#[async_trait]
impl DeploymentRegistry for DeploymentsDir {
    fn name(&self) -> &'static str {
        "deployments"
    }

    async fn fetch(&self, artifact: &str, chain_id: u64) -> Result<Option<DeployedContract>> {
        let files = self.artifact_files(artifact, chain_id)?;
        if files.len() > 1 {
            tracing::warn!(artifact, chain_id, count = files.len(), "several deployments match, using the first");
        }
        match files.first() {
            Some(filepath) => Self::load_deployment_file(filepath).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const DIAMOND_JSON: &str = r#"{
        "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        "abi": [
            {
                "type": "function",
                "name": "facets",
                "inputs": [],
                "outputs": [{"name": "", "type": "tuple[]", "components": [
                    {"name": "facetAddress", "type": "address"},
                    {"name": "functionSelectors", "type": "bytes4[]"}
                ]}],
                "stateMutability": "view"
            }
        ],
        "transactionHash": "0x00"
    }"#;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_match_by_chain_id_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("custom").join(".chainId"), "31337\n");
        write(dir.path().join("custom").join("Diamond.json"), DIAMOND_JSON);

        let registry = DeploymentsDir::new(dir.path());
        let diamond = registry.fetch("Diamond", 31337).await.unwrap().unwrap();
        assert!(diamond.abi.function("facets").is_some());
        assert!(registry.fetch("Diamond", 1).await.unwrap().is_none());
        assert!(registry.fetch("ProjectFacet", 31337).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_by_network_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("sepolia").join("Diamond.json"), DIAMOND_JSON);
        write(dir.path().join("31337").join("Diamond.json"), DIAMOND_JSON);

        let registry = DeploymentsDir::new(dir.path());
        assert!(registry.fetch("Diamond", 11155111).await.unwrap().is_some());
        assert!(registry.fetch("Diamond", 31337).await.unwrap().is_some());
        assert!(registry.fetch("Diamond", 8453).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chain_id_file_overrides_dir_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("sepolia").join(".chainId"), "84532");
        write(dir.path().join("sepolia").join("Diamond.json"), DIAMOND_JSON);

        let registry = DeploymentsDir::new(dir.path());
        assert!(registry.fetch("Diamond", 11155111).await.unwrap().is_none());
        assert!(registry.fetch("Diamond", 84532).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("31337").join("Diamond.json"), "{ not json");
        let registry = DeploymentsDir::new(dir.path());
        assert!(registry.fetch("Diamond", 31337).await.is_err());
    }
}
