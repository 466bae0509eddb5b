use std::{path::Path, sync::Arc, time::Duration};

use alloy::{
    hex,
    primitives::{Address, Bytes, TxHash, U256},
    signers::local::{LocalSigner, PrivateKeySigner},
};
use anyhow::{Context, Result};
use serde_json::Value;

use crate::{
    abi::{CombinedAbi, ContractName, ContractRole, MethodCategory, MethodIndex, MethodKind},
    config::{Config, Network},
    invoker::{
        render_outputs, AlloyBackend, Invoker, Notifier, ReadOptions, ReceiptSummary,
        WriteOptions,
    },
    loaders::{self, types::Registry, ExplorerAbiFallback},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub gas_limit: Option<u64>,
    pub value: Option<U256>,
    /// Wait this long for a receipt after submission.
    pub wait: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub tx_hash: TxHash,
    pub receipt: Option<ReceiptSummary>,
}

/// One row of the `facets` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetStatus {
    pub name: ContractName,
    pub role: ContractRole,
    pub address: Option<Address>,
    pub functions: usize,
    pub state: &'static str,
}

/// Everything loaded for one network: the registry, the combined ABI's
/// method index, and an invoker bound to the Diamond.
pub struct Session {
    config: Config,
    registry: Registry,
    index: MethodIndex,
    backend: AlloyBackend,
    invoker: Invoker,
}

impl Session {
    pub async fn open(config: Config) -> Result<Self> {
        let backend = AlloyBackend::connect(&config.rpc_url)
            .with_context(|| format!("invalid RPC URL {}", config.rpc_url))?;
        let chain_id = match config.chain_id {
            Some(chain_id) => chain_id,
            None => backend
                .chain_id()
                .await
                .with_context(|| format!("fetching chain id from {}", config.rpc_url))?,
        };

        let mut source = loaders::open(&config.deployments)?;
        if let Some(etherscan) = &config.etherscan {
            source = Box::new(ExplorerAbiFallback::new(source, etherscan.clone()));
        }
        let registry = loaders::load_registry(source.as_ref(), chain_id).await;

        let mut session = Session::new(config, registry, backend);
        if let Some(signer) = session.config.wallet.load_signer()? {
            session.connect_signer(signer)?;
        }
        Ok(session)
    }

    /// Builds a session from an already loaded registry.
    pub fn new(config: Config, registry: Registry, backend: AlloyBackend) -> Self {
        let network = Network::from_chain_id(registry.chain_id());
        let abi = CombinedAbi::from_registry(&registry);
        for (selector, signatures) in abi.selector_collisions() {
            tracing::warn!(%selector, signatures = ?signatures, "selector claimed by several functions");
        }
        let index = MethodIndex::new(&abi);
        let address = registry.primary().map(|d| d.address);
        tracing::info!(
            network = %network,
            diamond = ?address,
            functions = index.read_methods().len() + index.write_methods().len(),
            "session ready"
        );
        let invoker = Invoker::new(
            network,
            address,
            abi,
            Arc::new(backend.clone()),
            config.cache_ttl,
        );
        Session {
            config,
            registry,
            index,
            backend,
            invoker,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.invoker = self.invoker.with_notifier(notifier);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn index(&self) -> &MethodIndex {
        &self.index
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn network(&self) -> &Network {
        self.invoker.network()
    }

    pub fn methods(&self, kind: MethodKind, category: Option<MethodCategory>) -> Vec<String> {
        match category {
            Some(category) => self.index.for_category(kind, category),
            None => self.index.methods(kind).to_vec(),
        }
    }

    pub fn facets(&self) -> Vec<FacetStatus> {
        self.registry
            .iter()
            .map(|(name, slot)| {
                let descriptor = slot.descriptor();
                FacetStatus {
                    name: *name,
                    role: name.role(),
                    address: descriptor.map(|d| d.address),
                    functions: descriptor.map_or(0, |d| d.abi.functions().count()),
                    state: match slot {
                        loaders::types::ContractSlot::Pending => "pending",
                        loaders::types::ContractSlot::Unavailable => "unavailable",
                        loaders::types::ContractSlot::Ready(_) => "ready",
                    },
                }
            })
            .collect()
    }

    pub async fn call(&self, method: &str, args: &[String], skip_cache: bool) -> Result<Value> {
        let resolved = self.invoker.table().resolve_str(method, args)?;
        let options = ReadOptions { skip_cache };
        let values = self
            .invoker
            .try_read_method(method, &resolved.inputs, options)
            .await?;
        Ok(render_outputs(&resolved.function, &values))
    }

    pub async fn send(
        &self,
        method: &str,
        args: &[String],
        options: SendOptions,
    ) -> Result<SendOutcome> {
        let resolved = self.invoker.table().resolve_str(method, args)?;
        let mut write_options = WriteOptions::new();
        if let Some(gas_limit) = options.gas_limit {
            write_options = write_options.gas_limit(gas_limit);
        }
        if let Some(value) = options.value {
            write_options = write_options.value(value);
        }
        let tx_hash = self
            .invoker
            .write_method(method, &resolved.inputs, write_options)
            .await?;
        let receipt = match options.wait {
            Some(timeout) => Some(self.invoker.wait_for_receipt(tx_hash, timeout).await?),
            None => None,
        };
        Ok(SendOutcome { tx_hash, receipt })
    }

    pub fn encode(&self, method: &str, args: &[String]) -> Result<Bytes> {
        let resolved = self.invoker.table().resolve_str(method, args)?;
        Ok(resolved.calldata)
    }

    pub fn clear_cache(&self, key: Option<&str>) {
        self.invoker.clear_cache(key);
    }

    pub fn account(&self) -> Option<Address> {
        self.invoker.account()
    }

    pub fn connect_private_key(&mut self, private_key: &str) -> Result<Address> {
        let key = hex::decode(private_key.trim()).context("private key is not valid hex")?;
        let signer = PrivateKeySigner::from_slice(&key)?;
        self.connect_signer(signer)
    }

    pub fn connect_keystore<P: AsRef<Path>>(&mut self, path: P, password: &str) -> Result<Address> {
        let expanded_path = shellexpand::path::full(path.as_ref())?;
        let signer = LocalSigner::decrypt_keystore(&expanded_path, password)
            .with_context(|| format!("decrypting {}", expanded_path.display()))?;
        self.connect_signer(signer)
    }

    fn connect_signer(&mut self, signer: PrivateKeySigner) -> Result<Address> {
        let address = signer.address();
        self.backend = self
            .backend
            .with_wallet(signer, &self.config.wallet_rpc_url)?;
        self.invoker.set_backend(Arc::new(self.backend.clone()));
        tracing::info!(account = %address, "wallet connected");
        Ok(address)
    }

    pub fn disconnect_wallet(&mut self) {
        self.backend = self.backend.without_wallet();
        self.invoker.set_backend(Arc::new(self.backend.clone()));
        tracing::info!("wallet disconnected");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{
        abi::ContractAbi,
        loaders::types::{ContractDescriptor, ContractSlot, DeployedContract},
        repl::Cli,
    };

    const DIAMOND: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn session() -> Session {
        let config = Config::from_cli(&Cli::parse_from(["ideapulse", "--chain-id", "31337"]));
        let abi = ContractAbi::parse([
            "function owner() view returns (address)",
            "function getProject(uint256 id) view returns (string name, uint256 goal)",
            "function createProject(string name, uint256 goal)",
            "function contribute(uint256 projectId) payable",
        ])
        .unwrap();
        let diamond = DeployedContract {
            address: DIAMOND.parse().unwrap(),
            abi,
        };
        let registry = ContractName::ALL.iter().fold(Registry::pending(31337), |r, name| {
            r.with(*name, ContractSlot::Unavailable)
        });
        let registry = registry.with(
            ContractName::Diamond,
            ContractSlot::Ready(ContractDescriptor::new(ContractName::Diamond, diamond)),
        );
        let backend = AlloyBackend::connect("http://127.0.0.1:1").unwrap();
        Session::new(config, registry, backend)
    }

    #[test]
    fn test_methods() {
        let session = session();
        assert_eq!(
            session.methods(MethodKind::Read, None),
            vec!["owner", "getProject"]
        );
        assert_eq!(
            session.methods(MethodKind::Write, Some(MethodCategory::Crowdfunding)),
            vec!["contribute"]
        );
        assert_eq!(session.network().name, "Hardhat");
    }

    #[test]
    fn test_encode() {
        let calldata = session().encode("getProject", &["4".to_string()]).unwrap();
        assert_eq!(calldata.len(), 36);
        assert_eq!(calldata[35], 4);
    }

    #[test]
    fn test_facets() {
        let facets = session().facets();
        assert_eq!(facets.len(), ContractName::ALL.len());
        assert_eq!(facets[0].name, ContractName::Diamond);
        assert_eq!(facets[0].state, "ready");
        assert_eq!(facets[0].functions, 4);
        assert!(facets[1..].iter().all(|f| f.state == "unavailable"));
    }

    #[test]
    fn test_wallet_connect_and_disconnect() {
        let mut session = session();
        assert!(session.account().is_none());
        let address = session
            .connect_private_key("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();
        assert_eq!(session.account(), Some(address));
        session.disconnect_wallet();
        assert!(session.account().is_none());
    }

    #[tokio::test]
    async fn test_send_without_wallet() {
        let err = session()
            .send("createProject", &["Pulse".to_string(), "10".to_string()], SendOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "wallet not connected");
    }

    #[tokio::test]
    async fn test_call_unknown_method() {
        let err = session().call("withdraw", &[], false).await.unwrap_err();
        assert_eq!(err.to_string(), "method withdraw not found in the combined ABI");
    }
}
