use std::{fmt::Display, path::PathBuf, time::Duration};

use alloy::signers::local::{LocalSigner, PrivateKeySigner};
use anyhow::{Context, Result};

use crate::{loaders::EtherscanConfig, repl::Cli};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments";
pub const DEFAULT_READ_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    pub chain_id: u64,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

const KNOWN_NETWORKS: [KnownNetwork; 9] = [
    KnownNetwork { chain_id: 1, name: "Ethereum", aliases: &["mainnet", "ethereum"] },
    KnownNetwork { chain_id: 10, name: "OP Mainnet", aliases: &["optimism"] },
    KnownNetwork { chain_id: 137, name: "Polygon", aliases: &["polygon", "matic"] },
    KnownNetwork { chain_id: 8453, name: "Base", aliases: &["base"] },
    KnownNetwork { chain_id: 42161, name: "Arbitrum One", aliases: &["arbitrum"] },
    KnownNetwork { chain_id: 84532, name: "Base Sepolia", aliases: &["baseSepolia", "base-sepolia"] },
    KnownNetwork { chain_id: 421614, name: "Arbitrum Sepolia", aliases: &["arbitrumSepolia", "arbitrum-sepolia"] },
    KnownNetwork { chain_id: 11155111, name: "Sepolia", aliases: &["sepolia"] },
    KnownNetwork { chain_id: 31337, name: "Hardhat", aliases: &["hardhat", "localhost", "anvil"] },
];

impl KnownNetwork {
    pub fn from_chain_id(chain_id: u64) -> Option<&'static KnownNetwork> {
        KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
    }
}

/// The network contracts are read from and transactions must target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub name: String,
}

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = KnownNetwork::from_chain_id(chain_id)
            .map(|n| n.name.to_string())
            .unwrap_or(format!("chain {}", chain_id));
        Network { chain_id, name }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletSource {
    None,
    PrivateKey(String),
    Keystore(PathBuf),
}

impl WalletSource {
    /// Unlocks the configured signer, prompting for the keystore password.
    pub fn load_signer(&self) -> Result<Option<PrivateKeySigner>> {
        match self {
            WalletSource::None => Ok(None),
            WalletSource::PrivateKey(key) => Ok(Some(key.trim().parse()?)),
            WalletSource::Keystore(path) => {
                let expanded_path = shellexpand::path::full(path)?;
                let password = rpassword::prompt_password("Enter keystore password: ")?;
                let signer = LocalSigner::decrypt_keystore(&expanded_path, password)
                    .with_context(|| format!("decrypting {}", expanded_path.display()))?;
                Ok(Some(signer))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub wallet_rpc_url: String,
    pub chain_id: Option<u64>,
    pub deployments: PathBuf,
    pub etherscan: Option<EtherscanConfig>,
    pub cache_ttl: Duration,
    pub wallet: WalletSource,
    pub history_file: Option<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let rpc_url = cli.rpc_url.clone().unwrap_or(DEFAULT_RPC_URL.to_string());
        let wallet_rpc_url = cli.wallet_rpc_url.clone().unwrap_or(rpc_url.clone());
        let wallet = match (&cli.private_key, &cli.keystore) {
            (Some(key), _) => WalletSource::PrivateKey(key.clone()),
            (None, Some(path)) => WalletSource::Keystore(path.clone()),
            (None, None) => WalletSource::None,
        };
        Config {
            rpc_url,
            wallet_rpc_url,
            chain_id: cli.chain_id,
            deployments: cli
                .deployments
                .clone()
                .unwrap_or(PathBuf::from(DEFAULT_DEPLOYMENTS_PATH)),
            etherscan: cli.etherscan_api_key.clone().map(EtherscanConfig::with_key),
            cache_ttl: cli
                .cache_ttl
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_READ_CACHE_TTL),
            wallet,
            history_file: cli.history_file.clone(),
        }
    }
}
