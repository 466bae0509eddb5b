use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set the RPC URL to read from
    #[arg(long, value_name = "URL", env = "ETH_RPC_URL")]
    pub rpc_url: Option<String>,

    /// RPC URL used by the wallet to sign and send, defaults to the read RPC
    #[arg(long, value_name = "URL")]
    pub wallet_rpc_url: Option<String>,

    /// Target network, defaults to the chain of the read RPC
    #[arg(long, value_name = "ID")]
    pub chain_id: Option<u64>,

    /// Deployments directory or JSON manifest
    #[arg(long, value_name = "PATH")]
    pub deployments: Option<PathBuf>,

    /// Private key of the wallet used to send transactions
    #[arg(long, value_name = "HEX", env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Encrypted keystore of the wallet, the password is prompted for
    #[arg(long, value_name = "PATH")]
    pub keystore: Option<PathBuf>,

    /// Etherscan API key, used to fetch ABIs missing from deployments
    #[arg(long, value_name = "KEY", env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// How long read results are cached
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Log level or filter directives
    #[arg(long, value_name = "FILTER", env = "IDEAPULSE_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// File where to store history
    #[arg(long, value_name = "FILE", env = "IDEAPULSE_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the methods exposed by the Diamond
    Methods {
        /// read or write, both when omitted
        #[arg(long)]
        kind: Option<String>,

        /// Only list methods of this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Call a read method
    Call {
        method: String,

        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        /// Always query the node
        #[arg(long)]
        skip_cache: bool,
    },

    /// Send a transaction to a write method
    Send {
        method: String,

        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        /// Gas limit to use instead of the buffered estimate
        #[arg(long, value_name = "GAS")]
        gas_limit: Option<u64>,

        /// Wei to send along, payable methods only
        #[arg(long, value_name = "WEI")]
        value: Option<String>,

        /// Wait up to this many seconds for the receipt
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
    },

    /// Print the calldata of a call without sending it
    Encode {
        method: String,

        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Start the interactive shell
    Repl,
}
