use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("contract ABI or address is unavailable")]
    ContractUnavailable,

    #[error("method {0} not found in the combined ABI")]
    MethodNotFound(String),

    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("wallet is connected to chain {actual}, switch to {expected_name} ({expected})")]
    WrongNetwork {
        expected: u64,
        expected_name: String,
        actual: u64,
    },

    #[error("gas estimation failed: {0}")]
    GasEstimationFailed(String),

    #[error("RPC call failed: {0}")]
    RpcCallFailed(String),

    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("failed to decode return data: {0}")]
    DecodeFailed(String),
}

impl InvokeError {
    pub fn invalid_arguments(method: &str, reason: impl ToString) -> Self {
        InvokeError::InvalidArguments {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}
