use alloy::primitives::TxHash;

use super::InvokeError;
use crate::config::Network;

/// User-facing events raised by the invoker's write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    WalletNotConnected,
    WrongNetwork { expected: Network, actual: u64 },
    TransactionSubmitted { method: String, tx_hash: TxHash },
    TransactionFailed { method: String, error: InvokeError },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::WalletNotConnected => {
                write!(f, "Connect a wallet to send transactions")
            }
            Notification::WrongNetwork { expected, actual } => write!(
                f,
                "Wallet is on chain {}, please switch to {}",
                actual, expected
            ),
            Notification::TransactionSubmitted { method, tx_hash } => {
                write!(f, "{} submitted: {}", method, tx_hash)
            }
            Notification::TransactionFailed { method, error } => {
                write!(f, "{} failed: {}", method, error)
            }
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sends notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::TransactionSubmitted { .. } => tracing::info!("{}", notification),
            _ => tracing::warn!("{}", notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_network_names_expected_network() {
        let notification = Notification::WrongNetwork {
            expected: Network::from_chain_id(84532),
            actual: 1,
        };
        assert_eq!(
            notification.to_string(),
            "Wallet is on chain 1, please switch to Base Sepolia (84532)"
        );
    }
}
