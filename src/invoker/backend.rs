use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use url::Url;

/// What is left of a mined transaction once it has one confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
}

impl std::fmt::Display for ReceiptSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.status { "success" } else { "reverted" };
        write!(f, "{} {} (gas used: {}", self.tx_hash, status, self.gas_used)?;
        if let Some(block) = self.block_number {
            write!(f, ", block: {}", block)?;
        }
        write!(f, ")")
    }
}

/// The node and wallet the invoker talks to.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;

    /// Address of the connected signer, if any.
    fn account(&self) -> Option<Address>;

    /// Chain the connected wallet would sign for.
    async fn wallet_chain_id(&self) -> Result<u64>;

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    async fn wait_for_receipt(&self, tx: TxHash, timeout: Duration) -> Result<ReceiptSummary>;
}

#[derive(Clone)]
struct Wallet {
    provider: DynProvider,
    address: Address,
    rpc_url: String,
}

/// [`ChainBackend`] over alloy HTTP providers: one for reads, and an
/// optional signing provider for writes.
#[derive(Clone)]
pub struct AlloyBackend {
    reader: DynProvider,
    rpc_url: String,
    wallet: Option<Wallet>,
}

impl AlloyBackend {
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let url: Url = rpc_url.parse()?;
        let reader = ProviderBuilder::new().connect_http(url).erased();
        Ok(AlloyBackend {
            reader,
            rpc_url: rpc_url.to_string(),
            wallet: None,
        })
    }

    /// Returns a backend that signs with `signer` through `wallet_rpc_url`.
    pub fn with_wallet(&self, signer: PrivateKeySigner, wallet_rpc_url: &str) -> Result<Self> {
        let url: Url = wallet_rpc_url.parse()?;
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        Ok(AlloyBackend {
            wallet: Some(Wallet {
                provider,
                address,
                rpc_url: wallet_rpc_url.to_string(),
            }),
            ..self.clone()
        })
    }

    pub fn without_wallet(&self) -> Self {
        AlloyBackend {
            wallet: None,
            ..self.clone()
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn wallet_rpc_url(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.rpc_url.as_str())
    }

    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.reader.get_chain_id().await?)
    }

    fn signer(&self) -> Result<&Wallet> {
        self.wallet.as_ref().ok_or(anyhow!("no wallet connected"))
    }
}

#[async_trait]
impl ChainBackend for AlloyBackend {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        Ok(self.reader.call(tx).await?)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        let provider = self.wallet.as_ref().map_or(&self.reader, |w| &w.provider);
        Ok(provider.estimate_gas(tx).await?)
    }

    fn account(&self) -> Option<Address> {
        self.wallet.as_ref().map(|w| w.address)
    }

    async fn wallet_chain_id(&self) -> Result<u64> {
        Ok(self.signer()?.provider.get_chain_id().await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self.signer()?.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx: TxHash, timeout: Duration) -> Result<ReceiptSummary> {
        let provider = self.wallet.as_ref().map_or(&self.reader, |w| &w.provider);
        let receipt = PendingTransactionBuilder::new(provider.root().clone(), tx)
            .with_required_confirmations(1)
            .with_timeout(Some(timeout))
            .get_receipt()
            .await?;
        Ok(ReceiptSummary {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            status: receipt.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_connection() {
        let backend = AlloyBackend::connect("http://localhost:8545").unwrap();
        assert!(backend.account().is_none());

        let signer: PrivateKeySigner =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let connected = backend
            .with_wallet(signer, "http://localhost:9545")
            .unwrap();
        assert_eq!(
            connected.account().unwrap().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(connected.wallet_rpc_url(), Some("http://localhost:9545"));
        assert!(connected.without_wallet().account().is_none());
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(AlloyBackend::connect("not a url").is_err());
    }

    #[test]
    fn test_receipt_display() {
        let receipt = ReceiptSummary {
            tx_hash: TxHash::ZERO,
            block_number: Some(12),
            gas_used: 21000,
            status: true,
        };
        assert!(receipt.to_string().ends_with("success (gas used: 21000, block: 12)"));
    }
}
