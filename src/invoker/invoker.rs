use std::{sync::Arc, time::Duration};

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt},
    json_abi::StateMutability,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};
use dashmap::{mapref::entry::Entry, DashMap};
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};

use super::{
    backend::{ChainBackend, ReceiptSummary},
    cache::ReadCache,
    notify::{LogNotifier, Notification, Notifier},
    table::{ContractCall, FunctionTable, ResolvedCall},
    value::args_json,
    InvokeError,
};
use crate::{abi::CombinedAbi, config::Network};

/// Decoded return values of a read. Shared between the cache and every
/// caller that asked for the same key.
pub type ReadResult = Arc<Vec<DynSolValue>>;

type InflightRead = Shared<BoxFuture<'static, Result<ReadResult, InvokeError>>>;

pub const GAS_BUFFER_PERCENT: u64 = 20;

/// Estimated gas plus the safety buffer, rounded down.
pub fn apply_gas_buffer(estimate: u64) -> u64 {
    let buffered = estimate as u128 * (100 + GAS_BUFFER_PERCENT as u128) / 100;
    buffered.min(u64::MAX as u128) as u64
}

pub fn cache_key(name: &str, args: &[DynSolValue]) -> String {
    format!("{}{}", name, args_json(args))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub skip_cache: bool,
}

impl ReadOptions {
    pub fn skip_cache() -> Self {
        ReadOptions { skip_cache: true }
    }
}

type SuccessCallback = Box<dyn FnOnce(TxHash) + Send>;
type ErrorCallback = Box<dyn FnOnce(&InvokeError) + Send>;

#[derive(Default)]
pub struct WriteOptions {
    gas_limit: Option<u64>,
    value: Option<U256>,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Used as-is, no buffer and no estimation.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(TxHash) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&InvokeError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteOptions")
            .field("gas_limit", &self.gas_limit)
            .field("value", &self.value)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Calls any method of the combined Diamond ABI by name.
pub struct Invoker {
    network: Network,
    address: Option<Address>,
    abi: Arc<CombinedAbi>,
    table: Arc<FunctionTable>,
    backend: Arc<dyn ChainBackend>,
    cache: Arc<ReadCache<ReadResult>>,
    inflight: Arc<DashMap<String, InflightRead>>,
    notifier: Arc<dyn Notifier>,
}

impl Invoker {
    pub fn new(
        network: Network,
        address: Option<Address>,
        abi: CombinedAbi,
        backend: Arc<dyn ChainBackend>,
        cache_ttl: Duration,
    ) -> Self {
        let table = FunctionTable::new(&abi);
        Invoker {
            network,
            address,
            abi: Arc::new(abi),
            table: Arc::new(table),
            backend,
            cache: Arc::new(ReadCache::new(cache_ttl)),
            inflight: Arc::new(DashMap::new()),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ReadCache<ReadResult>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn ChainBackend>) -> Self {
        self.set_backend(backend);
        self
    }

    /// Swaps the node/wallet collaborator, keeping cached reads.
    pub fn set_backend(&mut self, backend: Arc<dyn ChainBackend>) {
        self.backend = backend;
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn abi(&self) -> &CombinedAbi {
        &self.abi
    }

    pub fn table(&self) -> &FunctionTable {
        &self.table
    }

    pub fn cache(&self) -> &Arc<ReadCache<ReadResult>> {
        &self.cache
    }

    pub fn account(&self) -> Option<Address> {
        self.backend.account()
    }

    fn contract_address(&self) -> Result<Address, InvokeError> {
        match self.address {
            Some(address) if !self.abi.is_empty() => Ok(address),
            _ => Err(InvokeError::ContractUnavailable),
        }
    }

    /// Reads `name`, logging and swallowing any failure.
    pub async fn read_method(
        &self,
        name: &str,
        args: &[DynSolValue],
        options: ReadOptions,
    ) -> Option<ReadResult> {
        match self.try_read_method(name, args, options).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!(method = name, error = %e, "read failed");
                None
            }
        }
    }

    /// Reads `name` through the cache. Concurrent cold reads of the same
    /// key share a single RPC call unless `skip_cache` is set.
    pub async fn try_read_method(
        &self,
        name: &str,
        args: &[DynSolValue],
        options: ReadOptions,
    ) -> Result<ReadResult, InvokeError> {
        let call = self.table.resolve(&ContractCall::new(name, args.to_vec()))?;
        let address = self.contract_address()?;
        let key = cache_key(name, args);

        if options.skip_cache {
            tracing::debug!(key = %key, "skipping read cache");
            let result = fetch(self.backend.clone(), address, call).await?;
            self.cache.set(key, result.clone());
            return Ok(result);
        }

        if let Some(result) = self.cache.get(&key) {
            tracing::trace!(key = %key, "read cache hit");
            return Ok(result);
        }

        let read = match self.inflight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::trace!(key = %key, "joining in-flight read");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let backend = self.backend.clone();
                let cache = self.cache.clone();
                let inflight = self.inflight.clone();
                let key = key.clone();
                let read = async move {
                    let result = fetch(backend, address, call).await;
                    if let Ok(values) = &result {
                        cache.set(key.clone(), values.clone());
                    }
                    inflight.remove(&key);
                    result
                }
                .boxed()
                .shared();
                entry.insert(read.clone());
                read
            }
        };
        read.await
    }

    /// Submits a state-changing call. Exactly one of the callbacks runs.
    pub async fn write_method(
        &self,
        name: &str,
        args: &[DynSolValue],
        options: WriteOptions,
    ) -> Result<TxHash, InvokeError> {
        let WriteOptions {
            gas_limit,
            value,
            on_success,
            on_error,
        } = options;

        match self.submit(name, args, gas_limit, value).await {
            Ok(tx_hash) => {
                tracing::info!(method = name, tx = %tx_hash, "transaction submitted");
                self.notifier.notify(Notification::TransactionSubmitted {
                    method: name.to_string(),
                    tx_hash,
                });
                if let Some(on_success) = on_success {
                    on_success(tx_hash);
                }
                Ok(tx_hash)
            }
            Err(error) => {
                tracing::error!(method = name, error = %error, "write failed");
                if !matches!(
                    error,
                    InvokeError::WalletNotConnected | InvokeError::WrongNetwork { .. }
                ) {
                    self.notifier.notify(Notification::TransactionFailed {
                        method: name.to_string(),
                        error: error.clone(),
                    });
                }
                if let Some(on_error) = on_error {
                    on_error(&error);
                }
                Err(error)
            }
        }
    }

    async fn submit(
        &self,
        name: &str,
        args: &[DynSolValue],
        gas_limit: Option<u64>,
        value: Option<U256>,
    ) -> Result<TxHash, InvokeError> {
        let address = self.contract_address()?;

        let Some(from) = self.backend.account() else {
            self.notifier.notify(Notification::WalletNotConnected);
            return Err(InvokeError::WalletNotConnected);
        };

        let chain_id = self
            .backend
            .wallet_chain_id()
            .await
            .map_err(|e| InvokeError::RpcCallFailed(format!("{:#}", e)))?;
        if chain_id != self.network.chain_id {
            self.notifier.notify(Notification::WrongNetwork {
                expected: self.network.clone(),
                actual: chain_id,
            });
            return Err(InvokeError::WrongNetwork {
                expected: self.network.chain_id,
                expected_name: self.network.name.clone(),
                actual: chain_id,
            });
        }

        let call = self.table.resolve(&ContractCall::new(name, args.to_vec()))?;
        let payable = call.function.state_mutability == StateMutability::Payable;
        if value.is_some_and(|v| !v.is_zero()) && !payable {
            return Err(InvokeError::invalid_arguments(
                name,
                "cannot send value to a non-payable function",
            ));
        }

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(address)
            .with_input(call.calldata);
        if let Some(value) = value {
            tx = tx.with_value(value);
        }

        let gas_limit = match gas_limit {
            Some(gas_limit) => Some(gas_limit),
            None => match self.backend.estimate_gas(tx.clone()).await {
                Ok(estimate) => Some(apply_gas_buffer(estimate)),
                Err(e) => {
                    let error = InvokeError::GasEstimationFailed(format!("{:#}", e));
                    tracing::warn!(method = name, error = %error, "sending without a gas limit");
                    None
                }
            },
        };
        if let Some(gas_limit) = gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }

        self.backend
            .send_transaction(tx)
            .await
            .map_err(|e| InvokeError::TransactionRejected(format!("{:#}", e)))
    }

    /// Calldata for `name(args)` without touching the network.
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Bytes, InvokeError> {
        let call = self.table.resolve(&ContractCall::new(name, args.to_vec()))?;
        Ok(call.calldata)
    }

    /// Waits for one confirmation, then drops every cached read.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<ReceiptSummary, InvokeError> {
        let receipt = self
            .backend
            .wait_for_receipt(tx_hash, timeout)
            .await
            .map_err(|e| InvokeError::RpcCallFailed(format!("{:#}", e)))?;
        self.clear_cache(None);
        Ok(receipt)
    }

    /// Drops one cached read, or all of them.
    pub fn clear_cache(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.cache.invalidate(key);
            }
            None => self.cache.clear(),
        }
    }
}

async fn fetch(
    backend: Arc<dyn ChainBackend>,
    address: Address,
    call: ResolvedCall,
) -> Result<ReadResult, InvokeError> {
    let tx = TransactionRequest::default()
        .with_to(address)
        .with_input(call.calldata);
    let output = backend
        .call(tx)
        .await
        .map_err(|e| InvokeError::RpcCallFailed(format!("{:#}", e)))?;
    let values = call
        .function
        .abi_decode_output(&output)
        .map_err(|e| InvokeError::DecodeFailed(e.to_string()))?;
    Ok(Arc::new(values))
}
