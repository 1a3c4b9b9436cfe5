//! Chain access - read-only providers, signers and transaction confirmation
//!
//! The dApp never talks to a node directly. It goes through two seams:
//!
//! ```text
//! WalletConnector ──connect──► WalletConnection
//!                                  │
//!                                  ├── Provider  (chain id, eth_call, receipts)
//!                                  └── Signer    (account address, send transaction)
//!                                          │
//!                                          ▼
//!                                  PendingTransaction ──wait──► TransactionReceipt
//! ```
//!
//! `devnet` ships a file-backed implementation of both seams.

pub mod devnet;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use devnet::{Devnet, DevnetSigner};

/// Default receipt polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A call or transaction. `to = None` deploys a contract with `data` as init code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self { from: None, to: Some(to), data: data.into() }
    }
    pub fn create(init_code: impl Into<Bytes>) -> Self {
        Self { from: None, to: None, data: init_code.into() }
    }
    pub fn with_from(mut self, from: Address) -> Self { self.from = Some(from); self }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    /// `true` when execution succeeded, `false` when the transaction was mined but reverted
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

impl TransactionReceipt {
    /// Inclusion is not success: turn a reverted receipt into an error.
    pub fn ensure_success(self) -> Result<Self> {
        if self.status {
            Ok(self)
        } else {
            Err(Error::Reverted {
                hash: self.transaction_hash,
                reason: self.revert_reason.unwrap_or_else(|| "execution reverted".into()),
            })
        }
    }
}

/// Read-only connection to a chain.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
    async fn block_number(&self) -> Result<u64>;
    /// Execute a call against the latest state without creating a transaction.
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes>;
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;
}

/// Authorizes transactions on behalf of one account.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;
    /// Submit a transaction and return its hash. Does not wait for inclusion.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;
}

/// Either a read-only provider or a provider plus a signer for the connected account.
#[derive(Clone)]
pub enum ChainHandle {
    Reader(Arc<dyn Provider>),
    Signer { provider: Arc<dyn Provider>, signer: Arc<dyn Signer> },
}

impl ChainHandle {
    pub fn provider(&self) -> Arc<dyn Provider> {
        match self {
            ChainHandle::Reader(provider) => provider.clone(),
            ChainHandle::Signer { provider, .. } => provider.clone(),
        }
    }

    pub fn signer(&self) -> Result<Arc<dyn Signer>> {
        match self {
            ChainHandle::Signer { signer, .. } => Ok(signer.clone()),
            ChainHandle::Reader(_) => Err(Error::SignerRequired),
        }
    }

    pub fn is_signer(&self) -> bool { matches!(self, ChainHandle::Signer { .. }) }
}

/// A submitted transaction awaiting inclusion.
pub struct PendingTransaction {
    hash: B256,
    provider: Arc<dyn Provider>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl PendingTransaction {
    pub fn new(hash: B256, provider: Arc<dyn Provider>) -> Self {
        Self { hash, provider, poll_interval: DEFAULT_POLL_INTERVAL, timeout: None }
    }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self { self.timeout = timeout; self }
    pub fn hash(&self) -> B256 { self.hash }

    /// Poll until the transaction is mined. The receipt may carry a failed status;
    /// callers decide whether to `ensure_success`. Without a timeout this waits forever.
    pub async fn wait(self) -> Result<TransactionReceipt> {
        let deadline = self.timeout.map(|t| tokio::time::Instant::now() + t);
        loop {
            if let Some(receipt) = self.provider.transaction_receipt(self.hash).await? {
                tracing::debug!(tx = %self.hash, block = receipt.block_number, status = receipt.status, "transaction mined");
                return Ok(receipt);
            }
            if let Some(deadline) = deadline {
                if tokio::time::Instant::now() >= deadline {
                    return Err(Error::ConfirmationTimeout(self.hash));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
