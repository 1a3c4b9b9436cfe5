//! Devnet - file-backed local chain hosting the whitelist contract
//!
//! Stands in for the JSON-RPC node. Keeps a ledger of deployed whitelist contracts,
//! per-account nonces and receipts as a JSON file. Every operation re-reads the file
//! under an advisory lock and every write replaces it atomically, so a long-lived session
//! and separate CLI invocations see the same chain.
//!
//! Transactions are mined immediately unless auto-mining is disabled, in which case
//! they wait in the pending pool until [`Devnet::mine`] is called. Reverted transactions
//! are still mined, with `status = false`.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::{sol_data, SolCall, SolInterface, SolType};
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{Provider, Signer, TransactionReceipt, TransactionRequest};
use crate::contract::{Whitelist, WHITELIST_INIT_CODE};
use crate::core::paths::revert;
use crate::error::{Error, Result};

type Revert = std::result::Result<Vec<u8>, String>;

/// On-chain storage of one whitelist contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhitelistStorage {
    address: Address,
    max_whitelisted_addresses: u8,
    num_addresses_whitelisted: u8,
    whitelisted: BTreeSet<Address>,
}

impl WhitelistStorage {
    fn execute(&mut self, sender: Address, data: &[u8]) -> Revert {
        use Whitelist::WhitelistCalls as Call;

        match Call::abi_decode(data, true).map_err(|e| e.to_string())? {
            Call::addAddress(_) => {
                if self.whitelisted.contains(&sender) {
                    return Err(revert::ALREADY_WHITELISTED.into());
                }
                if self.num_addresses_whitelisted >= self.max_whitelisted_addresses {
                    return Err(revert::LIMIT_REACHED.into());
                }
                self.whitelisted.insert(sender);
                self.num_addresses_whitelisted += 1;
                Ok(Vec::new())
            }
            Call::whitelistedCount(_) => {
                Ok(Whitelist::whitelistedCountCall::abi_encode_returns(&(self.num_addresses_whitelisted,)))
            }
            Call::maxWhitelistedAddresses(_) => {
                Ok(Whitelist::maxWhitelistedAddressesCall::abi_encode_returns(&(self.max_whitelisted_addresses,)))
            }
            Call::whitelisted(call) => {
                Ok(Whitelist::whitelistedCall::abi_encode_returns(&(self.whitelisted.contains(&call.account),)))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueuedTransaction {
    hash: B256,
    from: Address,
    nonce: u64,
    tx: TransactionRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ledger {
    chain_id: u64,
    block_number: u64,
    created_at: String,
    #[serde(default)]
    nonces: Vec<(Address, u64)>,
    #[serde(default)]
    contracts: Vec<WhitelistStorage>,
    #[serde(default)]
    receipts: Vec<TransactionReceipt>,
    #[serde(default)]
    pending: Vec<QueuedTransaction>,
}

impl Ledger {
    fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block_number: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
            nonces: Vec::new(),
            contracts: Vec::new(),
            receipts: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn next_nonce(&mut self, account: Address) -> u64 {
        match self.nonces.iter_mut().find(|(a, _)| *a == account) {
            Some((_, n)) => { let nonce = *n; *n += 1; nonce }
            None => { self.nonces.push((account, 1)); 0 }
        }
    }

    fn contract(&self, address: Address) -> Option<&WhitelistStorage> {
        self.contracts.iter().find(|c| c.address == address)
    }

    fn contract_mut(&mut self, address: Address) -> Option<&mut WhitelistStorage> {
        self.contracts.iter_mut().find(|c| c.address == address)
    }

    /// Mine every pending transaction into one block.
    fn mine(&mut self) -> u64 {
        if self.pending.is_empty() {
            return self.block_number;
        }
        self.block_number += 1;
        let block = self.block_number;
        for queued in std::mem::take(&mut self.pending) {
            let receipt = self.apply(block, queued);
            tracing::info!(
                tx = %receipt.transaction_hash,
                block,
                status = receipt.status,
                reason = receipt.revert_reason.as_deref().unwrap_or(""),
                "devnet mined transaction"
            );
            self.receipts.push(receipt);
        }
        block
    }

    fn apply(&mut self, block: u64, queued: QueuedTransaction) -> TransactionReceipt {
        let QueuedTransaction { hash, from, nonce, tx } = queued;
        let mut receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: block,
            from,
            to: tx.to,
            contract_address: None,
            status: true,
            revert_reason: None,
        };
        let outcome = match tx.to {
            None => self.create(from, nonce, &tx.data).map(|address| {
                receipt.contract_address = Some(address);
            }),
            Some(to) => match self.contract_mut(to) {
                Some(contract) => contract.execute(from, &tx.data).map(|_| ()),
                None => Err(format!("no contract at {to}")),
            },
        };
        if let Err(reason) = outcome {
            receipt.status = false;
            receipt.revert_reason = Some(reason);
        }
        receipt
    }

    fn create(&mut self, from: Address, nonce: u64, init_code: &[u8]) -> std::result::Result<Address, String> {
        let args = init_code
            .strip_prefix(WHITELIST_INIT_CODE)
            .ok_or_else(|| "unsupported init code".to_string())?;
        let max = <sol_data::Uint<8> as SolType>::abi_decode(args, true)
            .map_err(|e| format!("bad constructor argument: {e}"))?;

        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let address = Address::from_word(keccak256(&preimage));
        self.contracts.push(WhitelistStorage {
            address,
            max_whitelisted_addresses: max,
            num_addresses_whitelisted: 0,
            whitelisted: BTreeSet::new(),
        });
        Ok(address)
    }
}

/// A handle on the chain. File-backed handles share state through the ledger file:
/// every operation re-reads it under an advisory lock, and writes replace it atomically.
pub struct Devnet {
    ledger: Mutex<Ledger>,
    path: Option<PathBuf>,
    auto_mine: AtomicBool,
}

impl Devnet {
    /// Ephemeral chain, nothing written to disk.
    pub fn in_memory(chain_id: u64) -> Self {
        Self { ledger: Mutex::new(Ledger::new(chain_id)), path: None, auto_mine: AtomicBool::new(true) }
    }

    /// Create a fresh ledger at `path`, overwriting any existing one.
    pub fn create(path: impl Into<PathBuf>, chain_id: u64) -> Result<Self> {
        let path = path.into();
        let ledger = Ledger::new(chain_id);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let lock = lock_file(&path)?;
        FileExt::lock_exclusive(&lock)?;
        persist(&path, &ledger)?;
        tracing::info!(path = %path.display(), chain_id, "devnet created");
        Ok(Self { ledger: Mutex::new(ledger), path: Some(path), auto_mine: AtomicBool::new(true) })
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::Config(format!(
                "no devnet ledger at {} (run `whitelist init` first)",
                path.display()
            )));
        }
        let lock = lock_file(&path)?;
        FileExt::lock_shared(&lock)?;
        let ledger = load(&path)?;
        tracing::debug!(path = %path.display(), block = ledger.block_number, "devnet opened");
        Ok(Self { ledger: Mutex::new(ledger), path: Some(path), auto_mine: AtomicBool::new(true) })
    }

    pub fn open_or_create(path: impl Into<PathBuf>, chain_id: u64) -> Result<Self> {
        let path = path.into();
        if path.exists() { Self::open(path) } else { Self::create(path, chain_id) }
    }

    pub fn with_auto_mine(self, enabled: bool) -> Self {
        self.auto_mine.store(enabled, Ordering::SeqCst);
        self
    }

    pub fn set_auto_mine(&self, enabled: bool) { self.auto_mine.store(enabled, Ordering::SeqCst); }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    /// Deterministic account address for a label (`"deployer"`, `"alice"`, ...).
    pub fn account(label: &str) -> Address {
        Address::from_word(keccak256(format!("whitelist-dapp/account/{label}").as_bytes()))
    }

    pub fn signer(self: &Arc<Self>, account: Address) -> DevnetSigner {
        DevnetSigner { devnet: self.clone(), address: account }
    }

    /// Mine all pending transactions into a new block and return its number.
    pub async fn mine(&self) -> Result<u64> {
        self.write(|ledger| ledger.mine()).await
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.read(|ledger| ledger.pending.len()).await
    }

    async fn submit(&self, from: Address, tx: TransactionRequest) -> Result<B256> {
        let auto_mine = self.auto_mine.load(Ordering::SeqCst);
        self.write(|ledger| {
            let nonce = ledger.next_nonce(from);

            let mut preimage = from.to_vec();
            preimage.extend_from_slice(&nonce.to_be_bytes());
            if let Some(to) = tx.to {
                preimage.extend_from_slice(to.as_slice());
            }
            preimage.extend_from_slice(&tx.data);
            let hash = keccak256(&preimage);

            ledger.pending.push(QueuedTransaction { hash, from, nonce, tx });
            if auto_mine {
                ledger.mine();
            }
            hash
        })
        .await
    }

    /// Run `f` on the latest ledger, holding a shared file lock while reading it.
    async fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> Result<R> {
        let mut ledger = self.ledger.lock().await;
        if let Some(path) = &self.path {
            let lock = lock_file(path)?;
            FileExt::lock_shared(&lock)?;
            *ledger = load(path)?;
        }
        Ok(f(&*ledger))
    }

    /// Run `f` on the latest ledger and write the result back, under an exclusive lock.
    async fn write<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> Result<R> {
        let mut ledger = self.ledger.lock().await;
        let Some(path) = &self.path else { return Ok(f(&mut *ledger)) };
        let lock = lock_file(path)?;
        FileExt::lock_exclusive(&lock)?;
        *ledger = load(path)?;
        let out = f(&mut *ledger);
        persist(path, &ledger)?;
        Ok(out)
    }
}

/// Sidecar lock file; the ledger itself is replaced on every write.
/// The lock is released when the returned file is dropped.
fn lock_file(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path.with_extension("lock"))?)
}

fn load(path: &Path) -> Result<Ledger> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn persist(path: &Path, ledger: &Ledger) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, ledger)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl Provider for Devnet {
    async fn chain_id(&self) -> Result<u64> { self.read(|ledger| ledger.chain_id).await }

    async fn block_number(&self) -> Result<u64> { self.read(|ledger| ledger.block_number).await }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let to = tx.to.ok_or_else(|| Error::CallReverted("eth_call without a target".into()))?;
        let mut scratch = self.read(|ledger| ledger.contract(to).cloned()).await?.ok_or(Error::UnknownContract(to))?;
        let sender = tx.from.unwrap_or(Address::ZERO);
        scratch.execute(sender, &tx.data).map(Bytes::from).map_err(Error::CallReverted)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.read(|ledger| {
            if let Some(receipt) = ledger.receipts.iter().find(|r| r.transaction_hash == hash) {
                return Ok(Some(receipt.clone()));
            }
            if ledger.pending.iter().any(|q| q.hash == hash) {
                return Ok(None);
            }
            Err(Error::TransactionNotFound(hash))
        })
        .await?
    }
}

/// Signs as one devnet account.
#[derive(Clone)]
pub struct DevnetSigner {
    devnet: Arc<Devnet>,
    address: Address,
}

#[async_trait]
impl Signer for DevnetSigner {
    fn address(&self) -> Address { self.address }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        self.devnet.submit(self.address, tx.with_from(self.address)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Abi, WhitelistContract, WhitelistFactory};
    use crate::chain::ChainHandle;

    async fn deploy(devnet: &Arc<Devnet>, capacity: u8) -> Address {
        let factory = WhitelistFactory::new(Arc::new(Abi::whitelist().unwrap()));
        let signer = devnet.signer(Devnet::account("deployer"));
        let hash = signer.send_transaction(factory.deploy_transaction(capacity).unwrap()).await.unwrap();
        let receipt = devnet.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.status);
        receipt.contract_address.unwrap()
    }

    fn binding(devnet: &Arc<Devnet>, address: Address, account: &str) -> WhitelistContract {
        let handle = ChainHandle::Signer {
            provider: devnet.clone(),
            signer: Arc::new(devnet.signer(Devnet::account(account))),
        };
        WhitelistContract::new(address, Arc::new(Abi::whitelist().unwrap()), handle).unwrap()
    }

    #[tokio::test]
    async fn fresh_contract_is_empty_for_any_capacity() {
        let devnet = Arc::new(Devnet::in_memory(4));
        for capacity in [0u8, 1, 15, 255] {
            let address = deploy(&devnet, capacity).await;
            let contract = binding(&devnet, address, "reader");
            assert_eq!(contract.whitelisted_count().await.unwrap(), 0);
            assert_eq!(contract.max_whitelisted_addresses().await.unwrap(), capacity as u64);
            for label in ["deployer", "alice", "bob"] {
                assert!(!contract.whitelisted(Devnet::account(label)).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn duplicate_and_over_capacity_joins_revert() {
        let devnet = Arc::new(Devnet::in_memory(4));
        let address = deploy(&devnet, 1).await;

        let alice = binding(&devnet, address, "alice");
        let first = alice.add_address().await.unwrap().wait().await.unwrap();
        assert!(first.status);

        let again = alice.add_address().await.unwrap().wait().await.unwrap();
        assert!(!again.status);
        assert_eq!(again.revert_reason.as_deref(), Some(revert::ALREADY_WHITELISTED));

        let bob = binding(&devnet, address, "bob");
        let full = bob.add_address().await.unwrap().wait().await.unwrap();
        assert_eq!(full.revert_reason.as_deref(), Some(revert::LIMIT_REACHED));
        assert_eq!(bob.whitelisted_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn manual_mining_keeps_transactions_pending() {
        let devnet = Arc::new(Devnet::in_memory(4));
        let address = deploy(&devnet, 3).await;
        devnet.set_auto_mine(false);

        let pending = binding(&devnet, address, "alice").add_address().await.unwrap();
        let hash = pending.hash();
        assert_eq!(devnet.pending_count().await.unwrap(), 1);
        assert!(devnet.transaction_receipt(hash).await.unwrap().is_none());

        let block = devnet.mine().await.unwrap();
        let receipt = devnet.transaction_receipt(hash).await.unwrap().unwrap();
        assert_eq!(receipt.block_number, block);
        assert!(matches!(
            devnet.transaction_receipt(B256::repeat_byte(7)).await,
            Err(Error::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn ledger_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("devnet.json");
        let address = {
            let devnet = Arc::new(Devnet::create(&path, 4).unwrap());
            let address = deploy(&devnet, 2).await;
            binding(&devnet, address, "alice").add_address().await.unwrap().wait().await.unwrap();
            address
        };

        let reopened = Arc::new(Devnet::open(&path).unwrap());
        let contract = binding(&reopened, address, "bob");
        assert_eq!(contract.whitelisted_count().await.unwrap(), 1);
        assert!(contract.whitelisted(Devnet::account("alice")).await.unwrap());
        // Nonces persist, so the next deployment lands at a new address.
        assert_ne!(deploy(&reopened, 2).await, address);
    }

    #[tokio::test]
    async fn handles_sharing_a_ledger_see_each_others_blocks() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("devnet.json");
        let long_lived = Arc::new(Devnet::create(&path, 4).unwrap());
        let address = deploy(&long_lived, 15).await;

        // A second invocation opens the same file and joins.
        let other = Arc::new(Devnet::open(&path).unwrap());
        assert!(binding(&other, address, "bob").add_address().await.unwrap().wait().await.unwrap().status);

        // The first handle reads the other's block, and its own write keeps it.
        let alice = binding(&long_lived, address, "alice");
        assert_eq!(alice.whitelisted_count().await.unwrap(), 1);
        assert!(alice.add_address().await.unwrap().wait().await.unwrap().status);
        assert_eq!(long_lived.block_number().await.unwrap(), 3);

        let reopened = Arc::new(Devnet::open(&path).unwrap());
        let contract = binding(&reopened, address, "carol");
        assert_eq!(contract.whitelisted_count().await.unwrap(), 2);
        assert!(contract.whitelisted(Devnet::account("bob")).await.unwrap());
        assert!(contract.whitelisted(Devnet::account("alice")).await.unwrap());
        assert_eq!(other.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_selectors_and_init_code_revert() {
        let devnet = Arc::new(Devnet::in_memory(4));
        let address = deploy(&devnet, 1).await;
        let call = TransactionRequest::call(address, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(devnet.call(&call).await, Err(Error::CallReverted(_))));

        let signer = devnet.signer(Devnet::account("deployer"));
        let hash = signer.send_transaction(TransactionRequest::create(b"\x60\x80other".to_vec())).await.unwrap();
        let receipt = devnet.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(!receipt.status);
        assert_eq!(receipt.contract_address, None);
    }

    #[tokio::test]
    async fn calls_to_unknown_addresses_fail() {
        let devnet = Arc::new(Devnet::in_memory(4));
        let contract = binding(&devnet, Address::repeat_byte(1), "alice");
        assert!(matches!(contract.whitelisted_count().await, Err(Error::UnknownContract(_))));
        assert!(Devnet::open(std::env::temp_dir().join("whitelist-dapp-missing/devnet.json")).is_err());
    }
}
