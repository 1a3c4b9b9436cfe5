//! Whitelist contract binding
//!
//! | Entry point | Kind | Binding |
//! |-------------|------|---------|
//! | `constructor(uint8)` | deploy | [`WhitelistFactory::deploy_transaction`] |
//! | `addAddress()` | write | [`WhitelistContract::add_address`] |
//! | `whitelistedCount()` | view | [`WhitelistContract::whitelisted_count`] |
//! | `maxWhitelistedAddresses()` | view | [`WhitelistContract::max_whitelisted_addresses`] |
//! | `whitelisted(address)` | view | [`WhitelistContract::whitelisted`] |

pub mod abi;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use alloy_sol_types::{SolCall, SolConstructor};

use crate::chain::{ChainHandle, PendingTransaction, TransactionRequest, DEFAULT_POLL_INTERVAL};
use crate::error::Result;

pub use abi::{Abi, Whitelist};

/// Init code prefix understood by the devnet as "deploy a whitelist contract".
/// Constructor arguments follow it, ABI-encoded.
pub const WHITELIST_INIT_CODE: &[u8] = b"\x60\x80whitelist-dapp:Whitelist";

/// Builds deployment transactions for the whitelist contract.
pub struct WhitelistFactory {
    abi: Arc<Abi>,
}

impl WhitelistFactory {
    pub fn new(abi: Arc<Abi>) -> Self { Self { abi } }

    pub fn deploy_transaction(&self, max_whitelisted_addresses: u8) -> Result<TransactionRequest> {
        self.abi.require_constructor()?;
        let args = Whitelist::constructorCall { _maxWhitelistedAddresses: max_whitelisted_addresses };
        let mut code = WHITELIST_INIT_CODE.to_vec();
        code.extend(args.abi_encode());
        Ok(TransactionRequest::create(code))
    }
}

/// A contract instance bound to one address and one chain handle.
///
/// Rebuilt whenever a new handle is obtained; never mutated.
#[derive(Clone)]
pub struct WhitelistContract {
    address: Address,
    handle: ChainHandle,
    poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl std::fmt::Debug for WhitelistContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhitelistContract")
            .field("address", &self.address)
            .field("signer", &self.handle.is_signer())
            .finish()
    }
}

impl WhitelistContract {
    /// Bind `address`. Fails if the ABI lacks an entry point the binding calls.
    pub fn new(address: Address, abi: Arc<Abi>, handle: ChainHandle) -> Result<Self> {
        abi.require_whitelist()?;
        Ok(Self {
            address,
            handle,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: None,
        })
    }

    pub fn with_confirmation(mut self, poll_interval: Duration, timeout: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self.confirmation_timeout = timeout;
        self
    }

    pub fn address(&self) -> Address { self.address }

    pub async fn whitelisted_count(&self) -> Result<u64> {
        Ok(self.call(Whitelist::whitelistedCountCall {}).await?._0.into())
    }

    pub async fn max_whitelisted_addresses(&self) -> Result<u64> {
        Ok(self.call(Whitelist::maxWhitelistedAddressesCall {}).await?._0.into())
    }

    pub async fn whitelisted(&self, account: Address) -> Result<bool> {
        Ok(self.call(Whitelist::whitelistedCall { account }).await?._0)
    }

    /// Submit `addAddress()` from the signer's account. The returned pending transaction
    /// resolves on inclusion, successful or not.
    pub async fn add_address(&self) -> Result<PendingTransaction> {
        let signer = self.handle.signer()?;
        let data = Whitelist::addAddressCall {}.abi_encode();
        let tx = TransactionRequest::call(self.address, data).with_from(signer.address());
        let hash = signer.send_transaction(tx).await?;
        tracing::info!(tx = %hash, contract = %self.address, "addAddress submitted");
        Ok(PendingTransaction::new(hash, self.handle.provider())
            .with_poll_interval(self.poll_interval)
            .with_timeout(self.confirmation_timeout))
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let tx = TransactionRequest::call(self.address, call.abi_encode());
        tracing::debug!(contract = %self.address, function = C::SIGNATURE, "eth_call");
        let output = self.handle.provider().call(&tx).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }
}
