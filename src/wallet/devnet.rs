//! Wallet backed by a devnet account.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;

use super::{WalletConnection, WalletConnector};
use crate::chain::{Devnet, Provider};
use crate::error::{Error, Result};

/// Connects a fixed devnet account. The reject flag simulates the user
/// dismissing the connect prompt.
pub struct DevnetWallet {
    devnet: Arc<Devnet>,
    account: Address,
    reject: AtomicBool,
}

impl DevnetWallet {
    pub fn new(devnet: Arc<Devnet>, account: Address) -> Self {
        Self { devnet, account, reject: AtomicBool::new(false) }
    }

    pub fn labelled(devnet: Arc<Devnet>, label: &str) -> Self { Self::new(devnet, Devnet::account(label)) }

    pub fn account(&self) -> Address { self.account }

    pub fn set_rejecting(&self, reject: bool) { self.reject.store(reject, Ordering::SeqCst); }
}

#[async_trait]
impl WalletConnector for DevnetWallet {
    async fn connect(&self) -> Result<WalletConnection> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::WalletRejected);
        }
        let chain_id = self.devnet.chain_id().await?;
        Ok(WalletConnection {
            chain_id,
            account: self.account,
            provider: self.devnet.clone(),
            signer: Arc::new(self.devnet.signer(self.account)),
        })
    }
}
