//! Wallet - connection to the user's account and network check
//!
//! ```text
//! WalletConnector::connect()
//!     │
//!     ▼
//! WalletConnection {chain_id, account, provider, signer}
//!     │
//!     ├── chain_id != required → alert + Error::WrongNetwork
//!     │
//!     └── needs_signer ? ChainHandle::Signer : ChainHandle::Reader
//! ```

mod devnet;
mod network;

pub use devnet::DevnetWallet;
pub use network::Network;

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::chain::{ChainHandle, Provider, Signer};
use crate::error::{Error, Result};

/// Synchronous user-facing notification (the browser's `alert`).
pub type AlertHook = Arc<dyn Fn(&str) + Send + Sync>;

pub fn log_alert() -> AlertHook {
    Arc::new(|message: &str| tracing::warn!(alert = message, "user alert"))
}

/// An established wallet session.
#[derive(Clone)]
pub struct WalletConnection {
    pub chain_id: u64,
    pub account: Address,
    pub provider: Arc<dyn Provider>,
    pub signer: Arc<dyn Signer>,
}

impl WalletConnection {
    pub fn network(&self) -> Network { Network::from_chain_id(self.chain_id) }

    pub fn handle(&self, needs_signer: bool) -> ChainHandle {
        if needs_signer {
            ChainHandle::Signer { provider: self.provider.clone(), signer: self.signer.clone() }
        } else {
            ChainHandle::Reader(self.provider.clone())
        }
    }
}

/// Triggers the wallet's connect flow. Implementations may prompt the user.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self) -> Result<WalletConnection>;
}

/// Connect, then refuse any network other than `required`.
pub async fn connect_on(connector: &dyn WalletConnector, required: Network, alert: &AlertHook) -> Result<WalletConnection> {
    let connection = connector.connect().await?;
    let actual = connection.provider.chain_id().await?;
    if actual != required.chain_id() {
        let message = format!("This dApp only works on the {} network", required.as_str());
        alert(&message);
        return Err(Error::WrongNetwork { expected: required.chain_id(), actual });
    }
    tracing::debug!(account = %connection.account, network = %connection.network(), "wallet connected");
    Ok(connection)
}

/// Read-only provider, or a signer for the connected account when `needs_signer`.
pub async fn provider_or_signer(
    connector: &dyn WalletConnector,
    required: Network,
    needs_signer: bool,
    alert: &AlertHook,
) -> Result<ChainHandle> {
    Ok(connect_on(connector, required, alert).await?.handle(needs_signer))
}
