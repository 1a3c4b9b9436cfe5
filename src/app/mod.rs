//! Dapp - the whitelist page's view-model
//!
//! Owns the session state and drives it through the reducer. Every user action runs its
//! own connect → read/write → refresh sequence; failures are logged, rendered as the
//! error view and returned to the caller.
//!
//! | Action | Chain access | Events |
//! |--------|--------------|--------|
//! | `connect_wallet` | reader | `WalletConnected`, `MembershipChecked`, `CountFetched`, `CapacityFetched` |
//! | `update_whitelisted_count` | reader | `CountFetched`, `CapacityFetched` |
//! | `check_if_whitelisted` | reader + wallet account | `WalletConnected`, `MembershipChecked` |
//! | `add_to_whitelist` | signer | `TransactionSubmitted`, `TransactionConfirmed` / `TransactionReverted` + `MembershipChecked`, `CountFetched` |

mod config;

pub use config::{default_data_dir, load_dotenv, DappConfig, DEFAULT_ACCOUNT, DEFAULT_CAPACITY};

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::RwLock;

use crate::chain::{ChainHandle, TransactionReceipt};
use crate::contract::{Abi, WhitelistContract};
use crate::error::{Error, Result};
use crate::session::{reduce, render, Action, Event, SessionState, View};
use crate::wallet::{self, log_alert, AlertHook, WalletConnection, WalletConnector};

pub struct Dapp {
    config: DappConfig,
    abi: Arc<Abi>,
    wallet: Arc<dyn WalletConnector>,
    alert: AlertHook,
    state: RwLock<SessionState>,
}

impl Dapp {
    pub fn new(config: DappConfig, wallet: Arc<dyn WalletConnector>) -> Result<Self> {
        Ok(Self {
            config,
            abi: Arc::new(Abi::whitelist()?),
            wallet,
            alert: log_alert(),
            state: RwLock::new(SessionState::default()),
        })
    }

    pub fn with_abi(mut self, abi: Abi) -> Self { self.abi = Arc::new(abi); self }
    pub fn with_alert(mut self, alert: AlertHook) -> Self { self.alert = alert; self }

    pub fn config(&self) -> &DappConfig { &self.config }

    pub async fn state(&self) -> SessionState { self.state.read().await.clone() }

    pub async fn view(&self) -> View { render(&*self.state.read().await) }

    async fn dispatch(&self, event: Event) -> SessionState {
        let mut guard = self.state.write().await;
        let next = reduce(guard.clone(), &event);
        tracing::debug!(?event, loading = next.loading, connected = next.wallet_connected, "session event");
        *guard = next.clone();
        next
    }

    async fn record_failure(&self, action: Action, err: &Error) {
        tracing::warn!(action = action.as_str(), error = %err, "action failed");
        // Lost the wallet (rejected, switched network): back to the connect step.
        let action = if err.is_wallet_error() {
            self.dispatch(Event::Disconnected).await;
            Action::Connect
        } else {
            action
        };
        self.dispatch(Event::ActionFailed { action, message: err.to_string() }).await;
    }

    async fn connection(&self) -> Result<WalletConnection> {
        wallet::connect_on(self.wallet.as_ref(), self.config.network, &self.alert).await
    }

    /// Read-only provider, or a signer bound to the user's account.
    pub async fn provider_or_signer(&self, needs_signer: bool) -> Result<ChainHandle> {
        wallet::provider_or_signer(self.wallet.as_ref(), self.config.network, needs_signer, &self.alert).await
    }

    fn contract(&self, handle: ChainHandle) -> Result<WhitelistContract> {
        Ok(WhitelistContract::new(self.config.require_contract()?, self.abi.clone(), handle)?
            .with_confirmation(self.config.poll_interval, self.config.confirmation_timeout))
    }

    /// Page load: connect unless already connected.
    pub async fn mount(&self) -> Result<()> {
        if self.state.read().await.wallet_connected {
            return Ok(());
        }
        self.connect_wallet().await
    }

    pub async fn connect_wallet(&self) -> Result<()> {
        match self.try_connect().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record_failure(Action::Connect, &e).await;
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<()> {
        let connection = self.connection().await?;
        self.dispatch(Event::WalletConnected { account: connection.account }).await;
        tracing::info!(account = %connection.account, "wallet connected");

        let contract = self.contract(connection.handle(false))?;
        self.fetch_membership(&contract, connection.account).await?;
        self.fetch_count(&contract).await?;
        Ok(())
    }

    /// Refresh the count (and capacity) from chain.
    pub async fn update_whitelisted_count(&self) -> Result<u64> {
        let result = async {
            let contract = self.contract(self.provider_or_signer(false).await?)?;
            self.fetch_count(&contract).await
        }
        .await;
        if let Err(e) = &result {
            self.record_failure(Action::RefreshCount, e).await;
        }
        result
    }

    /// Membership of the wallet's account. Uses a plain read; the wallet only supplies the
    /// address. Connecting here also marks the session connected.
    pub async fn check_if_whitelisted(&self) -> Result<bool> {
        let result = async {
            let connection = self.connection().await?;
            self.dispatch(Event::WalletConnected { account: connection.account }).await;
            let contract = self.contract(connection.handle(false))?;
            self.fetch_membership(&contract, connection.account).await
        }
        .await;
        if let Err(e) = &result {
            self.record_failure(Action::CheckMembership, e).await;
        }
        result
    }

    /// Submit `addAddress()`, wait for the receipt and declare success only if it says so.
    pub async fn add_to_whitelist(&self) -> Result<TransactionReceipt> {
        let result = self.try_join().await;
        if let Err(e) = &result {
            self.record_failure(Action::Join, e).await;
        }
        result
    }

    async fn try_join(&self) -> Result<TransactionReceipt> {
        let handle = self.provider_or_signer(true).await?;
        let account = handle.signer()?.address();
        let contract = self.contract(handle)?;
        let pending = contract.add_address().await?;
        let hash = pending.hash();
        self.dispatch(Event::TransactionSubmitted(hash)).await;

        let receipt = pending.wait().await?;
        if receipt.status {
            self.dispatch(Event::TransactionConfirmed(hash)).await;
            tracing::info!(tx = %hash, block = receipt.block_number, "joined whitelist");
        } else {
            let reason = receipt.revert_reason.clone().unwrap_or_default();
            self.dispatch(Event::TransactionReverted { hash, reason }).await;
            // The session may be stale: the account can already be a member.
            if let Err(e) = self.fetch_membership(&contract, account).await {
                tracing::warn!(error = %e, "membership refresh after revert failed");
            }
        }

        if let Err(e) = self.fetch_count(&contract).await {
            tracing::warn!(error = %e, "count refresh after join failed");
        }
        receipt.ensure_success()
    }

    async fn fetch_count(&self, contract: &WhitelistContract) -> Result<u64> {
        let count = contract.whitelisted_count().await?;
        let capacity = contract.max_whitelisted_addresses().await?;
        self.dispatch(Event::CountFetched(count)).await;
        self.dispatch(Event::CapacityFetched(capacity)).await;
        Ok(count)
    }

    async fn fetch_membership(&self, contract: &WhitelistContract, account: Address) -> Result<bool> {
        let member = contract.whitelisted(account).await?;
        self.dispatch(Event::MembershipChecked(member)).await;
        Ok(member)
    }

    pub async fn dismiss_error(&self) { self.dispatch(Event::ErrorDismissed).await; }

    pub async fn disconnect(&self) { self.dispatch(Event::Disconnected).await; }

    /// Press the button. Non-interactive views are a no-op; the error view dismisses
    /// itself and retries the failed action.
    pub async fn click(&self) -> Result<View> {
        let view = self.view().await;
        let Some(action) = view.on_click() else { return Ok(view) };
        if matches!(view, View::Error { .. }) {
            self.dismiss_error().await;
            // Nothing to retry for a member whose join reverted.
            if action == Action::Join && self.state.read().await.user_whitelisted {
                return Ok(self.view().await);
            }
        }
        match action {
            Action::Connect => self.connect_wallet().await?,
            Action::RefreshCount => { self.update_whitelisted_count().await?; }
            Action::CheckMembership => { self.check_if_whitelisted().await?; }
            Action::Join => { self.add_to_whitelist().await?; }
        }
        Ok(self.view().await)
    }
}
