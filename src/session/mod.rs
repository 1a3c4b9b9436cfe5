//! Session - page-local view state, reducer and render
//!
//! State changes only through [`reduce`]; what the user sees is [`render`] of the state.
//!
//! ```text
//!            connect              join (loading)
//! Connect ──────────► Join ──────────────────────► Whitelisted
//!    │                  │ \                              ▲
//!    │                  │  └── reverted / failed ─► Error┘ (dismiss → retry)
//!    └── wrong network ─┴───────────────────────────► Error
//! ```

mod view;

pub use view::View;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// A user-triggerable operation, used to label failures and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Connect,
    RefreshCount,
    CheckMembership,
    Join,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Connect => "connect",
            Action::RefreshCount => "refresh_count",
            Action::CheckMembership => "check_membership",
            Action::Join => "join",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub action: Action,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub wallet_connected: bool,
    pub user_whitelisted: bool,
    pub loading: bool,
    pub whitelist_count: u64,
    pub capacity: Option<u64>,
    pub account: Option<Address>,
    pub pending_tx: Option<B256>,
    pub error: Option<SessionError>,
}

impl SessionState {
    pub fn seats_left(&self) -> Option<u64> {
        self.capacity.map(|cap| cap.saturating_sub(self.whitelist_count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WalletConnected { account: Address },
    Disconnected,
    CountFetched(u64),
    CapacityFetched(u64),
    MembershipChecked(bool),
    TransactionSubmitted(B256),
    TransactionConfirmed(B256),
    TransactionReverted { hash: B256, reason: String },
    ActionFailed { action: Action, message: String },
    ErrorDismissed,
}

pub fn reduce(state: SessionState, event: &Event) -> SessionState {
    let mut next = state;
    match event {
        Event::WalletConnected { account } => {
            if next.account != Some(*account) {
                next.user_whitelisted = false;
            }
            next.wallet_connected = true;
            next.account = Some(*account);
        }
        Event::Disconnected => {
            next = SessionState { whitelist_count: next.whitelist_count, capacity: next.capacity, ..SessionState::default() };
        }
        Event::CountFetched(count) => next.whitelist_count = *count,
        Event::CapacityFetched(capacity) => next.capacity = Some(*capacity),
        Event::MembershipChecked(member) => {
            if next.wallet_connected {
                next.user_whitelisted = *member;
            }
        }
        Event::TransactionSubmitted(hash) => {
            next.loading = true;
            next.pending_tx = Some(*hash);
            next.error = None;
        }
        Event::TransactionConfirmed(hash) => {
            if next.pending_tx == Some(*hash) {
                next.loading = false;
                next.pending_tx = None;
                next.user_whitelisted = next.wallet_connected;
            }
        }
        Event::TransactionReverted { hash, .. } => {
            if next.pending_tx == Some(*hash) {
                next.loading = false;
                next.pending_tx = None;
            }
        }
        Event::ActionFailed { action, message } => {
            next.loading = false;
            next.pending_tx = None;
            next.error = Some(SessionError { action: *action, message: message.clone() });
        }
        Event::ErrorDismissed => next.error = None,
    }
    next
}

/// Strict priority: loading, error, disconnected, whitelisted, join.
pub fn render(state: &SessionState) -> View {
    if state.loading {
        return View::Loading;
    }
    if let Some(error) = &state.error {
        return View::Error { message: error.message.clone(), retry: error.action };
    }
    if !state.wallet_connected {
        return View::ConnectWallet;
    }
    if state.user_whitelisted {
        View::Whitelisted
    } else {
        View::JoinWhitelist
    }
}
