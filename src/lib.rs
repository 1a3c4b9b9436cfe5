//! whitelist-dapp: deploy and join a capacity-bounded on-chain whitelist.
//!
//! # Architecture
//!
//! ```text
//! Dapp (view-model)
//!   │
//!   ├── SessionState ──reduce(Event)──► SessionState ──render──► View
//!   │
//!   ├── WalletConnector (connect, network check)
//!   │     └── WalletConnection {account, Provider, Signer}
//!   │
//!   └── WhitelistContract (address + ABI + ChainHandle)
//!         ├── whitelistedCount() / maxWhitelistedAddresses() / whitelisted(address)
//!         └── addAddress() → PendingTransaction → TransactionReceipt
//!
//! deploy::deploy_whitelist ── WhitelistFactory ── constructor(uint8 capacity)
//!
//! Devnet (file-backed chain) implements Provider + Signer for local use and tests.
//! ```
//!
//! # Views
//!
//! | State | View | Click |
//! |-------|------|-------|
//! | loading | `Loading...` | - |
//! | error | `Something went wrong: ...` | dismiss + retry |
//! | not connected | `Connect to your wallet` | connect |
//! | whitelisted | `Thanks for joining the whitelist!` | - |
//! | otherwise | `Join the whitelist!` | join |
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use whitelist_dapp::{Dapp, DappConfig, Devnet, DevnetWallet};
//!
//! let devnet = Arc::new(Devnet::open_or_create(config.devnet_path(), 4)?);
//! let wallet = Arc::new(DevnetWallet::labelled(devnet, "alice"));
//! let dapp = Dapp::new(DappConfig::from_env()?, wallet)?;
//!
//! dapp.mount().await?;          // connect, read membership + count
//! let view = dapp.click().await?; // join
//! ```

pub mod app;
pub mod chain;
pub mod contract;
pub mod core;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod wallet;

pub use app::{Dapp, DappConfig};
pub use chain::{ChainHandle, Devnet, DevnetSigner, PendingTransaction, Provider, Signer, TransactionReceipt, TransactionRequest};
pub use contract::{Abi, Whitelist, WhitelistContract, WhitelistFactory};
pub use deploy::{deploy_whitelist, DeploymentRecord};
pub use error::{Error, Result};
pub use runtime::{install_signal_handlers, Shutdown};
pub use session::{reduce, render, Action, Event, SessionState, View};
pub use wallet::{DevnetWallet, Network, WalletConnection, WalletConnector};
