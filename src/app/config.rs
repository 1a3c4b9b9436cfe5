//! Dapp configuration - static contract address plus environment overrides

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;

use crate::chain::DEFAULT_POLL_INTERVAL;
use crate::core::paths::{env as vars, files};
use crate::deploy::DeploymentRecord;
use crate::error::{Error, Result};
use crate::wallet::Network;

/// Constructor argument used by the deployment script.
pub const DEFAULT_CAPACITY: u8 = 15;
pub const DEFAULT_ACCOUNT: &str = "deployer";

#[derive(Debug, Clone)]
pub struct DappConfig {
    /// Deployed whitelist contract. `None` until something is deployed.
    pub contract_address: Option<Address>,
    /// The only network the dApp accepts.
    pub network: Network,
    pub capacity: u8,
    /// Devnet account label the wallet connects as.
    pub account: String,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    /// `None` waits for confirmation indefinitely.
    pub confirmation_timeout: Option<Duration>,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            network: Network::Rinkeby,
            capacity: DEFAULT_CAPACITY,
            account: DEFAULT_ACCOUNT.into(),
            data_dir: default_data_dir(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: None,
        }
    }
}

impl DappConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_contract(mut self, address: Address) -> Self { self.contract_address = Some(address); self }
    pub fn with_network(mut self, network: Network) -> Self { self.network = network; self }
    pub fn with_capacity(mut self, capacity: u8) -> Self { self.capacity = capacity; self }
    pub fn with_account(mut self, label: impl Into<String>) -> Self { self.account = label.into(); self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = path.into(); self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self { self.confirmation_timeout = Some(timeout); self }

    pub fn devnet_path(&self) -> PathBuf { self.data_dir.join(files::DEVNET) }
    pub fn deployment_path(&self) -> PathBuf { self.data_dir.join(files::DEPLOYMENT) }

    /// Build from `WHITELIST_*` variables. A `.env` in the working directory is loaded
    /// first and never overrides variables already set. Without
    /// `WHITELIST_CONTRACT_ADDRESS` the last recorded deployment is used.
    pub fn from_env() -> Result<Self> {
        load_dotenv(Path::new(files::DOTENV));

        let mut config = Self::default();
        if let Some(network) = var(vars::CHAIN_ID) {
            config.network = Network::parse(&network)
                .ok_or_else(|| Error::Config(format!("{}: invalid network `{network}`", vars::CHAIN_ID)))?;
        }
        if let Some(capacity) = var(vars::CAPACITY) {
            config.capacity = parse(vars::CAPACITY, &capacity)?;
        }
        if let Some(account) = var(vars::ACCOUNT) {
            config.account = account;
        }
        if let Some(ms) = var(vars::POLL_MS) {
            config.poll_interval = Duration::from_millis(parse(vars::POLL_MS, &ms)?);
        }
        if let Some(ms) = var(vars::CONFIRM_TIMEOUT_MS) {
            config.confirmation_timeout = Some(Duration::from_millis(parse(vars::CONFIRM_TIMEOUT_MS, &ms)?));
        }
        config.contract_address = match var(vars::CONTRACT_ADDRESS) {
            Some(address) => Some(parse(vars::CONTRACT_ADDRESS, &address)?),
            None => DeploymentRecord::load(&config.deployment_path())?.map(|r| r.address),
        };
        Ok(config)
    }

    pub fn require_contract(&self) -> Result<Address> {
        self.contract_address.ok_or_else(|| {
            Error::Config(format!("no contract address (set {} or run `deploy`)", vars::CONTRACT_ADDRESS))
        })
    }
}

/// `$WHITELIST_ROOT`, else the platform data dir.
pub fn default_data_dir() -> PathBuf {
    std::env::var(vars::ROOT)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(files::APP_DIR)
        })
}

/// Load `KEY=value` lines into the environment without overriding existing variables.
pub fn load_dotenv(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| Error::Config(format!("{key}: {e}")))
}
