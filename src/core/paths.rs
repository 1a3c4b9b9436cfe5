//! Path, file-name and environment-variable constants.
//!
//! Centralized registry so the CLI, config loader and devnet agree on names.

/// Data directory layout (relative to the data root)
pub mod files {
    pub const APP_DIR: &str = "whitelist-dapp";
    pub const DEVNET: &str = "devnet.json";
    pub const DEPLOYMENT: &str = "deployment.json";
    pub const DOTENV: &str = ".env";
}

/// Environment variables read by `DappConfig::from_env` and logging
pub mod env {
    pub const ROOT: &str = "WHITELIST_ROOT";
    pub const CONTRACT_ADDRESS: &str = "WHITELIST_CONTRACT_ADDRESS";
    pub const CHAIN_ID: &str = "WHITELIST_CHAIN_ID";
    pub const CAPACITY: &str = "WHITELIST_CAPACITY";
    pub const ACCOUNT: &str = "WHITELIST_ACCOUNT";
    pub const POLL_MS: &str = "WHITELIST_POLL_MS";
    pub const CONFIRM_TIMEOUT_MS: &str = "WHITELIST_CONFIRM_TIMEOUT_MS";
    pub const LOG_JSON: &str = "WHITELIST_LOG_JSON";
}

/// Revert reasons raised by the whitelist contract
pub mod revert {
    pub const ALREADY_WHITELISTED: &str = "Sender has already been whitelisted";
    pub const LIMIT_REACHED: &str = "More addresses cant be added, limit reached";
}
