//! Error type shared by the chain, contract, wallet and view-model layers.

use alloy_primitives::{Address, B256};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("user rejected the wallet request")]
    WalletRejected,

    #[error("this dApp only works on chain {expected} (wallet is on chain {actual})")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("a signer is required for this operation")]
    SignerRequired,

    #[error("ABI has no entry for `{0}`")]
    MissingAbiEntry(String),

    #[error("no contract deployed at {0}")]
    UnknownContract(Address),

    #[error("call reverted: {0}")]
    CallReverted(String),

    #[error("transaction {hash} reverted: {reason}")]
    Reverted { hash: B256, reason: String },

    #[error("transaction {0} not found")]
    TransactionNotFound(B256),

    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(B256),

    #[error("decode: {0}")]
    Decode(String),

    #[error("abi: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wallet-side failures leave the session disconnected rather than in a chain error.
    pub fn is_wallet_error(&self) -> bool {
        matches!(self, Error::WalletUnavailable(_) | Error::WalletRejected | Error::WrongNetwork { .. })
    }
}
