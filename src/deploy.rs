//! Deployment script logic
//!
//! One shot: submit the whitelist constructor, wait for the receipt, check it, report the
//! address. Nothing is retried; the operator re-runs the command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::chain::{ChainHandle, PendingTransaction};
use crate::contract::{Abi, WhitelistFactory};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub chain_id: u64,
    pub capacity: u8,
    pub deployer: Address,
    pub deployed_at: String,
}

impl DeploymentRecord {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&std::fs::read_to_string(path)?)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Deploy a whitelist contract holding at most `capacity` addresses.
pub async fn deploy_whitelist(handle: &ChainHandle, capacity: u8, poll_interval: Duration) -> Result<DeploymentRecord> {
    let signer = handle.signer()?;
    let provider = handle.provider();
    let chain_id = provider.chain_id().await?;

    let factory = WhitelistFactory::new(Arc::new(Abi::whitelist()?));
    let hash = signer.send_transaction(factory.deploy_transaction(capacity)?.with_from(signer.address())).await?;
    tracing::info!(tx = %hash, capacity, chain_id, "deployment submitted");

    let receipt = PendingTransaction::new(hash, provider)
        .with_poll_interval(poll_interval)
        .wait()
        .await?
        .ensure_success()?;
    let address = receipt
        .contract_address
        .ok_or_else(|| Error::Decode(format!("receipt for {hash} has no contract address")))?;
    tracing::info!(%address, block = receipt.block_number, "whitelist deployed");

    Ok(DeploymentRecord {
        address,
        transaction_hash: hash,
        block_number: receipt.block_number,
        chain_id,
        capacity,
        deployer: signer.address(),
        deployed_at: chrono::Utc::now().to_rfc3339(),
    })
}
