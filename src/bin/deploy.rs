//! Deploy the whitelist contract.
//!
//! Takes no flags. Deploys with capacity `WHITELIST_CAPACITY` (15 unless overridden) from
//! the `WHITELIST_ACCOUNT` devnet account, waits for the receipt and prints the address.
//! Exit code 0 on success, 1 on any error.

use std::sync::Arc;

use whitelist_dapp::logging::init_logging;
use whitelist_dapp::{deploy_whitelist, ChainHandle, DappConfig, Devnet};

async fn run() -> anyhow::Result<()> {
    let config = DappConfig::from_env()?;
    let devnet = Arc::new(Devnet::open_or_create(config.devnet_path(), config.network.chain_id())?);
    let handle = ChainHandle::Signer {
        provider: devnet.clone(),
        signer: Arc::new(devnet.signer(Devnet::account(&config.account))),
    };

    let record = deploy_whitelist(&handle, config.capacity, config.poll_interval).await?;
    record.save(&config.deployment_path())?;

    println!("contract address: {}", record.address);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
