//! Integration Tests: the whitelist page end to end against a local devnet
//!
//! These tests verify:
//! 1. The connect → join → thank-you scenario, including a second join that reverts
//! 2. The wrong-network guard
//! 3. Receipt status, not inclusion, decides whitelisted
//! 4. Loading while a transaction is pending, and the error view with retry
//! 5. Several handles on one ledger file see the same chain

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use whitelist_dapp::chain::{ChainHandle, Provider};
use whitelist_dapp::core::paths::revert;
use whitelist_dapp::{
    deploy_whitelist, Abi, Action, Dapp, DappConfig, Devnet, DevnetWallet, Error, View, WhitelistContract,
};

const POLL: Duration = Duration::from_millis(2);

async fn deploy(devnet: &Arc<Devnet>, capacity: u8) -> alloy_primitives::Address {
    let handle = ChainHandle::Signer {
        provider: devnet.clone(),
        signer: Arc::new(devnet.signer(Devnet::account("deployer"))),
    };
    deploy_whitelist(&handle, capacity, POLL).await.expect("deploy").address
}

/// Join directly through the contract binding, bypassing the page.
async fn join_as(devnet: &Arc<Devnet>, contract: alloy_primitives::Address, label: &str) {
    let handle = ChainHandle::Signer {
        provider: devnet.clone(),
        signer: Arc::new(devnet.signer(Devnet::account(label))),
    };
    let binding = WhitelistContract::new(contract, Arc::new(Abi::whitelist().unwrap()), handle).unwrap();
    let receipt = binding.add_address().await.unwrap().wait().await.unwrap();
    assert!(receipt.status, "{label} failed to join");
}

fn page_for(devnet: &Arc<Devnet>, contract: alloy_primitives::Address, label: &str) -> (Dapp, Arc<DevnetWallet>) {
    let wallet = Arc::new(DevnetWallet::labelled(devnet.clone(), label));
    let config = DappConfig::new().with_contract(contract).with_poll_interval(POLL);
    (Dapp::new(config, wallet.clone()).expect("dapp"), wallet)
}

/// Test: the full page scenario
#[tokio::test]
async fn connect_join_then_second_join_reverts() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    join_as(&devnet, contract, "bob").await;

    let (dapp, _wallet) = page_for(&devnet, contract, "alice");

    // Fresh page: nothing read yet
    let state = dapp.state().await;
    assert_eq!(state.whitelist_count, 0);
    assert_eq!(dapp.view().await, View::ConnectWallet);

    // Connect: membership + count from chain
    assert_eq!(dapp.click().await.expect("connect"), View::JoinWhitelist);
    let state = dapp.state().await;
    assert!(state.wallet_connected);
    assert!(!state.user_whitelisted);
    assert_eq!(state.whitelist_count, 1);
    assert_eq!(state.capacity, Some(15));
    assert_eq!(state.account, Some(Devnet::account("alice")));

    // Join: count +1, thank-you view
    assert_eq!(dapp.click().await.expect("join"), View::Whitelisted);
    let state = dapp.state().await;
    assert!(state.user_whitelisted);
    assert!(!state.loading);
    assert_eq!(state.whitelist_count, 2);
    assert_eq!(state.seats_left(), Some(13));

    // Thank-you view is not clickable
    assert_eq!(dapp.click().await.expect("no-op"), View::Whitelisted);

    // Second join by the same address reverts on chain; count unchanged
    let err = dapp.add_to_whitelist().await.unwrap_err();
    match err {
        Error::Reverted { reason, .. } => assert_eq!(reason, revert::ALREADY_WHITELISTED),
        other => panic!("expected revert, got {other}"),
    }
    let state = dapp.state().await;
    assert_eq!(state.whitelist_count, 2);
    assert!(!state.loading);
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Join, .. }));
}

/// Test: any chain other than 4 never connects
#[tokio::test]
async fn wrong_network_never_connects() {
    for chain_id in [1u64, 5, 31_337] {
        let devnet = Arc::new(Devnet::in_memory(chain_id));
        let contract = deploy(&devnet, 15).await;
        let (dapp, _wallet) = page_for(&devnet, contract, "alice");
        let alerts = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = alerts.clone();
        let dapp = dapp.with_alert(Arc::new(move |m: &str| sink.lock().unwrap().push(m.to_string())));

        let err = dapp.mount().await.unwrap_err();
        assert!(matches!(err, Error::WrongNetwork { expected: 4, actual } if actual == chain_id));
        assert!(!dapp.state().await.wallet_connected);
        assert_eq!(alerts.lock().unwrap().len(), 1);
        assert!(matches!(dapp.view().await, View::Error { retry: Action::Connect, .. }));
    }
}

/// Test: a mined-but-reverted join does not mark the user whitelisted
#[tokio::test]
async fn full_whitelist_reverts_without_marking_member() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 1).await;
    join_as(&devnet, contract, "bob").await;

    let (dapp, _wallet) = page_for(&devnet, contract, "alice");
    dapp.mount().await.expect("mount");
    assert_eq!(dapp.view().await, View::JoinWhitelist);

    let err = dapp.click().await.unwrap_err();
    assert!(matches!(err, Error::Reverted { ref reason, .. } if reason == revert::LIMIT_REACHED));

    let state = dapp.state().await;
    assert!(!state.user_whitelisted);
    assert_eq!(state.whitelist_count, 1);
    assert_eq!(state.seats_left(), Some(0));

    dapp.dismiss_error().await;
    assert_eq!(dapp.view().await, View::JoinWhitelist);
}

/// Test: the view shows Loading until the transaction is mined
#[tokio::test]
async fn loading_until_mined() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    let (dapp, _wallet) = page_for(&devnet, contract, "alice");
    let dapp = Arc::new(dapp);
    dapp.mount().await.expect("mount");

    devnet.set_auto_mine(false);
    let joining = {
        let dapp = dapp.clone();
        tokio::spawn(async move { dapp.add_to_whitelist().await })
    };

    let mut waited = 0;
    while !dapp.state().await.loading {
        tokio::time::sleep(Duration::from_millis(1)).await;
        waited += 1;
        assert!(waited < 5_000, "transaction never submitted");
    }
    assert_eq!(dapp.view().await, View::Loading);
    assert!(dapp.state().await.pending_tx.is_some());
    // Clicking while loading does nothing
    assert_eq!(dapp.click().await.expect("no-op"), View::Loading);

    devnet.mine().await.expect("mine");
    let receipt = joining.await.expect("task").expect("join");
    assert!(receipt.status);

    let state = dapp.state().await;
    assert!(!state.loading);
    assert!(state.user_whitelisted);
    assert_eq!(state.whitelist_count, 1);
}

/// Test: a confirmation timeout leaves the page in the error view, not Loading
#[tokio::test]
async fn confirmation_timeout_surfaces_error() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    let wallet = Arc::new(DevnetWallet::labelled(devnet.clone(), "alice"));
    let config = DappConfig::new()
        .with_contract(contract)
        .with_poll_interval(POLL)
        .with_confirmation_timeout(Duration::from_millis(20));
    let dapp = Dapp::new(config, wallet).expect("dapp");
    dapp.mount().await.expect("mount");

    devnet.set_auto_mine(false);
    let err = dapp.add_to_whitelist().await.unwrap_err();
    assert!(matches!(err, Error::ConfirmationTimeout(_)));
    let state = dapp.state().await;
    assert!(!state.loading);
    assert!(!state.user_whitelisted);
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Join, .. }));
}

/// Test: a rejected connect prompt can be retried from the error view
#[tokio::test]
async fn rejected_wallet_then_retry() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    let (dapp, wallet) = page_for(&devnet, contract, "alice");

    wallet.set_rejecting(true);
    assert!(matches!(dapp.mount().await, Err(Error::WalletRejected)));
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Connect, .. }));

    wallet.set_rejecting(false);
    assert_eq!(dapp.click().await.expect("retry"), View::JoinWhitelist);
    assert_eq!(dapp.state().await.error, None);
}

/// Test: a member sees the thank-you view straight after connecting
#[tokio::test]
async fn existing_member_sees_thanks() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    join_as(&devnet, contract, "alice").await;

    let (dapp, _wallet) = page_for(&devnet, contract, "alice");
    dapp.mount().await.expect("mount");
    assert_eq!(dapp.view().await, View::Whitelisted);
    assert!(dapp.check_if_whitelisted().await.expect("check"));
    assert_eq!(dapp.update_whitelisted_count().await.expect("count"), 1);
}

/// Test: without a contract address the page reports a config error
#[tokio::test]
async fn missing_contract_address_is_an_error() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let wallet = Arc::new(DevnetWallet::labelled(devnet, "alice"));
    let dapp = Dapp::new(DappConfig::new(), wallet).expect("dapp");

    assert!(matches!(dapp.connect_wallet().await, Err(Error::Config(_))));
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Connect, .. }));
}

/// Test: losing the wallet mid-session drops back to the connect step
#[tokio::test]
async fn wallet_loss_during_join_disconnects() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    let (dapp, wallet) = page_for(&devnet, contract, "alice");
    dapp.mount().await.expect("mount");

    wallet.set_rejecting(true);
    assert!(matches!(dapp.click().await, Err(Error::WalletRejected)));
    let state = dapp.state().await;
    assert!(!state.wallet_connected);
    assert!(!state.user_whitelisted);
    assert_eq!(state.whitelist_count, 0);
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Connect, .. }));

    wallet.set_rejecting(false);
    assert_eq!(dapp.click().await.expect("reconnect"), View::JoinWhitelist);
}

/// Test: a join that reverts because the account is already a member lands on the thank-you view
#[tokio::test]
async fn stale_join_rechecks_membership() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    let (dapp, _wallet) = page_for(&devnet, contract, "alice");
    dapp.mount().await.expect("mount");
    assert_eq!(dapp.view().await, View::JoinWhitelist);

    // Alice joins from another tab; this page still shows the join button.
    join_as(&devnet, contract, "alice").await;

    let err = dapp.click().await.unwrap_err();
    assert!(matches!(err, Error::Reverted { ref reason, .. } if reason == revert::ALREADY_WHITELISTED));
    let state = dapp.state().await;
    assert!(state.user_whitelisted);
    assert_eq!(state.whitelist_count, 1);
    assert!(matches!(dapp.view().await, View::Error { retry: Action::Join, .. }));

    // Clicking the error does not send another doomed join.
    assert_eq!(dapp.click().await.expect("dismiss"), View::Whitelisted);
    assert_eq!(devnet.block_number().await.expect("block"), 3);
}

/// Test: checking membership on a fresh page connects the session
#[tokio::test]
async fn membership_check_connects_the_session() {
    let devnet = Arc::new(Devnet::in_memory(4));
    let contract = deploy(&devnet, 15).await;
    join_as(&devnet, contract, "alice").await;

    let (dapp, _wallet) = page_for(&devnet, contract, "alice");
    assert!(dapp.check_if_whitelisted().await.expect("check"));
    let state = dapp.state().await;
    assert!(state.wallet_connected);
    assert!(state.user_whitelisted);
    assert_eq!(state.account, Some(Devnet::account("alice")));
    assert_eq!(dapp.view().await, View::Whitelisted);
}

/// Test: a long-lived session and a second invocation share one ledger file
#[tokio::test]
async fn sessions_on_one_ledger_file_share_the_chain() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("devnet.json");
    let repl_chain = Arc::new(Devnet::create(&path, 4).expect("create"));
    let contract = deploy(&repl_chain, 15).await;

    let (repl, _wallet) = page_for(&repl_chain, contract, "alice");
    repl.mount().await.expect("mount");
    assert_eq!(repl.state().await.whitelist_count, 0);

    // Separate invocation: bob joins through his own handle on the same file.
    let bob_chain = Arc::new(Devnet::open(&path).expect("open"));
    let (bob, _wallet) = page_for(&bob_chain, contract, "bob");
    bob.mount().await.expect("mount");
    assert_eq!(bob.click().await.expect("join"), View::Whitelisted);

    // The long-lived session sees bob's block, then joins without erasing it.
    assert_eq!(repl.update_whitelisted_count().await.expect("count"), 1);
    assert_eq!(repl.click().await.expect("join"), View::Whitelisted);
    assert_eq!(repl.state().await.whitelist_count, 2);

    let reopened = Arc::new(Devnet::open(&path).expect("reopen"));
    let (check, _wallet) = page_for(&reopened, contract, "bob");
    assert!(check.check_if_whitelisted().await.expect("bob"));
    assert_eq!(check.update_whitelisted_count().await.expect("count"), 2);
}
