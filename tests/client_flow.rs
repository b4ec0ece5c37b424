//! Node, proxy and name-service interaction against a local mock.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aptos_name_minter::blockchain::{
    AccountClient, AccountResource, BlockchainError, Coin, CoinAmount, ConfirmationStatus, SigningIdentity,
    TransactionSubmitter, TxHash,
};
use aptos_name_minter::config::{FromTo, MinterConfig, NamesConfig};
use aptos_name_minter::minter::Runner;
use aptos_name_minter::names::{DomainRecord, NameLookup, NameResolver};
use aptos_name_minter::proxy::ProxyPool;

use common::*;

const SUBMITTED_HASH: &str = "0xfeedbeef";

/// Scripted behavior of the mock node and name API.
#[derive(Default)]
struct NodeState {
    activated: bool,
    coin_registered: AtomicBool,
    balance: u64,
    coin_info: Option<String>,
    pending_polls: usize,
    failed_with: Option<String>,
    reject_submit: Option<String>,
    names: HashMap<String, String>,
    polls: AtomicUsize,
    submissions: Mutex<Vec<MockRequest>>,
}

impl NodeState {
    fn healthy() -> Self {
        Self {
            activated: true,
            coin_registered: AtomicBool::new(true),
            balance: 150_000_000,
            ..Self::default()
        }
    }

    fn route(&self, req: MockRequest) -> (u16, String) {
        let path = req.path.clone();

        if let Some((_, address)) = path.split_once("/primary-name/") {
            return match self.names.get(address) {
                Some(name) => (200, format!(r#"{{"name":"{}"}}"#, name)),
                None => (404, r#"{"message":"not found"}"#.into()),
            };
        }
        if path.contains("CoinInfo") {
            return (200, self.coin_info.clone().unwrap_or_else(|| coin_info_body(8)));
        }
        if path.contains("CoinStore") {
            return if self.coin_registered.load(Ordering::SeqCst) {
                (200, coin_store_body(self.balance))
            } else {
                (404, r#"{"message":"Resource not found","error_code":"resource_not_found"}"#.into())
            };
        }
        if path.ends_with("/estimate_gas_price") {
            return (200, r#"{"gas_estimate":100}"#.into());
        }
        if path.contains("/transactions/by_hash/") {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.pending_polls {
                return (200, pending_body(SUBMITTED_HASH));
            }
            return match &self.failed_with {
                Some(status) => (
                    200,
                    format!(
                        r#"{{"type":"user_transaction","hash":"{}","success":false,"vm_status":"{}"}}"#,
                        SUBMITTED_HASH, status
                    ),
                ),
                None => (200, success_body(SUBMITTED_HASH, 42)),
            };
        }
        if path.ends_with("/transactions") && req.method == "POST" {
            self.submissions.lock().unwrap().push(req);
            if let Some(body) = &self.reject_submit {
                return (400, body.clone());
            }
            self.coin_registered.store(true, Ordering::SeqCst);
            return (202, format!(r#"{{"hash":"{}"}}"#, SUBMITTED_HASH));
        }
        if path.contains("/accounts/") {
            return if self.activated {
                (200, r#"{"sequence_number":"7","authentication_key":"0x0"}"#.into())
            } else {
                (
                    404,
                    r#"{"message":"Account not found","error_code":"account_not_found"}"#.into(),
                )
            };
        }
        (404, "{}".into())
    }

    fn submissions(&self) -> Vec<MockRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

async fn start_node(state: NodeState) -> (std::net::SocketAddr, Arc<NodeState>) {
    let state = Arc::new(state);
    let handler_state = state.clone();
    let addr = start_programmable_backend(move |req| handler_state.route(req)).await;
    (addr, state)
}

// --- Proxy probe -----------------------------------------------------------

#[tokio::test]
async fn test_proxy_check_rotates_to_working_proxy() {
    let (addr, _) = start_node(NodeState::healthy()).await;
    let live = proxy_at(addr);
    let first_dead = dead_proxy();
    let pool = ProxyPool::new(vec![first_dead.clone(), dead_proxy(), live.clone()]);

    // Host only reachable through the mock acting as proxy.
    let mut config = node_config(addr);
    config.url = "http://aptos-node.test/v1".into();

    let client = AccountClient::connect(identity(), Some(first_dead), &pool, gateway(), &config, true)
        .await
        .unwrap();
    assert_eq!(client.proxy(), Some(&live));
}

#[tokio::test]
async fn test_proxy_check_fails_when_every_proxy_is_dead() {
    let first = dead_proxy();
    let pool = ProxyPool::new(vec![first.clone(), dead_proxy()]);
    let config = node_config("127.0.0.1:9".parse().unwrap());

    let err = AccountClient::connect(identity(), Some(first), &pool, gateway(), &config, true)
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::NoWorkingProxy { attempts: 2 }));
}

#[tokio::test]
async fn test_proxy_check_skipped_when_disabled() {
    let dead = dead_proxy();
    let pool = ProxyPool::new(vec![dead.clone()]);
    let config = node_config("127.0.0.1:9".parse().unwrap());

    let client = AccountClient::connect(identity(), Some(dead.clone()), &pool, gateway(), &config, false)
        .await
        .unwrap();
    assert_eq!(client.proxy(), Some(&dead));
}

#[tokio::test]
async fn test_proxy_credentials_sent_as_basic_auth() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let addr = start_programmable_backend(move |req| {
        recorder
            .lock()
            .unwrap()
            .push(req.header("proxy-authorization").map(str::to_string));
        (200, r#"{"chain_id":1}"#.to_string())
    })
    .await;

    let proxy = proxy_at(addr).with_credentials("user", "p/ss#w?rd");
    let response = gateway()
        .get("http://aptos-node.test/v1", Some(&proxy))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[Some("Basic dXNlcjpwL3NzI3c/cmQ=".to_string())]
    );
}

// --- Confirmation polling --------------------------------------------------

#[tokio::test]
async fn test_confirmation_after_pending_polls() {
    let (addr, state) = start_node(NodeState {
        pending_polls: 3,
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let status = TransactionSubmitter::new(&account)
        .wait_for_transaction(&TxHash(SUBMITTED_HASH.into()))
        .await
        .unwrap();

    match status {
        ConfirmationStatus::Confirmed(receipt) => {
            assert_eq!(receipt.polls, 4);
            assert_eq!(receipt.version, Some(42));
            assert_eq!(receipt.hash, TxHash(SUBMITTED_HASH.into()));
        }
        other => panic!("expected confirmation, got {:?}", other),
    }
    assert_eq!(state.polls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_confirmation_times_out_within_budget() {
    let (addr, state) = start_node(NodeState {
        pending_polls: usize::MAX,
        ..NodeState::healthy()
    })
    .await;
    let mut config = node_config(addr);
    config.max_poll_attempts = 3;
    let account = direct_account(&config);

    let status = TransactionSubmitter::new(&account)
        .wait_for_transaction(&TxHash(SUBMITTED_HASH.into()))
        .await
        .unwrap();

    assert!(matches!(status, ConfirmationStatus::TimedOut { attempts: 3, .. }));
    assert_eq!(state.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_transaction_reports_vm_status() {
    let (addr, _) = start_node(NodeState {
        failed_with: Some("Move abort: EINSUFFICIENT_BALANCE".into()),
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let status = TransactionSubmitter::new(&account)
        .wait_for_transaction(&TxHash(SUBMITTED_HASH.into()))
        .await
        .unwrap();

    match status {
        ConfirmationStatus::Failed { reason, .. } => assert!(reason.contains("EINSUFFICIENT_BALANCE")),
        other => panic!("expected failure, got {:?}", other),
    }
}

// --- Submission ------------------------------------------------------------

#[tokio::test]
async fn test_register_domain_end_to_end() {
    let (addr, state) = start_node(NodeState {
        pending_polls: 1,
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let receipt = TransactionSubmitter::new(&account)
        .register_domain(&NamesConfig::default(), "satoshi42")
        .await
        .unwrap();
    assert_eq!(receipt.hash, TxHash(SUBMITTED_HASH.into()));
    assert_eq!(receipt.polls, 2);

    let submissions = state.submissions();
    assert_eq!(submissions.len(), 1);
    let submitted = &submissions[0];
    assert_eq!(
        submitted.header("content-type"),
        Some("application/x.aptos.signed_transaction+bcs")
    );
    // BCS raw transaction: sender address, then the sequence number.
    assert_eq!(&submitted.body[..32], account.address().as_bytes());
    assert_eq!(&submitted.body[32..40], &7u64.to_le_bytes());
}

#[tokio::test]
async fn test_unfunded_account_is_not_activated() {
    let (addr, state) = start_node(NodeState {
        activated: false,
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let err = TransactionSubmitter::new(&account)
        .register_domain(&NamesConfig::default(), "satoshi42")
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::AccountNotActivated(_)));
    assert!(state.submissions().is_empty());
}

#[tokio::test]
async fn test_submission_rejected_for_missing_account() {
    let (addr, _) = start_node(NodeState {
        reject_submit: Some(
            r#"{"message":"Account not found by Address","error_code":"account_not_found","vm_error_code":null}"#
                .into(),
        ),
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let err = TransactionSubmitter::new(&account)
        .register_domain(&NamesConfig::default(), "satoshi42")
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::AccountNotActivated(_)));
}

// --- Balances --------------------------------------------------------------

async fn decimals_for(coin_info: &str) -> u8 {
    let (addr, _) = start_node(NodeState {
        coin_info: Some(coin_info.to_string()),
        ..NodeState::healthy()
    })
    .await;
    direct_account(&node_config(addr)).get_decimals(&Coin::aptos()).await
}

#[tokio::test]
async fn test_decimals_read_from_coin_info() {
    assert_eq!(decimals_for(&coin_info_body(8)).await, 8);
    assert_eq!(decimals_for(r#"{"type":"x","data":{"decimals":"6"}}"#).await, 6);
}

#[tokio::test]
async fn test_malformed_decimals_read_as_zero() {
    assert_eq!(decimals_for(r#"{"type":"x","data":{"decimals":"abc"}}"#).await, 0);
    assert_eq!(decimals_for(r#"{"type":"x","data":{"name":"Aptos Coin"}}"#).await, 0);
    assert_eq!(decimals_for(r#"{"type":"x","data":{"decimals":300}}"#).await, 0);
    assert_eq!(decimals_for("not json").await, 0);
}

#[tokio::test]
async fn test_balance_of_registered_coin() {
    let (addr, state) = start_node(NodeState::healthy()).await;
    let account = direct_account(&node_config(addr));

    let balance = account.get_balance(None).await;
    assert_eq!(balance, CoinAmount::from_units(150_000_000, 8));
    assert_eq!(balance.to_string(), "1.5");
    assert!(state.submissions().is_empty());
}

#[tokio::test]
async fn test_unregistered_coin_is_registered_then_zero() {
    let (addr, state) = start_node(NodeState {
        coin_registered: AtomicBool::new(false),
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let balance = account.get_balance(Some(&Coin::aptos())).await;
    assert_eq!(balance, CoinAmount::from_units(0, 8));
    assert_eq!(state.submissions().len(), 1);
}

#[tokio::test]
async fn test_already_registered_coin_counts_as_registered() {
    let (addr, state) = start_node(NodeState {
        coin_registered: AtomicBool::new(false),
        reject_submit: Some(
            r#"{"message":"Move abort in 0x1::coin: ECOIN_STORE_ALREADY_PUBLISHED(0x80004)","error_code":"vm_error"}"#
                .into(),
        ),
        ..NodeState::healthy()
    })
    .await;
    let account = direct_account(&node_config(addr));

    let resource = account.get_coin_resource(&Coin::aptos()).await.unwrap();
    assert_eq!(resource, AccountResource::empty());
    assert_eq!(state.submissions().len(), 1);
}

// --- Name lookup -----------------------------------------------------------

#[tokio::test]
async fn test_primary_name_absent_and_registered() {
    let owner = identity().address();
    let mut names = HashMap::new();
    names.insert(owner.to_string(), "alice".to_string());
    let (addr, _) = start_node(NodeState {
        names,
        ..NodeState::healthy()
    })
    .await;

    let resolver = NameResolver::new(gateway(), format!("http://{}/v1", addr));
    let mut pool = ProxyPool::default();

    let found = resolver.lookup_primary_name(&owner, &mut None, &mut pool).await.unwrap();
    assert_eq!(
        found,
        NameLookup::Registered(DomainRecord {
            address: owner,
            name: "alice".into(),
        })
    );

    let stranger = SigningIdentity::from_private_key(OTHER_KEY).unwrap().address();
    let absent = resolver.lookup_primary_name(&stranger, &mut None, &mut pool).await.unwrap();
    assert_eq!(absent, NameLookup::Absent);
}

#[tokio::test]
async fn test_primary_name_fails_over_to_live_proxy() {
    let owner = identity().address();
    let mut names = HashMap::new();
    names.insert(owner.to_string(), "alice".to_string());
    let (addr, _) = start_node(NodeState {
        names,
        ..NodeState::healthy()
    })
    .await;

    let dead = dead_proxy();
    let live = proxy_at(addr);
    let mut pool = ProxyPool::new(vec![dead.clone(), live.clone()]);
    let resolver = NameResolver::new(gateway(), "http://names.test/v1");
    let mut current = Some(dead.clone());

    let lookup = resolver
        .lookup_primary_name(&owner, &mut current, &mut pool)
        .await
        .unwrap();
    assert!(matches!(lookup, NameLookup::Registered(record) if record.name == "alice"));
    assert_eq!(current, Some(live));
    assert_eq!(pool.select(None), current);
}

#[tokio::test]
async fn test_account_keeps_failover_proxy_after_name_lookup() {
    let (addr, _) = start_node(NodeState::healthy()).await;
    let dead = dead_proxy();
    let live = proxy_at(addr);
    let pool = ProxyPool::new(vec![dead.clone(), live.clone()]);
    let mut config = node_config(addr);
    config.url = "http://aptos-node.test/v1".into();

    let mut account = AccountClient::connect(identity(), Some(dead.clone()), &pool, gateway(), &config, false)
        .await
        .unwrap();
    assert_eq!(account.proxy(), Some(&dead));

    let resolver = NameResolver::new(gateway(), "http://names.test/v1");
    let lookup = account.lookup_primary_name(&resolver).await.unwrap();
    assert_eq!(lookup, NameLookup::Absent);
    assert_eq!(account.proxy(), Some(&live));

    // Follow-up node calls go through the proxy that answered.
    assert_eq!(account.sequence_number().await.unwrap(), 7);
}

// --- Runner ----------------------------------------------------------------

#[tokio::test]
async fn test_runner_mints_only_for_unnamed_wallets() {
    let named = identity().address();
    let mut names = HashMap::new();
    names.insert(named.to_string(), "alice".to_string());
    let (addr, state) = start_node(NodeState {
        names,
        ..NodeState::healthy()
    })
    .await;

    let mut config = MinterConfig::default();
    config.node = node_config(addr);
    config.node.url = "http://aptos-node.test/v1".into();
    config.names.api_url = "http://names.test/v1".into();
    config.settings.sleep_time = FromTo { from: 0, to: 0 };

    let runner = Runner::new(&config, vec![proxy_at(addr)]).unwrap();
    let summary = runner
        .run(vec![TEST_KEY.to_string(), OTHER_KEY.to_string()])
        .await;

    assert_eq!(summary.minted, 1);
    assert_eq!(summary.already_named, 1);
    assert_eq!(summary.abandoned, 0);

    let minter = SigningIdentity::from_private_key(OTHER_KEY).unwrap().address();
    let submissions = state.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(&submissions[0].body[..32], minter.as_bytes());
}

#[tokio::test]
async fn test_runner_abandons_wallet_after_repeated_failures() {
    let mut config = MinterConfig::default();
    config.node = node_config("127.0.0.1:9".parse().unwrap());
    config.settings.max_wallet_attempts = 2;
    config.settings.sleep_time = FromTo { from: 0, to: 0 };

    let runner = Runner::new(&config, vec![dead_proxy()]).unwrap();
    let summary = runner.run(vec![TEST_KEY.to_string()]).await;

    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.minted, 0);
}
