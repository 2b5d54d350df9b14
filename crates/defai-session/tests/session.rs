//! Session lifecycle against an in-process fake backend

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use defai_sdk::ApiClient;
use defai_session::*;
use defai_types::{Chain, WalletCredentials, WalletId};
use defai_wallet::{KeystoreWallet, ProviderRegistry, WalletProvider, WalletResult};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// ============================================================================
// Fakes
// ============================================================================

#[derive(Clone, Default)]
struct Backend {
    reject: Arc<AtomicBool>,
    verify_calls: Arc<AtomicUsize>,
    agent_auth: Arc<Mutex<Vec<Option<String>>>>,
}

async fn auth_wallet(
    State(b): State<Backend>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if b.reject.load(Ordering::SeqCst) {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid signature"}))));
    }
    Ok(Json(json!({
        "token": "t1",
        "user": {"id": "u1", "wallet_address": body["address"], "chain": body["chain"]}
    })))
}

async fn verify(State(b): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    b.verify_calls.fetch_add(1, Ordering::SeqCst);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer t1") => Ok(Json(json!({"user": {"id": "u1"}}))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn agents(State(b): State<Backend>, headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    b.agent_auth.lock().push(auth);
    Json(json!([]))
}

async fn spawn_backend() -> (ApiClient, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/auth/wallet", post(auth_wallet))
        .route("/auth/verify", get(verify))
        .route("/agents/", get(agents))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (ApiClient::connect(&format!("http://{addr}")).unwrap(), backend)
}

struct FixedBalance(f64);

#[async_trait]
impl BalanceSource for FixedBalance {
    async fn balance(&self, _address: &str) -> SessionResult<f64> {
        Ok(self.0)
    }
}

/// Blocks every query until a permit is added
struct GatedBalance {
    permits: Semaphore,
    calls: AtomicUsize,
}

#[async_trait]
impl BalanceSource for GatedBalance {
    async fn balance(&self, _address: &str) -> SessionResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SessionError::Balance(e.to_string()))?;
        permit.forget();
        Ok(9.0)
    }
}

struct BrokenStorage;

impl SessionStorage for BrokenStorage {
    fn get(&self, _key: &str) -> SessionResult<Option<StoredEntry>> {
        Ok(None)
    }
    fn set_many(&self, _entries: &[(&str, String)], _ttl: Duration) -> SessionResult<()> {
        Err(SessionError::Storage("disk full".into()))
    }
    fn remove_many(&self, _keys: &[&str]) -> SessionResult<()> {
        Ok(())
    }
}

/// Keystore wallet that counts provider-side disconnects
struct CountingWallet {
    inner: KeystoreWallet,
    disconnects: AtomicUsize,
}

#[async_trait]
impl WalletProvider for CountingWallet {
    fn id(&self) -> WalletId {
        self.inner.id()
    }

    fn supports(&self, chain: Chain) -> bool {
        self.inner.supports(chain)
    }

    async fn connect(&self, chain: Chain) -> WalletResult<String> {
        self.inner.connect(chain).await
    }

    async fn sign_message(&self, chain: Chain, message: &str) -> WalletResult<String> {
        self.inner.sign_message(chain, message).await
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn registry() -> Arc<ProviderRegistry> {
    let phantom = KeystoreWallet::from_seed(WalletId::Phantom, &[1u8; 32]).unwrap();
    let metamask = KeystoreWallet::from_seed(WalletId::MetaMask, &[2u8; 32]).unwrap();
    Arc::new(
        ProviderRegistry::new()
            .with(Arc::new(phantom))
            .with(Arc::new(metamask)),
    )
}

fn fixed(balance: f64) -> ChainBalances {
    ChainBalances::new(Arc::new(FixedBalance(balance)), Arc::new(FixedBalance(balance)))
}

fn context(api: ApiClient, storage: Arc<dyn SessionStorage>, balances: ChainBalances) -> SessionContext {
    SessionContext::builder(api, registry())
        .storage(storage)
        .balances(balances)
        .build()
}

fn credentials() -> WalletCredentials {
    WalletCredentials {
        wallet: WalletId::Phantom,
        chain: Chain::Solana,
        address: "So1anaAddr".into(),
        signature: "sig".into(),
        message: "msg".into(),
    }
}

fn persist(storage: &MemoryStorage, token: &str, ttl: Duration) {
    PersistedSession::save(storage, token, "So1anaAddr", Chain::Solana, WalletId::Phantom, ttl).unwrap();
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn connect_authenticates_and_later_calls_carry_bearer() {
    let (api, backend) = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(api.clone(), storage.clone(), fixed(1.5));

    let outcome = ctx.connect(WalletId::Phantom).await.unwrap();
    let ConnectOutcome::Authenticated(session) = outcome else {
        panic!("expected an authenticated session");
    };
    assert!(session.is_authenticated());
    assert_eq!(session.chain, Some(Chain::Solana));
    assert_eq!(session.wallet_type, Some(WalletId::Phantom));
    assert_eq!(session.user.and_then(|u| u.id).as_deref(), Some("u1"));

    api.list_agents().await.unwrap();
    assert_eq!(backend.agent_auth.lock().clone(), vec![Some("Bearer t1".to_string())]);

    let persisted = PersistedSession::load(storage.as_ref()).unwrap().unwrap();
    assert_eq!(persisted.token, "t1");
    assert_eq!(persisted.wallet_type, Some(WalletId::Phantom));
    assert_eq!(storage.len(), 4);

    wait_for(|| ctx.snapshot().balance == 1.5).await;
    assert!(ctx.is_refreshing());
}

#[tokio::test]
async fn ethereum_preference_connects_metamask() {
    let (api, _) = spawn_backend().await;
    let ctx = context(api, Arc::new(MemoryStorage::new()), fixed(0.0));
    ctx.set_preferred_chain(Chain::Ethereum);

    let outcome = ctx.connect(WalletId::MetaMask).await.unwrap();
    let ConnectOutcome::Authenticated(session) = outcome else {
        panic!("expected an authenticated session");
    };
    assert!(session.address.unwrap().starts_with("0x"));
    assert_eq!(session.chain, Some(Chain::Ethereum));
}

#[tokio::test]
async fn missing_wallet_requires_install() {
    let (api, _) = spawn_backend().await;
    let ctx = context(api, Arc::new(MemoryStorage::new()), fixed(0.0));

    let outcome = ctx.connect(WalletId::Solflare).await.unwrap();
    assert_eq!(
        outcome,
        ConnectOutcome::InstallRequired {
            wallet: WalletId::Solflare,
            url: "https://solflare.com/".into()
        }
    );
    assert!(!ctx.is_authenticated());
}

#[tokio::test]
async fn rejected_credentials_persist_nothing() {
    let (api, backend) = spawn_backend().await;
    backend.reject.store(true, Ordering::SeqCst);
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(api.clone(), storage.clone(), fixed(1.0));

    assert!(!ctx.authenticate(credentials()).await.unwrap());
    assert!(storage.is_empty());
    assert!(!ctx.is_authenticated());
    assert!(!api.has_token());
    assert_eq!(ctx.snapshot(), Session::default());

    let outcome = ctx.connect(WalletId::Phantom).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Rejected);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn storage_failure_leaves_session_unauthenticated() {
    let (api, _) = spawn_backend().await;
    let ctx = context(api.clone(), Arc::new(BrokenStorage), fixed(1.0));

    let err = ctx.authenticate(credentials()).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert!(!ctx.is_authenticated());
    assert!(!api.has_token());
    assert!(!ctx.is_refreshing());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let api = ApiClient::connect("http://127.0.0.1:9").unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(api, storage.clone(), fixed(1.0));

    let err = ctx.authenticate(credentials()).await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
    assert!(storage.is_empty());
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let (api, _) = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(api.clone(), storage.clone(), fixed(1.0));

    assert!(ctx.authenticate(credentials()).await.unwrap());
    ctx.disconnect().await.unwrap();
    let first = ctx.snapshot();
    ctx.disconnect().await.unwrap();

    assert_eq!(first, ctx.snapshot());
    assert_eq!(first, Session::default());
    assert!(storage.is_empty());
    assert!(!api.has_token());
    assert!(!ctx.is_refreshing());
}

#[tokio::test]
async fn restore_with_valid_token() {
    let (api, backend) = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    persist(&storage, "t1", WEEK);
    let ctx = context(api.clone(), storage.clone(), fixed(3.0));

    assert!(ctx.restore().await.unwrap());
    assert_eq!(backend.verify_calls.load(Ordering::SeqCst), 1);

    let session = ctx.snapshot();
    assert!(session.is_authenticated());
    assert_eq!(session.address.as_deref(), Some("So1anaAddr"));
    assert_eq!(session.user.and_then(|u| u.id).as_deref(), Some("u1"));
    assert_eq!(api.token().as_deref(), Some("t1"));
    wait_for(|| ctx.snapshot().balance == 3.0).await;
}

#[tokio::test]
async fn failed_verification_clears_before_restore_returns() {
    let (api, _) = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    persist(&storage, "stale", WEEK);
    let ctx = context(api.clone(), storage.clone(), fixed(1.0));

    assert!(!ctx.restore().await.unwrap());
    assert_eq!(ctx.snapshot(), Session::default());
    assert!(storage.is_empty());
    assert!(!api.has_token());
}

#[tokio::test]
async fn expired_entries_are_not_restored() {
    let (api, backend) = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    persist(&storage, "t1", Duration::ZERO);
    let ctx = context(api.clone(), storage, fixed(1.0));

    assert!(!ctx.restore().await.unwrap());
    assert_eq!(backend.verify_calls.load(Ordering::SeqCst), 0);
    assert!(!ctx.is_authenticated());
    assert!(!api.has_token());
}

#[tokio::test]
async fn session_survives_restart_with_file_storage() {
    let (api, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = context(api.clone(), Arc::new(FileStorage::new(&path)), fixed(1.0));
    assert!(first.authenticate(credentials()).await.unwrap());
    drop(first);
    api.clear_token();

    let second = context(api.clone(), Arc::new(FileStorage::new(&path)), fixed(1.0));
    assert!(second.restore().await.unwrap());
    assert_eq!(second.snapshot().wallet_type, Some(WalletId::Phantom));
}

#[tokio::test]
async fn stale_balance_is_discarded_after_disconnect() {
    let (api, _) = spawn_backend().await;
    let gated = Arc::new(GatedBalance { permits: Semaphore::new(0), calls: AtomicUsize::new(0) });
    let balances = ChainBalances::new(gated.clone(), gated.clone());
    let ctx = context(api, Arc::new(MemoryStorage::new()), balances);

    assert!(ctx.authenticate(credentials()).await.unwrap());
    // the refresher's first tick is already waiting on the gate
    wait_for(|| gated.calls.load(Ordering::SeqCst) >= 1).await;

    let pending = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.refresh_balance().await })
    };
    wait_for(|| gated.calls.load(Ordering::SeqCst) >= 2).await;

    ctx.disconnect().await.unwrap();
    gated.permits.add_permits(2);

    assert_eq!(pending.await.unwrap().unwrap(), None);
    assert_eq!(ctx.snapshot().balance, 0.0);
}

#[tokio::test]
async fn refresh_without_connection_is_noop() {
    let (api, _) = spawn_backend().await;
    let ctx = context(api, Arc::new(MemoryStorage::new()), fixed(1.0));
    assert_eq!(ctx.refresh_balance().await.unwrap(), None);
}

#[tokio::test]
async fn disconnect_tells_the_session_wallet_once() {
    let (api, _) = spawn_backend().await;
    let phantom = Arc::new(CountingWallet {
        inner: KeystoreWallet::from_seed(WalletId::Phantom, &[1u8; 32]).unwrap(),
        disconnects: AtomicUsize::new(0),
    });
    let registry = Arc::new(ProviderRegistry::new().with(phantom.clone()));
    let ctx = SessionContext::builder(api, registry)
        .storage(Arc::new(MemoryStorage::new()))
        .balances(fixed(1.0))
        .build();

    let outcome = ctx.connect(WalletId::Phantom).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::Authenticated(_)));
    assert_eq!(phantom.disconnects.load(Ordering::SeqCst), 0);

    ctx.disconnect().await.unwrap();
    assert_eq!(phantom.disconnects.load(Ordering::SeqCst), 1);

    ctx.disconnect().await.unwrap();
    assert_eq!(phantom.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn corrupt_session_file_does_not_lock_the_user_out() {
    let (api, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    let ctx = context(api.clone(), Arc::new(FileStorage::new(&path)), fixed(1.0));

    assert!(!ctx.restore().await.unwrap());
    ctx.disconnect().await.unwrap();
    assert!(!path.exists());

    std::fs::write(&path, "{not json").unwrap();
    assert!(ctx.authenticate(credentials()).await.unwrap());

    let reopened = context(api, Arc::new(FileStorage::new(&path)), fixed(1.0));
    assert!(reopened.restore().await.unwrap());
    assert_eq!(reopened.snapshot().address.as_deref(), Some("So1anaAddr"));
}

#[tokio::test]
async fn without_background_refresh_balance_is_fetched_on_demand() {
    let (api, _) = spawn_backend().await;
    let gated = Arc::new(GatedBalance { permits: Semaphore::new(0), calls: AtomicUsize::new(0) });
    let ctx = SessionContext::builder(api, registry())
        .storage(Arc::new(MemoryStorage::new()))
        .balances(ChainBalances::new(gated.clone(), gated.clone()))
        .background_refresh(false)
        .build();

    assert!(ctx.authenticate(credentials()).await.unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ctx.is_refreshing());
    assert_eq!(gated.calls.load(Ordering::SeqCst), 0);

    gated.permits.add_permits(1);
    assert_eq!(ctx.refresh_balance().await.unwrap(), Some(9.0));
    assert_eq!(ctx.snapshot().balance, 9.0);
}

#[tokio::test]
async fn zero_balance_interval_still_refreshes() {
    let (api, _) = spawn_backend().await;
    let config = SessionConfig { balance_interval: Duration::ZERO, ..Default::default() };
    let ctx = SessionContext::builder(api, registry())
        .config(config)
        .storage(Arc::new(MemoryStorage::new()))
        .balances(fixed(2.5))
        .build();

    assert!(ctx.authenticate(credentials()).await.unwrap());
    wait_for(|| ctx.snapshot().balance == 2.5).await;
    assert!(ctx.is_refreshing());
}
