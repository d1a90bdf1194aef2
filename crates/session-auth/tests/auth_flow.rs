//! End-to-end authentication flows through the gate

use async_trait::async_trait;
use serde_json::json;
use session_auth::clock::ManualClock;
use session_auth::password::PlaintextHasher;
use session_auth::session::OsRngGenerator;
use session_auth::{
    AuthConfig, AuthError, AuthenticationGate, DirectoryError, Identity, IdentityId,
    MemoryUserDirectory, PasswordHasher, SessionConfig, SessionId, UserDirectory,
    GENERIC_LOGIN_FAILURE,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// Directory that can be taken offline
struct SwitchableDirectory {
    inner: MemoryUserDirectory,
    offline: AtomicBool,
}

impl SwitchableDirectory {
    fn new() -> Self {
        let inner = MemoryUserDirectory::new();
        inner.insert(Identity::new("u1", "jon", "s3cret"));
        Self {
            inner,
            offline: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DirectoryError::new("directory offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserDirectory for SwitchableDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, DirectoryError> {
        self.check()?;
        self.inner.find_by_username(username).await
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, DirectoryError> {
        self.check()?;
        self.inner.find_by_id(id).await
    }
}

fn plaintext_gate<D: UserDirectory>(
    directory: Arc<D>,
    config: SessionConfig,
) -> (AuthenticationGate<D>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let gate = AuthenticationGate::with_parts(
        directory,
        config,
        Arc::new(PlaintextHasher),
        Arc::new(OsRngGenerator),
        clock.clone(),
    )
    .unwrap();
    (gate, clock)
}

fn jon_directory() -> Arc<MemoryUserDirectory> {
    let directory = Arc::new(MemoryUserDirectory::new());
    directory.insert(Identity::new("u1", "jon", "s3cret"));
    directory
}

#[tokio::test]
async fn login_authenticate_logout_scenario() {
    let (gate, _) = plaintext_gate(jon_directory(), SessionConfig::default());

    let session_id = assert_ok!(gate.login("jon", "s3cret").await);
    let identity = gate.authenticate(&session_id).await.unwrap();
    assert_eq!(identity.id, IdentityId::new("u1"));
    assert_eq!(identity.username, "jon");

    gate.logout(&session_id);
    assert!(gate.authenticate(&session_id).await.is_none());
}

#[tokio::test]
async fn wrong_secrets_never_succeed() {
    let (gate, _) = plaintext_gate(jon_directory(), SessionConfig::default());

    for secret in ["", "S3cret", "s3cret ", "s3cre", "helloWorld456", "s3cret\0"] {
        let err = assert_err!(gate.login("jon", secret).await);
        assert_eq!(err, AuthError::InvalidCredentials);
    }
    assert!(gate.registry().is_empty());
}

#[tokio::test]
async fn expired_session_looks_never_issued() {
    let config = SessionConfig {
        ttl: 60,
        ..SessionConfig::default()
    };
    let (gate, clock) = plaintext_gate(jon_directory(), config);
    let session_id = gate.login("jon", "s3cret").await.unwrap();
    let never_issued = SessionId::parse("N".repeat(32)).unwrap();

    clock.advance(chrono::Duration::seconds(59));
    assert!(gate.authenticate(&session_id).await.is_some());

    clock.advance(chrono::Duration::seconds(1));
    let expired = gate.authenticate(&session_id).await;
    let unknown = gate.authenticate(&never_issued).await;
    assert!(expired.is_none());
    assert_eq!(expired, unknown);
}

#[tokio::test]
async fn directory_outage_is_reported_but_hidden_from_users() {
    let directory = Arc::new(SwitchableDirectory::new());
    let (gate, _) = plaintext_gate(directory.clone(), SessionConfig::default());
    let session_id = gate.login("jon", "s3cret").await.unwrap();

    directory.offline.store(true, Ordering::SeqCst);

    let outage = gate.login("jon", "s3cret").await.unwrap_err();
    assert_eq!(outage.error_code(), "DIRECTORY_UNAVAILABLE");
    assert_eq!(outage.public_message(), GENERIC_LOGIN_FAILURE);
    assert_eq!(outage.public_message(), AuthError::InvalidCredentials.public_message());

    // existing session is unauthenticated during the outage but survives it
    assert!(gate.authenticate(&session_id).await.is_none());
    directory.offline.store(false, Ordering::SeqCst);
    assert!(gate.authenticate(&session_id).await.is_some());
}

#[tokio::test]
async fn disabling_an_account_revokes_on_next_request() {
    let directory = jon_directory();
    let (gate, _) = plaintext_gate(directory.clone(), SessionConfig::default());
    let session_id = gate.login("jon", "s3cret").await.unwrap();

    directory.set_disabled(&IdentityId::new("u1"), true);

    assert!(gate.authenticate(&session_id).await.is_none());
    assert!(gate.registry().is_empty());
    assert_eq!(gate.login("jon", "s3cret").await.unwrap_err(), AuthError::InvalidCredentials);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_get_distinct_sessions() {
    let (gate, _) = plaintext_gate(jon_directory(), SessionConfig::default());
    let gate = Arc::new(gate);

    let tasks: Vec<_> = (0..200)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.login("jon", "s3cret").await })
        })
        .collect();

    let mut seen = HashSet::new();
    for task in tasks {
        let session_id = task.await.unwrap().unwrap();
        assert!(seen.insert(session_id.expose().to_string()));
    }
    assert_eq!(gate.registry().len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_session_can_be_used_concurrently() {
    let directory = Arc::new(MemoryUserDirectory::new().with_latency(Duration::from_millis(5)));
    directory.insert(Identity::new("u1", "jon", "s3cret"));
    let (gate, _) = plaintext_gate(directory, SessionConfig::default());
    let gate = Arc::new(gate);
    let session_id = gate.login("jon", "s3cret").await.unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let gate = gate.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move { gate.authenticate(&session_id).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().id, IdentityId::new("u1"));
    }
}

#[tokio::test]
async fn sweep_drops_only_expired_sessions() {
    let config = SessionConfig {
        ttl: 60,
        ..SessionConfig::default()
    };
    let (gate, clock) = plaintext_gate(jon_directory(), config);

    gate.login("jon", "s3cret").await.unwrap();
    gate.login("jon", "s3cret").await.unwrap();
    clock.advance(chrono::Duration::seconds(30));
    let fresh = gate.login("jon", "s3cret").await.unwrap();
    clock.advance(chrono::Duration::seconds(45));

    assert_eq!(gate.registry().len(), 3);
    assert_eq!(gate.registry().sweep(), 2);
    assert_eq!(gate.registry().len(), 1);
    assert!(gate.authenticate(&fresh).await.is_some());
}

#[tokio::test]
async fn sliding_sessions_stay_alive_while_used() {
    let config = SessionConfig {
        ttl: 60,
        sliding_expiration: true,
        ..SessionConfig::default()
    };
    let (gate, clock) = plaintext_gate(jon_directory(), config);
    let session_id = gate.login("jon", "s3cret").await.unwrap();

    for _ in 0..5 {
        clock.advance(chrono::Duration::seconds(50));
        assert!(gate.authenticate(&session_id).await.is_some());
    }

    clock.advance(chrono::Duration::seconds(61));
    assert!(gate.authenticate(&session_id).await.is_none());
}

#[tokio::test]
async fn session_attributes_follow_the_session() {
    let (gate, _) = plaintext_gate(jon_directory(), SessionConfig::default());
    let session_id = gate.login("jon", "s3cret").await.unwrap();

    gate.registry()
        .set_attribute(&session_id, "cart", json!({"items": 2}))
        .unwrap();
    assert_eq!(gate.registry().attribute(&session_id, "cart"), Some(json!({"items": 2})));

    gate.logout(&session_id);
    assert_eq!(gate.registry().attribute(&session_id, "cart"), None);
    assert_eq!(
        gate.registry().set_attribute(&session_id, "cart", json!(null)).unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[cfg(feature = "argon2")]
#[tokio::test]
async fn configured_gate_verifies_hashed_credentials() {
    let config = AuthConfig::development();
    let hasher = session_auth::password::PasswordHasherFactory::from_config(&config.password).unwrap();
    let directory = Arc::new(MemoryUserDirectory::new());
    directory.insert(Identity::new("u7", "sam", hasher.hash_password("tarly").unwrap()));

    let gate = AuthenticationGate::new(directory, &config).unwrap();
    let session_id = gate.login("sam", "tarly").await.unwrap();

    let cookie_pair = gate
        .cookie()
        .set_cookie(&session_id)
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let identity = gate.authenticate_cookie(&cookie_pair).await.unwrap();
    assert_eq!(identity.id, IdentityId::new("u7"));
    assert!(gate.login("sam", "Tarly").await.is_err());
}

#[tokio::test]
async fn background_sweeper_runs_until_shutdown() {
    let config = SessionConfig {
        ttl: 60,
        sweep_interval: 1,
        ..SessionConfig::default()
    };
    let (gate, clock) = plaintext_gate(jon_directory(), config);
    gate.login("jon", "s3cret").await.unwrap();

    let sweeper = gate.spawn_sweeper();
    clock.advance(chrono::Duration::minutes(2));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !gate.registry().is_empty() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("expired session was not swept");

    sweeper.shutdown().await;
}
