use std::sync::Arc;

use chrono::{TimeZone, Utc};
use spotify_cleaner::{
    error::AuthError,
    management::{
        ACCOUNT_NAME, FileSecretStore, KeyringSecretStore, MemorySecretStore, SERVICE_NAME,
        SecretStore, TokenStore,
    },
    types::Credential,
};

fn sample() -> Credential {
    Credential {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();

    TokenStore::new(Arc::new(FileSecretStore::new(dir.path())))
        .save(&sample())
        .await
        .unwrap();
    let loaded = TokenStore::new(Arc::new(FileSecretStore::new(dir.path())))
        .load()
        .await
        .unwrap();

    assert_eq!(loaded, Some(sample()));
}

#[tokio::test]
async fn test_file_store_missing_entry_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSecretStore::new(dir.path().join("not-created-yet"));

    assert_eq!(store.get(SERVICE_NAME, ACCOUNT_NAME).await.unwrap(), None);
    // Deleting what is not there is fine.
    store.delete(SERVICE_NAME, ACCOUNT_NAME).await.unwrap();
}

#[tokio::test]
async fn test_file_store_clear_removes_credential() {
    let dir = tempfile::tempdir().unwrap();
    let tokens = TokenStore::new(Arc::new(FileSecretStore::new(dir.path())));

    tokens.save(&sample()).await.unwrap();
    tokens.clear().await.unwrap();

    assert_eq!(tokens.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store_overwrites_entry() {
    let secrets = Arc::new(MemorySecretStore::new());
    let tokens = TokenStore::new(secrets.clone());

    tokens.save(&sample()).await.unwrap();
    let mut newer = sample();
    newer.access_token = "access-2".to_string();
    tokens.save(&newer).await.unwrap();

    assert_eq!(tokens.load().await.unwrap(), Some(newer));
    assert!(secrets.get(SERVICE_NAME, ACCOUNT_NAME).await.unwrap().is_some());
}

#[tokio::test]
async fn test_garbage_entry_reads_as_absent() {
    let secrets = Arc::new(MemorySecretStore::new());
    secrets
        .set(SERVICE_NAME, ACCOUNT_NAME, b"{\"access_token\": 1}")
        .await
        .unwrap();

    let loaded = TokenStore::new(secrets).load().await.unwrap();

    assert_eq!(loaded, None);
}

// CI hosts may have no usable keyring, so an unavailable store is accepted;
// what matters is that the blocking calls complete on a single-threaded runtime.
#[tokio::test]
async fn test_keyring_missing_entry_resolves_without_blocking_the_runtime() {
    let store = KeyringSecretStore;
    let service = "spotify-cleaner-test";
    let account = "entry-that-was-never-written";

    let got = store.get(service, account).await;
    let deleted = store.delete(service, account).await;

    assert!(matches!(got, Ok(None) | Err(AuthError::StoreUnavailable(_))), "{got:?}");
    assert!(matches!(deleted, Ok(()) | Err(AuthError::StoreUnavailable(_))), "{deleted:?}");
}
