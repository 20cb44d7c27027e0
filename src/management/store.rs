use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{error::AuthError, types::Credential};

pub const SERVICE_NAME: &str = "spotify-cleaner";
pub const ACCOUNT_NAME: &str = "credential";

/// Durable key-value store for secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, AuthError>;
    async fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), AuthError>;
    /// Deleting an absent entry is not an error.
    async fn delete(&self, service: &str, account: &str) -> Result<(), AuthError>;
}

/// OS credential store: macOS Keychain, Windows Credential Manager, and the
/// kernel keyutils keyring on Linux. Linux keyutils entries live in the user's
/// session and are lost on reboot, after which a fresh login is needed.
///
/// The platform calls block, so each one runs on tokio's blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecretStore;

impl KeyringSecretStore {
    async fn with_entry<T, F>(service: &str, account: &str, op: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T, AuthError> + Send + 'static,
    {
        let (service, account) = (service.to_string(), account.to_string());
        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &account)
                .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
            op(entry)
        })
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("keyring task failed: {e}")))?
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, AuthError> {
        Self::with_entry(service, account, |entry| match entry.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::StoreUnavailable(e.to_string())),
        })
        .await
    }

    async fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), AuthError> {
        let secret = secret.to_vec();
        Self::with_entry(service, account, move |entry| {
            entry
                .set_secret(&secret)
                .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
        })
        .await
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), AuthError> {
        Self::with_entry(service, account, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::StoreUnavailable(e.to_string())),
        })
        .await
    }
}

/// One file per entry under a directory, for hosts without a keychain.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, service: &str, account: &str) -> PathBuf {
        self.dir.join(format!("{service}.{account}.json"))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, AuthError> {
        match async_fs::read(self.path(service, account)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::StoreUnavailable(e.to_string())),
        }
    }

    async fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), AuthError> {
        async_fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        async_fs::write(self.path(service, account), secret)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), AuthError> {
        match async_fs::remove_file(self.path(service, account)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::StoreUnavailable(e.to_string())),
        }
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    async fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().await;
        entries.insert((service.to_string(), account.to_string()), secret.to_vec());
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().await;
        entries.remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

/// Persists the [`Credential`] under a fixed service/account key.
#[derive(Clone)]
pub struct TokenStore {
    secrets: Arc<dyn SecretStore>,
}

impl TokenStore {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// A stored value that does not parse is reported as absent.
    pub async fn load(&self) -> Result<Option<Credential>, AuthError> {
        let Some(bytes) = self.secrets.get(SERVICE_NAME, ACCOUNT_NAME).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Credential>(&bytes) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(error = %e, "stored credential is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec(credential)
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        self.secrets.set(SERVICE_NAME, ACCOUNT_NAME, &bytes).await?;
        tracing::debug!("credential persisted");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        self.secrets.delete(SERVICE_NAME, ACCOUNT_NAME).await
    }
}
