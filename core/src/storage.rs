//! Persistence of the access/refresh token pair.
//!
//! # Design
//! `TokenStorage` is the only seam the HTTP layer sees. Three backends are
//! provided and chosen when the client is composed:
//!
//! - `MemoryTokenStorage` keeps the pair in process memory.
//! - `FileTokenStorage` keeps a small key/value JSON document on disk, the
//!   way a browser keeps `localStorage` entries.
//! - `SecureTokenStorage` writes through a `SecureStore`, the item API of an
//!   OS keystore.
//!
//! A pair is stored whole or not at all. Getters return `Ok(None)` when
//! nothing is stored; `Err` is reserved for backend failures.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::StorageError;

pub const ACCESS_TOKEN_KEY: &str = "hf_access_token";
pub const REFRESH_TOKEN_KEY: &str = "hf_refresh_token";

/// An access token together with the refresh token that can renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>, StorageError>;

    async fn refresh_token(&self) -> Result<Option<String>, StorageError>;

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    /// The stored pair, or `None` unless both tokens are present.
    async fn tokens(&self) -> Result<Option<TokenPair>, StorageError> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(TokenPair::new(access, refresh))
            }
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.pair.read().await.as_ref().map(|p| p.access_token.clone()))
    }

    async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.pair.read().await.as_ref().map(|p| p.refresh_token.clone()))
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError> {
        *self.pair.write().await = Some(TokenPair::new(access_token, refresh_token));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.pair.write().await = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Tokens kept in a JSON object of string entries on disk.
///
/// Entries other than the two token keys are preserved. Each write goes to a
/// sibling temp file that is then renamed over the target, so readers never
/// observe half a pair.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/hf/tokens.json`, when the platform has a data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("hf").join("tokens.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_err(e)),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let serialized = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().await?.remove(ACCESS_TOKEN_KEY))
    }

    async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().await?.remove(REFRESH_TOKEN_KEY))
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(ACCESS_TOKEN_KEY.to_string(), access_token.to_string());
        entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh_token.to_string());
        self.write_entries(&entries).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let had_access = entries.remove(ACCESS_TOKEN_KEY).is_some();
        let had_refresh = entries.remove(REFRESH_TOKEN_KEY).is_some();
        if !had_access && !had_refresh {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}

// ---------------------------------------------------------------------------
// Secure store
// ---------------------------------------------------------------------------

/// Item-level API of a platform keystore (Keychain, Android Keystore, ...).
#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn delete_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Tokens kept as two keystore items.
pub struct SecureTokenStorage<S> {
    store: S,
    access_key: String,
    refresh_key: String,
}

impl<S: SecureStore> SecureTokenStorage<S> {
    pub fn new(store: S) -> Self {
        Self::with_keys(store, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY)
    }

    pub fn with_keys(store: S, access_key: impl Into<String>, refresh_key: impl Into<String>) -> Self {
        Self {
            store,
            access_key: access_key.into(),
            refresh_key: refresh_key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: SecureStore> TokenStorage for SecureTokenStorage<S> {
    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get_item(&self.access_key).await
    }

    async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get_item(&self.refresh_key).await
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StorageError> {
        self.store.set_item(&self.access_key, access_token).await?;
        if let Err(e) = self.store.set_item(&self.refresh_key, refresh_token).await {
            // The new access token must not pair with a previously stored
            // refresh token, so both items go.
            for key in [&self.refresh_key, &self.access_key] {
                if let Err(rollback) = self.store.delete_item(key).await {
                    tracing::warn!(key = %key, error = %rollback, "failed to roll back token item after partial write");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Stops at the first failed delete, so the access token is never left
    /// behind without its refresh token.
    async fn clear(&self) -> Result<(), StorageError> {
        self.store.delete_item(&self.access_key).await?;
        self.store.delete_item(&self.refresh_key).await
    }
}
