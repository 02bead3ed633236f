//! Credential storage backend implementations

use super::{ResearcherProfile, TokenResponse};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Credentials persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    pub researcher: ResearcherProfile,
}

/// Trait for credential storage backends
///
/// The API client reads the token before every request; login and
/// signup persist it; logout clears it. Token absence is not an error,
/// it just means requests go out unauthenticated.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current bearer token, if any
    async fn token(&self) -> Option<String>;

    /// Profile of the authenticated researcher, if any
    async fn profile(&self) -> Option<ResearcherProfile>;

    /// Persist credentials from a successful authentication
    async fn store(&self, response: &TokenResponse) -> Result<()>;

    /// Remove any persisted credentials
    async fn clear(&self) -> Result<()>;
}

/// File-based credential storage
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create storage backed by the given file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read(&self) -> Option<StoredCredentials> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(_) => return None,
        };
        match serde_json::from_str(&contents) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                debug!("Ignoring unreadable credentials file: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn token(&self) -> Option<String> {
        self.read().await.map(|c| c.access_token)
    }

    async fn profile(&self) -> Option<ResearcherProfile> {
        self.read().await.map(|c| c.researcher)
    }

    async fn store(&self, response: &TokenResponse) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let credentials = StoredCredentials {
            access_token: response.access_token.clone(),
            researcher: response.researcher.clone(),
        };
        let json = serde_json::to_string_pretty(&credentials)?;
        fs::write(&self.path, json).await?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }

        Ok(())
    }
}

/// In-memory credential storage for tests and ephemeral use
pub struct MemoryCredentialStore {
    credentials: tokio::sync::RwLock<Option<StoredCredentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            credentials: tokio::sync::RwLock::new(None),
        }
    }

    /// Create a store pre-populated with a token
    pub fn with_token(token: &str, researcher: ResearcherProfile) -> Self {
        Self {
            credentials: tokio::sync::RwLock::new(Some(StoredCredentials {
                access_token: token.to_string(),
                researcher,
            })),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn token(&self) -> Option<String> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    async fn profile(&self) -> Option<ResearcherProfile> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.researcher.clone())
    }

    async fn store(&self, response: &TokenResponse) -> Result<()> {
        *self.credentials.write().await = Some(StoredCredentials {
            access_token: response.access_token.clone(),
            researcher: response.researcher.clone(),
        });
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.credentials.write().await = None;
        Ok(())
    }
}
