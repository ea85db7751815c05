// src/store/mod.rs

pub mod local;
pub mod remote;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    api_key::ApiKey,
    job::QuizJob,
    log::{LogEntry, LogLevel},
    settings::{SiteSettings, TestConnectionResponse},
    user::User,
};

pub use local::LocalStore;
pub use remote::RemoteClient;

/// Error type shared by both storage adapters.
#[derive(Debug)]
pub enum StoreError {
    Sql(sqlx::Error),
    Serde(serde_json::Error),
    Http(reqwest::Error),
    /// The remote backend answered, but with an error payload.
    Remote(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sql(e) => write!(f, "database error: {e}"),
            StoreError::Serde(e) => write!(f, "stored data is not valid JSON: {e}"),
            StoreError::Http(e) => write!(f, "remote request failed: {e}"),
            StoreError::Remote(msg) => write!(f, "remote backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Sql(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(err)
    }
}

/// Uniform CRUD contract over the five record types, implemented by both the
/// remote SQL backend and the local fallback store.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn get_jobs(&self) -> Result<Vec<QuizJob>, StoreError>;
    async fn save_job(&self, job: &QuizJob) -> Result<(), StoreError>;
    async fn delete_job(&self, id: &str) -> Result<(), StoreError>;

    async fn get_api_keys(&self) -> Result<Vec<ApiKey>, StoreError>;
    async fn save_api_keys(&self, keys: &[ApiKey]) -> Result<(), StoreError>;
    async fn update_api_key_usage(&self, key: &str) -> Result<(), StoreError>;

    async fn get_settings(&self) -> Result<SiteSettings, StoreError>;
    async fn save_settings(&self, settings: &SiteSettings) -> Result<(), StoreError>;

    async fn get_logs(&self) -> Result<Vec<LogEntry>, StoreError>;
    async fn add_log(&self, entry: &LogEntry) -> Result<(), StoreError>;
    async fn clear_logs(&self) -> Result<(), StoreError>;

    async fn get_users(&self) -> Result<Vec<User>, StoreError>;
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;
}

/// Which physical backend is currently serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Remote,
    Local,
}

/// The persistence façade.
///
/// Holds the local store plus an optional remote client rebuilt from the
/// stored credentials. Reads prefer the remote backend and fall back to the
/// local store when it errors; writes go to whichever backend is active at
/// call time and are never retried or queued.
pub struct Db {
    local: LocalStore,
    remote: RwLock<Option<RemoteClient>>,
}

impl Db {
    pub fn new(local: LocalStore) -> Self {
        Self {
            local,
            remote: RwLock::new(None),
        }
    }

    /// Decides the backend from the stored settings. Called once at startup
    /// and again after every settings save.
    pub async fn init(&self) -> Result<(), StoreError> {
        let settings = self.local.get_settings().await?;
        self.reconnect(&settings).await;
        Ok(())
    }

    /// Connection factory: rebuilds the remote handle from credentials.
    ///
    /// A remote that fails schema initialization is discarded and the façade
    /// stays on the local store.
    async fn reconnect(&self, settings: &SiteSettings) {
        let next = match settings.remote_url() {
            Some(url) => {
                let client =
                    RemoteClient::new(url, settings.db_token.clone().unwrap_or_default());
                match client.init_schema().await {
                    Ok(()) => {
                        tracing::info!(url, "remote database initialized");
                        Some(client)
                    }
                    Err(e) => {
                        tracing::warn!(url, error = %e, "remote init failed, using local store");
                        None
                    }
                }
            }
            None => None,
        };
        *self.remote.write().await = next;
    }

    async fn active_remote(&self) -> Option<RemoteClient> {
        self.remote.read().await.clone()
    }

    pub async fn connection_type(&self) -> ConnectionType {
        if self.remote.read().await.is_some() {
            ConnectionType::Remote
        } else {
            ConnectionType::Local
        }
    }

    /// Probes a candidate remote backend with a trivial round trip. Does not
    /// mutate the active backend.
    pub async fn test_connection(&self, url: &str, token: &str) -> TestConnectionResponse {
        if url.is_empty() {
            return TestConnectionResponse {
                success: false,
                message: "URL Database tidak boleh kosong.".to_string(),
            };
        }
        let candidate = RemoteClient::new(url, token);
        match candidate.execute("SELECT 1", vec![]).await {
            Ok(_) => TestConnectionResponse {
                success: true,
                message: "Koneksi berhasil! Database siap digunakan.".to_string(),
            },
            Err(e) => TestConnectionResponse {
                success: false,
                message: format!("Koneksi gagal: {e}"),
            },
        }
    }

    pub async fn get_jobs(&self) -> Result<Vec<QuizJob>, StoreError> {
        if let Some(remote) = self.active_remote().await {
            match remote.get_jobs().await {
                Ok(jobs) => return Ok(jobs),
                Err(e) => tracing::warn!(error = %e, "remote get_jobs failed, using local store"),
            }
        }
        self.local.get_jobs().await
    }

    pub async fn save_job(&self, job: &QuizJob) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.save_job(job).await,
            None => self.local.save_job(job).await,
        }
    }

    pub async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.delete_job(id).await,
            None => self.local.delete_job(id).await,
        }
    }

    pub async fn get_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        if let Some(remote) = self.active_remote().await {
            match remote.get_api_keys().await {
                Ok(keys) => return Ok(keys),
                Err(e) => {
                    tracing::warn!(error = %e, "remote get_api_keys failed, using local store")
                }
            }
        }
        self.local.get_api_keys().await
    }

    pub async fn save_api_keys(&self, keys: &[ApiKey]) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.save_api_keys(keys).await,
            None => self.local.save_api_keys(keys).await,
        }
    }

    pub async fn update_api_key_usage(&self, key: &str) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.update_api_key_usage(key).await,
            None => self.local.update_api_key_usage(key).await,
        }
    }

    pub async fn get_settings(&self) -> Result<SiteSettings, StoreError> {
        if let Some(remote) = self.active_remote().await {
            match remote.get_settings().await {
                Ok(settings) => return Ok(settings),
                Err(e) => {
                    tracing::warn!(error = %e, "remote get_settings failed, using local store")
                }
            }
        }
        self.local.get_settings().await
    }

    /// Saves the settings singleton.
    ///
    /// The local copy is always written first: it is the bootstrap source for
    /// the remote credentials. The remote handle is then rebuilt so a changed
    /// URL or token takes effect immediately.
    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<(), StoreError> {
        self.local.save_settings(settings).await?;
        if let Some(remote) = self.active_remote().await {
            remote.save_settings(settings).await?;
        }
        self.reconnect(settings).await;
        Ok(())
    }

    pub async fn get_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        if let Some(remote) = self.active_remote().await {
            match remote.get_logs().await {
                Ok(logs) => return Ok(logs),
                Err(e) => tracing::warn!(error = %e, "remote get_logs failed, using local store"),
            }
        }
        self.local.get_logs().await
    }

    /// Appends an application log entry, constructing id and timestamp.
    pub async fn add_log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Result<(), StoreError> {
        let entry = LogEntry::new(level, message);
        match self.active_remote().await {
            Some(remote) => remote.add_log(&entry).await,
            None => self.local.add_log(&entry).await,
        }
    }

    pub async fn clear_logs(&self) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.clear_logs().await,
            None => self.local.clear_logs().await,
        }
    }

    pub async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        if let Some(remote) = self.active_remote().await {
            match remote.get_users().await {
                Ok(users) => return Ok(users),
                Err(e) => tracing::warn!(error = %e, "remote get_users failed, using local store"),
            }
        }
        self.local.get_users().await
    }

    pub async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.save_user(user).await,
            None => self.local.save_user(user).await,
        }
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        match self.active_remote().await {
            Some(remote) => remote.delete_user(id).await,
            None => self.local.delete_user(id).await,
        }
    }
}
