// src/store/local.rs

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::models::{
    api_key::ApiKey,
    job::QuizJob,
    log::LogEntry,
    settings::SiteSettings,
    user::User,
};
use crate::store::{QuizStore, StoreError};

const KEY_JOBS: &str = "edugenius_jobs";
const KEY_API_KEYS: &str = "edugenius_keys";
const KEY_SETTINGS: &str = "edugenius_settings";
const KEY_LOGS: &str = "edugenius_logs";
const KEY_USERS: &str = "edugenius_users";

/// Newest log entries kept in the fallback store.
const LOG_CAP: usize = 100;

/// Local fallback store.
///
/// Each collection is one JSON blob under a fixed key in an embedded SQLite
/// key-value table, so every upsert is a whole-collection read-modify-write.
/// Always available; the façade degrades to it when the remote backend
/// errors.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens (or creates) the store at the given file path.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool).await
    }

    /// An in-memory store, used by the test suites.
    pub async fn in_memory() -> Result<Self, StoreError> {
        // A single connection keeps one shared in-memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&pool)
            .await?;
        Ok(Self { pool })
    }

    async fn read_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn write_blob<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_blob(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuizStore for LocalStore {
    async fn get_jobs(&self) -> Result<Vec<QuizJob>, StoreError> {
        Ok(self.read_blob(KEY_JOBS).await?.unwrap_or_default())
    }

    async fn save_job(&self, job: &QuizJob) -> Result<(), StoreError> {
        let mut jobs = self.get_jobs().await?;
        match jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job.clone(),
            None => jobs.push(job.clone()),
        }
        self.write_blob(KEY_JOBS, &jobs).await
    }

    async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        let mut jobs = self.get_jobs().await?;
        jobs.retain(|j| j.id != id);
        self.write_blob(KEY_JOBS, &jobs).await
    }

    async fn get_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        Ok(self.read_blob(KEY_API_KEYS).await?.unwrap_or_default())
    }

    async fn save_api_keys(&self, keys: &[ApiKey]) -> Result<(), StoreError> {
        self.write_blob(KEY_API_KEYS, &keys).await
    }

    async fn update_api_key_usage(&self, key: &str) -> Result<(), StoreError> {
        let mut keys = self.get_api_keys().await?;
        if let Some(entry) = keys.iter_mut().find(|k| k.key == key) {
            entry.usage_count += 1;
            self.save_api_keys(&keys).await?;
        }
        Ok(())
    }

    async fn get_settings(&self) -> Result<SiteSettings, StoreError> {
        Ok(self.read_blob(KEY_SETTINGS).await?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &SiteSettings) -> Result<(), StoreError> {
        self.write_blob(KEY_SETTINGS, settings).await
    }

    async fn get_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.read_blob(KEY_LOGS).await?.unwrap_or_default())
    }

    async fn add_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let mut logs = self.get_logs().await?;
        logs.insert(0, entry.clone());
        logs.truncate(LOG_CAP);
        self.write_blob(KEY_LOGS, &logs).await
    }

    async fn clear_logs(&self) -> Result<(), StoreError> {
        self.delete_blob(KEY_LOGS).await
    }

    async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.read_blob(KEY_USERS).await?.unwrap_or_default())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.get_users().await?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }
        self.write_blob(KEY_USERS, &users).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        let mut users = self.get_users().await?;
        users.retain(|u| u.id != id);
        self.write_blob(KEY_USERS, &users).await
    }
}
