// src/store/remote.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::{
    api_key::{ApiKey, ApiKeyStatus},
    job::{JobStatus, QuizJob},
    log::{LogEntry, LogLevel},
    settings::SiteSettings,
    user::{User, UserRole},
};
use crate::store::{QuizStore, StoreError};

/// Schema applied on every (re)connect. Mirrors the five record types.
const INIT_SQL: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS jobs (id TEXT PRIMARY KEY, title TEXT, subject TEXT, \
     grade TEXT, topic TEXT, status TEXT, progress INTEGER, results TEXT, error TEXT, \
     created_at TEXT, published INTEGER)",
    "CREATE TABLE IF NOT EXISTS api_keys (key TEXT PRIMARY KEY, status TEXT, usage_count INTEGER)",
    "CREATE TABLE IF NOT EXISTS settings (id TEXT PRIMARY KEY, data TEXT)",
    "CREATE TABLE IF NOT EXISTS logs (id TEXT PRIMARY KEY, timestamp TEXT, level TEXT, message TEXT)",
    "CREATE TABLE IF NOT EXISTS users (id TEXT PRIMARY KEY, username TEXT UNIQUE, name TEXT, \
     role TEXT, active INTEGER, password TEXT)",
];

/// Client for the hosted SQL backend.
///
/// Speaks the batch statement protocol: a POST of parameterized statements to
/// the configured URL, authenticated with a bearer token, answered with one
/// result set (or error) per statement.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

#[derive(Serialize)]
pub struct Statement {
    q: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(q: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            q: q.into(),
            params,
        }
    }
}

#[derive(Serialize)]
struct BatchRequest {
    statements: Vec<Statement>,
}

#[derive(Deserialize)]
struct StatementOutcome {
    #[serde(default)]
    results: Option<ResultSet>,
    #[serde(default)]
    error: Option<RemoteErrorBody>,
}

#[derive(Deserialize)]
struct RemoteErrorBody {
    message: String,
}

/// Columns and rows of one SELECT, as loosely-typed JSON values.
#[derive(Debug, Default, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

static NULL: Value = Value::Null;

fn cell<'a>(row: &'a [Value], idx: usize) -> &'a Value {
    row.get(idx).unwrap_or(&NULL)
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn opt_text(v: &Value) -> Option<String> {
    if v.is_null() { None } else { Some(text(v)) }
}

fn integer(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        Value::Bool(b) => *b as i64,
        _ => 0,
    }
}

fn flag(v: &Value) -> bool {
    integer(v) != 0
}

impl RemoteClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            token: token.into(),
        }
    }

    /// Creates the five tables. Idempotent.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = INIT_SQL.iter().map(|q| Statement::new(*q)).collect();
        self.batch(statements).await?;
        Ok(())
    }

    pub async fn execute(&self, q: &str, params: Vec<Value>) -> Result<ResultSet, StoreError> {
        let mut sets = self.batch(vec![Statement::with_params(q, params)]).await?;
        sets.pop()
            .ok_or_else(|| StoreError::Remote("empty batch response".to_string()))
    }

    pub async fn batch(&self, statements: Vec<Statement>) -> Result<Vec<ResultSet>, StoreError> {
        let mut request = self.http.post(&self.url).json(&BatchRequest { statements });
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(StoreError::Remote(format!("HTTP {status}: {preview}")));
        }

        let outcomes: Vec<StatementOutcome> = response.json().await?;
        outcomes
            .into_iter()
            .map(|outcome| match outcome.error {
                Some(err) => Err(StoreError::Remote(err.message)),
                None => Ok(outcome.results.unwrap_or_default()),
            })
            .collect()
    }
}

fn job_from_row(row: &[Value]) -> Result<QuizJob, StoreError> {
    let results_json = opt_text(cell(row, 7)).filter(|s| !s.is_empty());
    let results: Vec<_> = match results_json {
        Some(s) => serde_json::from_str(&s)?,
        None => Vec::new(),
    };
    Ok(QuizJob {
        id: text(cell(row, 0)),
        title: text(cell(row, 1)),
        subject: text(cell(row, 2)),
        grade: text(cell(row, 3)),
        topic: text(cell(row, 4)),
        status: JobStatus::parse(&text(cell(row, 5))),
        progress: integer(cell(row, 6)),
        results: if results.is_empty() { None } else { Some(results) },
        error: opt_text(cell(row, 8)),
        created_at: text(cell(row, 9)),
        published: flag(cell(row, 10)),
    })
}

#[async_trait]
impl QuizStore for RemoteClient {
    async fn get_jobs(&self) -> Result<Vec<QuizJob>, StoreError> {
        let set = self
            .execute(
                "SELECT id, title, subject, grade, topic, status, progress, results, error, \
                 created_at, published FROM jobs ORDER BY created_at DESC",
                vec![],
            )
            .await?;
        set.rows.iter().map(|row| job_from_row(row)).collect()
    }

    async fn save_job(&self, job: &QuizJob) -> Result<(), StoreError> {
        let results_json = serde_json::to_string(job.results.as_deref().unwrap_or(&[]))?;
        self.execute(
            "INSERT INTO jobs (id, title, subject, grade, topic, status, progress, results, \
             error, created_at, published) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET title=excluded.title, status=excluded.status, \
             progress=excluded.progress, results=excluded.results, error=excluded.error, \
             published=excluded.published",
            vec![
                json!(job.id),
                json!(job.title),
                json!(job.subject),
                json!(job.grade),
                json!(job.topic),
                json!(job.status.as_str()),
                json!(job.progress),
                json!(results_json),
                json!(job.error),
                json!(job.created_at),
                json!(job.published as i64),
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        self.execute("DELETE FROM jobs WHERE id = ?", vec![json!(id)])
            .await?;
        Ok(())
    }

    async fn get_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        let set = self
            .execute("SELECT key, status, usage_count FROM api_keys", vec![])
            .await?;
        Ok(set
            .rows
            .iter()
            .map(|row| ApiKey {
                key: text(cell(row, 0)),
                status: match text(cell(row, 1)).as_str() {
                    "FAILED" => ApiKeyStatus::Failed,
                    _ => ApiKeyStatus::Active,
                },
                usage_count: integer(cell(row, 2)),
            })
            .collect())
    }

    async fn save_api_keys(&self, keys: &[ApiKey]) -> Result<(), StoreError> {
        // Whole-collection replace, like the local blob write.
        let mut statements = vec![Statement::new("DELETE FROM api_keys")];
        for key in keys {
            statements.push(Statement::with_params(
                "INSERT INTO api_keys (key, status, usage_count) VALUES (?, ?, ?)",
                vec![
                    json!(key.key),
                    json!(match key.status {
                        ApiKeyStatus::Active => "ACTIVE",
                        ApiKeyStatus::Failed => "FAILED",
                    }),
                    json!(key.usage_count),
                ],
            ));
        }
        self.batch(statements).await?;
        Ok(())
    }

    async fn update_api_key_usage(&self, key: &str) -> Result<(), StoreError> {
        self.execute(
            "UPDATE api_keys SET usage_count = usage_count + 1 WHERE key = ?",
            vec![json!(key)],
        )
        .await?;
        Ok(())
    }

    async fn get_settings(&self) -> Result<SiteSettings, StoreError> {
        let set = self
            .execute("SELECT data FROM settings WHERE id = 'main'", vec![])
            .await?;
        match set.rows.first() {
            Some(row) => Ok(serde_json::from_str(&text(cell(row, 0)))?),
            None => Ok(SiteSettings::default()),
        }
    }

    async fn save_settings(&self, settings: &SiteSettings) -> Result<(), StoreError> {
        let data = serde_json::to_string(settings)?;
        self.execute(
            "INSERT INTO settings (id, data) VALUES ('main', ?) \
             ON CONFLICT(id) DO UPDATE SET data=excluded.data",
            vec![json!(data)],
        )
        .await?;
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        let set = self
            .execute(
                "SELECT id, timestamp, level, message FROM logs \
                 ORDER BY timestamp DESC LIMIT 100",
                vec![],
            )
            .await?;
        Ok(set
            .rows
            .iter()
            .map(|row| LogEntry {
                id: text(cell(row, 0)),
                timestamp: text(cell(row, 1)),
                level: LogLevel::parse(&text(cell(row, 2))),
                message: text(cell(row, 3)),
            })
            .collect())
    }

    async fn add_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO logs (id, timestamp, level, message) VALUES (?, ?, ?, ?)",
            vec![
                json!(entry.id),
                json!(entry.timestamp),
                json!(entry.level.as_str()),
                json!(entry.message),
            ],
        )
        .await?;
        Ok(())
    }

    async fn clear_logs(&self) -> Result<(), StoreError> {
        self.execute("DELETE FROM logs", vec![]).await?;
        Ok(())
    }

    async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        let set = self
            .execute(
                "SELECT id, username, name, role, active, password FROM users",
                vec![],
            )
            .await?;
        Ok(set
            .rows
            .iter()
            .map(|row| User {
                id: text(cell(row, 0)),
                username: text(cell(row, 1)),
                name: text(cell(row, 2)),
                role: UserRole::parse(&text(cell(row, 3))),
                active: flag(cell(row, 4)),
                password: text(cell(row, 5)),
            })
            .collect())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.execute(
            "INSERT INTO users (id, username, name, role, active, password) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET username=excluded.username, name=excluded.name, \
             role=excluded.role, active=excluded.active, password=excluded.password",
            vec![
                json!(user.id),
                json!(user.username),
                json!(user.name),
                json!(user.role.as_str()),
                json!(user.active as i64),
                json!(user.password),
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.execute("DELETE FROM users WHERE id = ?", vec![json!(id)])
            .await?;
        Ok(())
    }
}
