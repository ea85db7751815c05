// src/handlers/dashboard.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        api_key::ApiKeyStatus,
        job::{JobStatus, QuizJob},
        log::LogEntry,
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub published_jobs: usize,
    pub active_keys: usize,
    pub total_key_usage: i64,
    pub total_logs: usize,
    pub total_users: usize,
    pub recent_jobs: Vec<QuizJob>,
    pub recent_logs: Vec<LogEntry>,
}

/// Aggregates the panel overview.
///
/// The four collections are read concurrently and joined before the response
/// is assembled; this is the only parallel fan-out in the system.
pub async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (mut jobs, keys, logs, users) = tokio::try_join!(
        state.db.get_jobs(),
        state.db.get_api_keys(),
        state.db.get_logs(),
        state.db.get_users(),
    )?;

    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let response = DashboardResponse {
        total_jobs: jobs.len(),
        completed_jobs: jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count(),
        failed_jobs: jobs.iter().filter(|j| j.status == JobStatus::Failed).count(),
        published_jobs: jobs.iter().filter(|j| j.published).count(),
        active_keys: keys
            .iter()
            .filter(|k| k.status == ApiKeyStatus::Active)
            .count(),
        total_key_usage: keys.iter().map(|k| k.usage_count).sum(),
        total_logs: logs.len(),
        total_users: users.len(),
        recent_jobs: jobs.into_iter().take(5).collect(),
        recent_logs: logs.into_iter().take(10).collect(),
    };

    Ok(Json(response))
}
