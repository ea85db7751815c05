// src/handlers/jobs.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    gemini::GenerateParams,
    models::{
        job::{CreateJobRequest, JobStatus, QuizJob},
        log::LogLevel,
    },
    state::AppState,
    utils::docx::{self, PaperSize},
};

/// Lists every generation job.
pub async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let jobs = state.db.get_jobs().await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let job = find_job(&state, &id).await?;
    Ok(Json(job))
}

/// Submits a generation job and runs it to completion.
///
/// The job is stored as PROCESSING first, then flipped to COMPLETED with its
/// results or to FAILED with the error text once the external call resolves.
/// There is no queue: processing lasts exactly as long as this handler.
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = payload
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Kuis {} - {}", payload.subject, payload.topic));

    let mut job = QuizJob {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        subject: payload.subject.clone(),
        grade: payload.grade.clone(),
        topic: payload.topic.clone(),
        status: JobStatus::Processing,
        progress: 0,
        results: None,
        error: None,
        created_at: chrono::Utc::now().to_rfc3339(),
        published: false,
    };

    state.db.save_job(&job).await?;
    state
        .db
        .add_log(LogLevel::Info, format!("Memulai proses generate: {}", job.title))
        .await?;

    let params = GenerateParams {
        subject: payload.subject,
        grade: payload.grade,
        topic: payload.topic,
        num_questions: payload.num_questions,
        quiz_type: payload.quiz_type,
        cognitive_level: payload.cognitive_level,
        difficulty: payload.difficulty,
        summary: payload.summary,
        language: payload.language,
        model: payload.model,
    };

    match state.gemini.generate_quiz(&state.db, &params).await {
        Ok(results) => {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.results = Some(results);
            state.db.save_job(&job).await?;
            state
                .db
                .add_log(LogLevel::Info, format!("Berhasil generate soal: {}", job.title))
                .await?;
            Ok((StatusCode::CREATED, Json(job)))
        }
        Err(e) => {
            job.status = JobStatus::Failed;
            job.error = Some(e.to_string());
            state.db.save_job(&job).await?;
            state
                .db
                .add_log(LogLevel::Error, format!("Gagal generate soal: {e}"))
                .await?;
            Err(AppError::Upstream(e.to_string()))
        }
    }
}

/// Deletes a job. Removing an id that was never stored is a no-op.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_job(&id).await?;
    state
        .db
        .add_log(LogLevel::Info, format!("Menghapus riwayat soal ID: {id}"))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flips the `published` flag and nothing else.
pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut job = find_job(&state, &id).await?;
    job.published = !job.published;
    state.db.save_job(&job).await?;
    state
        .db
        .add_log(
            LogLevel::Info,
            format!(
                "Status publikasi {} diubah menjadi: {}",
                job.title, job.published
            ),
        )
        .await?;
    Ok(Json(job))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub answers: bool,
    #[serde(default)]
    pub paper: PaperSize,
}

/// Exports a job as a Word-compatible document.
pub async fn export_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let job = find_job(&state, &id).await?;

    let filename = docx::export_filename(&job, query.answers);
    let html = docx::render_doc(&job, query.answers, query.paper);
    state
        .db
        .add_log(LogLevel::Info, format!("User mendownload Word: {filename}"))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/msword".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        // Word sniffs the BOM to pick up UTF-8.
        format!("\u{feff}{html}"),
    ))
}

async fn find_job(state: &AppState, id: &str) -> Result<QuizJob, AppError> {
    let jobs = state.db.get_jobs().await?;
    jobs.into_iter()
        .find(|j| j.id == id)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}
