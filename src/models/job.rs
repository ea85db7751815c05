// src/models/job.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::QuizQuestion;

/// Lifecycle of a generation job.
///
/// Set to PROCESSING when the job is created and flipped exactly once to
/// COMPLETED or FAILED when the generation call resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "PENDING" => JobStatus::Pending,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Processing,
        }
    }
}

/// A quiz-generation job and its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizJob {
    pub id: String,

    pub title: String,

    pub subject: String,

    /// Grade label, e.g. "Kelas 10".
    pub grade: String,

    pub topic: String,

    pub status: JobStatus,

    /// 0 at creation, 100 once completed.
    pub progress: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<QuizQuestion>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    pub published: bool,
}

/// DTO for submitting a new generation job.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// Optional package title; defaults to "Kuis <subject> - <topic>".
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub subject: String,

    #[validate(length(min = 1, max = 50))]
    pub grade: String,

    #[validate(length(min = 1, max = 300))]
    pub topic: String,

    #[validate(range(min = 1, max = 50))]
    pub num_questions: u32,

    /// Question type label, e.g. "Pilihan Ganda (4 Opsi)".
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50))]
    pub quiz_type: String,

    /// Bloom level label, e.g. "C1 (Mengingat)".
    #[validate(length(min = 1, max = 50))]
    pub cognitive_level: String,

    /// "Mudah", "Sedang" or "Sulit".
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,

    /// Optional reference summary pasted by the teacher.
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub summary: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_language() -> String {
    "Bahasa Indonesia".to_string()
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
