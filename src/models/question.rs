// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Fact-check verdict attached to a question by the review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactCheckStatus {
    Verified,
    Flagged,
    Uncertain,
}

/// A single generated quiz question.
///
/// Immutable once generated, except for the fields merged in by the
/// fact-check pass. Serialized in camelCase to match the admin SPA and the
/// stored JSON blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,

    pub question: String,

    /// Answer options for multiple-choice types. Absent for essay types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    pub answer: String,

    pub explanation: String,

    /// Learning-goal indicator the question was written against.
    pub indicator: String,

    pub cognitive_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_image: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_check_status: Option<FactCheckStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_check_comment: Option<String>,
}

/// One per-question correction returned by the fact-check call.
///
/// Only `id` and `factCheckStatus` are required by the response schema; any
/// other field the reviewer returns overwrites the original question field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckResult {
    pub id: String,

    pub fact_check_status: FactCheckStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_check_comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}
