// src/gemini.rs

//! Client for the external generative service.
//!
//! Two call shapes: quiz generation with a schema-constrained JSON array
//! response, and an optional fact-check pass over a generated batch. Keys
//! rotate uniformly at random over the ACTIVE credentials; the API key is
//! never logged.

use rand::Rng;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::instrument;

use crate::config::Config;
use crate::models::api_key::ApiKeyStatus;
use crate::models::log::LogLevel;
use crate::models::question::{FactCheckResult, QuizQuestion};
use crate::store::{Db, StoreError};

/// Model used for the review pass, independent of the generation model.
const FACT_CHECK_MODEL: &str = "gemini-3-flash-preview";

const FACT_CHECK_SYSTEM: &str = "Tinjau keakuratan soal. Kembalikan data dalam format JSON \
     yang sama namun tambahkan field 'factCheckStatus' dan 'factCheckComment'.";

#[derive(Debug)]
pub enum AiError {
    Http(reqwest::Error),
    /// Error message extracted from the service's error payload.
    Api(String),
    Parse(serde_json::Error),
    Store(StoreError),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Http(e) => write!(f, "request failed: {e}"),
            AiError::Api(msg) => write!(f, "{msg}"),
            AiError::Parse(e) => write!(f, "model returned invalid JSON: {e}"),
            AiError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Http(err)
    }
}

impl From<StoreError> for AiError {
    fn from(err: StoreError) -> Self {
        AiError::Store(err)
    }
}

/// Inputs for one generation request.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub num_questions: u32,
    pub quiz_type: String,
    pub cognitive_level: String,
    pub difficulty: String,
    pub summary: Option<String>,
    pub language: String,
    pub model: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    /// Environment-provided default, used when no key is ACTIVE. May be
    /// empty.
    fallback_key: String,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            fallback_key: config.gemini_api_key.clone(),
        }
    }

    /// Picks one ACTIVE key uniformly at random and bumps its usage count.
    ///
    /// No affinity and no failure memory: a key errors out of rotation only
    /// when an admin flips its status.
    pub async fn rotating_api_key(&self, db: &Db) -> Result<String, AiError> {
        let keys = db.get_api_keys().await?;
        let active: Vec<_> = keys
            .into_iter()
            .filter(|k| k.status == ApiKeyStatus::Active)
            .collect();

        if active.is_empty() {
            return Ok(self.fallback_key.clone());
        }

        let picked = {
            let mut rng = rand::thread_rng();
            active[rng.gen_range(0..active.len())].key.clone()
        };
        db.update_api_key_usage(&picked).await?;
        Ok(picked)
    }

    /// Generates a quiz batch and, when the fact-checker toggle is on, runs
    /// the review pass over it. Any generation failure is recorded as an
    /// ERROR log entry and propagated.
    #[instrument(level = "info", skip(self, db, params), fields(model = %params.model, n = params.num_questions))]
    pub async fn generate_quiz(
        &self,
        db: &Db,
        params: &GenerateParams,
    ) -> Result<Vec<QuizQuestion>, AiError> {
        let settings = db.get_settings().await?;

        match self.request_quiz(db, params).await {
            Ok(quiz) => {
                if settings.ai_fact_checker && !quiz.is_empty() {
                    let _ = db
                        .add_log(
                            LogLevel::Info,
                            format!("Memulai AI Fact Checker untuk {} soal...", quiz.len()),
                        )
                        .await;
                    return Ok(self
                        .fact_check_quiz(db, quiz, &params.subject, &params.language)
                        .await);
                }
                Ok(quiz)
            }
            Err(e) => {
                let _ = db
                    .add_log(LogLevel::Error, format!("Gemini API Error: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    async fn request_quiz(
        &self,
        db: &Db,
        params: &GenerateParams,
    ) -> Result<Vec<QuizQuestion>, AiError> {
        let mut prompt = format!(
            "Buatkan {} soal {} untuk mata pelajaran {} kelas {}.\n\
             Topik: {}.\n\
             Tingkat Kesulitan: {}.\n\
             Level Kognitif: {}.",
            params.num_questions,
            params.quiz_type,
            params.subject,
            params.grade,
            params.topic,
            params.difficulty,
            params.cognitive_level,
        );
        if let Some(summary) = params.summary.as_deref().filter(|s| !s.is_empty()) {
            prompt.push_str(&format!(
                "\nGunakan ringkasan materi berikut sebagai acuan: {summary}"
            ));
        }

        let api_key = self.rotating_api_key(db).await?;
        let text = self
            .generate_content(
                &params.model,
                &api_key,
                &prompt,
                &system_prompt(&params.subject, &params.language),
                quiz_response_schema(),
            )
            .await?;

        serde_json::from_str(&text).map_err(AiError::Parse)
    }

    /// Reviews a generated batch. This is the one degrade-don't-fail path:
    /// any error is logged as a WARNING and the original quiz is returned
    /// untouched.
    #[instrument(level = "info", skip(self, db, quiz, subject, language), fields(n = quiz.len(), %subject))]
    pub async fn fact_check_quiz(
        &self,
        db: &Db,
        quiz: Vec<QuizQuestion>,
        subject: &str,
        language: &str,
    ) -> Vec<QuizQuestion> {
        match self.request_fact_check(db, &quiz, subject, language).await {
            Ok(checks) => merge_fact_checks(quiz, checks),
            Err(e) => {
                let _ = db
                    .add_log(LogLevel::Warning, format!("AI Fact Checker gagal: {e}"))
                    .await;
                quiz
            }
        }
    }

    async fn request_fact_check(
        &self,
        db: &Db,
        quiz: &[QuizQuestion],
        subject: &str,
        language: &str,
    ) -> Result<Vec<FactCheckResult>, AiError> {
        let data = serde_json::to_string(quiz).map_err(AiError::Parse)?;
        let prompt = format!(
            "Anda adalah pakar peninjau soal (Editor Ahli) untuk mata pelajaran {subject}.\n\
             Tugas Anda adalah memverifikasi fakta, ketepatan kunci jawaban, dan kejelasan \
             pembahasan dalam {language}.\n\
             Data soal: {data}"
        );

        let api_key = self.rotating_api_key(db).await?;
        let text = self
            .generate_content(
                FACT_CHECK_MODEL,
                &api_key,
                &prompt,
                FACT_CHECK_SYSTEM,
                fact_check_response_schema(),
            )
            .await?;

        serde_json::from_str(&text).map_err(AiError::Parse)
    }

    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
        system: &str,
        schema: Value,
    ) -> Result<String, AiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Some(Content {
                parts: vec![Part {
                    text: system.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(schema),
            }),
        };

        let response = self
            .http
            .post(&url)
            .header(USER_AGENT, "edugenius-backend/0.1")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message =
                extract_gemini_error(&body).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(AiError::Api(message));
        }

        let body: GenerateContentResponse = response.json().await?;
        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }
}

/// Merges per-question corrections into the batch by id; questions with no
/// matching correction pass through unchanged.
pub fn merge_fact_checks(
    quiz: Vec<QuizQuestion>,
    checks: Vec<FactCheckResult>,
) -> Vec<QuizQuestion> {
    quiz.into_iter()
        .map(|mut q| {
            if let Some(check) = checks.iter().find(|c| c.id == q.id) {
                q.fact_check_status = Some(check.fact_check_status);
                if check.fact_check_comment.is_some() {
                    q.fact_check_comment = check.fact_check_comment.clone();
                }
                if let Some(question) = &check.question {
                    q.question = question.clone();
                }
                if let Some(answer) = &check.answer {
                    q.answer = answer.clone();
                }
                if let Some(explanation) = &check.explanation {
                    q.explanation = explanation.clone();
                }
                if let Some(options) = &check.options {
                    q.options = Some(options.clone());
                }
            }
            q
        })
        .collect()
}

fn system_prompt(subject: &str, language: &str) -> String {
    format!(
        "You are a senior expert teacher in {subject} following the \"Kurikulum Merdeka\" \
         standard in Indonesia.\n\
         Language of Output: {language}.\n\n\
         STRICT FORMATTING FOR EXACT SCIENCES (MathJax & MS Word Compatible):\n\
         1. Use $...$ for inline formulas.\n\
         2. Use $$...$$ for display equations.\n\
         3. For Chemistry, use \\ce{{...}} (mhchem), e.g., $\\ce{{H2O}}$.\n\
         4. IMPORTANT: Keep LaTeX syntax clean and standard. Microsoft Word's Equation \
         Editor (Alt+=) often parses standard TeX better if it's simplified.\n\
         5. Avoid nested complex environments unless necessary. Use \\frac{{a}}{{b}} for \
         fractions, \\sqrt{{x}} for roots.\n\
         6. For multiplication, use \\times or \\cdot.\n\
         7. Ensure all scientific notation uses LaTeX, e.g., $6.02 \\times 10^{{23}}$.\n\n\
         Generate high-precision content that renders perfectly in both web browsers \
         (MathJax) and document editors (Word/PDF)."
    )
}

fn quiz_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "question": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "answer": { "type": "STRING" },
                "explanation": { "type": "STRING" },
                "indicator": { "type": "STRING" },
                "cognitiveLevel": { "type": "STRING" }
            },
            "required": ["id", "question", "answer", "explanation", "indicator", "cognitiveLevel"]
        }
    })
}

fn fact_check_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "factCheckStatus": { "type": "STRING" },
                "factCheckComment": { "type": "STRING" },
                "question": { "type": "STRING" },
                "answer": { "type": "STRING" },
                "explanation": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["id", "factCheckStatus"]
        }
    })
}

/// Try to extract a clean message from the service's error body.
fn extract_gemini_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    serde_json::from_str::<EWrap>(body)
        .ok()
        .map(|w| w.error.message)
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}
