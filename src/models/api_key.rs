// src/models/api_key.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credential state. Keys are never flipped to FAILED automatically; only an
/// admin action changes status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiKeyStatus {
    Active,
    Failed,
}

/// One external-service API credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub key: String,

    pub status: ApiKeyStatus,

    /// Incremented by exactly one each time the rotation picks this key.
    pub usage_count: i64,
}

impl ApiKey {
    /// A freshly registered key: active, never used.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: ApiKeyStatus::Active,
            usage_count: 0,
        }
    }
}

/// DTO for registering a single key.
#[derive(Debug, Deserialize, Validate)]
pub struct AddApiKeyRequest {
    #[validate(length(min = 6, max = 200, message = "API key is too short."))]
    pub key: String,
}

/// DTO for the bulk text upload (one key per line).
#[derive(Debug, Deserialize)]
pub struct BulkUploadRequest {
    pub text: String,
}
