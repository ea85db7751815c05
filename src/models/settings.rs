// src/models/settings.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Singleton site configuration record.
///
/// Read at startup and on demand, overwritten wholesale on save. The optional
/// `dbUrl`/`dbToken` pair selects the remote backend; everything else is site
/// identity and feature toggles surfaced in the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    #[validate(length(min = 1, max = 100))]
    pub site_name: String,

    #[validate(length(max = 300))]
    pub seo_description: String,

    pub timezone: String,

    pub is_maintenance: bool,

    pub auto_rotation: bool,

    /// When enabled, every generation result goes through a second
    /// fact-check pass before being stored.
    pub ai_fact_checker: bool,

    #[validate(range(min = 1, max = 1000))]
    pub tasks_per_hour: u32,

    /// Seconds between queued tasks, as displayed in the panel.
    #[validate(range(min = 0, max = 3600))]
    pub delay_between_tasks: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_identity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots_txt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_xml: Option<String>,

    /// Remote database URL. Presence of a non-empty value activates the
    /// remote backend on the next (re)initialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_token: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "EduGenius AI".to_string(),
            seo_description: "Pembuat soal otomatis terbaik di Indonesia.".to_string(),
            timezone: "Asia/Jakarta".to_string(),
            is_maintenance: false,
            auto_rotation: true,
            ai_fact_checker: true,
            tasks_per_hour: 10,
            delay_between_tasks: 60,
            site_identity: None,
            robots_txt: None,
            sitemap_xml: None,
            db_url: None,
            db_token: None,
        }
    }
}

impl SiteSettings {
    /// The configured remote URL, treating an empty string as unset.
    pub fn remote_url(&self) -> Option<&str> {
        self.db_url.as_deref().filter(|u| !u.is_empty())
    }
}

/// DTO for probing a candidate remote backend without activating it.
#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    pub url: String,
    #[serde(default)]
    pub token: String,
}

/// Result of a connection probe.
#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
}
