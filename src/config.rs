// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// File path of the local fallback store.
    pub database_path: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Optional seed account created when the user table is empty.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Default generation key used when no stored key is ACTIVE. May be
    /// empty when the variable is absent.
    pub gemini_api_key: String,
    pub gemini_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "edugenius.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        Self {
            database_path,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            gemini_api_key,
            gemini_base_url,
        }
    }
}
