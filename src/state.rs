// src/state.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::FromRef;

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::store::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub config: Config,
    pub gemini: GeminiClient,
    /// Outstanding login challenges: challenge id -> expected sum.
    pub challenges: Arc<Mutex<HashMap<String, i64>>>,
}

impl AppState {
    pub fn new(db: Arc<Db>, config: Config) -> Self {
        let gemini = GeminiClient::from_config(&config);
        Self {
            db,
            config,
            gemini,
            challenges: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Db> {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for GeminiClient {
    fn from_ref(state: &AppState) -> Self {
        state.gemini.clone()
    }
}
