// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        api_key::{AddApiKeyRequest, ApiKey, BulkUploadRequest},
        log::LogLevel,
        settings::{SiteSettings, TestConnectionRequest},
        user::{CreateUserRequest, UpdateUserRequest, User, UserResponse},
    },
    state::AppState,
    utils::{hash::hash_password, jwt::Claims},
};

/// The built-in bootstrap account; it cannot be deleted.
const PROTECTED_USER_ID: &str = "admin";

// --- API keys ---

/// Lists all generation credentials with their usage counters.
/// Admin only.
pub async fn list_api_keys(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.get_api_keys().await?))
}

/// Registers a single key.
/// Admin only.
pub async fn add_api_key(
    State(state): State<AppState>,
    Json(payload): Json<AddApiKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let key = payload.key.trim().to_string();
    let mut keys = state.db.get_api_keys().await?;
    if keys.iter().any(|k| k.key == key) {
        return Err(AppError::Conflict("API key sudah terdaftar.".to_string()));
    }

    keys.push(ApiKey::new(key));
    state.db.save_api_keys(&keys).await?;
    state
        .db
        .add_log(LogLevel::Info, "Menambahkan API Key baru secara manual.")
        .await?;

    Ok((StatusCode::CREATED, Json(keys)))
}

/// Bulk upload: one key per line, short lines discarded. Already-known keys
/// are skipped.
/// Admin only.
pub async fn upload_api_keys(
    State(state): State<AppState>,
    Json(payload): Json<BulkUploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut keys = state.db.get_api_keys().await?;
    let mut added = 0usize;

    for line in payload.text.lines() {
        let candidate = line.trim();
        if candidate.len() <= 5 {
            continue;
        }
        if keys.iter().any(|k| k.key == candidate) {
            continue;
        }
        keys.push(ApiKey::new(candidate));
        added += 1;
    }

    state.db.save_api_keys(&keys).await?;
    state
        .db
        .add_log(
            LogLevel::Info,
            format!("Berhasil upload {added} API Keys via file."),
        )
        .await?;

    Ok(Json(json!({ "added": added, "total": keys.len() })))
}

/// Zeroes every usage counter.
/// Admin only.
pub async fn reset_api_key_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut keys = state.db.get_api_keys().await?;
    for key in &mut keys {
        key.usage_count = 0;
    }
    state.db.save_api_keys(&keys).await?;
    state
        .db
        .add_log(LogLevel::Info, "Statistik API Keys telah direset.")
        .await?;

    Ok(Json(keys))
}

/// Removes a key. Unknown keys are a no-op.
/// Admin only.
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut keys = state.db.get_api_keys().await?;
    keys.retain(|k| k.key != key);
    state.db.save_api_keys(&keys).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Users ---

/// Lists all accounts, without credential hashes.
/// Admin only.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.db.get_users().await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

/// Creates a new account with a hashed password.
/// Admin only.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = payload.username.trim().to_lowercase();
    let users = state.db.get_users().await?;
    if users.iter().any(|u| u.username == username) {
        return Err(AppError::Conflict(format!(
            "Username '{username}' already exists"
        )));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        name: payload.name,
        role: payload.role,
        active: true,
        password: hash_password(&payload.password)?,
    };
    state.db.save_user(&user).await?;
    state
        .db
        .add_log(
            LogLevel::Info,
            format!("Menambahkan user baru: {} ({})", user.name, user.username),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Bulk upload of `username,name,password` lines. Malformed lines and
/// already-taken usernames are skipped.
/// Admin only.
pub async fn upload_users(
    State(state): State<AppState>,
    Json(payload): Json<BulkUploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut existing: Vec<String> = state
        .db
        .get_users()
        .await?
        .into_iter()
        .map(|u| u.username)
        .collect();
    let mut added = 0usize;

    for line in payload.text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, ',');
        let (Some(username), Some(name), Some(password)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let username = username.trim().to_lowercase();
        if username.is_empty() || existing.iter().any(|u| *u == username) {
            continue;
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.clone(),
            name: name.trim().to_string(),
            role: crate::models::user::UserRole::Guru,
            active: true,
            password: hash_password(password.trim())?,
        };
        state.db.save_user(&user).await?;
        existing.push(username);
        added += 1;
    }

    state
        .db
        .add_log(
            LogLevel::Info,
            format!("Berhasil upload bulk user. Total user: {}", existing.len()),
        )
        .await?;

    Ok(Json(json!({ "added": added, "total": existing.len() })))
}

/// Partially updates an account (name, role, active flag, password).
/// Admin only.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.db.get_users().await?;
    let mut user = users
        .into_iter()
        .find(|u| u.id == id)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = payload.name {
        user.name = name;
    }
    if let Some(role) = payload.role {
        user.role = role;
    }
    if let Some(active) = payload.active {
        user.active = active;
    }
    if let Some(password) = payload.password {
        user.password = hash_password(&password)?;
    }

    state.db.save_user(&user).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Deletes an account.
/// Admin only. The built-in admin and the caller's own account are refused.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if id == PROTECTED_USER_ID {
        return Err(AppError::BadRequest(
            "Akun admin utama tidak dapat dihapus.".to_string(),
        ));
    }
    if id == claims.sub {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    state.db.delete_user(&id).await?;
    state
        .db
        .add_log(LogLevel::Warning, format!("Menghapus user ID: {id}"))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// --- Settings ---

/// Returns the settings singleton.
/// Admin only.
pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.get_settings().await?))
}

/// Overwrites the settings singleton wholesale and rebuilds the storage
/// backend from the (possibly changed) remote credentials.
/// Admin only.
pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<SiteSettings>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = settings.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if let Some(url) = settings.remote_url() {
        if Url::parse(url).is_err() {
            return Err(AppError::BadRequest("URL Database tidak valid.".to_string()));
        }
    }

    state.db.save_settings(&settings).await?;
    state
        .db
        .add_log(LogLevel::Info, "Pengaturan situs & Database telah diperbarui.")
        .await?;

    Ok(Json(
        json!({ "connectionType": state.db.connection_type().await }),
    ))
}

/// Probes a candidate remote backend without switching to it.
/// Admin only.
pub async fn test_connection(
    State(state): State<AppState>,
    Json(payload): Json<TestConnectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.db.test_connection(&payload.url, &payload.token).await;
    Ok(Json(result))
}

// --- Logs ---

/// Lists the system log, newest first.
/// Admin only.
pub async fn list_logs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.get_logs().await?))
}

/// Clears the system log, leaving a single WARNING marker behind.
/// Admin only.
pub async fn clear_logs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.clear_logs().await?;
    state
        .db
        .add_log(
            LogLevel::Warning,
            "Seluruh log sistem telah dibersihkan oleh Administrator.",
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
