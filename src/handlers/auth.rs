// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use rand::Rng;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::LoginRequest,
    state::AppState,
    utils::{hash::verify_password, jwt::sign_jwt},
};

/// Outstanding challenges kept at most; the map is wiped past this point.
const CHALLENGE_CAP: usize = 1000;

const LOGIN_FAILED: &str = "Username, Password salah, atau database belum sinkron!";

/// Issues a fresh arithmetic login challenge.
///
/// Each challenge is single-use: the id is consumed by the next login
/// attempt that presents it, successful or not.
pub async fn get_challenge(State(state): State<AppState>) -> impl IntoResponse {
    let (a, b) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(1..=10), rng.gen_range(1..=10))
    };
    let id = uuid::Uuid::new_v4().to_string();

    {
        let mut challenges = state.challenges.lock().unwrap_or_else(|e| e.into_inner());
        if challenges.len() >= CHALLENGE_CAP {
            challenges.clear();
        }
        challenges.insert(id.clone(), a + b);
    }

    Json(json!({ "id": id, "question": format!("{a} + {b} = ?") }))
}

/// Authenticates a user and returns a JWT token.
///
/// The challenge answer is checked before any credential lookup; a wrong sum
/// fails the attempt regardless of username and password. Then the account
/// must exist (usernames are matched lowercased), be active, and the
/// password must verify against the stored hash.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let expected = {
        let mut challenges = state.challenges.lock().unwrap_or_else(|e| e.into_inner());
        challenges.remove(&payload.challenge_id)
    };
    if expected != Some(payload.challenge_answer) {
        return Err(AppError::AuthError("Jawaban keamanan salah!".to_string()));
    }

    let username = payload.username.trim().to_lowercase();
    let users = state.db.get_users().await?;
    let user = users
        .into_iter()
        .find(|u| u.username == username)
        .ok_or_else(|| AppError::AuthError(LOGIN_FAILED.to_string()))?;

    let password_ok =
        !user.password.is_empty() && verify_password(&payload.password, &user.password)?;
    if !user.active || !password_ok {
        return Err(AppError::AuthError(LOGIN_FAILED.to_string()));
    }

    let token = sign_jwt(
        &user.id,
        &user.username,
        user.role.as_str(),
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": user.username,
        "role": user.role,
    })))
}
