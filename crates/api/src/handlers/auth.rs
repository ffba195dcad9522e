//! Admin login: `POST /api/admin/login`.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chooseme_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_admin_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::admin::ClientIp;
use crate::state::AppState;

/// Request body for `POST /api/admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub message: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// POST /api/admin/login
///
/// Wrong passwords answer 401 with the remaining attempt count; a locked
/// out client gets 429 until its lockout elapses.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let allowed = lock_throttle(&state)?.check(&ip, Instant::now());
    if let Err(e) = allowed {
        tracing::warn!(client_ip = %ip, "Login attempt from locked IP");
        return Err(e.into());
    }

    let valid = verify_password(&input.password, &state.config.admin.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !valid {
        let outcome = lock_throttle(&state)?.record_failure(&ip, Instant::now());
        tracing::warn!(client_ip = %ip, outcome = ?outcome, "Failed admin login");
        return Err(AppError::Core(CoreError::Unauthorized(outcome.message())));
    }

    lock_throttle(&state)?.record_success(&ip);
    let token = generate_admin_token(&state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!(client_ip = %ip, "Successful admin login");

    Ok(Json(LoginResponse {
        success: true,
        token,
        message: "Login successful".into(),
        expires_in: state.config.jwt.token_expiry_mins * 60,
    }))
}

fn lock_throttle(
    state: &AppState,
) -> AppResult<std::sync::MutexGuard<'_, chooseme_core::login_throttle::LoginThrottle>> {
    state
        .login_throttle
        .lock()
        .map_err(|_| AppError::InternalError("Login throttle lock poisoned".into()))
}
