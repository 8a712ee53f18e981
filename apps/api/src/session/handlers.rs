use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::session::{
    bearer_token, issue_admin_token, revoke_admin_token, verify_admin_password, SessionContext,
    Theme,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: String,
}

/// POST /api/v1/admin/login
pub async fn handle_admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !verify_admin_password(&state.config, &req.password) {
        warn!("Rejected admin login attempt");
        return Err(AppError::Unauthorized("Incorrect admin password.".to_string()));
    }

    let ttl = state.config.admin_token_ttl_secs;
    let token = issue_admin_token(&state.redis, ttl)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Could not issue admin token: {e}")))?;
    info!("Admin session started");

    Ok(Json(LoginResponse {
        token,
        expires_in: ttl,
    }))
}

/// POST /api/v1/admin/logout
pub async fn handle_admin_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    if let Some(token) = bearer_token(&headers) {
        revoke_admin_token(&state.redis, token)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Could not revoke admin token: {e}")))?;
        info!("Admin session ended");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/session/theme
pub async fn handle_get_theme(session: SessionContext) -> Json<ThemeBody> {
    let theme = Theme::load(&session.prefs).await;
    Json(ThemeBody {
        theme: theme.as_str().to_string(),
    })
}

/// PUT /api/v1/session/theme
pub async fn handle_put_theme(
    session: SessionContext,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, AppError> {
    let theme = Theme::parse(&body.theme)
        .ok_or_else(|| AppError::Validation("theme must be 'dark' or 'light'".to_string()))?;
    theme.store(&session.prefs).await;
    Ok(Json(ThemeBody {
        theme: theme.as_str().to_string(),
    }))
}
