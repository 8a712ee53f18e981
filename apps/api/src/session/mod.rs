// Per-request session context.
//
// The client sends an opaque `x-session-id`; its preferences live in Redis
// under that id. Admin status is never taken from the client: it is an
// opaque bearer token issued by `POST /api/v1/admin/login` after a
// server-side password check, and looked up on every request.

pub mod handlers;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::prefs::{keys, Prefs};
use crate::redis_conn::SharedRedis;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub async fn load(prefs: &Prefs) -> Self {
        prefs
            .get(keys::THEME)
            .await
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub async fn store(self, prefs: &Prefs) {
        prefs.set(keys::THEME, self.as_str()).await;
    }
}

/// Explicit per-request state handed to the handlers that need it.
#[derive(Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub is_admin: bool,
    pub prefs: Prefs,
}

impl SessionContext {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if !valid_session_id(raw) {
        return Err(AppError::Validation(format!(
            "Missing or malformed {SESSION_HEADER} header"
        )));
    }
    Ok(raw.to_string())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = session_id_from_headers(&parts.headers)?;

        let is_admin = match bearer_token(&parts.headers) {
            Some(token) => admin_token_is_valid(&state.redis, token)
                .await
                .unwrap_or_else(|e| {
                    warn!("Could not verify admin token: {e}");
                    false
                }),
            None => false,
        };

        Ok(SessionContext {
            prefs: state.prefs_for(&session_id),
            session_id,
            is_admin,
        })
    }
}

/// Compares against the configured admin password. Length is checked first
/// and the byte comparison does not short-circuit.
pub fn verify_admin_password(config: &Config, candidate: &str) -> bool {
    let expected = config.admin_password.as_bytes();
    let candidate = candidate.as_bytes();
    if expected.is_empty() || expected.len() != candidate.len() {
        return false;
    }
    expected
        .iter()
        .zip(candidate)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn admin_token_key(token: &str) -> String {
    format!("admin_token:{token}")
}

pub async fn issue_admin_token(shared: &SharedRedis, ttl_secs: u64) -> redis::RedisResult<String> {
    let token = Uuid::new_v4().to_string();
    let mut conn = shared.connection().await?;
    redis::cmd("SET")
        .arg(admin_token_key(&token))
        .arg(1)
        .arg("EX")
        .arg(ttl_secs)
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(token)
}

pub async fn admin_token_is_valid(shared: &SharedRedis, token: &str) -> redis::RedisResult<bool> {
    let mut conn = shared.connection().await?;
    conn.exists(admin_token_key(token)).await
}

pub async fn revoke_admin_token(shared: &SharedRedis, token: &str) -> redis::RedisResult<()> {
    let mut conn = shared.connection().await?;
    conn.del(admin_token_key(token)).await
}
