use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Built once in `main` and carried in `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    /// Admin credential. Only ever compared server-side.
    pub admin_password: String,
    pub admin_token_ttl_secs: u64,
    /// Sliding expiry for per-session preferences.
    pub session_ttl_secs: u64,
    pub min_intro_length: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            admin_password: require_env("ADMIN_PASSWORD")?,
            admin_token_ttl_secs: parse_env("ADMIN_TOKEN_TTL_SECS", 86_400)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 30 * 86_400)?,
            min_intro_length: parse_env("MIN_INTRO_LENGTH", 30)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(admin_password: &str) -> Self {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            admin_password: admin_password.to_string(),
            admin_token_ttl_secs: 60,
            session_ttl_secs: 3600,
            min_intro_length: 30,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
