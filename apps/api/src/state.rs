use std::sync::Arc;

use crate::config::Config;
use crate::intake::validation::IntakeRules;
use crate::prefs::redis_store::RedisKeyValueStore;
use crate::prefs::Prefs;
use crate::redis_conn::SharedRedis;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Jobs and applications. Postgres in production.
    pub store: Arc<dyn RecordStore>,
    /// Per-session preferences and admin tokens.
    pub redis: SharedRedis,
    pub config: Config,
}

impl AppState {
    pub fn prefs_for(&self, session_id: &str) -> Prefs {
        Prefs::new(Arc::new(RedisKeyValueStore::for_session(
            self.redis.clone(),
            session_id,
            self.config.session_ttl_secs,
        )))
    }

    pub fn intake_rules(&self) -> IntakeRules {
        IntakeRules {
            min_intro_length: self.config.min_intro_length,
        }
    }
}
