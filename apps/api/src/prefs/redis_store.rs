use async_trait::async_trait;
use redis::Cmd;

use super::{KeyValueStore, LocalStoreError};
use crate::redis_conn::SharedRedis;

/// Redis-backed store; every key is namespaced under `session:{id}:`.
///
/// Keys expire `ttl_secs` after they were last read or written, so a
/// session that stops coming back is dropped.
pub struct RedisKeyValueStore {
    redis: SharedRedis,
    namespace: String,
    ttl_secs: u64,
}

impl RedisKeyValueStore {
    pub fn for_session(redis: SharedRedis, session_id: &str, ttl_secs: u64) -> Self {
        Self {
            redis,
            namespace: format!("session:{session_id}"),
            ttl_secs,
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{key}", self.namespace)
    }

    fn get_cmd(&self, key: &str) -> Cmd {
        let mut cmd = redis::cmd("GETEX");
        cmd.arg(self.key(key)).arg("EX").arg(self.ttl_secs);
        cmd
    }

    fn set_cmd(&self, key: &str, value: &str) -> Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(key)).arg(value).arg("EX").arg(self.ttl_secs);
        cmd
    }

    fn remove_cmd(&self, key: &str) -> Cmd {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(self.key(key));
        cmd
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let mut conn = self.redis.connection().await?;
        let value = self
            .get_cmd(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut conn = self.redis.connection().await?;
        self.set_cmd(key, value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        let mut conn = self.redis.connection().await?;
        self.remove_cmd(key).query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use redis::Client;

    use super::*;

    fn store() -> RedisKeyValueStore {
        let client = Client::open("redis://127.0.0.1/").unwrap();
        RedisKeyValueStore::for_session(SharedRedis::new(client), "abc-123", 3600)
    }

    fn packed(cmd: &Cmd) -> String {
        String::from_utf8(cmd.get_packed_command()).unwrap()
    }

    #[test]
    fn test_keys_are_namespaced_per_session() {
        assert_eq!(store().key("savedJobs"), "session:abc-123:savedJobs");
    }

    #[test]
    fn test_writes_carry_the_session_ttl() {
        let set = packed(&store().set_cmd("theme", "light"));
        assert!(set.contains("SET"));
        assert!(set.contains("session:abc-123:theme"));
        assert!(set.contains("light"));
        assert!(set.contains("EX"));
        assert!(set.contains("3600"));
    }

    #[test]
    fn test_reads_refresh_the_ttl() {
        let get = packed(&store().get_cmd("savedJobs"));
        assert!(get.contains("GETEX"));
        assert!(get.contains("session:abc-123:savedJobs"));
        assert!(get.contains("3600"));
    }
}
