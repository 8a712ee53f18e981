use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{Client, RedisResult};
use tokio::sync::OnceCell;
use tracing::info;

/// One reconnecting redis connection shared by every request.
///
/// Opened on first use, so building `AppState` never touches the network.
#[derive(Clone)]
pub struct SharedRedis {
    client: Client,
    manager: Arc<OnceCell<ConnectionManager>>,
}

impl SharedRedis {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            manager: Arc::new(OnceCell::new()),
        }
    }

    /// A handle onto the shared connection. Clones are cheap and multiplex
    /// over the same socket.
    pub async fn connection(&self) -> RedisResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                info!("Redis connection established");
                Ok::<_, redis::RedisError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}
