//! Redis adapter for the publisher port.
//!
//! The URL is parsed when the adapter is built, so a bad URL stops the
//! process before it serves anything. The TCP connection itself is opened on
//! the first publish and then shared: `ConnectionManager` multiplexes
//! concurrent commands over one socket and reconnects on its own.
//! Connect attempts are never retried in the request path; a failed first
//! connect is reported to that caller and the next publish tries again.

use anyhow::Context;
use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    Client,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use url::Url;

use crate::domain::ports::{EventPublisher, PublishError};

pub struct RedisPublisher {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    target: String,
}

impl RedisPublisher {
    /// Build the client from a connection URL such as `redis://localhost:6379/0`.
    pub fn open(url: &str) -> anyhow::Result<Self> {
        let target = redact_url(url);
        let client = Client::open(url)
            .with_context(|| format!("Invalid pub/sub connection URL '{target}'"))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            target,
        })
    }

    /// Connection URL with any password masked, safe for logs.
    pub fn target(&self) -> &str {
        &self.target
    }

    async fn connection(&self) -> Result<ConnectionManager, PublishError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new().set_number_of_retries(0);
                let manager =
                    ConnectionManager::new_with_config(self.client.clone(), config).await?;
                info!(target_url = %self.target, "connected to pub/sub channel");
                Ok::<_, redis::RedisError>(manager)
            })
            .await
            .map_err(|e| PublishError::channel(e.to_string()))?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    #[instrument(
        name = "event_bridge.redis.publish",
        skip_all,
        fields(target_url = %self.target, topic = %topic)
    )]
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        let mut conn = self.connection().await?;
        let receivers: usize = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| PublishError::channel(e.to_string()))?;
        debug!(receivers, "PUBLISH acknowledged");
        Ok(())
    }
}

/// Mask the password of a connection URL; unparseable input is returned as-is
/// so the client's own error can describe it.
fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}
