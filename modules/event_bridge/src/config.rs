use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SERVICE_NAME: &str = "mesh-bridge";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Event bridge configuration, read from `modules.event_bridge`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventBridgeConfig {
    /// Name reported by `GET /health`.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Pub/sub connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Upper bound for a single publish call; unset waits on the channel client.
    #[serde(default, with = "humantime_serde")]
    pub publish_timeout: Option<Duration>,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Request body cap in bytes; unset means no cap.
    #[serde(default)]
    pub body_limit_bytes: Option<usize>,
}

impl Default for EventBridgeConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            redis_url: default_redis_url(),
            publish_timeout: None,
            cors_enabled: false,
            body_limit_bytes: None,
        }
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}
