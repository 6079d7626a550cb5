#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
};
use event_bridge::{EventBridge, EventBridgeConfig, EventPublisher, PublishError};

/// In-memory channel: records every publish and optionally fails them.
#[derive(Default)]
pub struct FakeChannel {
    calls: Mutex<Vec<(String, String)>>,
    fail_with: Mutex<Option<String>>,
}

impl FakeChannel {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Mutex::new(Some(message.to_owned())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for FakeChannel {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_owned(), payload.to_owned()));
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(PublishError::channel(message)),
            None => Ok(()),
        }
    }
}

pub fn bridge_with(channel: Arc<FakeChannel>) -> EventBridge {
    bridge_with_config(channel, EventBridgeConfig::default())
}

pub fn bridge_with_config(channel: Arc<FakeChannel>, config: EventBridgeConfig) -> EventBridge {
    EventBridge::new(config, channel)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
