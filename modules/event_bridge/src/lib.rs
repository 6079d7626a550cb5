//! HTTP-to-pub/sub bridge: `POST /publish` takes one JSON event and forwards
//! it to a channel named by its topic; `GET /health` is the liveness probe.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit, http::StatusCode, middleware::from_fn, routing::get, Extension,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub mod api;
mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod request_id;
mod web;

pub use config::{EventBridgeConfig, DEFAULT_REDIS_URL, DEFAULT_SERVICE_NAME};
pub use domain::{BridgeService, Event, EventPublisher, PublishError, DEFAULT_TOPIC};
pub use infra::RedisPublisher;
pub use web::ServiceName;

/// Key of this module's section in the application config bag.
pub const MODULE_NAME: &str = "event_bridge";

/// The bridge: owns the shared publisher (through the service) and the HTTP
/// server built around it.
pub struct EventBridge {
    config: EventBridgeConfig,
    service: Arc<BridgeService>,
    request_timeout: Option<Duration>,
}

impl EventBridge {
    /// Create a bridge over any publisher implementation.
    pub fn new(config: EventBridgeConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        let service = Arc::new(BridgeService::new(publisher, config.publish_timeout));
        Self {
            config,
            service,
            request_timeout: None,
        }
    }

    /// Create a bridge publishing to Redis at `config.redis_url`.
    /// Fails when the URL cannot be turned into a client.
    pub fn with_redis(config: EventBridgeConfig) -> Result<Self> {
        let publisher = RedisPublisher::open(&config.redis_url)?;
        tracing::info!(target_url = %publisher.target(), "pub/sub channel configured");
        Ok(Self::new(config, Arc::new(publisher)))
    }

    /// Whole-request timeout; `None` (the default) disables the layer.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the HTTP router with its middleware stack.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route("/health", get(web::health_check));
        router = api::rest::routes::register_routes(router, self.service.clone());
        router = router
            .fallback(web::not_found)
            .layer(Extension(ServiceName(Arc::from(
                self.config.service_name.as_str(),
            ))));

        if let Some(timeout) = self.request_timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = match self.config.body_limit_bytes {
            Some(limit) => router.layer(DefaultBodyLimit::max(limit)),
            None => router.layer(DefaultBodyLimit::disable()),
        };

        // Outermost first: set id -> echo id -> trace span -> id into extensions
        let x_request_id = request_id::header();
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    request_id::MakeReqId,
                ))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_id::make_request_span)
                        .on_response(request_id::record_response),
                )
                .layer(from_fn(request_id::push_req_id_to_extensions)),
        )
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(&self, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
        self.serve_on(listener, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires, then drain
    /// in-flight requests.
    pub async fn serve_on(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(service = %self.config.service_name, "HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
