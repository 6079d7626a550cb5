use crate::api::rest::handlers;
use crate::domain::service::BridgeService;
use crate::web;
use axum::{routing::post, Extension, Router};
use std::sync::Arc;

/// Register the publish route. Methods other than POST get a JSON 405.
pub fn register_routes(router: Router, service: Arc<BridgeService>) -> Router {
    router
        .route(
            "/publish",
            post(handlers::publish).fallback(web::method_not_allowed),
        )
        .layer(Extension(service))
}
