use std::sync::Arc;

use axum::{response::Json, Extension};

use crate::api::rest::dto::HealthDto;
use crate::error::ApiError;

/// Name reported by the liveness probe.
#[derive(Clone, Debug)]
pub struct ServiceName(pub Arc<str>);

/// Liveness probe. Never touches the channel.
pub async fn health_check(Extension(ServiceName(name)): Extension<ServiceName>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        service: name.to_string(),
    })
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
