use std::sync::Arc;

use axum::{body::Bytes, extract::rejection::BytesRejection, response::Json, Extension};
use tracing::debug;

use crate::api::rest::dto::{decode_event, PublishedDto};
use crate::domain::service::BridgeService;
use crate::error::ApiError;

/// Decode one event and forward it. Decode failures never reach the channel.
pub async fn publish(
    Extension(svc): Extension<Arc<BridgeService>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PublishedDto>, ApiError> {
    let body = body.map_err(|rejection| ApiError::Rejected {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let event = decode_event(&body)?;
    debug!(payload_len = event.payload.len(), "publish request decoded");

    svc.publish(event).await?;
    Ok(Json(PublishedDto { published: true }))
}
