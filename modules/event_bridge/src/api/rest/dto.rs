use std::fmt;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::domain::Event;
use crate::error::ApiError;

/// REST DTO for `POST /publish`. Both fields are optional; `null` counts as absent.
///
/// Field names match case-insensitively (`Topic`, `PAYLOAD`), unknown keys are
/// skipped, and when a field appears twice the last non-null value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReq {
    pub topic: Option<String>,
    pub payload: Option<String>,
}

impl<'de> Deserialize<'de> for PublishReq {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PublishReqVisitor)
    }
}

struct PublishReqVisitor;

impl<'de> Visitor<'de> for PublishReqVisitor {
    type Value = PublishReq;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object with string `topic` and `payload` fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PublishReq, A::Error> {
        let mut req = PublishReq::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = if key.eq_ignore_ascii_case("topic") {
                &mut req.topic
            } else if key.eq_ignore_ascii_case("payload") {
                &mut req.payload
            } else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };
            // null leaves an earlier value in place
            if let Some(value) = map.next_value::<Option<String>>()? {
                *slot = Some(value);
            }
        }
        Ok(req)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDto {
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub service: String,
}

impl From<PublishReq> for Event {
    fn from(req: PublishReq) -> Self {
        Event::new(req.topic.unwrap_or_default(), req.payload.unwrap_or_default())
    }
}

/// Decode a raw request body into an [`Event`]. The content type is not
/// checked. Only the first JSON value is read; bytes after it are ignored.
/// A top-level `null` is an empty event.
pub fn decode_event(body: &[u8]) -> Result<Event, ApiError> {
    let first = serde_json::Deserializer::from_slice(body)
        .into_iter::<Option<PublishReq>>()
        .next()
        .ok_or_else(|| ApiError::BadRequest("empty request body".to_owned()))?;
    let req = first.map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(req.unwrap_or_default().into())
}
