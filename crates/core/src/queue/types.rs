//! Types shared by the queue module.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::QueueError;

/// Opaque token used to acknowledge (delete) a queue message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckToken(String);

impl AckToken {
    /// Wraps a raw receipt token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One object-landed notification: the storage location to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Bucket the object landed in.
    pub bucket: String,
    /// Object key, percent-decoded.
    pub key: String,
    /// Size of the object in bytes, as reported by the event.
    pub size: u64,
    /// When the object landed, if the event carried a timestamp.
    pub event_time: Option<DateTime<Utc>>,
}

/// A received queue message: one notification plus its acknowledgment token.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub notification: Notification,
    pub ack_token: AckToken,
}

#[derive(Deserialize)]
struct EventBody {
    #[serde(rename = "Records", default)]
    records: Vec<EventRecord>,
}

#[derive(Deserialize)]
struct EventRecord {
    #[serde(rename = "eventTime")]
    event_time: Option<DateTime<Utc>>,
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Deserialize)]
struct ObjectEntity {
    key: String,
    #[serde(default)]
    size: u64,
}

/// Parses a storage-event message body into notifications.
///
/// Event documents carry a `Records` array; object keys arrive
/// percent-encoded with spaces as `+` and are decoded here. A body with no
/// usable records is malformed.
pub fn parse_notification_body(body: &str) -> Result<Vec<Notification>, QueueError> {
    let event: EventBody =
        serde_json::from_str(body).map_err(|e| QueueError::malformed(e.to_string()))?;

    if event.records.is_empty() {
        return Err(QueueError::malformed("no records in event body"));
    }

    let mut notifications = Vec::with_capacity(event.records.len());
    for record in event.records {
        let raw_key = record.s3.object.key.replace('+', " ");
        let key = urlencoding::decode(&raw_key)
            .map_err(|e| QueueError::malformed(format!("undecodable object key: {}", e)))?
            .into_owned();

        notifications.push(Notification {
            bucket: record.s3.bucket.name,
            key,
            size: record.s3.object.size,
            event_time: record.event_time,
        });
    }

    Ok(notifications)
}
