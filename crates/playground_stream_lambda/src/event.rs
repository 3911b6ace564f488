use chrono::{DateTime, Utc};
use playground_core::{ChangeKind, Image};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DYNAMODB_EVENT_SOURCE: &str = "aws:dynamodb";

#[derive(Debug, thiserror::Error)]
pub enum StreamEventError {
    #[error("stream event must include a Records array")]
    MissingRecords,
    #[error("record {index} comes from '{source_name}', expected aws:dynamodb")]
    UnexpectedSource { index: usize, source_name: String },
    #[error("invalid DynamoDB stream event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Batch of change records delivered to one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StreamRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventSource", default)]
    pub event_source: String,
    #[serde(rename = "eventSourceARN", default, skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    #[serde(rename = "awsRegion", default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    pub dynamodb: StreamChange,
}

/// The `dynamodb` section of a stream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamChange {
    #[serde(default)]
    pub keys: Image,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Image>,
    pub sequence_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<String>,
    /// Seconds since the epoch, possibly fractional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_creation_date_time: Option<f64>,
}

impl StreamRecord {
    pub fn change_kind(&self) -> Option<ChangeKind> {
        self.event_name.parse().ok()
    }

    pub fn sequence_number(&self) -> &str {
        &self.dynamodb.sequence_number
    }

    pub fn approximate_creation_time(&self) -> Option<DateTime<Utc>> {
        let seconds = self.dynamodb.approximate_creation_date_time?;
        if !seconds.is_finite() {
            return None;
        }
        let whole = seconds.trunc() as i64;
        let nanos = ((seconds - seconds.trunc()) * 1_000_000_000.0).round() as u32;
        DateTime::from_timestamp(whole, nanos.min(999_999_999))
    }
}

/// Decodes an invocation payload, rejecting records from other sources.
pub fn decode_stream_event(payload: Value) -> Result<StreamEvent, StreamEventError> {
    if payload.get("Records").and_then(Value::as_array).is_none() {
        return Err(StreamEventError::MissingRecords);
    }

    let event: StreamEvent = serde_json::from_value(payload)?;
    if let Some((index, record)) = event
        .records
        .iter()
        .enumerate()
        .find(|(_, record)| record.event_source != DYNAMODB_EVENT_SOURCE)
    {
        return Err(StreamEventError::UnexpectedSource {
            index,
            source_name: record.event_source.clone(),
        });
    }

    Ok(event)
}
