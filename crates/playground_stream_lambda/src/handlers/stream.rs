use std::time::Instant;

use playground_core::{ChangeKind, Image, PersonRecord, RecordKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::change_sink::ChangeSink;
use crate::event::{decode_stream_event, StreamEvent, StreamEventError, StreamRecord};

/// Partial batch response. Listed sequence numbers are redelivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

impl StreamBatchResponse {
    pub fn is_success(&self) -> bool {
        self.batch_item_failures.is_empty()
    }

    fn fail(&mut self, record: &StreamRecord) {
        self.batch_item_failures.push(BatchItemFailure {
            item_identifier: record.sequence_number().to_string(),
        });
    }
}

/// Decodes the invocation payload and applies its records of `kind`.
pub fn handle_stream_event(
    kind: ChangeKind,
    payload: Value,
    sink: &impl ChangeSink,
) -> Result<StreamBatchResponse, StreamEventError> {
    let event = decode_stream_event(payload)?;
    Ok(process_stream_batch(kind, &event, sink))
}

/// Applies records in stream order.
///
/// Records of another kind are skipped. The first record that fails to
/// decode or apply is reported together with every record after it, since
/// the shard is retried from the lowest failed sequence number and later
/// records must not be applied ahead of it.
pub fn process_stream_batch(
    kind: ChangeKind,
    event: &StreamEvent,
    sink: &impl ChangeSink,
) -> StreamBatchResponse {
    let started_at = Instant::now();
    let mut response = StreamBatchResponse::default();
    let mut applied = 0usize;
    let mut skipped = 0usize;

    tracing::info!(
        component = "stream_handler",
        event = "batch_started",
        kind = %kind,
        records = event.records.len(),
        "processing stream batch"
    );

    let mut records = event.records.iter();
    for record in records.by_ref() {
        if record.change_kind() != Some(kind) {
            skipped += 1;
            tracing::warn!(
                component = "stream_handler",
                event = "record_skipped",
                kind = %kind,
                event_id = %record.event_id,
                event_name = %record.event_name,
                sequence_number = record.sequence_number(),
                "record does not match the handler's change kind"
            );
            continue;
        }

        match apply_record(kind, record, sink) {
            Ok(()) => applied += 1,
            Err(error) => {
                tracing::error!(
                    component = "stream_handler",
                    event = "record_failed",
                    kind = %kind,
                    event_id = %record.event_id,
                    sequence_number = record.sequence_number(),
                    error = %error,
                    "failed to apply stream record"
                );
                response.fail(record);
                break;
            }
        }
    }
    for remaining in records {
        response.fail(remaining);
    }

    tracing::info!(
        component = "stream_handler",
        event = "batch_completed",
        kind = %kind,
        applied,
        skipped,
        failed = response.batch_item_failures.len(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "stream batch processed"
    );

    response
}

fn apply_record(
    kind: ChangeKind,
    record: &StreamRecord,
    sink: &impl ChangeSink,
) -> Result<(), String> {
    let change = &record.dynamodb;
    match kind {
        ChangeKind::Insert => {
            let new = decode_image(change.new_image.as_ref(), "NewImage", kind)?;
            sink.record_inserted(&new)
        }
        ChangeKind::Modify => {
            let old = decode_image(change.old_image.as_ref(), "OldImage", kind)?;
            let new = decode_image(change.new_image.as_ref(), "NewImage", kind)?;
            sink.record_modified(&old, &new)
        }
        ChangeKind::Remove => {
            let old = change
                .old_image
                .as_ref()
                .map(PersonRecord::from_image)
                .transpose()
                .map_err(|error| format!("invalid OldImage: {error}"))?;
            let key = match &old {
                Some(record) => record.key(),
                None => RecordKey::from_image(&change.keys)
                    .map_err(|error| format!("invalid Keys: {error}"))?,
            };
            sink.record_removed(&key, old.as_ref())
        }
    }
}

fn decode_image(
    image: Option<&Image>,
    name: &str,
    kind: ChangeKind,
) -> Result<PersonRecord, String> {
    let image = image.ok_or_else(|| {
        format!("{kind} record is missing {name}; the stream must carry record images")
    })?;
    PersonRecord::from_image(image).map_err(|error| format!("invalid {name}: {error}"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;

    /// Records every change it receives; fails for ids listed in `fail_ids`.
    pub struct RecordingSink {
        pub changes: Mutex<Vec<String>>,
        pub fail_ids: Vec<String>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                changes: Mutex::new(Vec::new()),
                fail_ids: Vec::new(),
            }
        }

        pub fn failing_on(id: &str) -> Self {
            Self {
                fail_ids: vec![id.to_string()],
                ..Self::new()
            }
        }

        pub fn changes(&self) -> Vec<String> {
            self.changes.lock().expect("poisoned mutex").clone()
        }

        fn push(&self, id: &str, change: String) -> Result<(), String> {
            if self.fail_ids.iter().any(|fail| fail == id) {
                return Err(format!("sink rejected {id}"));
            }
            self.changes.lock().expect("poisoned mutex").push(change);
            Ok(())
        }
    }

    impl ChangeSink for RecordingSink {
        fn record_inserted(&self, record: &PersonRecord) -> Result<(), String> {
            self.push(&record.id, format!("insert {}", record.id))
        }

        fn record_modified(&self, old: &PersonRecord, new: &PersonRecord) -> Result<(), String> {
            self.push(
                &new.id,
                format!(
                    "modify {} {:?} -> {:?}",
                    new.id,
                    old.nome.as_deref(),
                    new.nome.as_deref()
                ),
            )
        }

        fn record_removed(&self, key: &RecordKey, old: Option<&PersonRecord>) -> Result<(), String> {
            self.push(
                &key.id,
                format!("remove {} with_image={}", key.id, old.is_some()),
            )
        }
    }

    pub fn image(id: &str, nome: Option<&str>) -> Value {
        let mut image = json!({"id": {"S": id}, "cpf": {"S": "000"}});
        if let Some(nome) = nome {
            image["nome"] = json!({"S": nome});
        }
        image
    }

    pub fn record(kind: &str, seq: &str, dynamodb: Value) -> Value {
        let mut section = dynamodb;
        section["SequenceNumber"] = json!(seq);
        json!({
            "eventID": format!("evt-{seq}"),
            "eventName": kind,
            "eventSource": "aws:dynamodb",
            "dynamodb": section,
        })
    }

    pub fn payload(records: Vec<Value>) -> Value {
        json!({ "Records": records })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_support::*;
    use super::*;

    fn insert(seq: &str, id: &str) -> Value {
        record(
            "INSERT",
            seq,
            json!({"Keys": {}, "NewImage": image(id, Some("Ana"))}),
        )
    }

    #[test]
    fn applies_every_matching_record() {
        let sink = RecordingSink::new();
        let response = handle_stream_event(
            ChangeKind::Insert,
            payload(vec![insert("1", "a"), insert("2", "b")]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec!["insert a", "insert b"]);
    }

    #[test]
    fn skips_records_of_another_kind() {
        let sink = RecordingSink::new();
        let response = handle_stream_event(
            ChangeKind::Insert,
            payload(vec![
                record("REMOVE", "1", json!({"Keys": image("x", None)})),
                insert("2", "b"),
            ]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec!["insert b"]);
    }

    #[test]
    fn failure_reports_record_and_everything_after_it() {
        let sink = RecordingSink::failing_on("b");
        let response = handle_stream_event(
            ChangeKind::Insert,
            payload(vec![insert("1", "a"), insert("2", "b"), insert("3", "c")]),
            &sink,
        )
        .expect("event should decode");

        let failed: Vec<&str> = response
            .batch_item_failures
            .iter()
            .map(|failure| failure.item_identifier.as_str())
            .collect();
        assert_eq!(failed, vec!["2", "3"]);
        assert_eq!(sink.changes(), vec!["insert a"]);
    }

    #[test]
    fn missing_image_is_a_record_failure() {
        let sink = RecordingSink::new();
        let response = handle_stream_event(
            ChangeKind::Insert,
            payload(vec![record("INSERT", "9", json!({"Keys": image("a", None)}))]),
            &sink,
        )
        .expect("event should decode");

        assert_eq!(
            response.batch_item_failures,
            vec![BatchItemFailure {
                item_identifier: "9".to_string()
            }]
        );
        assert!(sink.changes().is_empty());
    }

    #[test]
    fn response_serializes_in_partial_batch_shape() {
        let response = StreamBatchResponse {
            batch_item_failures: vec![BatchItemFailure {
                item_identifier: "42".to_string(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&response).expect("response should serialize"),
            json!({"batchItemFailures": [{"itemIdentifier": "42"}]})
        );
    }

    #[test]
    fn empty_batch_succeeds() {
        let sink = RecordingSink::new();
        let response = handle_stream_event(ChangeKind::Remove, payload(Vec::new()), &sink)
            .expect("event should decode");

        assert!(response.is_success());
    }
}
