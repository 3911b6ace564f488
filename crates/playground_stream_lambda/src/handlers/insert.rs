use playground_core::ChangeKind;
use serde_json::Value;

use crate::adapters::change_sink::ChangeSink;
use crate::event::StreamEventError;
use crate::handlers::stream::{handle_stream_event, StreamBatchResponse};

/// Handles a batch of newly created records.
pub fn handle_insert_event(
    payload: Value,
    sink: &impl ChangeSink,
) -> Result<StreamBatchResponse, StreamEventError> {
    handle_stream_event(ChangeKind::Insert, payload, sink)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handlers::stream::test_support::{image, payload, record, RecordingSink};

    #[test]
    fn inserts_record_from_new_image() {
        let sink = RecordingSink::new();
        let response = handle_insert_event(
            payload(vec![record(
                "INSERT",
                "100",
                json!({"Keys": image("p-1", None), "NewImage": image("p-1", Some("Ana"))}),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec!["insert p-1"]);
    }

    #[test]
    fn rejects_non_stream_payload() {
        let sink = RecordingSink::new();
        let error = handle_insert_event(json!({"body": "{}"}), &sink)
            .expect_err("payload without records should fail");

        assert!(matches!(error, StreamEventError::MissingRecords));
    }
}
