use playground_core::ChangeKind;
use serde_json::Value;

use crate::adapters::change_sink::ChangeSink;
use crate::event::StreamEventError;
use crate::handlers::stream::{handle_stream_event, StreamBatchResponse};

/// Handles a batch of removed records. The key comes from the old image
/// when present, otherwise from the record keys.
pub fn handle_delete_event(
    payload: Value,
    sink: &impl ChangeSink,
) -> Result<StreamBatchResponse, StreamEventError> {
    handle_stream_event(ChangeKind::Remove, payload, sink)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handlers::stream::test_support::{image, payload, record, RecordingSink};

    #[test]
    fn removes_with_old_image() {
        let sink = RecordingSink::new();
        let response = handle_delete_event(
            payload(vec![record(
                "REMOVE",
                "300",
                json!({"Keys": image("p-1", None), "OldImage": image("p-1", Some("Ana"))}),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec!["remove p-1 with_image=true"]);
    }

    #[test]
    fn falls_back_to_keys_without_old_image() {
        let sink = RecordingSink::new();
        let response = handle_delete_event(
            payload(vec![record("REMOVE", "301", json!({"Keys": image("p-2", None)}))]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec!["remove p-2 with_image=false"]);
    }

    #[test]
    fn keys_without_sort_key_fail_the_record() {
        let sink = RecordingSink::new();
        let response = handle_delete_event(
            payload(vec![record(
                "REMOVE",
                "302",
                json!({"Keys": {"id": {"S": "p-3"}}}),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert_eq!(response.batch_item_failures[0].item_identifier, "302");
    }
}
