use playground_core::ChangeKind;
use serde_json::Value;

use crate::adapters::change_sink::ChangeSink;
use crate::event::StreamEventError;
use crate::handlers::stream::{handle_stream_event, StreamBatchResponse};

/// Handles a batch of modified records; both images are required.
pub fn handle_update_event(
    payload: Value,
    sink: &impl ChangeSink,
) -> Result<StreamBatchResponse, StreamEventError> {
    handle_stream_event(ChangeKind::Modify, payload, sink)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handlers::stream::test_support::{image, payload, record, RecordingSink};

    #[test]
    fn passes_old_and_new_images() {
        let sink = RecordingSink::new();
        let response = handle_update_event(
            payload(vec![record(
                "MODIFY",
                "200",
                json!({
                    "Keys": image("p-1", None),
                    "OldImage": image("p-1", None),
                    "NewImage": image("p-1", Some("Ana"))
                }),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert!(response.is_success());
        assert_eq!(sink.changes(), vec![r#"modify p-1 None -> Some("Ana")"#]);
    }

    #[test]
    fn missing_old_image_fails_the_record() {
        let sink = RecordingSink::new();
        let response = handle_update_event(
            payload(vec![record(
                "MODIFY",
                "201",
                json!({"Keys": image("p-1", None), "NewImage": image("p-1", Some("Ana"))}),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert_eq!(response.batch_item_failures.len(), 1);
        assert_eq!(response.batch_item_failures[0].item_identifier, "201");
    }

    #[test]
    fn malformed_new_image_fails_the_record() {
        let sink = RecordingSink::new();
        let response = handle_update_event(
            payload(vec![record(
                "MODIFY",
                "202",
                json!({
                    "OldImage": image("p-1", None),
                    "NewImage": {"id": {"S": "p-1"}, "cpf": {"N": "7"}}
                }),
            )]),
            &sink,
        )
        .expect("event should decode");

        assert!(!response.is_success());
        assert!(sink.changes().is_empty());
    }
}
