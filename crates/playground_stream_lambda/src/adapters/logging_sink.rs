use playground_core::{PersonRecord, RecordKey};
use serde_json::Value;

use crate::adapters::change_sink::ChangeSink;

const COMPONENT: &str = "stream_handler";

/// Emits one structured log event per change.
#[derive(Debug, Clone, Default)]
pub struct LoggingChangeSink {
    request_id: String,
}

impl LoggingChangeSink {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

impl ChangeSink for LoggingChangeSink {
    fn record_inserted(&self, record: &PersonRecord) -> Result<(), String> {
        tracing::info!(
            component = COMPONENT,
            event = "record_inserted",
            request_id = %self.request_id,
            id = %record.id,
            cpf = %record.cpf,
            indexed = record.index_key().is_some(),
            record = %record.to_json(),
            "record inserted"
        );
        Ok(())
    }

    fn record_modified(&self, old: &PersonRecord, new: &PersonRecord) -> Result<(), String> {
        tracing::info!(
            component = COMPONENT,
            event = "record_modified",
            request_id = %self.request_id,
            id = %new.id,
            cpf = %new.cpf,
            changed = %changed_fields(old, new),
            old = %old.to_json(),
            new = %new.to_json(),
            "record modified"
        );
        Ok(())
    }

    fn record_removed(&self, key: &RecordKey, old: Option<&PersonRecord>) -> Result<(), String> {
        let old = old.map(PersonRecord::to_json).unwrap_or(Value::Null);
        tracing::info!(
            component = COMPONENT,
            event = "record_removed",
            request_id = %self.request_id,
            id = %key.id,
            cpf = %key.cpf,
            old = %old,
            "record removed"
        );
        Ok(())
    }
}

/// Names of top-level fields whose values differ, as a JSON array.
fn changed_fields(old: &PersonRecord, new: &PersonRecord) -> Value {
    let (Value::Object(before), Value::Object(after)) = (old.to_json(), new.to_json()) else {
        return Value::Array(Vec::new());
    };

    let mut names: Vec<&String> = before
        .keys()
        .chain(after.keys())
        .filter(|name| before.get(*name) != after.get(*name))
        .collect();
    names.sort();
    names.dedup();
    Value::from(names.into_iter().cloned().collect::<Vec<_>>())
}
