use playground_core::{PersonRecord, RecordKey};

/// Destination for decoded changes. Returning an error marks the record as
/// failed so the platform redelivers it.
pub trait ChangeSink {
    fn record_inserted(&self, record: &PersonRecord) -> Result<(), String>;

    fn record_modified(&self, old: &PersonRecord, new: &PersonRecord) -> Result<(), String>;

    /// `old` is absent when the stream only carries keys.
    fn record_removed(&self, key: &RecordKey, old: Option<&PersonRecord>) -> Result<(), String>;
}
