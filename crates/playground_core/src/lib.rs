//! Shared domain vocabulary for the DynamoDB stream playground.
//!
//! This crate owns the person record shape, the key attribute names shared by
//! the table definition and the stream handlers, the change kind enum, and the
//! typed attribute encoding used by stream images. It intentionally excludes
//! template synthesis and Lambda runtime concerns.

pub mod attribute;
pub mod change;
pub mod record;

pub use attribute::{AttributeValue, Image};
pub use change::ChangeKind;
pub use record::{PersonRecord, RecordError, RecordKey};
