//! Lambda runtime integration for the DynamoDB stream playground.
//!
//! This crate owns stream event decoding, the batch processor shared by the
//! three change handlers, and the change-sink adapter seam. Record shapes and
//! change kinds come from `playground_core`.

pub mod adapters;
pub mod event;
pub mod handlers;
pub mod telemetry;
