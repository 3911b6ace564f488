//! Declarative infrastructure for the DynamoDB stream playground.
//!
//! This crate owns the typed resource model (table, functions, stream event
//! sources, IAM wiring), its validation, and synthesis into a CloudFormation
//! template plus cloud-assembly manifests. It never calls a cloud API;
//! deploying the synthesized assembly is left to the deployment CLI.

pub mod assembly;
pub mod asset;
pub mod environment;
pub mod error;
pub mod event_source;
pub mod function;
pub mod iam;
pub mod logical_id;
pub mod stack;
pub mod table;
pub mod template;

pub use environment::Environment;
pub use error::{StackError, ValidationProblem};
pub use stack::{PlaygroundStack, SynthesizedStack, DEV_STACK_NAME};
