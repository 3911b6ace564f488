use std::collections::BTreeMap;

use playground_core::ChangeKind;
use serde_json::json;

use crate::asset::{CodeAsset, ResolvedAsset};
use crate::error::ValidationProblem;
use crate::template::{get_att, Resource};

pub const CUSTOM_RUNTIME: &str = "provided.al2023";
pub const BOOTSTRAP_HANDLER: &str = "bootstrap";
pub const DEFAULT_MEMORY_MB: u32 = 128;
pub const DEFAULT_TIMEOUT_SECS: u32 = 3;

const MEMORY_RANGE_MB: std::ops::RangeInclusive<u32> = 128..=10_240;
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u32> = 1..=900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Arm64,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub id: String,
    pub runtime: String,
    pub handler: String,
    pub architecture: Architecture,
    pub memory_mb: u32,
    pub timeout_secs: u32,
    pub environment: BTreeMap<String, String>,
    pub code: CodeAsset,
}

impl FunctionDefinition {
    pub fn new(id: impl Into<String>, code: CodeAsset) -> Self {
        Self {
            id: id.into(),
            runtime: CUSTOM_RUNTIME.to_string(),
            handler: BOOTSTRAP_HANDLER.to_string(),
            architecture: Architecture::X86_64,
            memory_mb: DEFAULT_MEMORY_MB,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            environment: BTreeMap::new(),
            code,
        }
    }

    /// Function running the packaged handler for one change kind.
    pub fn for_change_kind(kind: ChangeKind) -> Self {
        Self::new(
            kind.function_id(),
            CodeAsset::for_binary(kind.handler_binary()),
        )
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        let path = self.id.as_str();

        if self.id.trim().is_empty() {
            problems.push(ValidationProblem::new(
                "<function>",
                "function id cannot be empty",
            ));
        }
        if !MEMORY_RANGE_MB.contains(&self.memory_mb) {
            problems.push(ValidationProblem::new(
                path,
                format!(
                    "memory size {} MB is outside {}..={} MB",
                    self.memory_mb,
                    MEMORY_RANGE_MB.start(),
                    MEMORY_RANGE_MB.end()
                ),
            ));
        }
        if !TIMEOUT_RANGE_SECS.contains(&self.timeout_secs) {
            problems.push(ValidationProblem::new(
                path,
                format!(
                    "timeout {} s is outside {}..={} s",
                    self.timeout_secs,
                    TIMEOUT_RANGE_SECS.start(),
                    TIMEOUT_RANGE_SECS.end()
                ),
            ));
        }
        if self.environment.keys().any(|name| name.trim().is_empty()) {
            problems.push(ValidationProblem::new(
                path,
                "environment variable names cannot be empty",
            ));
        }

        problems
    }

    /// Renders the `AWS::Lambda::Function` resource running as `role_logical_id`.
    pub fn render(&self, role_logical_id: &str, asset: &ResolvedAsset) -> Resource {
        let mut properties = json!({
            "Code": asset.function_code(),
            "Role": get_att(role_logical_id, "Arn"),
            "Handler": self.handler,
            "Runtime": self.runtime,
            "Architectures": [self.architecture.as_str()],
            "MemorySize": self.memory_mb,
            "Timeout": self.timeout_secs,
        });
        if !self.environment.is_empty() {
            properties["Environment"] = json!({ "Variables": self.environment });
        }

        Resource::new("AWS::Lambda::Function", properties).depends_on(role_logical_id)
    }
}
