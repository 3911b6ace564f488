use std::fmt;
use std::path::PathBuf;

/// A single configuration problem, attributed to the construct that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProblem {
    construct_path: String,
    message: String,
}

impl ValidationProblem {
    pub fn new(construct_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            construct_path: construct_path.into(),
            message: message.into(),
        }
    }

    pub fn construct_path(&self) -> &str {
        &self.construct_path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.construct_path, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("stack validation failed:\n{}", format_problems(.0))]
    Validation(Vec<ValidationProblem>),
    #[error("global secondary index '{0}' is already defined")]
    DuplicateIndex(String),
    #[error("logical id '{0}' is already allocated in this stack")]
    DuplicateLogicalId(String),
    #[error("failed to read asset {path}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StackError {
    pub fn problems(&self) -> &[ValidationProblem] {
        match self {
            Self::Validation(problems) => problems.as_slice(),
            _ => &[],
        }
    }
}

fn format_problems(problems: &[ValidationProblem]) -> String {
    problems
        .iter()
        .map(|problem| format!("  - {problem}"))
        .collect::<Vec<_>>()
        .join("\n")
}
