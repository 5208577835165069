use thiserror::Error;

/// Main error type for gasbench operations
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("deployment of '{variant}' failed: {reason}")]
    Deployment { variant: String, reason: String },

    #[error("execution environment unreachable: {0}")]
    EnvironmentUnreachable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl BenchError {
    /// Stable error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            BenchError::InvalidConfig(_) => "invalid_config",
            BenchError::UnknownScenario(_) => "invalid_config",
            BenchError::Deployment { .. } => "deployment_failed",
            BenchError::EnvironmentUnreachable(_) => "env_unreachable",
            BenchError::Io(_) => "io_error",
            BenchError::Json(_) => "internal_error",
            BenchError::TomlParse(_) => "invalid_config",
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::InvalidConfig(_) => 2,
            BenchError::UnknownScenario(_) => 2,
            BenchError::TomlParse(_) => 2,
            BenchError::Deployment { .. } => 3,
            BenchError::EnvironmentUnreachable(_) => 3,
            BenchError::Io(_) => 5,
            BenchError::Json(_) => 1,
        }
    }

    /// Actionable hints printed under the error message
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            BenchError::InvalidConfig(_) | BenchError::TomlParse(_) => {
                vec!["Run 'gasbench --validate-only -c <file>' to check the suite file"]
            }
            BenchError::UnknownScenario(_) => {
                vec!["Omit --scenario to run every scenario in the suite"]
            }
            BenchError::Deployment { .. } => vec![
                "Set run.deploy_policy = \"continue-on-error\" to keep comparing the remaining variants",
            ],
            _ => vec![],
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        BenchError::InvalidConfig(msg.into())
    }
}

/// Errors reported by an execution environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("deployment rejected: {0}")]
    DeployRejected(String),

    #[error("unknown instance: {0}")]
    UnknownInstance(String),

    #[error("unreachable: {0}")]
    Unreachable(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;
