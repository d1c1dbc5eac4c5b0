//! Error types shared by both binaries

use thiserror::Error;

/// Result type for dcs-ops operations
pub type Result<T> = std::result::Result<T, OpsError>;

/// dcs-ops error types
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("{tool} is not available. {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    #[error("No Dockerfile found at {0}")]
    MissingDockerfile(std::path::PathBuf),

    #[error("{command} failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("Registry request failed ({status}): {body}")]
    Registry {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("No free port found between {start} and 65535")]
    PortsExhausted { start: u16 },

    #[error("Invalid service definition: {0}")]
    InvalidService(String),

    #[error("Setup cancelled")]
    Cancelled,

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
