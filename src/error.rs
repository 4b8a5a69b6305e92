//! Error types for netfixture

use thiserror::Error;

/// Result type for netfixture operations
pub type Result<T> = std::result::Result<T, FixtureError>;

/// netfixture error types
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Docker engine error: {0}")]
    Engine(#[from] bollard::errors::Error),

    #[error("Creating container {container}: {message}")]
    ContainerCreate { container: String, message: String },

    #[error("Starting container {container}: {message}")]
    ContainerStart { container: String, message: String },

    #[error("Container not started: {0}")]
    NotStarted(String),

    #[error("Container already started: {0}")]
    AlreadyStarted(String),

    #[error("Staging file into container: {0}")]
    FileStaging(String),

    #[error("No host port mapped for container {container} port {port}")]
    PortResolution { container: String, port: u16 },

    #[error("Container {container} not ready after {attempts} probe attempts")]
    ReadinessTimeout { container: String, attempts: u32 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Orchestrator is not running: {0}")]
    NotRunning(String),

    #[error("Invalid orchestrator state: {0}")]
    InvalidState(String),

    #[error("Teardown failed: {}", .failures.join("; "))]
    Teardown { failures: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
