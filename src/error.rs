//! Error types for Station Host client operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StationError>;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Server start failed: {0}")]
    ServerStartFailed(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Fatal protocol error: {0}")]
    FatalProtocol(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Target not reachable: {0}")]
    TargetReach(String),

    #[error("Stopped: {0}")]
    Stopped(String),

    #[error("License error: {0}")]
    License(String),

    #[error("Station Host error: {0}")]
    Generic(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tokio task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StationError {
    /// True when the error leaves the session unusable until it reconnects
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StationError::FatalProtocol(_)
                | StationError::HandshakeFailed(_)
                | StationError::Io(_)
        )
    }
}
