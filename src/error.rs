//! Error types for the connection engine.
//!
//! Cardinality conflicts are not errors: they are resolved by
//! eviction and only show up in logs and `Deleted` notifications.

use crate::types::{Connector, NodeId};
use thiserror::Error;

/// Errors raised by geometry resolution and connection validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// The node provider does not know this node (yet)
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node exists but its kind has no such connector
    #[error("connector not found: {0}")]
    ConnectorNotFound(Connector),

    /// The endpoints cannot form a connection
    #[error("invalid connection: {0}")]
    InvalidConnection(#[from] InvalidConnection),
}

impl CanvasError {
    /// Geometry failures are usually a layout race and worth retrying next frame.
    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::NodeNotFound(_) | Self::ConnectorNotFound(_))
    }
}

/// Why a pair of endpoints was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidConnection {
    #[error("a node cannot connect to itself")]
    SelfLoop,

    #[error("both endpoints are on the same side")]
    SameSide,

    #[error("the node does not expose that connector")]
    UnknownConnector,
}

/// Result type alias for engine operations
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Result type alias for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;
