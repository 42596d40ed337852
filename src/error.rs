//! Error types for cell map construction

use thiserror::Error;

/// Errors that can occur while configuring or assembling a cell map
///
/// Runtime lookups never fail with an error: ids that have not been generated
/// yet resolve to `None`. Broken preconditions (an empty rasterizer input, a
/// sub-view escaping its parent) are programming errors and panic instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A required collaborator was not supplied to a builder
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}

/// Result type alias for cell map operations
pub type Result<T> = std::result::Result<T, MeshError>;
