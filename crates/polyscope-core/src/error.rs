//! Error types for polyscope-rs.

use thiserror::Error;

/// The main error type for polyscope-rs operations.
#[derive(Error, Debug)]
pub enum PolyscopeError {
    /// Polyscope has not been initialized.
    #[error("polyscope not initialized - call polyscope::init() first")]
    NotInitialized,

    /// Polyscope has already been initialized.
    #[error("polyscope already initialized")]
    AlreadyInitialized,

    /// A structure with the given name already exists.
    #[error("structure '{0}' already exists")]
    StructureExists(String),

    /// A structure with the given name was not found.
    #[error("structure '{0}' not found")]
    StructureNotFound(String),

    /// A quantity with the given name was not found.
    #[error("quantity '{0}' not found on structure '{1}'")]
    QuantityNotFound(String, String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An edge references a node that does not exist.
    #[error(
        "{structure} edge {edge} has bad node indices {{ {tail} , {tip} }} but there are {num_nodes} nodes"
    )]
    BadEdgeIndex {
        structure: String,
        edge: usize,
        tail: usize,
        tip: usize,
        num_nodes: usize,
    },

    /// A decoded pick index does not belong to any element of the structure.
    #[error("bad pick index {index} in {structure}")]
    BadPickIndex { structure: String, index: u64 },

    /// The named color map is not registered.
    #[error("unknown color map '{0}'")]
    UnknownColorMap(String),

    /// The named material does not exist.
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    /// Rendering error surfaced from the backend.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for polyscope-rs operations.
pub type Result<T> = std::result::Result<T, PolyscopeError>;
