//! Error types for the slicer.

use thiserror::Error;

/// Errors that can occur during slicing.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Slicing operation failed.
    #[error("slicing failed: {0}")]
    SliceFailed(String),

    /// A region operation was requested before its prerequisites were met,
    /// or on a non-terminal layer with no shells.
    #[error("layer {layer}: {operation} generation requested before its prerequisites")]
    NotReady {
        /// Index of the offending layer.
        layer: usize,
        /// The operation that was refused.
        operation: &'static str,
    },
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
