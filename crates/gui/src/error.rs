//! Error types for model loading and export.

use thiserror::Error;

/// Errors produced while fetching or parsing a model asset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Label not present in the model catalog.
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    /// Reading a local asset failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Fetching an asset over HTTP failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The asset is not a usable binary glTF file.
    #[error("invalid GLB: {0}")]
    InvalidGlb(String),
    /// The load task was aborted or panicked.
    #[error("load cancelled")]
    Cancelled,
}

/// Errors produced while exporting the scene.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no model loaded")]
    NoModel,
    /// Binary STL stores the triangle count as u32.
    #[error("{0} triangles exceed the binary STL limit")]
    TooManyTriangles(usize),
    /// Writing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
