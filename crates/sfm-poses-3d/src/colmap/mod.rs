mod binary;
pub use binary::*;

mod text;
pub use text::*;

mod types;
pub use types::*;

/// Error types for the COLMAP module.
#[derive(Debug, thiserror::Error)]
pub enum ColmapError {
    /// Error reading or writing file
    #[error("error reading or writing file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid number of camera parameters
    #[error("Invalid number of camera parameters: {0}")]
    InvalidNumCameraParams(usize),

    /// Unknown camera model
    #[error("Invalid camera model: {0}")]
    InvalidCameraModel(String),

    /// No COLMAP model files in the directory
    #[error("No COLMAP model found in {0}")]
    ModelNotFound(std::path::PathBuf),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),
}
