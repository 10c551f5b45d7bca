use std::path::PathBuf;

use sfm_poses_3d::export::ExportError;
use sfm_poses_io::error::IoError;

use crate::toolkit::ToolkitError;

/// Invalid pipeline configuration, detected before any work is done.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The feature extractor name is not in the registry.
    #[error("Unknown feature extractor: {0}")]
    UnknownExtractor(String),

    /// The feature matcher name is not in the registry.
    #[error("Unknown feature matcher: {0}")]
    UnknownMatcher(String),

    /// The frame skip stride must be at least one.
    #[error("Invalid frame skip {0}, must be >= 1")]
    InvalidFrameSkip(usize),

    /// Retrieval needs at least one neighbour per image.
    #[error("Invalid number of retrieval matches {0}, must be >= 1")]
    InvalidNumMatched(usize),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for environment variable {name}")]
    InvalidEnvOverride {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// An error that stops the pipeline.
///
/// Every variant is fatal to the run, see [`PipelineError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input directory produced no images.
    #[error("No valid input files found in {0}! Please add videos or images to the input directory.")]
    EmptyInput(PathBuf),

    /// The image pool holds no images.
    #[error("No images found for processing!")]
    EmptyManifest,

    /// The feature extraction and matching stage reported failure.
    #[error("Feature extraction and matching failed!")]
    StageFailed,

    /// The reconstruction engine produced no model.
    #[error("SfM reconstruction failed!")]
    ReconstructionFailed,

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error while collecting or listing input images.
    #[error(transparent)]
    Input(#[from] IoError),

    /// Error while writing intermediate files.
    #[error("Failed to manipulate the file. {0}")]
    File(#[from] std::io::Error),

    /// Error reported by the external toolkit.
    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    /// Error while exporting the camera poses.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
