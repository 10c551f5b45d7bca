use std::{path::Path, process::ExitStatus};

use sfm_poses_3d::{colmap::ColmapError, reconstruction::Reconstruction};
use sfm_poses_io::{error::IoError, manifest::ImageManifest};

use crate::config::{ExtractorConf, MatcherConf};

/// Error types for the toolkit module.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    /// The toolkit process could not be started.
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A toolkit step exited unsuccessfully.
    #[error("{step} exited with {status}")]
    StepFailed {
        /// The step name.
        step: &'static str,
        /// Exit status of the process.
        status: ExitStatus,
    },

    /// Error preparing the toolkit inputs.
    #[error(transparent)]
    Input(#[from] IoError),

    /// Error reading the toolkit outputs.
    #[error("Failed to read toolkit output. {0}")]
    File(#[from] std::io::Error),

    /// Error reading the reconstructed model.
    #[error(transparent)]
    Model(#[from] ColmapError),
}

/// The feature extraction, matching and reconstruction engine.
///
/// Every call blocks until the step finished and its outputs are on disk.
pub trait SfmToolkit {
    /// Extract features for every manifest image into `feature_path`.
    fn extract_features(
        &self,
        conf: &ExtractorConf,
        image_dir: &Path,
        manifest: &ImageManifest,
        feature_path: &Path,
    ) -> Result<(), ToolkitError>;

    /// Write the `num_matched` most similar images of every image to `output`.
    fn pairs_from_retrieval(
        &self,
        descriptors: &Path,
        output: &Path,
        num_matched: usize,
    ) -> Result<(), ToolkitError>;

    /// Match the features of every pair listed in `pairs` into `matches`.
    fn match_features(
        &self,
        conf: &MatcherConf,
        pairs: &Path,
        features: &Path,
        matches: &Path,
    ) -> Result<(), ToolkitError>;

    /// Run incremental SfM and return the model, `None` if no model was built.
    fn reconstruct(
        &self,
        sfm_dir: &Path,
        image_dir: &Path,
        pairs: &Path,
        features: &Path,
        matches: &Path,
        manifest: &ImageManifest,
    ) -> Result<Option<Reconstruction>, ToolkitError>;
}
