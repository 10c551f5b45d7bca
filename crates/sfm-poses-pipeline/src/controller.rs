use std::path::PathBuf;

use sfm_poses_3d::{
    export::export_camera_poses,
    pose::CameraPose,
    trajectory::{analyze_trajectory, log_trajectory, TrajectoryStats},
};
use sfm_poses_io::{
    collect::{collect_inputs, CollectOptions},
    manifest::list_images,
    video::VideoDecoder,
};

use crate::{
    error::{ConfigError, PipelineError},
    features::{extract_and_match_features, FeatureOptions},
    layout::OutputLayout,
    reconstruct::run_sfm_reconstruction,
    toolkit::SfmToolkit,
};

const NUM_POSES_LOGGED: usize = 5;

/// Enables or disables retrieval based pair selection.
pub const ENV_USE_NETVLAD_RETRIEVAL: &str = "USE_NETVLAD_RETRIEVAL";
/// Overrides the number of retrieved neighbours.
pub const ENV_NETVLAD_NUM_MATCHED: &str = "NETVLAD_NUM_MATCHED";
/// Overrides the video frame skip.
pub const ENV_FRAME_SAMPLE_RATE: &str = "FRAME_SAMPLE_RATE";

fn parse_env(name: &'static str, value: String) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { name, value })
}

/// Stage the pipeline is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Filling the image pool from the input directory.
    CollectingInput,
    /// Listing the image pool.
    Listing,
    /// Extracting features, selecting pairs and matching.
    ExtractingMatching,
    /// Running structure-from-motion.
    Reconstructing,
    /// Writing the pose exports.
    Exporting,
    /// Finished successfully.
    Done,
    /// Stopped on an error.
    Failed,
}

/// Everything needed to run the pipeline once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding the input videos and images.
    pub input_dir: PathBuf,
    /// Directory receiving features, matches, the model and the poses.
    pub output_dir: PathBuf,
    /// Scratch directory holding the image pool.
    pub temp_dir: PathBuf,
    /// Feature extraction and matching settings.
    pub features: FeatureOptions,
    /// Keep one video frame every `frame_skip` frames.
    pub frame_skip: usize,
    /// Maximum number of frames sampled per video.
    pub max_images: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./videos"),
            output_dir: PathBuf::from("./outputs/hloc_poses"),
            temp_dir: PathBuf::from("./temp/hloc_processing"),
            features: FeatureOptions::default(),
            frame_skip: 1,
            max_images: None,
        }
    }
}

impl PipelineConfig {
    /// Check the numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(ConfigError::InvalidFrameSkip(self.frame_skip));
        }
        let retrieval = &self.features.retrieval;
        if retrieval.enabled && retrieval.num_matched == 0 {
            return Err(ConfigError::InvalidNumMatched(retrieval.num_matched));
        }
        Ok(())
    }

    /// Override settings from `USE_NETVLAD_RETRIEVAL`, `NETVLAD_NUM_MATCHED`
    /// and `FRAME_SAMPLE_RATE`.
    ///
    /// `lookup` returns the value of a variable. Unset and empty variables
    /// leave the setting untouched. Retrieval is enabled only by a
    /// case-insensitive `true`, the integers must parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(value) = var(ENV_USE_NETVLAD_RETRIEVAL) {
            self.features.retrieval.enabled = value.eq_ignore_ascii_case("true");
        }
        if let Some(value) = var(ENV_NETVLAD_NUM_MATCHED) {
            self.features.retrieval.num_matched = parse_env(ENV_NETVLAD_NUM_MATCHED, value)?;
        }
        if let Some(value) = var(ENV_FRAME_SAMPLE_RATE) {
            self.frame_skip = parse_env(ENV_FRAME_SAMPLE_RATE, value)?;
        }
        Ok(())
    }

    /// The image pool inside the temp directory.
    pub fn images_dir(&self) -> PathBuf {
        self.temp_dir.join("images")
    }

    /// Output paths.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }

    fn log(&self) {
        let retrieval = &self.features.retrieval;
        log::info!("Input directory: {}", self.input_dir.display());
        log::info!("Output directory: {}", self.output_dir.display());
        log::info!("Temporary directory: {}", self.temp_dir.display());
        log::info!("Feature extractor: {}", self.features.extractor);
        log::info!("Feature matcher: {}", self.features.matcher);
        log::info!(
            "Using NetVLAD retrieval: {} (top-{} matches)",
            retrieval.enabled,
            retrieval.num_matched
        );
        log::info!(
            "Frame sampling rate: {0} (every {0} frames)",
            self.frame_skip
        );
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of input files that contributed images.
    pub num_input_files: usize,
    /// Number of images in the manifest.
    pub num_images: usize,
    /// Number of images registered in the model.
    pub num_registered: usize,
    /// Number of reconstructed 3D points.
    pub num_points3d: usize,
    /// Number of cameras in the model.
    pub num_cameras: usize,
    /// Registered images over manifest images, in percent.
    pub registration_rate: f64,
    /// Trajectory statistics, when at least two poses were exported.
    pub trajectory: Option<TrajectoryStats>,
    /// The exported poses, sorted by image name.
    pub poses: Vec<CameraPose>,
    /// Where the outputs were written.
    pub layout: OutputLayout,
}

/// Runs collection, feature matching, reconstruction and export in sequence.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    toolkit: &'a dyn SfmToolkit,
    decoder: &'a dyn VideoDecoder,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    /// Create an idle pipeline.
    pub fn new(
        config: PipelineConfig,
        toolkit: &'a dyn SfmToolkit,
        decoder: &'a dyn VideoDecoder,
    ) -> Self {
        Self {
            config,
            toolkit,
            decoder,
            state: PipelineState::Idle,
        }
    }

    /// The current stage.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The configuration the pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage once.
    ///
    /// Ends in [`PipelineState::Done`] on success and in
    /// [`PipelineState::Failed`] on any error. The temp directory is left in
    /// place either way.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        match self.run_stages() {
            Ok(summary) => {
                self.transition(PipelineState::Done);
                log_summary(&summary);
                Ok(summary)
            }
            Err(err) => {
                self.transition(PipelineState::Failed);
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run_stages(&mut self) -> Result<RunSummary, PipelineError> {
        self.config.validate()?;

        log::info!("Camera Pose Estimation Pipeline Starting");
        self.config.log();

        std::fs::create_dir_all(&self.config.temp_dir)?;
        let images_dir = self.config.images_dir();
        let layout = self.config.layout();

        self.transition(PipelineState::CollectingInput);
        log::info!("Processing input files...");
        let options = CollectOptions {
            frame_skip: self.config.frame_skip,
            max_frames: self.config.max_images,
        };
        let report = collect_inputs(&self.config.input_dir, &images_dir, &options, self.decoder)?;
        if report.total_images == 0 {
            return Err(PipelineError::EmptyInput(self.config.input_dir.clone()));
        }

        self.transition(PipelineState::Listing);
        let manifest = list_images(&images_dir)?;
        if manifest.is_empty() {
            return Err(PipelineError::EmptyManifest);
        }

        self.transition(PipelineState::ExtractingMatching);
        let matched = extract_and_match_features(
            self.toolkit,
            &images_dir,
            &manifest,
            &layout,
            &self.config.features,
        )?;
        if !matched {
            return Err(PipelineError::StageFailed);
        }

        self.transition(PipelineState::Reconstructing);
        let model = run_sfm_reconstruction(self.toolkit, &images_dir, &manifest, &layout)?
            .ok_or(PipelineError::ReconstructionFailed)?;

        self.transition(PipelineState::Exporting);
        log::info!("Extracting and exporting camera poses...");
        let poses = export_camera_poses(&model, &layout.poses_dir)?;
        log::info!("Exported {} camera poses", poses.len());
        log_poses(&poses);

        let trajectory = analyze_trajectory(&poses);
        if let Some(stats) = &trajectory {
            log_trajectory(stats);
        }

        let num_registered = model.num_registered_images();
        Ok(RunSummary {
            num_input_files: report.files.len(),
            num_images: manifest.len(),
            num_registered,
            num_points3d: model.num_points3d(),
            num_cameras: model.num_cameras(),
            registration_rate: num_registered as f64 / manifest.len() as f64 * 100.0,
            trajectory,
            poses,
            layout,
        })
    }
}

fn log_poses(poses: &[CameraPose]) {
    if poses.is_empty() {
        return;
    }
    log::info!("Camera poses summary:");
    for pose in poses.iter().take(NUM_POSES_LOGGED) {
        let [tx, ty, tz] = pose.translation;
        log::info!(
            "  {}: position=({tx:.3}, {ty:.3}, {tz:.3})",
            pose.image_name
        );
    }
    if poses.len() > NUM_POSES_LOGGED {
        log::info!("  ... and {} more", poses.len() - NUM_POSES_LOGGED);
    }
}

fn log_summary(summary: &RunSummary) {
    let rule = "=".repeat(60);
    log::info!("{rule}");
    log::info!("CAMERA POSE ESTIMATION PIPELINE - SUMMARY");
    log::info!("{rule}");
    log::info!("Successfully processed {} input images", summary.num_images);
    log::info!("Reconstructed {} camera poses", summary.num_registered);
    log::info!("Generated {} 3D points", summary.num_points3d);
    log::info!("Used {} camera model(s)", summary.num_cameras);
    log::info!(
        "Reconstruction success rate: {:.1}%",
        summary.registration_rate
    );

    let layout = &summary.layout;
    log::info!("Output files:");
    log::info!("  Main output directory: {}", layout.output_dir.display());
    log::info!("  Camera poses (JSON): poses/camera_poses.json");
    log::info!("  Trajectory (TUM): poses/trajectory_tum.txt");
    log::info!("  COLMAP poses: poses/images_poses.txt");
    log::info!("  3D reconstruction: sfm/");
    log::info!("  Features: features.h5");
    log::info!("  Matches: matches.h5");
    log::info!("{rule}");
    log::info!("Pipeline execution completed successfully!");
    log::info!("{rule}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalOptions;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.images_dir(), PathBuf::from("./temp/hloc_processing/images"));
        assert_eq!(config.features.retrieval, RetrievalOptions::default());
    }

    #[test]
    fn invalid_config() {
        let config = PipelineConfig {
            frame_skip: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameSkip(0)));

        let mut config = PipelineConfig::default();
        config.features.retrieval.num_matched = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidNumMatched(0)));

        config.features.retrieval.enabled = false;
        assert_eq!(config.validate(), Ok(()));
    }

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn env_overrides() -> Result<(), ConfigError> {
        let mut config = PipelineConfig::default();
        config.apply_env_overrides(env(&[
            ("USE_NETVLAD_RETRIEVAL", "FALSE"),
            ("NETVLAD_NUM_MATCHED", "7"),
            ("FRAME_SAMPLE_RATE", "4"),
        ]))?;
        assert!(!config.features.retrieval.enabled);
        assert_eq!(config.features.retrieval.num_matched, 7);
        assert_eq!(config.frame_skip, 4);

        config.apply_env_overrides(env(&[("USE_NETVLAD_RETRIEVAL", "True")]))?;
        assert!(config.features.retrieval.enabled);

        config.apply_env_overrides(env(&[("USE_NETVLAD_RETRIEVAL", "yes")]))?;
        assert!(!config.features.retrieval.enabled);
        Ok(())
    }

    #[test]
    fn empty_env_is_ignored() -> Result<(), ConfigError> {
        let mut config = PipelineConfig::default();
        config.apply_env_overrides(env(&[
            ("USE_NETVLAD_RETRIEVAL", ""),
            ("NETVLAD_NUM_MATCHED", ""),
        ]))?;
        assert_eq!(config, PipelineConfig::default());
        Ok(())
    }

    #[test]
    fn invalid_env_integer() {
        let mut config = PipelineConfig::default();
        let result = config.apply_env_overrides(env(&[("FRAME_SAMPLE_RATE", "every other")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidEnvOverride {
                name: "FRAME_SAMPLE_RATE",
                value: "every other".to_string(),
            })
        );
    }
}
