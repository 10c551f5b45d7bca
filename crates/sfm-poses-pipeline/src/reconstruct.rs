use std::path::Path;

use sfm_poses_3d::reconstruction::Reconstruction;
use sfm_poses_io::manifest::ImageManifest;

use crate::{error::PipelineError, layout::OutputLayout, toolkit::SfmToolkit};

/// Run incremental structure-from-motion over the matched images.
///
/// The model is written to the `sfm/` directory of the layout. Returns `None`
/// when the manifest is empty or the engine built no model. A model with no
/// registered image is still returned.
pub fn run_sfm_reconstruction(
    toolkit: &dyn SfmToolkit,
    image_dir: &Path,
    manifest: &ImageManifest,
    layout: &OutputLayout,
) -> Result<Option<Reconstruction>, PipelineError> {
    if manifest.is_empty() {
        log::warn!("Skipping SfM reconstruction - no images available");
        return Ok(None);
    }

    log::info!("Running Structure-from-Motion reconstruction...");
    let model = toolkit.reconstruct(
        &layout.sfm_dir,
        image_dir,
        &layout.pairs,
        &layout.features,
        &layout.matches,
        manifest,
    )?;

    let Some(model) = model else {
        return Ok(None);
    };

    log::info!("Reconstruction completed!");
    log::info!("Number of registered images: {}", model.num_registered_images());
    log::info!("Number of 3D points: {}", model.num_points3d());
    log::info!("Number of cameras: {}", model.num_cameras());

    Ok(Some(model))
}
