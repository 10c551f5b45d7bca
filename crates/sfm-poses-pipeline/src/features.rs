use std::path::Path;

use sfm_poses_io::manifest::ImageManifest;

use crate::{
    config::{resolve_matcher, ExtractorConf, FeatureExtractor, FeatureMatcher, RetrievalOptions},
    error::{ConfigError, PipelineError},
    layout::OutputLayout,
    pairs::{count_unique_pairs, pairs_from_exhaustive, read_pairs, write_pairs},
    toolkit::SfmToolkit,
};

/// Options of the feature extraction and matching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureOptions {
    /// Local feature extractor.
    pub extractor: FeatureExtractor,
    /// Requested matcher, resolved against the extractor.
    pub matcher: FeatureMatcher,
    /// Pair selection.
    pub retrieval: RetrievalOptions,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            extractor: FeatureExtractor::SuperPointAachen,
            matcher: FeatureMatcher::SuperGlue,
            retrieval: RetrievalOptions::default(),
        }
    }
}

/// Extract local features, select image pairs and match them.
///
/// Writes `features.h5`, `pairs-sfm.txt` and `matches.h5` into the output
/// layout, plus `global-features.h5` when retrieval is enabled.
///
/// # Arguments
///
/// * `toolkit` - The engine running extraction and matching.
/// * `image_dir` - The image pool root.
/// * `manifest` - Images to process, relative to `image_dir`.
/// * `layout` - Output paths.
/// * `options` - Extractor, matcher and retrieval settings.
///
/// # Returns
///
/// `false` without doing anything when the manifest is empty.
pub fn extract_and_match_features(
    toolkit: &dyn SfmToolkit,
    image_dir: &Path,
    manifest: &ImageManifest,
    layout: &OutputLayout,
    options: &FeatureOptions,
) -> Result<bool, PipelineError> {
    if manifest.is_empty() {
        log::warn!("Skipping feature extraction - no images available");
        return Ok(false);
    }

    if options.retrieval.enabled && options.retrieval.num_matched == 0 {
        return Err(ConfigError::InvalidNumMatched(options.retrieval.num_matched).into());
    }

    let feature_conf = options.extractor.conf();
    let matcher_conf = resolve_matcher(options.extractor, options.matcher);
    log::info!("Feature extraction configuration: {feature_conf}");
    log::info!("Matching configuration: {matcher_conf}");

    std::fs::create_dir_all(&layout.output_dir)?;

    log::info!("Extracting local features...");
    toolkit.extract_features(&feature_conf, image_dir, manifest, &layout.features)?;

    let num_images = manifest.len();
    let num_exhaustive = num_images * num_images.saturating_sub(1) / 2;

    if options.retrieval.enabled {
        let retrieval_conf = ExtractorConf::NETVLAD;
        log::info!("NetVLAD retrieval configuration: {retrieval_conf}");

        log::info!("Extracting global descriptors with NetVLAD...");
        toolkit.extract_features(&retrieval_conf, image_dir, manifest, &layout.global_features)?;

        let num_matched = options.retrieval.num_matched;
        log::info!("Generating image pairs with NetVLAD retrieval (top-{num_matched})...");
        toolkit.pairs_from_retrieval(&layout.global_features, &layout.pairs, num_matched)?;

        let pairs = read_pairs(&layout.pairs)?;
        log::info!(
            "NetVLAD generated {} pairs, {} unique (vs {num_exhaustive} exhaustive)",
            pairs.len(),
            count_unique_pairs(&pairs)
        );
    } else {
        log::info!("Generating image pairs with exhaustive matching...");
        let pairs = pairs_from_exhaustive(manifest);
        write_pairs(&layout.pairs, &pairs)?;
        log::info!("Generated {} exhaustive pairs", pairs.len());
    }

    log::info!("Matching features...");
    toolkit.match_features(&matcher_conf, &layout.pairs, &layout.features, &layout.matches)?;

    log::info!("Feature extraction and matching completed!");
    Ok(true)
}
