use std::path::{Path, PathBuf};

/// File name of the image list written next to the feature stores.
pub const IMAGE_LIST_TXT: &str = "image-list.txt";

/// Paths of every artifact the pipeline writes into its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// The output directory root.
    pub output_dir: PathBuf,
    /// Image pairs selected for matching.
    pub pairs: PathBuf,
    /// Local features store.
    pub features: PathBuf,
    /// Pairwise matches store.
    pub matches: PathBuf,
    /// Global descriptors store used by retrieval.
    pub global_features: PathBuf,
    /// Image list handed to the toolkit.
    pub image_list: PathBuf,
    /// Directory receiving the reconstructed model.
    pub sfm_dir: PathBuf,
    /// Directory receiving the pose exports.
    pub poses_dir: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        let output_dir = output_dir.as_ref().to_path_buf();
        Self {
            pairs: output_dir.join("pairs-sfm.txt"),
            features: output_dir.join("features.h5"),
            matches: output_dir.join("matches.h5"),
            global_features: output_dir.join("global-features.h5"),
            image_list: output_dir.join(IMAGE_LIST_TXT),
            sfm_dir: output_dir.join("sfm"),
            poses_dir: output_dir.join("poses"),
            output_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_under_root() {
        let layout = OutputLayout::new("/tmp/out");
        assert_eq!(layout.pairs, Path::new("/tmp/out/pairs-sfm.txt"));
        assert_eq!(layout.sfm_dir, Path::new("/tmp/out/sfm"));
        assert_eq!(layout.poses_dir, Path::new("/tmp/out/poses"));
    }
}
