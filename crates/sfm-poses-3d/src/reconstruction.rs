use std::{collections::BTreeMap, path::Path};

use crate::colmap::{
    read_cameras_bin, read_cameras_txt, read_images_bin, read_images_txt, read_points3d_bin,
    read_points3d_txt, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d,
};

/// On-disk encoding of a COLMAP model directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `cameras.bin`, `images.bin`, `points3D.bin`
    Binary,
    /// `cameras.txt`, `images.txt`, `points3D.txt`
    Text,
}

impl ModelFormat {
    /// Detect the format of the model stored in `dir`, preferring binary.
    pub fn detect(dir: impl AsRef<Path>) -> Option<Self> {
        let dir = dir.as_ref();
        let complete = |ext: &str| {
            ["cameras", "images", "points3D"]
                .iter()
                .all(|stem| dir.join(format!("{stem}.{ext}")).is_file())
        };
        if complete("bin") {
            Some(Self::Binary)
        } else if complete("txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// A sparse reconstruction: cameras, registered images and 3D points keyed by id.
///
/// Not every input image is guaranteed to be registered; an empty `images`
/// map is a valid, if degenerate, reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Cameras by camera id.
    pub cameras: BTreeMap<u32, ColmapCamera>,
    /// Registered images by image id.
    pub images: BTreeMap<u32, ColmapImage>,
    /// Triangulated points by point id.
    pub points3d: BTreeMap<u64, ColmapPoint3d>,
}

impl Reconstruction {
    /// Build a reconstruction from flat lists, keyed by their ids.
    pub fn new(
        cameras: Vec<ColmapCamera>,
        images: Vec<ColmapImage>,
        points3d: Vec<ColmapPoint3d>,
    ) -> Self {
        Self {
            cameras: cameras.into_iter().map(|c| (c.camera_id, c)).collect(),
            images: images.into_iter().map(|i| (i.image_id, i)).collect(),
            points3d: points3d.into_iter().map(|p| (p.point3d_id, p)).collect(),
        }
    }

    /// Number of images with a pose.
    pub fn num_registered_images(&self) -> usize {
        self.images.len()
    }

    /// Number of triangulated points.
    pub fn num_points3d(&self) -> usize {
        self.points3d.len()
    }

    /// Number of camera models.
    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }
}

/// Read a COLMAP model directory, binary or text.
///
/// # Arguments
///
/// * `dir` - Directory holding the three model files.
///
/// # Returns
///
/// The reconstruction, or [`ColmapError::ModelNotFound`] when the directory
/// holds no complete model.
pub fn read_reconstruction(dir: impl AsRef<Path>) -> Result<Reconstruction, ColmapError> {
    let dir = dir.as_ref();
    let format =
        ModelFormat::detect(dir).ok_or_else(|| ColmapError::ModelNotFound(dir.to_path_buf()))?;

    log::debug!("reading {:?} COLMAP model from {}", format, dir.display());

    let reconstruction = match format {
        ModelFormat::Binary => Reconstruction::new(
            read_cameras_bin(dir.join("cameras.bin"))?,
            read_images_bin(dir.join("images.bin"))?,
            read_points3d_bin(dir.join("points3D.bin"))?,
        ),
        ModelFormat::Text => Reconstruction::new(
            read_cameras_txt(dir.join("cameras.txt"))?,
            read_images_txt(dir.join("images.txt"))?,
            read_points3d_txt(dir.join("points3D.txt"))?,
        ),
    };

    Ok(reconstruction)
}
