use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::{colmap::ColmapImage, reconstruction::Reconstruction};

/// Camera-to-world pose of a registered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Image id in the reconstruction.
    pub image_id: u32,
    /// Image name relative to the image pool.
    pub image_name: String,
    /// Camera id in the reconstruction.
    pub camera_id: u32,
    /// Camera centre in world coordinates.
    pub translation: [f64; 3],
    /// Camera-to-world rotation, row-major.
    pub rotation_matrix: [[f64; 3]; 3],
    /// Camera-to-world rotation as a unit quaternion (w, x, y, z).
    pub quaternion: [f64; 4],
    /// Number of 2D observations with a triangulated 3D point.
    #[serde(rename = "num_points3D")]
    pub num_points3d: usize,
}

impl CameraPose {
    /// Derive the camera-to-world pose of a registered image.
    pub fn from_image(image: &ColmapImage) -> Self {
        let (world_q_cam, world_t_cam) = world_from_camera(&image.rotation, &image.translation);
        Self {
            image_id: image.image_id,
            image_name: image.name.clone(),
            camera_id: image.camera_id,
            translation: world_t_cam.to_array(),
            rotation_matrix: rotation_matrix_rows(world_q_cam),
            quaternion: [world_q_cam.w, world_q_cam.x, world_q_cam.y, world_q_cam.z],
            num_points3d: image.num_points3d(),
        }
    }

    /// Camera centre as a vector.
    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.translation)
    }
}

/// Invert a world-to-camera transform.
///
/// # Arguments
///
/// * `cam_q_world` - Rotation quaternion (w, x, y, z), normalised internally.
/// * `cam_t_world` - Translation of the world-to-camera transform.
///
/// # Returns
///
/// The camera-to-world rotation and translation.
pub fn world_from_camera(cam_q_world: &[f64; 4], cam_t_world: &[f64; 3]) -> (DQuat, DVec3) {
    let [w, x, y, z] = *cam_q_world;
    let cam_q_world = DQuat::from_xyzw(x, y, z, w).normalize();
    let world_q_cam = cam_q_world.inverse();
    let world_t_cam = -(world_q_cam * DVec3::from_array(*cam_t_world));
    (world_q_cam, world_t_cam)
}

/// Convert a (w, x, y, z) quaternion into a row-major rotation matrix.
pub fn quaternion_to_rotation_matrix(quaternion: &[f64; 4]) -> [[f64; 3]; 3] {
    let [w, x, y, z] = *quaternion;
    rotation_matrix_rows(DQuat::from_xyzw(x, y, z, w).normalize())
}

fn rotation_matrix_rows(q: DQuat) -> [[f64; 3]; 3] {
    // glam is column-major, the columns of the transpose are the rows
    DMat3::from_quat(q).transpose().to_cols_array_2d()
}

/// Compute the camera-to-world pose of every registered image.
///
/// The poses are sorted by image name, which is the canonical order of every
/// export.
pub fn camera_poses(reconstruction: &Reconstruction) -> Vec<CameraPose> {
    let mut poses = reconstruction
        .images
        .values()
        .map(CameraPose::from_image)
        .collect::<Vec<_>>();
    poses.sort_by(|a, b| a.image_name.cmp(&b.image_name));
    poses
}
