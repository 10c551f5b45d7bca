use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    pose::{camera_poses, CameraPose},
    reconstruction::Reconstruction,
};

/// File name of the JSON pose export.
pub const POSES_JSON: &str = "camera_poses.json";
/// File name of the TUM trajectory export.
pub const TRAJECTORY_TUM: &str = "trajectory_tum.txt";
/// File name of the detailed per-image export.
pub const IMAGES_POSES_TXT: &str = "images_poses.txt";

/// Error types for the export module.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Error reading or writing file
    #[error("error reading or writing file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing or deserializing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Paths of the files written by [`export_camera_poses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseExportPaths {
    /// The JSON array of pose records.
    pub json: PathBuf,
    /// The TUM trajectory.
    pub tum: PathBuf,
    /// The detailed `image_id qw qx qy qz tx ty tz camera_id name` listing.
    pub images: PathBuf,
}

impl PoseExportPaths {
    /// Paths of the exports inside `poses_dir`.
    pub fn new(poses_dir: impl AsRef<Path>) -> Self {
        let poses_dir = poses_dir.as_ref();
        Self {
            json: poses_dir.join(POSES_JSON),
            tum: poses_dir.join(TRAJECTORY_TUM),
            images: poses_dir.join(IMAGES_POSES_TXT),
        }
    }
}

/// Export the camera poses of a reconstruction in three formats.
///
/// # Arguments
///
/// * `reconstruction` - The reconstruction to export.
/// * `poses_dir` - Output directory, created if missing.
///
/// # Returns
///
/// The exported poses, sorted by image name.
pub fn export_camera_poses(
    reconstruction: &Reconstruction,
    poses_dir: impl AsRef<Path>,
) -> Result<Vec<CameraPose>, ExportError> {
    let poses_dir = poses_dir.as_ref();
    std::fs::create_dir_all(poses_dir)?;

    let poses = camera_poses(reconstruction);
    let paths = PoseExportPaths::new(poses_dir);

    write_poses_json(&paths.json, &poses)?;
    log::info!("Exported poses to JSON: {}", paths.json.display());

    write_trajectory_tum(&paths.tum, &poses)?;
    log::info!("Exported poses in TUM format: {}", paths.tum.display());

    write_images_poses_txt(&paths.images, &poses)?;
    log::info!("Exported poses in COLMAP format: {}", paths.images.display());

    Ok(poses)
}

/// Write the poses as a pretty-printed JSON array.
pub fn write_poses_json(path: impl AsRef<Path>, poses: &[CameraPose]) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, poses)?;
    writer.flush()?;
    Ok(())
}

/// Read poses previously written by [`write_poses_json`].
pub fn read_poses_json(path: impl AsRef<Path>) -> Result<Vec<CameraPose>, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the poses as a TUM trajectory, `index tx ty tz qx qy qz qw` per line.
///
/// The index is the position of the pose in `poses`, zero padded to 6 digits.
pub fn write_trajectory_tum(
    path: impl AsRef<Path>,
    poses: &[CameraPose],
) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "# TUM trajectory format")?;
    writeln!(writer, "# timestamp tx ty tz qx qy qz qw")?;
    for (i, pose) in poses.iter().enumerate() {
        let [tx, ty, tz] = pose.translation;
        let [qw, qx, qy, qz] = pose.quaternion;
        writeln!(
            writer,
            "{i:06} {tx:.6} {ty:.6} {tz:.6} {qx:.6} {qy:.6} {qz:.6} {qw:.6}"
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the poses as `image_id qw qx qy qz tx ty tz camera_id image_name` lines.
pub fn write_images_poses_txt(
    path: impl AsRef<Path>,
    poses: &[CameraPose],
) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "# COLMAP image poses (camera-to-world)")?;
    writeln!(writer, "# IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME")?;
    for pose in poses {
        let [tx, ty, tz] = pose.translation;
        let [qw, qx, qy, qz] = pose.quaternion;
        writeln!(
            writer,
            "{} {qw:.6} {qx:.6} {qy:.6} {qz:.6} {tx:.6} {ty:.6} {tz:.6} {} {}",
            pose.image_id, pose.camera_id, pose.image_name
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colmap::ColmapImage;
    use crate::pose::quaternion_to_rotation_matrix;
    use approx::assert_relative_eq;

    fn reconstruction() -> Reconstruction {
        let image = |image_id: u32, name: &str, rotation: [f64; 4], translation: [f64; 3]| {
            ColmapImage {
                name: name.to_string(),
                image_id,
                camera_id: 1 + image_id % 2,
                rotation,
                translation,
                points2d: vec![(0.0, 0.0, 1), (2.0, 2.0, 2)],
            }
        };
        let h = std::f64::consts::FRAC_1_SQRT_2;
        Reconstruction::new(
            vec![],
            vec![
                image(7, "c.jpg", [0.5, 0.5, 0.5, 0.5], [0.25, -3.0, 1.5]),
                image(2, "a.jpg", [1.0, 0.0, 0.0, 0.0], [1.0, 2.0, 3.0]),
                image(4, "b.jpg", [h, h, 0.0, 0.0], [-1.0, 0.0, 4.0]),
            ],
            vec![],
        )
    }

    fn data_lines(path: &Path) -> std::io::Result<Vec<Vec<String>>> {
        Ok(std::fs::read_to_string(path)?
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .collect())
    }

    #[test]
    fn json_round_trip_recovers_rotation() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir()?;
        let poses = export_camera_poses(&reconstruction(), tmp_dir.path())?;

        let loaded = read_poses_json(tmp_dir.path().join(POSES_JSON))?;
        assert_eq!(loaded, poses);

        for pose in &loaded {
            let r = quaternion_to_rotation_matrix(&pose.quaternion);
            for i in 0..3 {
                for j in 0..3 {
                    assert_relative_eq!(r[i][j], pose.rotation_matrix[i][j], epsilon = 1e-9);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn json_field_names() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir()?;
        export_camera_poses(&reconstruction(), tmp_dir.path())?;

        let text = std::fs::read_to_string(tmp_dir.path().join(POSES_JSON))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let first = &value[0];
        for key in [
            "image_id",
            "image_name",
            "camera_id",
            "translation",
            "rotation_matrix",
            "quaternion",
            "num_points3D",
        ] {
            assert!(first.get(key).is_some(), "missing {key}");
        }
        assert_eq!(first["image_name"], "a.jpg");
        assert_eq!(first["num_points3D"], 2);
        Ok(())
    }

    #[test]
    fn formats_agree() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir()?;
        let poses = export_camera_poses(&reconstruction(), tmp_dir.path())?;
        let json = read_poses_json(tmp_dir.path().join(POSES_JSON))?;
        let tum = data_lines(&tmp_dir.path().join(TRAJECTORY_TUM))?;
        let images = data_lines(&tmp_dir.path().join(IMAGES_POSES_TXT))?;

        assert_eq!(json.len(), 3);
        assert_eq!(tum.len(), json.len());
        assert_eq!(images.len(), json.len());

        let names = poses.iter().map(|p| p.image_name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);

        for (i, ((pose, tum), img)) in json.iter().zip(&tum).zip(&images).enumerate() {
            let num = |s: &String| s.parse::<f64>().unwrap();
            let [tx, ty, tz] = pose.translation;
            let [qw, qx, qy, qz] = pose.quaternion;

            assert_eq!(tum[0], format!("{i:06}"));
            for (field, expected) in tum[1..].iter().zip([tx, ty, tz, qx, qy, qz, qw]) {
                assert_relative_eq!(num(field), expected, epsilon = 1e-6);
            }

            assert_eq!(img[0], pose.image_id.to_string());
            for (field, expected) in img[1..8].iter().zip([qw, qx, qy, qz, tx, ty, tz]) {
                assert_relative_eq!(num(field), expected, epsilon = 1e-6);
            }
            assert_eq!(img[8], pose.camera_id.to_string());
            assert_eq!(img[9], pose.image_name);
        }
        Ok(())
    }

    #[test]
    fn tum_line_format() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir()?;
        export_camera_poses(&reconstruction(), tmp_dir.path())?;
        let text = std::fs::read_to_string(tmp_dir.path().join(TRAJECTORY_TUM))?;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "# TUM trajectory format");
        assert_eq!(lines[1], "# timestamp tx ty tz qx qy qz qw");
        assert_eq!(
            lines[2],
            "000000 -1.000000 -2.000000 -3.000000 -0.000000 -0.000000 -0.000000 1.000000"
        );
        Ok(())
    }

    #[test]
    fn empty_reconstruction() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir()?;
        let poses = export_camera_poses(&Reconstruction::default(), tmp_dir.path())?;
        assert!(poses.is_empty());
        assert!(read_poses_json(tmp_dir.path().join(POSES_JSON))?.is_empty());
        assert!(data_lines(&tmp_dir.path().join(TRAJECTORY_TUM))?.is_empty());
        Ok(())
    }
}
