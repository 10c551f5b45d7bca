use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use super::{CameraModelId, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d};

/// Read the cameras.txt file and return a vector of ColmapCamera structs.
///
/// # Arguments
///
/// * `path` - The path to the cameras.txt file.
///
/// # Returns
///
/// A vector of ColmapCamera structs.
pub fn read_cameras_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    data_lines(path)?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_camera_line(&line))
        .collect()
}

/// Read the points3D.txt file and return a vector of ColmapPoint3d structs.
///
/// # Arguments
///
/// * `path` - The path to the points3D.txt file.
///
/// # Returns
///
/// A vector of ColmapPoint3d structs.
pub fn read_points3d_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    data_lines(path)?
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_point3d_line(&line))
        .collect()
}

/// Read the images.txt file and return a vector of ColmapImage structs.
///
/// Each image takes two lines, the second one may be empty when the image has
/// no 2D observations.
///
/// # Arguments
///
/// * `path` - The path to the images.txt file.
///
/// # Returns
///
/// A vector of ColmapImage structs.
pub fn read_images_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    data_lines(path)?
        .chunks(2)
        .map(|chunk| match chunk {
            [line1, line2] => parse_image_line(line1, line2),
            [line1] => parse_image_line(line1, ""),
            _ => Err(ColmapError::ParseError(
                "Invalid number of lines".to_string(),
            )),
        })
        .collect()
}

/// Read all lines of a file dropping the `#` comment header.
fn data_lines(path: impl AsRef<Path>) -> Result<Vec<String>, ColmapError> {
    // open the file and create a buffered reader
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let lines = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|line| !line.starts_with('#'))
        .collect();

    Ok(lines)
}

/// Utility functions for parsing COLMAP text files
fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T, ColmapError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| ColmapError::ParseError(format!("{}: {}", s, e)))
}

fn parse_array<T: std::str::FromStr + Copy + Default, const N: usize>(
    parts: &[&str],
    what: &str,
) -> Result<[T; N], ColmapError>
where
    T::Err: std::fmt::Display,
{
    if parts.len() != N {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of {what}: {}",
            parts.len()
        )));
    }
    let mut out = [T::default(); N];
    for (dst, src) in out.iter_mut().zip(parts) {
        *dst = parse_part(src)?;
    }
    Ok(out)
}

/// Parse a camera line and return a ColmapCamera struct.
/// NOTE: The number of parameters depends on the camera model.
///       CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[0], PARAMS[1], ...
fn parse_camera_line(line: &str) -> Result<ColmapCamera, ColmapError> {
    // split the line into parts by whitespace
    let parts = line.split_whitespace().collect::<Vec<_>>();

    if parts.len() < 5 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    let model_id = CameraModelId::from_name(parts[1])
        .ok_or_else(|| ColmapError::InvalidCameraModel(parts[1].to_string()))?;

    let params = parts[4..]
        .iter()
        .map(|s| parse_part(s))
        .collect::<Result<Vec<_>, _>>()?;

    if params.len() != model_id.num_params() {
        return Err(ColmapError::InvalidNumCameraParams(params.len()));
    }

    Ok(ColmapCamera {
        camera_id: parse_part(parts[0])?,
        model_id,
        width: parse_part(parts[2])?,
        height: parse_part(parts[3])?,
        params,
    })
}

/// Parse a point3d line and return a ColmapPoint3d struct.
///       POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)
fn parse_point3d_line(line: &str) -> Result<ColmapPoint3d, ColmapError> {
    // split the line into parts by whitespace
    let parts = line.split_whitespace().collect::<Vec<_>>();

    // check if the number of parts is correct
    if parts.len() < 8 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    Ok(ColmapPoint3d {
        point3d_id: parse_part(parts[0])?,
        xyz: parse_array(&parts[1..4], "xyz coordinates")?,
        rgb: parse_array(&parts[4..7], "rgb values")?,
        error: parse_part(parts[7])?,
        track: parts[8..]
            .chunks_exact(2)
            .map(|chunk| -> Result<(u32, u32), ColmapError> {
                Ok((parse_part(chunk[0])?, parse_part(chunk[1])?))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Parse an image line and return a ColmapImage struct.
/// #   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
/// #   POINTS2D[] as (X, Y, POINT3D_ID)
fn parse_image_line(line1: &str, line2: &str) -> Result<ColmapImage, ColmapError> {
    // split the line into parts by whitespace
    let parts1 = line1.split_whitespace().collect::<Vec<_>>();
    let parts2 = line2.split_whitespace().collect::<Vec<_>>();

    if parts1.len() < 10 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts1.len()
        )));
    }

    Ok(ColmapImage {
        image_id: parse_part(parts1[0])?,
        rotation: parse_array(&parts1[1..5], "rotation coordinates")?,
        translation: parse_array(&parts1[5..8], "translation coordinates")?,
        camera_id: parse_part(parts1[8])?,
        // names may contain spaces
        name: parts1[9..].join(" "),
        points2d: parts2
            .chunks_exact(3)
            .map(|chunk| -> Result<(f64, f64, i64), ColmapError> {
                Ok((
                    parse_part(chunk[0])?,
                    parse_part(chunk[1])?,
                    parse_part(chunk[2])?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERAS_TXT: &str = "\
# Camera list with one line of data per camera:
#   CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]
# Number of cameras: 2
1 SIMPLE_RADIAL 640 480 500.0 320.0 240.0 0.01
2 PINHOLE 1280 720 900.0 901.0 640.0 360.0
";

    const IMAGES_TXT: &str = "\
# Image list with two lines of data per image:
#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
#   POINTS2D[] as (X, Y, POINT3D_ID)
# Number of images: 2, mean observations per image: 1.5
1 1 0 0 0 0.5 -1 2 1 walk/frame_000000.jpg
10.0 20.0 7 11.5 21.5 -1 12.0 22.0 8
2 0.7071067811865476 0 0.7071067811865476 0 0 0 0 2 b.jpg

";

    const POINTS3D_TXT: &str = "\
# 3D point list with one line of data per point:
#   POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)
# Number of points: 1, mean track length: 2
7 1.0 2.0 3.0 255 128 0 0.5 1 0 2 3
";

    #[test]
    fn read_text_model() -> Result<(), ColmapError> {
        let tmp_dir = tempfile::tempdir()?;
        let dir = tmp_dir.path();
        std::fs::write(dir.join("cameras.txt"), CAMERAS_TXT)?;
        std::fs::write(dir.join("images.txt"), IMAGES_TXT)?;
        std::fs::write(dir.join("points3D.txt"), POINTS3D_TXT)?;

        let cameras = read_cameras_txt(dir.join("cameras.txt"))?;
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].model_id, CameraModelId::SimpleRadial);
        assert_eq!(cameras[1].params, vec![900.0, 901.0, 640.0, 360.0]);

        let images = read_images_txt(dir.join("images.txt"))?;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "walk/frame_000000.jpg");
        assert_eq!(images[0].translation, [0.5, -1.0, 2.0]);
        assert_eq!(images[0].points2d.len(), 3);
        assert_eq!(images[0].num_points3d(), 2);
        assert_eq!(images[1].camera_id, 2);
        assert!(images[1].points2d.is_empty());

        let points = read_points3d_txt(dir.join("points3D.txt"))?;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].rgb, [255, 128, 0]);
        assert_eq!(points[0].track, vec![(1, 0), (2, 3)]);

        Ok(())
    }

    #[test]
    fn wrong_param_count() {
        let res = parse_camera_line("1 PINHOLE 10 10 1.0 2.0 3.0");
        assert!(matches!(res, Err(ColmapError::InvalidNumCameraParams(3))));
    }

    #[test]
    fn unknown_model() {
        let res = parse_camera_line("1 WEIRD 10 10 1.0 2.0 3.0");
        assert!(matches!(res, Err(ColmapError::InvalidCameraModel(_))));
    }
}
