use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use super::{CameraModelId, ColmapCamera, ColmapError, ColmapImage, ColmapPoint3d};

/// Read the cameras.bin file and return a vector of ColmapCamera structs.
///
/// Layout (little endian): `u64` count, then per camera `u32` id, `i32` model id,
/// `u64` width, `u64` height and as many `f64` params as the model requires.
pub fn read_cameras_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);

    let num_cameras = read_len(&mut reader)?;
    let mut cameras = Vec::with_capacity(num_cameras.min(1 << 16));

    for _ in 0..num_cameras {
        let camera_id = read_u32(&mut reader)?;
        let raw_model_id = read_i32(&mut reader)?;
        let model_id = CameraModelId::from_id(raw_model_id)
            .ok_or_else(|| ColmapError::InvalidCameraModel(raw_model_id.to_string()))?;
        let width = read_len(&mut reader)?;
        let height = read_len(&mut reader)?;
        let params = (0..model_id.num_params())
            .map(|_| read_f64(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        cameras.push(ColmapCamera {
            camera_id,
            model_id,
            width,
            height,
            params,
        });
    }

    Ok(cameras)
}

/// Read the images.bin file and return a vector of ColmapImage structs.
///
/// Layout (little endian): `u64` count, then per image `u32` id, 4 `f64`
/// quaternion (w, x, y, z), 3 `f64` translation, `u32` camera id, a
/// nul-terminated name, `u64` number of points and per point `f64` x, `f64` y,
/// `i64` point3d id.
pub fn read_images_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);

    let num_images = read_len(&mut reader)?;
    let mut images = Vec::with_capacity(num_images.min(1 << 16));

    for _ in 0..num_images {
        let image_id = read_u32(&mut reader)?;
        let rotation = [
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
        ];
        let translation = [
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
        ];
        let camera_id = read_u32(&mut reader)?;
        let name = read_cstring(&mut reader)?;

        let num_points2d = read_len(&mut reader)?;
        let points2d = (0..num_points2d)
            .map(|_| -> Result<(f64, f64, i64), ColmapError> {
                Ok((
                    read_f64(&mut reader)?,
                    read_f64(&mut reader)?,
                    read_i64(&mut reader)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        images.push(ColmapImage {
            name,
            image_id,
            camera_id,
            rotation,
            translation,
            points2d,
        });
    }

    Ok(images)
}

/// Read the points3D.bin file and return a vector of ColmapPoint3d structs.
///
/// Layout (little endian): `u64` count, then per point `u64` id, 3 `f64` xyz,
/// 3 `u8` rgb, `f64` error, `u64` track length and per element `u32` image id,
/// `u32` point2d index.
pub fn read_points3d_bin(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    let mut reader = BufReader::new(File::open(path)?);

    let num_points = read_len(&mut reader)?;
    let mut points = Vec::with_capacity(num_points.min(1 << 20));

    for _ in 0..num_points {
        let point3d_id = read_u64(&mut reader)?;
        let xyz = [
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
            read_f64(&mut reader)?,
        ];
        let mut rgb = [0u8; 3];
        reader.read_exact(&mut rgb)?;
        let error = read_f64(&mut reader)?;

        let track_len = read_len(&mut reader)?;
        let track = (0..track_len)
            .map(|_| -> Result<(u32, u32), ColmapError> {
                Ok((read_u32(&mut reader)?, read_u32(&mut reader)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        points.push(ColmapPoint3d {
            point3d_id,
            xyz,
            rgb,
            error,
            track,
        });
    }

    Ok(points)
}

fn read_bytes<const N: usize>(reader: &mut impl Read) -> Result<[u8; N], ColmapError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32(reader: &mut impl Read) -> Result<u32, ColmapError> {
    Ok(u32::from_le_bytes(read_bytes(reader)?))
}

fn read_i32(reader: &mut impl Read) -> Result<i32, ColmapError> {
    Ok(i32::from_le_bytes(read_bytes(reader)?))
}

fn read_u64(reader: &mut impl Read) -> Result<u64, ColmapError> {
    Ok(u64::from_le_bytes(read_bytes(reader)?))
}

fn read_i64(reader: &mut impl Read) -> Result<i64, ColmapError> {
    Ok(i64::from_le_bytes(read_bytes(reader)?))
}

fn read_f64(reader: &mut impl Read) -> Result<f64, ColmapError> {
    Ok(f64::from_le_bytes(read_bytes(reader)?))
}

fn read_len(reader: &mut impl Read) -> Result<usize, ColmapError> {
    let len = read_u64(reader)?;
    usize::try_from(len).map_err(|_| ColmapError::ParseError(format!("Invalid length: {len}")))
}

fn read_cstring(reader: &mut impl Read) -> Result<String, ColmapError> {
    let mut bytes = Vec::new();
    loop {
        let [byte] = read_bytes::<1>(reader)?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes).map_err(|e| ColmapError::ParseError(e.to_string()))
}
