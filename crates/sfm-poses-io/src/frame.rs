use std::path::Path;

use jpeg_encoder::{ColorType, Encoder};

use crate::error::IoError;

/// JPEG quality used for frames sampled from videos.
pub const FRAME_JPEG_QUALITY: u8 = 95;

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels.
    pub width: usize,
    /// Height of the image in pixels.
    pub height: usize,
}

/// A decoded video frame with interleaved 8-bit RGB pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    size: ImageSize,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from a tightly packed rgb8 buffer.
    ///
    /// # Arguments
    ///
    /// * `size` - The frame size in pixels.
    /// * `data` - The pixel buffer, `width * height * 3` bytes.
    pub fn new(size: ImageSize, data: Vec<u8>) -> Result<Self, IoError> {
        let expected = size.width * size.height * 3;
        if data.len() != expected {
            return Err(IoError::InvalidFrameBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Create a frame filled with a single value.
    pub fn from_size_val(size: ImageSize, val: u8) -> Self {
        Self {
            size,
            data: vec![val; size.width * size.height * 3],
        }
    }

    /// The frame size in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The raw rgb8 pixel buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Writes the given frame as an rgb8 JPEG file.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `frame` - The frame to encode.
/// - `quality` - The quality of the JPEG encoding, range from 0 (lowest) to 100 (highest)
pub fn write_frame_jpeg(
    file_path: impl AsRef<Path>,
    frame: &Frame,
    quality: u8,
) -> Result<(), IoError> {
    let size = frame.size();
    let (width, height) = match (u16::try_from(size.width), u16::try_from(size.height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(IoError::FrameTooLarge(size.width, size.height)),
    };
    let encoder = Encoder::new_file(file_path, quality)?;
    encoder.encode(frame.as_slice(), width, height, ColorType::Rgb)?;
    Ok(())
}
