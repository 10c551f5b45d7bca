use std::path::Path;

use crate::{
    error::IoError,
    frame::{write_frame_jpeg, Frame, FRAME_JPEG_QUALITY},
};

/// A pull based source of decoded frames in presentation order.
pub trait FrameSource {
    /// Decode the next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, IoError>;
}

/// Opens video files into frame sources.
pub trait VideoDecoder {
    /// Open the video at `path` for sequential decoding.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, IoError>;
}

/// Decoder used when no video backend is compiled in.
///
/// Every call to [`VideoDecoder::open`] fails with [`IoError::VideoBackendUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVideoBackend;

impl VideoDecoder for NoVideoBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, IoError> {
        Err(IoError::VideoBackendUnavailable(path.to_path_buf()))
    }
}

/// The best decoder available in this build.
pub fn default_decoder() -> Box<dyn VideoDecoder> {
    #[cfg(feature = "gstreamer")]
    {
        Box::new(crate::gstreamer::GstVideoDecoder)
    }
    #[cfg(not(feature = "gstreamer"))]
    {
        Box::new(NoVideoBackend)
    }
}

/// File name of the `index`-th sampled frame.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:06}.jpg")
}

/// Sample frames from a source and write them as sequential JPEG files.
///
/// Every frame whose 0-based index is a multiple of `frame_skip` is written to
/// `output_dir` as `frame_000000.jpg`, `frame_000001.jpg`, ... Decoding stops
/// early once `max_frames` frames have been written.
///
/// # Arguments
///
/// * `source` - The decoded frame stream.
/// * `output_dir` - Directory receiving the frames, created if missing.
/// * `frame_skip` - Keep one frame every `frame_skip` frames, must be >= 1.
/// * `max_frames` - Optional cap on the number of written frames.
///
/// # Returns
///
/// The number of frames written.
pub fn extract_frames(
    source: &mut dyn FrameSource,
    output_dir: impl AsRef<Path>,
    frame_skip: usize,
    max_frames: Option<usize>,
) -> Result<usize, IoError> {
    if frame_skip == 0 {
        return Err(IoError::InvalidFrameSkip(frame_skip));
    }

    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;

    let mut frame_index = 0;
    let mut extracted = 0;

    while max_frames.map_or(true, |max| extracted < max) {
        let Some(frame) = source.next_frame()? else {
            break;
        };

        if frame_index % frame_skip == 0 {
            write_frame_jpeg(
                output_dir.join(frame_file_name(extracted)),
                &frame,
                FRAME_JPEG_QUALITY,
            )?;
            extracted += 1;
        }

        frame_index += 1;
    }

    Ok(extracted)
}
