use std::path::{Path, PathBuf};

use gstreamer::prelude::*;

use crate::{
    error::IoError,
    frame::{Frame, ImageSize},
    video::{FrameSource, VideoDecoder},
};

/// Video decoder backed by a GStreamer `decodebin` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct GstVideoDecoder;

impl VideoDecoder for GstVideoDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, IoError> {
        Ok(Box::new(GstFrameSource::new(path)?))
    }
}

/// Decodes every frame of a video file as rgb8, pulled synchronously from an appsink.
pub struct GstFrameSource {
    path: PathBuf,
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
}

impl GstFrameSource {
    /// Build and start the decoding pipeline for `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let err = |message: String| IoError::VideoDecodeError {
            path: path.clone(),
            message,
        };

        // make sure that we do not initialize gstreamer several times
        if !gstreamer::INITIALIZED.load(std::sync::atomic::Ordering::Relaxed) {
            gstreamer::init().map_err(|e| err(e.to_string()))?;
        }

        // sync=false so that frames are delivered as fast as they decode
        let pipeline_desc = format!(
            "filesrc location=\"{}\" ! \
            decodebin ! \
            videoconvert ! \
            video/x-raw,format=RGB ! \
            appsink name=sink sync=false",
            path.to_string_lossy()
        );

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| err(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| err("failed to downcast pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| err("failed to get the appsink".to_string()))?
            .dynamic_cast::<gstreamer_app::AppSink>()
            .map_err(|_| err("failed to downcast appsink".to_string()))?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| err(e.to_string()))?;

        log::debug!("gstreamer decoding {}", path.display());

        Ok(Self {
            path,
            pipeline,
            appsink,
        })
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        IoError::VideoDecodeError {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    /// Drain the bus looking for an error posted by the pipeline.
    fn bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
        match msg.view() {
            gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
            _ => None,
        }
    }

    fn sample_to_frame(&self, sample: &gstreamer::Sample) -> Result<Frame, IoError> {
        let caps = sample
            .caps()
            .ok_or_else(|| self.error("sample without caps"))?;
        let structure = caps
            .structure(0)
            .ok_or_else(|| self.error("caps without structure"))?;

        let width = structure
            .get::<i32>("width")
            .map_err(|e| self.error(e.to_string()))? as usize;
        let height = structure
            .get::<i32>("height")
            .map_err(|e| self.error(e.to_string()))? as usize;

        let buffer = sample
            .buffer()
            .ok_or_else(|| self.error("sample without buffer"))?
            .map_readable()
            .map_err(|e| self.error(e.to_string()))?;
        let pixels = pack_rgb_rows(buffer.as_slice(), width, height)
            .map_err(|e| self.error(e))?;
        Frame::new(ImageSize { width, height }, pixels)
    }
}

/// Copy `height` rows of `width` rgb pixels out of a buffer whose rows may be padded.
fn pack_rgb_rows(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    if width == 0 || height == 0 {
        return Err(format!("empty frame of {width}x{height}"));
    }

    // rows are padded to 4 bytes by videoconvert
    let row_bytes = width * 3;
    let stride = data.len() / height;
    if stride < row_bytes {
        return Err(format!(
            "buffer of {} bytes too small for {width}x{height} rgb",
            data.len()
        ));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height);
    for row in data.chunks(stride).take(height) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    Ok(pixels)
}

impl FrameSource for GstFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, IoError> {
        match self.appsink.pull_sample() {
            Ok(sample) => self.sample_to_frame(&sample).map(Some),
            Err(_) if self.appsink.is_eos() => Ok(None),
            Err(e) => Err(self.error(self.bus_error().unwrap_or_else(|| e.to_string()))),
        }
    }
}

impl Drop for GstFrameSource {
    fn drop(&mut self) {
        if self.pipeline.set_state(gstreamer::State::Null).is_err() {
            log::warn!("failed to stop the decoder for {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pack_rgb_rows;

    #[test]
    fn padded_rows() {
        // 1x2 rgb with rows padded from 3 to 4 bytes
        let data = [1, 2, 3, 0, 4, 5, 6, 0];
        assert_eq!(pack_rgb_rows(&data, 1, 2), Ok(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn empty_frames_are_errors() {
        assert!(pack_rgb_rows(&[], 0, 0).is_err());
        assert!(pack_rgb_rows(&[], 0, 4).is_err());
        assert!(pack_rgb_rows(&[0; 12], 4, 0).is_err());
    }

    #[test]
    fn short_buffer() {
        assert!(pack_rgb_rows(&[0; 5], 2, 1).is_err());
    }
}
