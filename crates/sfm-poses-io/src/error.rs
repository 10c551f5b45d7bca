/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error to manipulate a file or directory.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error while walking a directory tree.
    #[error("Failed to walk the directory. {0}")]
    WalkDirError(#[from] walkdir::Error),

    /// Error to encode a frame as JPEG.
    #[error("Error with Jpeg encoding. {0}")]
    JpegEncodingError(#[from] jpeg_encoder::EncodingError),

    /// The frame buffer does not match its declared size.
    #[error("Invalid frame buffer: expected {expected} bytes, got {actual}")]
    InvalidFrameBuffer {
        /// Number of bytes implied by the frame size.
        expected: usize,
        /// Number of bytes in the buffer.
        actual: usize,
    },

    /// The frame is too large to be encoded as JPEG.
    #[error("Frame of {0}x{1} pixels exceeds the JPEG size limit")]
    FrameTooLarge(usize, usize),

    /// The frame skip stride must be at least one.
    #[error("Invalid frame skip {0}, must be >= 1")]
    InvalidFrameSkip(usize),

    /// No video decoding backend was compiled in.
    #[error("Cannot decode {0}: video decoding requires the `gstreamer` feature")]
    VideoBackendUnavailable(std::path::PathBuf),

    /// Error reported by the video decoding backend.
    #[error("Failed to decode video {path}: {message}")]
    VideoDecodeError {
        /// The video being decoded.
        path: std::path::PathBuf,
        /// Backend specific description.
        message: String,
    },
}
