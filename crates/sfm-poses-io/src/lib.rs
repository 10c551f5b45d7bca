#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Scanning of the input directory into the image pool.
///
/// See [`collect::collect_inputs`].
pub mod collect;

/// Error types for I/O operations.
pub mod error;

/// Decoded frames and JPEG writing.
pub mod frame;

/// GStreamer video decoding (feature-gated).
///
/// Requires the `gstreamer` feature flag and system GStreamer libraries.
#[cfg(feature = "gstreamer")]
pub mod gstreamer;

/// Sorted image manifests of the pool.
pub mod manifest;

/// Image and video file classification.
pub mod media;

/// Video frame sampling.
pub mod video;
