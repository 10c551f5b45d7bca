#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// COLMAP model readers, text and binary.
pub mod colmap;

/// Pose exports: JSON, TUM trajectory and detailed text.
pub mod export;

/// Camera-to-world poses of registered images.
pub mod pose;

/// Reconstructions keyed by id and model directory loading.
pub mod reconstruction;

/// Trajectory statistics.
pub mod trajectory;

#[cfg(test)]
mod fixtures;
