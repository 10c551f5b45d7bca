#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Extractor and matcher registry.
pub mod config;

/// The pipeline state machine.
pub mod controller;

/// Error types for the pipeline.
pub mod error;

/// Feature extraction, pair selection and matching stage.
pub mod features;

/// Subprocess backend running the hloc toolkit.
pub mod hloc;

/// Output directory layout.
pub mod layout;

/// Image pair lists.
pub mod pairs;

/// Structure-from-motion stage.
pub mod reconstruct;

/// The toolkit seam.
pub mod toolkit;
