#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use sfm_poses_io as io;

#[doc(inline)]
pub use sfm_poses_3d as k3d;

#[doc(inline)]
pub use sfm_poses_pipeline as pipeline;
