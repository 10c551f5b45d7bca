use glam::DVec3;

use crate::pose::CameraPose;

/// Summary statistics of a camera trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryStats {
    /// Sum of the distances between consecutive camera centres.
    pub total_length: f64,
    /// Mean distance between consecutive camera centres.
    pub mean_step: f64,
    /// Minimum corner of the axis-aligned bounding box of the centres.
    pub bbox_min: [f64; 3],
    /// Maximum corner of the axis-aligned bounding box of the centres.
    pub bbox_max: [f64; 3],
    /// Mean of the camera centres.
    pub center: [f64; 3],
}

impl TrajectoryStats {
    /// Size of the bounding box along each axis.
    pub fn extent(&self) -> [f64; 3] {
        (DVec3::from_array(self.bbox_max) - DVec3::from_array(self.bbox_min)).to_array()
    }
}

/// Compute trajectory statistics over poses in their given order.
///
/// # Returns
///
/// `None` when fewer than two poses are given.
pub fn analyze_trajectory(poses: &[CameraPose]) -> Option<TrajectoryStats> {
    if poses.len() < 2 {
        return None;
    }

    let positions = poses.iter().map(CameraPose::position).collect::<Vec<_>>();

    let total_length = positions
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .sum::<f64>();
    let mean_step = total_length / (positions.len() - 1) as f64;

    let (bbox_min, bbox_max) = positions.iter().fold(
        (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    let center = positions.iter().copied().sum::<DVec3>() / positions.len() as f64;

    Some(TrajectoryStats {
        total_length,
        mean_step,
        bbox_min: bbox_min.to_array(),
        bbox_max: bbox_max.to_array(),
        center: center.to_array(),
    })
}

/// Log the trajectory statistics.
pub fn log_trajectory(stats: &TrajectoryStats) {
    let [ex, ey, ez] = stats.extent();
    let [cx, cy, cz] = stats.center;
    log::info!("Camera trajectory analysis:");
    log::info!("  Total trajectory length: {:.3} units", stats.total_length);
    log::info!("  Average step size: {:.3} units", stats.mean_step);
    log::info!("  Scene bounding box: {ex:.3} x {ey:.3} x {ez:.3}");
    log::info!("  Center position: ({cx:.3}, {cy:.3}, {cz:.3})");
}
