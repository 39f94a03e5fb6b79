//! Text formatting for panels

use facelens_core::HeadPose;

/// Round to the nearest integer, ties toward positive infinity
///
/// 2.5 -> 3, -2.5 -> -2, 0.49 -> 0. Non-finite input saturates
/// (NaN -> 0).
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    // value - floor is exact for every finite double
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// `"{x}, {y}, {z}"` with each angle rounded to an integer
pub fn format_head_pose(pose: &HeadPose) -> String {
    format!(
        "{}, {}, {}",
        round_half_up(pose.theta_x),
        round_half_up(pose.theta_y),
        round_half_up(pose.theta_z)
    )
}
