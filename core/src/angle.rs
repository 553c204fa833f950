//! Heading arithmetic in degrees.
//!
//! Every facing stored by the simulation lives in `(-180, 180]`.

use glam::Vec2;

/// Wraps an angle into `(-180, 180]`.
#[must_use]
pub fn normalize_degrees(angle: f32) -> f32 {
    let mut wrapped = angle % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Signed shortest turn that brings `from` onto `to`, in `(-180, 180]`.
#[must_use]
pub fn shortest_turn(from: f32, to: f32) -> f32 {
    normalize_degrees(to - from)
}

/// Heading of the vector pointing from `from` to `to`.
#[must_use]
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    normalize_degrees(delta.y.atan2(delta.x).to_degrees())
}

/// Unit vector for a heading expressed in degrees.
#[must_use]
pub fn heading_vector(angle: f32) -> Vec2 {
    let radians = angle.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}
