//! Fixed-point angles.
//!
//! A full turn is `TRIG_MAX_ANGLE` units and sine/cosine results are scaled
//! to `TRIG_MAX_RATIO`. Values come from `libm` rather than a lookup table,
//! rounded to the nearest integer.

use core::f32::consts::PI;

use embedded_graphics::prelude::Point;

/// One full turn (360 degrees).
pub const TRIG_MAX_ANGLE: i32 = 0x10000;

/// Fixed-point `1.0` for `sin_lookup` / `cos_lookup` results.
pub const TRIG_MAX_RATIO: i32 = 0xFFFF;

/// Wraps any angle (including negative ones) into `[0, TRIG_MAX_ANGLE)`.
#[inline]
pub const fn normalize_angle(angle: i32) -> i32 {
    angle.rem_euclid(TRIG_MAX_ANGLE)
}

#[inline]
fn to_radians(angle: i32) -> f32 {
    normalize_angle(angle) as f32 * (2.0 * PI / TRIG_MAX_ANGLE as f32)
}

pub fn sin_lookup(angle: i32) -> i32 {
    libm::roundf(libm::sinf(to_radians(angle)) * TRIG_MAX_RATIO as f32) as i32
}

pub fn cos_lookup(angle: i32) -> i32 {
    libm::roundf(libm::cosf(to_radians(angle)) * TRIG_MAX_RATIO as f32) as i32
}

/// Rotates `p` about the origin. Positive angles turn clockwise on a
/// y-down screen; results are truncated towards zero.
pub fn rotate_point(p: Point, angle: i32) -> Point {
    let cos = cos_lookup(angle) as i64;
    let sin = sin_lookup(angle) as i64;
    let (x, y) = (p.x as i64, p.y as i64);
    let ratio = TRIG_MAX_RATIO as i64;
    Point::new(
        ((x * cos - y * sin) / ratio) as i32,
        ((x * sin + y * cos) / ratio) as i32,
    )
}

/// Point at distance `radius` from `center` along `angle`, where angle 0
/// is 3 o'clock (screen x axis). Callers wanting 12 o'clock subtract a
/// quarter turn first.
pub fn polar_point(center: Point, angle: i32, radius: i32) -> Point {
    let cos = cos_lookup(angle);
    let sin = sin_lookup(angle);
    Point::new(
        center.x + cos * radius / TRIG_MAX_RATIO,
        center.y + sin * radius / TRIG_MAX_RATIO,
    )
}
