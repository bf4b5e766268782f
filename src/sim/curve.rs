//! Quadratic Bézier geometry for curved throws
//!
//! A curve is defined by:
//! - start: launch origin
//! - control: origin-target midpoint raised by the curve height
//! - end: target point
//!
//! Position at parameter t is (1-t)²·p0 + 2(1-t)t·p1 + t²·p2.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::clamp01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticBezier {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
}

impl QuadraticBezier {
    pub fn new(start: Vec3, control: Vec3, end: Vec3) -> Self {
        Self {
            start,
            control,
            end,
        }
    }

    /// Curve whose control point sits `height` above the start-end midpoint
    pub fn arched(start: Vec3, end: Vec3, height: f32) -> Self {
        Self::new(start, Self::control_point(start, end, height), end)
    }

    /// Midpoint of start and end, offset upward by `height`
    #[inline]
    pub fn control_point(start: Vec3, end: Vec3, height: f32) -> Vec3 {
        (start + end) / 2.0 + Vec3::Y * height
    }

    /// Point on the curve (t clamped to [0, 1])
    pub fn point_at(&self, t: f32) -> Vec3 {
        let t = clamp01(t);
        let u = 1.0 - t;
        u * u * self.start + 2.0 * u * t * self.control + t * t * self.end
    }

    /// Point reached after `elapsed` seconds of a `duration`-second traversal
    pub fn point_after(&self, elapsed: f32, duration: f32) -> Vec3 {
        if duration <= 0.0 {
            return self.end;
        }
        self.point_at(elapsed / duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_curve_midpoint() {
        // origin (0,0,0), target (0,0,10), height 1 => control (0,1,5)
        let curve = QuadraticBezier::arched(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), 1.0);
        assert!(approx(curve.control, Vec3::new(0.0, 1.0, 5.0)));
        // t = 0.5: 0.25*p0 + 0.5*p1 + 0.25*p2 = (0, 0.5, 5)
        let mid = curve.point_after(1.25, 2.5);
        assert!(approx(mid, Vec3::new(0.0, 0.5, 5.0)));
    }

    #[test]
    fn test_curve_clamps_parameter() {
        let curve = QuadraticBezier::arched(Vec3::ZERO, Vec3::X * 4.0, 2.0);
        assert!(approx(curve.point_at(-1.0), curve.start));
        assert!(approx(curve.point_at(3.0), curve.end));
        assert!(approx(curve.point_after(10.0, 2.5), curve.end));
        assert!(approx(curve.point_after(1.0, 0.0), curve.end));
    }

    fn vec3_strategy() -> impl Strategy<Value = Vec3> {
        (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_curve_endpoints(start in vec3_strategy(), end in vec3_strategy(), height in -5.0f32..5.0) {
            let curve = QuadraticBezier::arched(start, end, height);
            prop_assert!((curve.point_at(0.0) - start).length() < 1e-3);
            prop_assert!((curve.point_at(1.0) - end).length() < 1e-3);
        }
    }
}
