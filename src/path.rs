//! Camera flight paths between viewpoints.
//!
//! A flight runs along a centripetal Catmull-Rom curve through the start
//! position, any intermediate waypoints, and the end position. The scene
//! renderer drives the animation clock; this module only answers "where is
//! the camera, and what is it looking at, at progress `p`".
//!
//! While flying, the camera looks slightly ahead of itself along the curve
//! so it turns into bends. Once the eased progress passes
//! [`FlightTiming::target_lock_at`] the target snaps to the destination's
//! look-at point, so the final approach frames the point of interest.

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Vec3, Viewpoint};
use crate::consts::{LOOK_AHEAD, LOOK_AHEAD_MAX, SEGMENT_SECS, TARGET_LOCK_AT};
use crate::error::TourError;

/// Knot spacing below which a segment counts as degenerate.
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Identifies one issued camera flight. Monotonic within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub u64);

/// Timing and framing parameters shared by every flight in a tour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTiming {
    /// Seconds per curve segment.
    pub segment_secs: f64,
    /// Curve-parameter look-ahead for the camera target.
    pub look_ahead: f64,
    /// Eased progress at which the target locks to the destination.
    pub target_lock_at: f64,
}

impl Default for FlightTiming {
    fn default() -> Self {
        Self { segment_secs: SEGMENT_SECS, look_ahead: LOOK_AHEAD, target_lock_at: TARGET_LOCK_AT }
    }
}

impl FlightTiming {
    /// # Errors
    ///
    /// Returns [`TourError::InvalidFlight`] when `segment_secs` is not a
    /// positive number, `look_ahead` is outside `[0, 1)`, or
    /// `target_lock_at` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), TourError> {
        if !(self.segment_secs.is_finite() && self.segment_secs > 0.0) {
            return Err(TourError::InvalidFlight(format!("segment_secs must be positive, got {}", self.segment_secs)));
        }
        if !(0.0..1.0).contains(&self.look_ahead) {
            return Err(TourError::InvalidFlight(format!("look_ahead must be in [0, 1), got {}", self.look_ahead)));
        }
        if !(0.0..=1.0).contains(&self.target_lock_at) {
            return Err(TourError::InvalidFlight(format!(
                "target_lock_at must be in [0, 1], got {}",
                self.target_lock_at
            )));
        }
        Ok(())
    }
}

/// GSAP-style `power2.inOut` easing (cubic in/out), clamped to `[0, 1]`.
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// A camera flight command: everything the renderer needs to animate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub transition: TransitionId,
    pub from: Viewpoint,
    pub to: Viewpoint,
    pub waypoints: Vec<Vec3>,
    pub duration_secs: f64,
    pub timing: FlightTiming,
}

impl FlightPlan {
    #[must_use]
    pub fn new(transition: TransitionId, from: Viewpoint, to: Viewpoint, waypoints: Vec<Vec3>, timing: FlightTiming) -> Self {
        let segments = waypoints.len() + 1;
        #[allow(clippy::cast_precision_loss)]
        let duration_secs = segments as f64 * timing.segment_secs;
        Self { transition, from, to, waypoints, duration_secs, timing }
    }

    /// Build the sampled curve for this plan.
    #[must_use]
    pub fn path(&self) -> FlightPath {
        FlightPath::new(self.from, &self.waypoints, self.to, self.timing)
    }
}

/// A Catmull-Rom curve from one viewpoint to another.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPath {
    points: Vec<Vec3>,
    destination: Viewpoint,
    timing: FlightTiming,
}

impl FlightPath {
    #[must_use]
    pub fn new(from: Viewpoint, waypoints: &[Vec3], to: Viewpoint, timing: FlightTiming) -> Self {
        let mut points = Vec::with_capacity(waypoints.len() + 2);
        points.push(from.position);
        points.extend_from_slice(waypoints);
        points.push(to.position);
        Self { points, destination: to, timing }
    }

    /// Control points, start and end included.
    #[must_use]
    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of curve segments (control points minus one).
    #[must_use]
    pub fn segments(&self) -> usize {
        self.points.len() - 1
    }

    /// Total flight time in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let segments = self.segments() as f64;
        segments * self.timing.segment_secs
    }

    /// Position on the curve at parameter `t` in `[0, 1]` (not arc length).
    #[must_use]
    pub fn point_at(&self, t: f64) -> Vec3 {
        let (p0, p1, p2, p3, w) = self.segment_at(t);
        let [c0, c1, c2, c3] = coefficients(p0, p1, p2, p3);
        c0.add(c1.scale(w)).add(c2.scale(w * w)).add(c3.scale(w * w * w))
    }

    /// Unit tangent at parameter `t`.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vec3 {
        let (p0, p1, p2, p3, w) = self.segment_at(t);
        let [_, c1, c2, c3] = coefficients(p0, p1, p2, p3);
        c1.add(c2.scale(2.0 * w)).add(c3.scale(3.0 * w * w)).normalize()
    }

    /// Camera pose at linear flight progress `progress` in `[0, 1]`.
    ///
    /// Progress is eased before sampling the curve.
    #[must_use]
    pub fn pose_at(&self, progress: f64) -> Viewpoint {
        let eased = ease_in_out_cubic(progress);
        let position = self.point_at(eased);
        let target = if eased >= self.timing.target_lock_at {
            self.destination.target
        } else {
            self.point_at((eased + self.timing.look_ahead).min(LOOK_AHEAD_MAX))
        };
        Viewpoint::new(position, target)
    }

    /// Resolve `t` to the four control points around its segment and the
    /// local weight inside that segment.
    fn segment_at(&self, t: f64) -> (Vec3, Vec3, Vec3, Vec3, f64) {
        let last = self.points.len() - 1;
        #[allow(clippy::cast_precision_loss)]
        let p = last as f64 * t.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut index = p.floor() as usize;
        let mut weight = p - p.floor();
        if index >= last {
            index = last - 1;
            weight = 1.0;
        }

        let p1 = self.points[index];
        let p2 = self.points[index + 1];
        let p0 = if index > 0 { self.points[index - 1] } else { p1.sub(p2.sub(p1)) };
        let p3 = if index + 2 <= last { self.points[index + 2] } else { p2.add(p2.sub(p1)) };
        (p0, p1, p2, p3, weight)
    }
}

/// Cubic coefficients for the centripetal Catmull-Rom segment p1 → p2.
///
/// Knot spacing is the square root of the distance between neighbours, so
/// unevenly spaced waypoints do not overshoot or backtrack.
fn coefficients(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> [Vec3; 4] {
    let mut dt1 = p1.distance(p2).sqrt();
    if dt1 < MIN_KNOT_SPACING {
        dt1 = 1.0;
    }
    let mut dt0 = p0.distance(p1).sqrt();
    if dt0 < MIN_KNOT_SPACING {
        dt0 = dt1;
    }
    let mut dt2 = p2.distance(p3).sqrt();
    if dt2 < MIN_KNOT_SPACING {
        dt2 = dt1;
    }

    let t1 = p1
        .sub(p0)
        .scale(1.0 / dt0)
        .sub(p2.sub(p0).scale(1.0 / (dt0 + dt1)))
        .add(p2.sub(p1).scale(1.0 / dt1))
        .scale(dt1);
    let t2 = p2
        .sub(p1)
        .scale(1.0 / dt1)
        .sub(p3.sub(p1).scale(1.0 / (dt1 + dt2)))
        .add(p3.sub(p2).scale(1.0 / dt2))
        .scale(dt1);

    let c0 = p1;
    let c1 = t1;
    let c2 = p1.scale(-3.0).add(p2.scale(3.0)).sub(t1.scale(2.0)).sub(t2);
    let c3 = p1.scale(2.0).sub(p2.scale(2.0)).add(t1).add(t2);
    [c0, c1, c2, c3]
}
