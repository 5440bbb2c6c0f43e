//! Tour data model: points of interest, their activation state, and the
//! aggregate `TourState` that the engine mutates.
//!
//! The tour is strictly linear. Ordinal order is fixed at creation and is
//! the narrative order. At any time exactly one frontier ordinal exists:
//! every point below it is `Visited`, the frontier itself is `Active` (or
//! `Visited` once the tour is complete), and every point above it is
//! `Locked`.

#[cfg(test)]
#[path = "tour_test.rs"]
mod tour_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Vec3, Viewpoint};

/// Stable identifier for a point of interest (e.g. `"point_3"`).
pub type PointId = String;

/// Activation state of a single point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointState {
    /// Not yet reachable; clicks are ignored.
    #[default]
    Locked,
    /// The frontier: reachable, not yet completed.
    Active,
    /// Completed; still reachable for a revisit.
    Visited,
}

/// A discrete stop in the guided tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: PointId,
    /// Marker position in scene space. Passed through to the renderer.
    pub position: Vec3,
    /// Camera pose used when viewing this point.
    pub viewpoint: Viewpoint,
    /// Intermediate path points flown through on the way here. Empty means a
    /// direct flight.
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
    /// Index into the artwork catalog. Defaults to the point's ordinal.
    #[serde(default)]
    pub artwork_ref: Option<usize>,
    /// Proximity tag value that confirms the visit (NFC text record).
    #[serde(default)]
    pub tag: Option<String>,
    /// Narration track played while this point is focused.
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(skip)]
    pub state: PointState,
}

/// Persisted progress: the only data needed to resume a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Frontier ordinal. Signed so corrupt stored values survive parsing and
    /// can be rejected by range.
    pub active_ordinal: i64,
    /// The last point has been visited.
    #[serde(default)]
    pub complete: bool,
    /// The frontier advanced but the unlock reveal has not been shown yet.
    #[serde(default)]
    pub pending_advance: bool,
}

impl Progress {
    #[must_use]
    pub fn at(active_ordinal: i64) -> Self {
        Self { active_ordinal, ..Self::default() }
    }
}

/// Outcome of advancing the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// `visited` was marked visited and `unlocked` became the new frontier.
    Unlocked { visited: usize, unlocked: usize },
    /// The last point was marked visited; the tour is complete.
    Completed { visited: usize },
    /// Nothing changed (already complete, or an empty tour).
    Unchanged,
}

/// The aggregate tour state. One instance per tour session.
#[derive(Debug, Clone, PartialEq)]
pub struct TourState {
    points: Vec<PointOfInterest>,
    active: usize,
    /// Point currently viewed in close-up, if any.
    pub focused: Option<usize>,
    /// Most recently focused point, kept after the camera returns.
    pub last_viewed: Option<usize>,
    /// The informational overlay is showing for `focused`.
    pub overlay_open: bool,
    pending_advance: bool,
}

impl TourState {
    /// Build a tour from its points, optionally resuming persisted progress.
    ///
    /// A persisted ordinal outside `0..points.len()` is treated as absent and
    /// the tour starts from the first point.
    #[must_use]
    pub fn initialize(mut points: Vec<PointOfInterest>, persisted: Option<Progress>) -> Self {
        let len = points.len();
        let resume = persisted.and_then(|p| match usize::try_from(p.active_ordinal) {
            Ok(k) if k < len => Some((k, p)),
            _ => {
                log::warn!("ignoring persisted ordinal {} for a {len}-point tour", p.active_ordinal);
                None
            }
        });
        let (active, complete, pending_advance) = match resume {
            Some((k, p)) => (k, p.complete && k + 1 == len, p.pending_advance),
            None => (0, false, false),
        };

        for (i, point) in points.iter_mut().enumerate() {
            point.state = match i.cmp(&active) {
                std::cmp::Ordering::Less => PointState::Visited,
                std::cmp::Ordering::Equal if complete => PointState::Visited,
                std::cmp::Ordering::Equal => PointState::Active,
                std::cmp::Ordering::Greater => PointState::Locked,
            };
        }

        Self { points, active, focused: None, last_viewed: None, overlay_open: false, pending_advance }
    }

    // --- Queries ---

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    #[must_use]
    pub fn point(&self, ordinal: usize) -> Option<&PointOfInterest> {
        self.points.get(ordinal)
    }

    #[must_use]
    pub fn ordinal_of(&self, id: &str) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    #[must_use]
    pub fn state(&self, ordinal: usize) -> Option<PointState> {
        self.points.get(ordinal).map(|p| p.state)
    }

    /// Frontier ordinal.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    /// The point a click may target: frontier and everything before it.
    #[must_use]
    pub fn is_clickable(&self, ordinal: usize) -> bool {
        ordinal < self.points.len() && ordinal <= self.active
    }

    /// Ids of every clickable point, in tour order.
    #[must_use]
    pub fn clickable_ids(&self) -> Vec<PointId> {
        self.points
            .iter()
            .take(self.active + 1)
            .map(|p| p.id.clone())
            .collect()
    }

    /// The last point has been visited.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.points
            .last()
            .is_some_and(|p| p.state == PointState::Visited)
    }

    #[must_use]
    pub fn pending_advance(&self) -> bool {
        self.pending_advance
    }

    /// Fraction of the tour completed, in `[0, 1]`.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let visited = self.points.iter().filter(|p| p.state == PointState::Visited).count();
        #[allow(clippy::cast_precision_loss)]
        let fraction = visited as f64 / self.points.len() as f64;
        fraction
    }

    /// Progress to hand to the persistent store.
    #[must_use]
    pub fn persisted_snapshot(&self) -> Progress {
        Progress {
            active_ordinal: i64::try_from(self.active).unwrap_or(i64::MAX),
            complete: self.is_complete(),
            pending_advance: self.pending_advance,
        }
    }

    /// Check the linear-order invariant: visited below the frontier, locked
    /// above it, and the frontier itself active unless the tour is complete.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.points.is_empty() {
            return self.active == 0;
        }
        let last = self.points.len() - 1;
        self.points.iter().enumerate().all(|(i, p)| match i.cmp(&self.active) {
            std::cmp::Ordering::Less => p.state == PointState::Visited,
            std::cmp::Ordering::Equal if i == last => p.state != PointState::Locked,
            std::cmp::Ordering::Equal => p.state == PointState::Active,
            std::cmp::Ordering::Greater => p.state == PointState::Locked,
        })
    }

    // --- Mutations ---

    /// Mark the frontier visited and unlock the next point, if any.
    ///
    /// Sets the pending-advance flag when a new point is unlocked.
    pub fn advance(&mut self) -> Advance {
        let visited = self.active;
        let Some(point) = self.points.get_mut(visited) else {
            return Advance::Unchanged;
        };
        if point.state == PointState::Visited {
            return Advance::Unchanged;
        }
        point.state = PointState::Visited;

        match self.points.get_mut(visited + 1) {
            Some(next) => {
                next.state = PointState::Active;
                self.active = visited + 1;
                self.pending_advance = true;
                Advance::Unlocked { visited, unlocked: self.active }
            }
            None => Advance::Completed { visited },
        }
    }

    /// Clear the pending-advance flag. Returns whether it was set.
    pub fn take_pending_advance(&mut self) -> bool {
        std::mem::take(&mut self.pending_advance)
    }
}
