//! Tour progression engine: the sole authority over which points are
//! clickable, what a click does, and when the frontier advances.
//!
//! `EngineCore` is single-threaded and never blocks. Every operation
//! synchronously updates state and returns the [`Action`]s the host should
//! forward to the scene renderer and presentation layer. Camera flights are
//! asynchronous on the renderer side; their completion comes back in through
//! [`EngineCore::fly_to_arrived`] and [`EngineCore::return_arrived`].
//!
//! ```text
//! Overview ──request_focus──▶ FlyingTo ──fly_to_arrived──▶ Focused
//!    ▲                                                      │
//!    └──return_arrived── Returning ◀──confirm_leave / close_overlay
//! ```
//!
//! The engine performs no storage I/O. It exposes
//! [`EngineCore::persisted_snapshot`] and emits [`Action::ProgressChanged`]
//! so the caller can write progress wherever it likes.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;

use crate::camera::Viewpoint;
use crate::config::TourConfig;
use crate::content::{Artwork, ArtworkCatalog};
use crate::path::{FlightPlan, FlightTiming, TransitionId};
use crate::proximity::{self, TagMatch};
use crate::tour::{Advance, PointId, PointOfInterest, PointState, Progress, TourState};

/// Commands and notifications returned from engine operations for the host
/// to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Replace the set of markers that accept clicks.
    SetClickable { ids: Vec<PointId> },
    /// Cosmetic hint for a marker's appearance.
    SetMarkerVisualState { id: PointId, state: PointState },
    /// Animate the camera to a point of interest.
    FlyTo { id: PointId, plan: FlightPlan },
    /// Animate the camera back to the overview pose.
    FlyToOverview { plan: FlightPlan },
    /// Abandon an in-flight camera animation.
    CancelFlight { transition: TransitionId },
    /// Play the unlock animation for a newly reachable marker.
    RevealMarker { id: PointId },
    /// The focused point changed. Narration follows this.
    FocusChanged { id: Option<PointId> },
    /// The overlay opened for `id`, or closed.
    OverlayChanged { open: bool, id: Option<PointId> },
    /// Route the host to another page (proximity tag target).
    Navigate { route: String },
    /// Persisted progress changed; the caller should store it.
    ProgressChanged { progress: Progress },
    /// The last point was visited.
    TourCompleted,
}

/// Where the engine is in the focus/return cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Browsing the map; no flight outstanding.
    Overview,
    /// Flying to `target`; waiting for `fly_to_arrived`.
    FlyingTo { transition: TransitionId, target: usize },
    /// Viewing `point` in close-up.
    Focused { point: usize },
    /// Flying back to the overview from `from`; waiting for `return_arrived`.
    Returning { transition: TransitionId, from: usize },
}

/// Read-only view of one point for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointView {
    pub id: PointId,
    pub state: PointState,
    pub clickable: bool,
}

/// Typed read model of the whole tour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourSnapshot {
    pub points: Vec<PointView>,
    pub active: usize,
    pub focused: Option<PointId>,
    pub last_viewed: Option<PointId>,
    pub overlay_open: bool,
    pub transitioning: bool,
    pub complete: bool,
    pub progress_fraction: f64,
}

/// Core engine state. All tour logic, no browser dependencies.
pub struct EngineCore {
    state: TourState,
    overview: Viewpoint,
    timing: FlightTiming,
    artworks: ArtworkCatalog,
    phase: Phase,
    next_transition: u64,
}

impl EngineCore {
    /// Build an engine from a validated tour definition, resuming persisted
    /// progress when it is in range.
    #[must_use]
    pub fn new(config: &TourConfig, persisted: Option<Progress>) -> Self {
        Self {
            state: TourState::initialize(config.points.clone(), persisted),
            overview: config.overview,
            timing: config.flight,
            artworks: config.artworks.clone(),
            phase: Phase::Overview,
            next_transition: 1,
        }
    }

    // --- Session start ---

    /// Initial renderer setup: clickable markers, every marker's visual
    /// state, and the unlock reveal left pending by a previous page.
    pub fn start(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::SetClickable { ids: self.state.clickable_ids() }];
        actions.extend(
            self.state
                .points()
                .iter()
                .map(|p| Action::SetMarkerVisualState { id: p.id.clone(), state: p.state }),
        );
        self.flush_pending_advance(&mut actions);
        actions
    }

    // --- Renderer events ---

    /// A marker was clicked. Starts a flight to it when allowed.
    ///
    /// Rejected without effect when a flight is already outstanding, when the
    /// point is unknown or locked, or when it is already focused.
    pub fn request_focus(&mut self, id: &str) -> Vec<Action> {
        let Some(target) = self.state.ordinal_of(id) else {
            log::debug!("ignoring click on unknown point {id}");
            return Vec::new();
        };
        if self.is_transitioning() {
            log::debug!("ignoring click on {id}: transition in progress");
            return Vec::new();
        }
        if !self.state.is_clickable(target) {
            log::debug!("ignoring click on locked point {id}");
            return Vec::new();
        }

        let mut actions = Vec::new();
        let from = match self.phase {
            Phase::Focused { point } if point == target => return actions,
            Phase::Focused { point } => {
                self.clear_focus(&mut actions);
                self.viewpoint_of(point)
            }
            _ => self.overview,
        };

        let Some(point) = self.state.point(target) else {
            return Vec::new();
        };
        let to = point.viewpoint;
        let waypoints = point.waypoints.clone();
        let point_id = point.id.clone();

        let transition = self.next_transition_id();
        let plan = FlightPlan::new(transition, from, to, waypoints, self.timing);
        log::debug!("flying to {point_id} ({:?}, {:.1}s)", transition, plan.duration_secs);
        self.phase = Phase::FlyingTo { transition, target };
        actions.push(Action::FlyTo { id: point_id, plan });
        actions
    }

    /// The renderer finished a flight to `id`. Opens the overlay.
    ///
    /// Ignored unless it matches the outstanding flight.
    pub fn fly_to_arrived(&mut self, id: &str) -> Vec<Action> {
        let Phase::FlyingTo { target, .. } = self.phase else {
            log::warn!("unexpected arrival at {id} while {:?}", self.phase);
            return Vec::new();
        };
        if self.state.ordinal_of(id) != Some(target) {
            log::warn!("arrival at {id} does not match pending target {target}");
            return Vec::new();
        }

        self.phase = Phase::Focused { point: target };
        self.state.focused = Some(target);
        self.state.last_viewed = Some(target);
        self.state.overlay_open = true;
        vec![
            Action::FocusChanged { id: Some(id.to_string()) },
            Action::OverlayChanged { open: true, id: Some(id.to_string()) },
        ]
    }

    /// The renderer finished the flight back to the overview.
    ///
    /// Ignored unless a return flight is outstanding.
    pub fn return_arrived(&mut self) -> Vec<Action> {
        if !matches!(self.phase, Phase::Returning { .. }) {
            log::warn!("unexpected return arrival while {:?}", self.phase);
            return Vec::new();
        }

        self.phase = Phase::Overview;
        let mut actions = Vec::new();
        self.clear_focus(&mut actions);
        self.flush_pending_advance(&mut actions);
        actions
    }

    // --- Visitor signals ---

    /// The visitor is done with the focused point (proximity scan or the
    /// explicit "no tag access" affordance).
    ///
    /// Advances the frontier when the focused point is the frontier, then
    /// flies back to the overview. No-op unless a point is focused, so a
    /// second call before the next focus has no effect.
    pub fn confirm_leave(&mut self) -> Vec<Action> {
        let Phase::Focused { point } = self.phase else {
            log::debug!("ignoring leave: no focused point ({:?})", self.phase);
            return Vec::new();
        };

        let mut actions = Vec::new();
        self.close_overlay_only(&mut actions);
        if point == self.state.active() {
            self.advance(&mut actions);
        }
        self.begin_return(point, &mut actions);
        actions
    }

    /// The visitor dismissed the overlay without confirming the visit.
    ///
    /// Flies back to the overview without advancing the frontier.
    pub fn close_overlay(&mut self) -> Vec<Action> {
        let Phase::Focused { point } = self.phase else {
            log::debug!("ignoring close: no focused point ({:?})", self.phase);
            return Vec::new();
        };

        let mut actions = Vec::new();
        self.clear_focus(&mut actions);
        self.begin_return(point, &mut actions);
        actions
    }

    /// A proximity tag was read while a point is focused.
    ///
    /// Confirms the visit when the tag belongs to the focused point, or when
    /// the focused point has no tag, then asks the host to navigate to the
    /// tag's route.
    pub fn proximity_scanned(&mut self, tag: &str) -> Vec<Action> {
        let Phase::Focused { point } = self.phase else {
            log::debug!("ignoring tag {tag}: no focused point");
            return Vec::new();
        };
        let Some(focused) = self.state.point(point) else {
            return Vec::new();
        };

        match proximity::match_tag(focused, tag) {
            TagMatch::Matches | TagMatch::Untagged => {
                let route = format!("/{}", proximity::normalize_tag(tag));
                let mut actions = self.confirm_leave();
                actions.push(Action::Navigate { route });
                actions
            }
            TagMatch::Mismatch => {
                log::warn!("tag {tag} does not belong to {}", focused.id);
                Vec::new()
            }
        }
    }

    /// Force the engine back to the overview, abandoning any outstanding
    /// flight. Intended for caller-owned timeouts when the renderer never
    /// reports arrival.
    pub fn cancel_transition(&mut self) -> Vec<Action> {
        let transition = match self.phase {
            Phase::FlyingTo { transition, .. } | Phase::Returning { transition, .. } => transition,
            Phase::Overview | Phase::Focused { .. } => return Vec::new(),
        };
        log::warn!("cancelling flight {transition:?}");

        self.phase = Phase::Overview;
        let mut actions = vec![Action::CancelFlight { transition }];
        self.clear_focus(&mut actions);
        self.flush_pending_advance(&mut actions);
        actions
    }

    // --- Queries ---

    /// A camera flight is outstanding.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::FlyingTo { .. } | Phase::Returning { .. })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Id of the outstanding flight, if any.
    #[must_use]
    pub fn pending_transition(&self) -> Option<TransitionId> {
        match self.phase {
            Phase::FlyingTo { transition, .. } | Phase::Returning { transition, .. } => Some(transition),
            Phase::Overview | Phase::Focused { .. } => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &TourState {
        &self.state
    }

    /// Progress to hand to the persistent store.
    #[must_use]
    pub fn persisted_snapshot(&self) -> Progress {
        self.state.persisted_snapshot()
    }

    /// The point currently in close-up, if any.
    #[must_use]
    pub fn focused(&self) -> Option<&PointOfInterest> {
        self.state.focused.and_then(|i| self.state.point(i))
    }

    /// Overlay content for the focused point.
    #[must_use]
    pub fn overlay_artwork(&self) -> Option<&Artwork> {
        if !self.state.overlay_open {
            return None;
        }
        let ordinal = self.state.focused?;
        let point = self.state.point(ordinal)?;
        self.artworks.for_point(point, ordinal)
    }

    /// Build the read model for presentation layers.
    #[must_use]
    pub fn snapshot(&self) -> TourSnapshot {
        let id_of = |i: usize| self.state.point(i).map(|p| p.id.clone());
        TourSnapshot {
            points: self
                .state
                .points()
                .iter()
                .enumerate()
                .map(|(i, p)| PointView { id: p.id.clone(), state: p.state, clickable: self.state.is_clickable(i) })
                .collect(),
            active: self.state.active(),
            focused: self.state.focused.and_then(id_of),
            last_viewed: self.state.last_viewed.and_then(id_of),
            overlay_open: self.state.overlay_open,
            transitioning: self.is_transitioning(),
            complete: self.state.is_complete(),
            progress_fraction: self.state.progress_fraction(),
        }
    }

    // --- Internals ---

    fn next_transition_id(&mut self) -> TransitionId {
        let id = TransitionId(self.next_transition);
        self.next_transition += 1;
        id
    }

    fn viewpoint_of(&self, ordinal: usize) -> Viewpoint {
        self.state.point(ordinal).map_or(self.overview, |p| p.viewpoint)
    }

    fn close_overlay_only(&mut self, actions: &mut Vec<Action>) {
        if self.state.overlay_open {
            self.state.overlay_open = false;
            actions.push(Action::OverlayChanged { open: false, id: None });
        }
    }

    fn clear_focus(&mut self, actions: &mut Vec<Action>) {
        self.close_overlay_only(actions);
        if self.state.focused.take().is_some() {
            actions.push(Action::FocusChanged { id: None });
        }
    }

    fn advance(&mut self, actions: &mut Vec<Action>) {
        match self.state.advance() {
            Advance::Unlocked { visited, unlocked } => {
                let visited_id = self.id_at(visited);
                let unlocked_id = self.id_at(unlocked);
                log::info!("frontier advanced: {visited_id} visited, {unlocked_id} unlocked");
                actions.push(Action::SetMarkerVisualState { id: visited_id, state: PointState::Visited });
                actions.push(Action::SetMarkerVisualState { id: unlocked_id, state: PointState::Active });
                actions.push(Action::SetClickable { ids: self.state.clickable_ids() });
            }
            Advance::Completed { visited } => {
                let visited_id = self.id_at(visited);
                log::info!("tour complete: {visited_id} visited");
                actions.push(Action::SetMarkerVisualState { id: visited_id, state: PointState::Visited });
                actions.push(Action::TourCompleted);
            }
            Advance::Unchanged => return,
        }
        actions.push(Action::ProgressChanged { progress: self.state.persisted_snapshot() });
        debug_assert!(self.state.is_consistent());
    }

    fn begin_return(&mut self, from: usize, actions: &mut Vec<Action>) {
        let Some(point) = self.state.point(from) else {
            self.phase = Phase::Overview;
            return;
        };
        let start = point.viewpoint;
        let waypoints = point.waypoints.iter().rev().copied().collect();

        let transition = self.next_transition_id();
        let plan = FlightPlan::new(transition, start, self.overview, waypoints, self.timing);
        log::debug!("returning to overview ({transition:?})");
        self.phase = Phase::Returning { transition, from };
        actions.push(Action::FlyToOverview { plan });
    }

    fn flush_pending_advance(&mut self, actions: &mut Vec<Action>) {
        if self.state.take_pending_advance() {
            actions.push(Action::RevealMarker { id: self.id_at(self.state.active()) });
            actions.push(Action::ProgressChanged { progress: self.state.persisted_snapshot() });
        }
    }

    fn id_at(&self, ordinal: usize) -> PointId {
        self.state.point(ordinal).map(|p| p.id.clone()).unwrap_or_default()
    }
}
