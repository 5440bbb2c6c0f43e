#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Vec3;
use crate::content::Artwork;

// =============================================================
// Helpers
// =============================================================

fn overview() -> Viewpoint {
    Viewpoint::new(Vec3::new(-5.99, 6.46, 7.41), Vec3::new(0.0, 4.7, -5.0))
}

fn make_point(n: usize) -> PointOfInterest {
    #[allow(clippy::cast_precision_loss)]
    let z = -(n as f64) * 2.5;
    PointOfInterest {
        id: format!("point_{}", n + 1),
        position: Vec3::new(0.0, 4.7, z),
        viewpoint: Viewpoint::new(Vec3::new(0.0, 6.0, z + 3.0), Vec3::new(0.0, 4.7, z)),
        waypoints: Vec::new(),
        artwork_ref: None,
        tag: None,
        narration: None,
        state: PointState::Locked,
    }
}

fn make_config(n: usize) -> TourConfig {
    TourConfig {
        points: (0..n).map(make_point).collect(),
        overview: overview(),
        artworks: ArtworkCatalog::new(
            (0..n)
                .map(|i| Artwork {
                    title: format!("Artwork {}", i + 1),
                    description: String::new(),
                    icon: None,
                    link: None,
                })
                .collect(),
        ),
        flight: FlightTiming::default(),
        storage_prefix: "tour".into(),
    }
}

fn fresh(n: usize) -> EngineCore {
    EngineCore::new(&make_config(n), None)
}

fn resumed(n: usize, k: i64) -> EngineCore {
    EngineCore::new(&make_config(n), Some(Progress::at(k)))
}

/// Drive a full focus cycle up to the `Focused` phase.
fn focus(core: &mut EngineCore, id: &str) {
    assert!(!core.request_focus(id).is_empty(), "focus on {id} rejected");
    assert!(!core.fly_to_arrived(id).is_empty(), "arrival at {id} rejected");
}

/// Focus, confirm, and come back.
fn visit(core: &mut EngineCore, id: &str) {
    focus(core, id);
    core.confirm_leave();
    core.return_arrived();
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn count_fly_to(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::FlyTo { .. })).count()
}

fn has_fly_to_overview(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::FlyToOverview { .. }))
}

fn has_progress_changed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::ProgressChanged { .. }))
}

fn states(core: &EngineCore) -> Vec<PointState> {
    core.state().points().iter().map(|p| p.state).collect()
}

use super::PointState::{Active, Locked, Visited};

// =============================================================
// Construction and defaults
// =============================================================

#[test]
fn new_starts_in_overview() {
    let core = fresh(6);
    assert_eq!(core.phase(), Phase::Overview);
    assert!(!core.is_transitioning());
    assert_eq!(core.pending_transition(), None);
}

#[test]
fn new_without_progress_activates_first_point() {
    let core = fresh(6);
    assert_eq!(core.state().active(), 0);
    assert_eq!(states(&core), vec![Active, Locked, Locked, Locked, Locked, Locked]);
}

#[test]
fn new_has_no_focus_or_overlay() {
    let core = fresh(3);
    assert!(core.focused().is_none());
    assert!(core.overlay_artwork().is_none());
}

// =============================================================
// start
// =============================================================

#[test]
fn start_sets_clickable_and_visual_states() {
    let mut core = resumed(4, 2);
    let actions = core.start();
    assert_eq!(
        actions[0],
        Action::SetClickable { ids: vec!["point_1".into(), "point_2".into(), "point_3".into()] }
    );
    let visuals: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::SetMarkerVisualState { state, .. } => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(visuals, vec![Visited, Visited, Active, Locked]);
}

#[test]
fn start_without_pending_advance_reveals_nothing() {
    let mut core = resumed(4, 2);
    let actions = core.start();
    assert!(!has_action(&actions, |a| matches!(a, Action::RevealMarker { .. })));
    assert!(!has_progress_changed(&actions));
}

#[test]
fn start_with_pending_advance_reveals_active_marker_once() {
    let progress = Progress { active_ordinal: 2, complete: false, pending_advance: true };
    let mut core = EngineCore::new(&make_config(4), Some(progress));

    let actions = core.start();
    assert!(actions.contains(&Action::RevealMarker { id: "point_3".into() }));
    assert!(actions.contains(&Action::ProgressChanged { progress: Progress::at(2) }));
    assert!(!core.persisted_snapshot().pending_advance);

    let again = core.start();
    assert!(!has_action(&again, |a| matches!(a, Action::RevealMarker { .. })));
}

// =============================================================
// request_focus
// =============================================================

#[test]
fn request_focus_on_active_point_flies_from_overview() {
    let mut core = fresh(6);
    let actions = core.request_focus("point_1");
    assert_eq!(actions.len(), 1);
    let Action::FlyTo { id, plan } = &actions[0] else {
        panic!("expected FlyTo, got {actions:?}");
    };
    assert_eq!(id, "point_1");
    assert_eq!(plan.from, overview());
    assert_eq!(plan.to, make_point(0).viewpoint);
    assert!(plan.waypoints.is_empty());
    assert!(core.is_transitioning());
    assert_eq!(core.pending_transition(), Some(plan.transition));
}

#[test]
fn request_focus_carries_point_waypoints() {
    let mut config = make_config(2);
    config.points[0].waypoints = vec![Vec3::new(1.0, 6.0, 3.0), Vec3::new(8.12, 6.0, 3.0)];
    let mut core = EngineCore::new(&config, None);
    let actions = core.request_focus("point_1");
    let Some(Action::FlyTo { plan, .. }) = actions.first() else {
        panic!("expected FlyTo");
    };
    assert_eq!(plan.waypoints, config.points[0].waypoints);
    assert_eq!(plan.duration_secs, 4.5);
}

#[test]
fn request_focus_on_locked_point_is_rejected() {
    let mut core = fresh(6);
    let before = core.snapshot();
    assert!(core.request_focus("point_4").is_empty());
    assert_eq!(core.snapshot(), before);
    assert_eq!(core.phase(), Phase::Overview);
}

#[test]
fn request_focus_on_every_locked_point_is_rejected() {
    let mut core = resumed(6, 2);
    for n in 4..=6 {
        assert!(core.request_focus(&format!("point_{n}")).is_empty());
    }
    assert!(!core.is_transitioning());
}

#[test]
fn request_focus_on_unknown_point_is_rejected() {
    let mut core = fresh(3);
    assert!(core.request_focus("home").is_empty());
    assert!(!core.is_transitioning());
}

#[test]
fn request_focus_while_flying_is_rejected() {
    let mut core = resumed(6, 3);
    let first = core.request_focus("point_1");
    assert_eq!(count_fly_to(&first), 1);
    let pending = core.pending_transition();

    assert!(core.request_focus("point_2").is_empty());
    assert!(core.request_focus("point_1").is_empty());
    assert_eq!(core.pending_transition(), pending);
}

#[test]
fn request_focus_while_returning_is_rejected() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.close_overlay();
    assert!(core.request_focus("point_1").is_empty());
}

#[test]
fn request_focus_on_visited_point_is_allowed() {
    let mut core = resumed(6, 3);
    let actions = core.request_focus("point_2");
    assert_eq!(count_fly_to(&actions), 1);
}

#[test]
fn request_focus_on_already_focused_point_is_noop() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    assert!(core.request_focus("point_1").is_empty());
    assert_eq!(core.phase(), Phase::Focused { point: 0 });
}

#[test]
fn request_focus_hops_from_focused_point() {
    let mut core = resumed(3, 2);
    focus(&mut core, "point_1");
    let actions = core.request_focus("point_3");

    assert!(actions.contains(&Action::OverlayChanged { open: false, id: None }));
    assert!(actions.contains(&Action::FocusChanged { id: None }));
    let Some(Action::FlyTo { plan, .. }) = actions.last() else {
        panic!("expected FlyTo last, got {actions:?}");
    };
    assert_eq!(plan.from, make_point(0).viewpoint);
    assert!(!core.state().overlay_open);
    assert_eq!(core.state().focused, None);
}

#[test]
fn transition_ids_increase() {
    let mut core = fresh(2);
    let a = core.request_focus("point_1");
    core.fly_to_arrived("point_1");
    let b = core.close_overlay();
    let Action::FlyTo { plan: first, .. } = &a[0] else { panic!("expected FlyTo") };
    let Some(Action::FlyToOverview { plan: second }) = b.last() else { panic!("expected FlyToOverview") };
    assert!(second.transition > first.transition);
}

// =============================================================
// fly_to_arrived
// =============================================================

#[test]
fn arrival_opens_overlay_and_focuses() {
    let mut core = fresh(3);
    core.request_focus("point_1");
    let actions = core.fly_to_arrived("point_1");

    assert_eq!(
        actions,
        vec![
            Action::FocusChanged { id: Some("point_1".into()) },
            Action::OverlayChanged { open: true, id: Some("point_1".into()) },
        ]
    );
    assert_eq!(core.phase(), Phase::Focused { point: 0 });
    assert_eq!(core.state().focused, Some(0));
    assert_eq!(core.state().last_viewed, Some(0));
    assert!(core.state().overlay_open);
    assert!(!core.is_transitioning());
}

#[test]
fn arrival_does_not_advance_frontier() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    assert_eq!(core.state().active(), 0);
    assert_eq!(core.state().state(0), Some(Active));
}

#[test]
fn arrival_without_pending_flight_is_ignored() {
    let mut core = fresh(3);
    assert!(core.fly_to_arrived("point_1").is_empty());
    assert_eq!(core.phase(), Phase::Overview);
    assert!(!core.state().overlay_open);
}

#[test]
fn arrival_for_wrong_point_is_ignored() {
    let mut core = resumed(3, 1);
    core.request_focus("point_2");
    assert!(core.fly_to_arrived("point_1").is_empty());
    assert!(core.is_transitioning());
    assert_eq!(core.state().focused, None);
}

#[test]
fn duplicate_arrival_is_ignored() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    let before = core.snapshot();
    assert!(core.fly_to_arrived("point_1").is_empty());
    assert_eq!(core.snapshot(), before);
}

#[test]
fn overlay_artwork_resolves_focused_point() {
    let mut core = resumed(3, 1);
    focus(&mut core, "point_2");
    assert_eq!(core.overlay_artwork().map(|a| a.title.as_str()), Some("Artwork 2"));
    assert_eq!(core.focused().map(|p| p.id.as_str()), Some("point_2"));
}

// =============================================================
// confirm_leave
// =============================================================

#[test]
fn confirm_leave_advances_and_returns() {
    let mut core = fresh(6);
    focus(&mut core, "point_1");
    let actions = core.confirm_leave();

    assert_eq!(core.state().active(), 1);
    assert_eq!(core.state().state(0), Some(Visited));
    assert_eq!(core.state().state(1), Some(Active));
    assert!(has_fly_to_overview(&actions));
    assert!(actions.contains(&Action::SetMarkerVisualState { id: "point_1".into(), state: Visited }));
    assert!(actions.contains(&Action::SetMarkerVisualState { id: "point_2".into(), state: Active }));
    assert!(actions.contains(&Action::SetClickable { ids: vec!["point_1".into(), "point_2".into()] }));
    assert!(matches!(core.phase(), Phase::Returning { from: 0, .. }));
}

#[test]
fn confirm_leave_closes_overlay_but_keeps_focus_until_return() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.confirm_leave();
    assert!(!core.state().overlay_open);
    assert_eq!(core.state().focused, Some(0));
}

#[test]
fn confirm_leave_reports_progress_with_pending_advance() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    let actions = core.confirm_leave();
    let expected = Progress { active_ordinal: 1, complete: false, pending_advance: true };
    assert!(actions.contains(&Action::ProgressChanged { progress: expected }));
    assert_eq!(core.persisted_snapshot(), expected);
}

#[test]
fn return_plan_reverses_waypoints_to_overview() {
    let mut config = make_config(2);
    config.points[0].waypoints = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
    let mut core = EngineCore::new(&config, None);
    focus(&mut core, "point_1");
    let actions = core.confirm_leave();
    let Some(Action::FlyToOverview { plan }) = actions.last() else {
        panic!("expected FlyToOverview last, got {actions:?}");
    };
    assert_eq!(plan.from, config.points[0].viewpoint);
    assert_eq!(plan.to, overview());
    assert_eq!(plan.waypoints, vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
}

#[test]
fn confirm_leave_twice_is_idempotent() {
    let mut core = fresh(6);
    focus(&mut core, "point_1");
    core.confirm_leave();
    let after_one = core.snapshot();
    let progress_one = core.persisted_snapshot();

    assert!(core.confirm_leave().is_empty());
    assert_eq!(core.snapshot(), after_one);
    assert_eq!(core.persisted_snapshot(), progress_one);
}

#[test]
fn confirm_leave_after_return_is_noop() {
    let mut core = fresh(6);
    visit(&mut core, "point_1");
    assert!(core.confirm_leave().is_empty());
    assert_eq!(core.state().active(), 1);
}

#[test]
fn confirm_leave_without_focus_is_noop() {
    let mut core = fresh(3);
    assert!(core.confirm_leave().is_empty());
    core.request_focus("point_1");
    assert!(core.confirm_leave().is_empty());
    assert_eq!(core.state().active(), 0);
}

#[test]
fn confirm_leave_on_visited_point_does_not_advance() {
    let mut core = resumed(6, 3);
    focus(&mut core, "point_2");
    let actions = core.confirm_leave();
    assert_eq!(core.state().active(), 3);
    assert!(!has_progress_changed(&actions));
    assert!(has_fly_to_overview(&actions));
}

#[test]
fn confirm_leave_on_last_point_completes_tour() {
    let mut core = resumed(3, 2);
    focus(&mut core, "point_3");
    let actions = core.confirm_leave();

    assert!(actions.contains(&Action::TourCompleted));
    assert!(core.state().is_complete());
    assert_eq!(core.state().active(), 2);
    let progress = core.persisted_snapshot();
    assert!(progress.complete);
    assert!(!progress.pending_advance);
}

#[test]
fn completed_tour_revisit_does_not_complete_again() {
    let mut core = resumed(2, 1);
    visit(&mut core, "point_2");
    focus(&mut core, "point_2");
    let actions = core.confirm_leave();
    assert!(!actions.contains(&Action::TourCompleted));
    assert!(core.state().is_complete());
}

// =============================================================
// return_arrived
// =============================================================

#[test]
fn return_arrival_clears_focus_and_reveals_unlock() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.confirm_leave();
    let actions = core.return_arrived();

    assert_eq!(core.phase(), Phase::Overview);
    assert_eq!(core.state().focused, None);
    assert!(!core.state().overlay_open);
    assert_eq!(core.state().last_viewed, Some(0));
    assert!(actions.contains(&Action::FocusChanged { id: None }));
    assert!(actions.contains(&Action::RevealMarker { id: "point_2".into() }));
    assert!(actions.contains(&Action::ProgressChanged { progress: Progress::at(1) }));
}

#[test]
fn return_arrival_without_return_is_ignored() {
    let mut core = fresh(3);
    assert!(core.return_arrived().is_empty());
    focus(&mut core, "point_1");
    assert!(core.return_arrived().is_empty());
    assert_eq!(core.phase(), Phase::Focused { point: 0 });
}

#[test]
fn duplicate_return_arrival_is_ignored() {
    let mut core = fresh(3);
    visit(&mut core, "point_1");
    assert!(core.return_arrived().is_empty());
}

// =============================================================
// close_overlay
// =============================================================

#[test]
fn close_overlay_returns_without_advancing() {
    let mut core = fresh(6);
    focus(&mut core, "point_1");
    let actions = core.close_overlay();

    assert_eq!(core.state().active(), 0);
    assert_eq!(core.state().state(0), Some(Active));
    assert!(!core.state().overlay_open);
    assert_eq!(core.state().focused, None);
    assert!(has_fly_to_overview(&actions));
    assert!(!has_progress_changed(&actions));
}

#[test]
fn close_overlay_then_return_has_no_reveal() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.close_overlay();
    let actions = core.return_arrived();
    assert!(actions.is_empty());
    assert_eq!(core.phase(), Phase::Overview);
}

#[test]
fn close_overlay_after_confirm_keeps_advance() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.confirm_leave();
    assert!(core.close_overlay().is_empty());
    assert_eq!(core.state().active(), 1);
}

#[test]
fn close_overlay_without_focus_is_noop() {
    let mut core = fresh(3);
    assert!(core.close_overlay().is_empty());
}

#[test]
fn point_can_be_refocused_after_close() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.close_overlay();
    core.return_arrived();
    focus(&mut core, "point_1");
    assert!(core.state().overlay_open);
}

// =============================================================
// proximity_scanned
// =============================================================

#[test]
fn matching_tag_confirms_and_navigates() {
    let mut config = make_config(3);
    config.points[0].tag = Some("vestige_1".into());
    let mut core = EngineCore::new(&config, None);
    focus(&mut core, "point_1");

    let actions = core.proximity_scanned("vestige_1");
    assert_eq!(core.state().active(), 1);
    assert!(has_fly_to_overview(&actions));
    assert_eq!(actions.last(), Some(&Action::Navigate { route: "/vestige_1".into() }));
}

#[test]
fn mismatched_tag_is_ignored() {
    let mut config = make_config(3);
    config.points[0].tag = Some("vestige_1".into());
    let mut core = EngineCore::new(&config, None);
    focus(&mut core, "point_1");

    assert!(core.proximity_scanned("vestige_4").is_empty());
    assert_eq!(core.state().active(), 0);
    assert_eq!(core.phase(), Phase::Focused { point: 0 });
}

#[test]
fn untagged_point_accepts_any_tag() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    let actions = core.proximity_scanned("/vestige_2");
    assert_eq!(core.state().active(), 1);
    assert!(actions.contains(&Action::Navigate { route: "/vestige_2".into() }));
}

#[test]
fn tag_without_focus_is_ignored() {
    let mut core = fresh(3);
    assert!(core.proximity_scanned("vestige_1").is_empty());
}

// =============================================================
// cancel_transition
// =============================================================

#[test]
fn cancel_during_flight_returns_to_overview() {
    let mut core = fresh(3);
    core.request_focus("point_1");
    let pending = core.pending_transition();
    let actions = core.cancel_transition();

    assert_eq!(actions[0], Action::CancelFlight { transition: pending.unwrap() });
    assert_eq!(core.phase(), Phase::Overview);
    assert!(!core.is_transitioning());
    assert!(core.fly_to_arrived("point_1").is_empty());
}

#[test]
fn cancel_during_return_flushes_pending_advance() {
    let mut core = fresh(3);
    focus(&mut core, "point_1");
    core.confirm_leave();
    let actions = core.cancel_transition();

    assert!(actions.contains(&Action::FocusChanged { id: None }));
    assert!(actions.contains(&Action::RevealMarker { id: "point_2".into() }));
    assert_eq!(core.state().focused, None);
    assert!(core.return_arrived().is_empty());
}

#[test]
fn cancel_without_flight_is_noop() {
    let mut core = fresh(3);
    assert!(core.cancel_transition().is_empty());
    focus(&mut core, "point_1");
    assert!(core.cancel_transition().is_empty());
    assert!(core.state().overlay_open);
}

// =============================================================
// Snapshot and invariants
// =============================================================

#[test]
fn snapshot_reflects_state() {
    let mut core = resumed(4, 1);
    focus(&mut core, "point_2");
    let snap = core.snapshot();

    assert_eq!(snap.active, 1);
    assert_eq!(snap.focused.as_deref(), Some("point_2"));
    assert_eq!(snap.last_viewed.as_deref(), Some("point_2"));
    assert!(snap.overlay_open);
    assert!(!snap.transitioning);
    assert!(!snap.complete);
    assert_eq!(snap.progress_fraction, 0.25);
    let clickable: Vec<_> = snap.points.iter().map(|p| p.clickable).collect();
    assert_eq!(clickable, vec![true, true, false, false]);
}

#[test]
fn snapshot_serializes_for_presentation() {
    let core = fresh(2);
    let json = serde_json::to_value(core.snapshot()).unwrap();
    assert_eq!(json["points"][0]["state"], "active");
    assert_eq!(json["points"][1]["clickable"], false);
    assert!(json["focused"].is_null());
}

#[test]
fn actions_serialize_with_type_tag() {
    let json = serde_json::to_value(Action::RevealMarker { id: "point_2".into() }).unwrap();
    assert_eq!(json["type"], "reveal_marker");
    assert_eq!(json["id"], "point_2");
    let json = serde_json::to_value(Action::TourCompleted).unwrap();
    assert_eq!(json["type"], "tour_completed");
}

#[test]
fn full_tour_visits_every_point_in_order() {
    let mut core = fresh(6);
    for n in 1..=6 {
        visit(&mut core, &format!("point_{n}"));
        assert!(core.state().is_consistent());
    }
    assert!(core.state().is_complete());
    assert_eq!(core.state().active(), 5);
    assert_eq!(states(&core), vec![Visited; 6]);
    assert_eq!(core.snapshot().progress_fraction, 1.0);
}

#[test]
fn frontier_never_decreases_under_mixed_input() {
    let mut core = fresh(4);
    let mut prev = 0;
    let script = ["point_1", "point_2", "point_1", "point_3", "point_2", "point_4", "point_4"];
    for (i, id) in script.iter().enumerate() {
        core.request_focus(id);
        core.fly_to_arrived(id);
        if i % 2 == 0 {
            core.confirm_leave();
        } else {
            core.close_overlay();
        }
        core.confirm_leave();
        core.return_arrived();
        assert!(core.state().active() >= prev);
        assert!(core.state().active() < 4);
        assert!(core.state().is_consistent());
        prev = core.state().active();
    }
}
