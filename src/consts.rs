//! Shared numeric constants and storage keys for the tour crate.

// ── Flight timing ───────────────────────────────────────────────

/// Seconds spent on each segment of a flight path (one segment per pair of
/// consecutive control points).
pub const SEGMENT_SECS: f64 = 1.5;

/// Curve-parameter distance the camera looks ahead of itself while flying.
pub const LOOK_AHEAD: f64 = 0.02;

/// Upper bound for the look-ahead sample so the target never reaches the end
/// of the curve before the lock point.
pub const LOOK_AHEAD_MAX: f64 = 0.98;

/// Flight progress after which the camera target locks onto the destination.
pub const TARGET_LOCK_AT: f64 = 0.7;

// ── Audio ───────────────────────────────────────────────────────

/// Duration of the volume fade when narration audio is toggled.
pub const VOLUME_FADE_SECS: f64 = 0.5;

/// Minimum change in playback position before it is written to storage.
pub const NARRATION_SAVE_STEP_SECS: f64 = 1.0;

// ── Storage ─────────────────────────────────────────────────────

/// Default key prefix for persisted values.
pub const DEFAULT_STORAGE_PREFIX: &str = "tour";

/// Key suffix for the frontier ordinal.
pub const KEY_ACTIVE_ORDINAL: &str = "activeOrdinal";

/// Key suffix for the tour-complete flag.
pub const KEY_COMPLETE: &str = "complete";

/// Key suffix for the pending-advance flag.
pub const KEY_PENDING_ADVANCE: &str = "pendingAdvance";

/// Key suffix for the audio on/off preference.
pub const KEY_AUDIO_ON: &str = "audioOn";

/// Key suffix for the narration resume position in seconds.
pub const KEY_NARRATION_TIME: &str = "narrationTime";
