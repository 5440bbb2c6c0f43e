//! Narration: timed captions, the audio on/off preference, and the director
//! that starts and stops a point's narration as focus changes.
//!
//! Audio playback itself belongs to the host. The director only issues
//! [`NarrationCommand`]s.

#[cfg(test)]
#[path = "narration_test.rs"]
mod narration_test;

use serde::{Deserialize, Serialize};

use crate::consts::VOLUME_FADE_SECS;
use crate::tour::PointOfInterest;

// =============================================================================
// Captions
// =============================================================================

/// One caption line, shown from `start_secs` until the next caption starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    #[serde(alias = "time")]
    pub start_secs: f64,
    pub text: String,
}

/// Captions for one narration track, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Caption>", into = "Vec<Caption>")]
pub struct CaptionTrack {
    captions: Vec<Caption>,
}

impl From<Vec<Caption>> for CaptionTrack {
    fn from(mut captions: Vec<Caption>) -> Self {
        captions.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
        Self { captions }
    }
}

impl From<CaptionTrack> for Vec<Caption> {
    fn from(track: CaptionTrack) -> Self {
        track.captions
    }
}

impl CaptionTrack {
    #[must_use]
    pub fn new(captions: Vec<Caption>) -> Self {
        captions.into()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    #[must_use]
    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    /// Index of the caption showing at `secs`: the last one that has started.
    /// Before the first caption starts, the first caption is shown.
    #[must_use]
    pub fn index_at(&self, secs: f64) -> Option<usize> {
        if self.captions.is_empty() {
            return None;
        }
        let started = self.captions.partition_point(|c| c.start_secs <= secs);
        Some(started.saturating_sub(1))
    }

    #[must_use]
    pub fn cue_at(&self, secs: f64) -> Option<&Caption> {
        self.index_at(secs).and_then(|i| self.captions.get(i))
    }
}

/// Tracks the caption on screen and reports only changes.
#[derive(Debug, Clone, Default)]
pub struct CaptionCursor {
    current: Option<usize>,
}

impl CaptionCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the playback position. Returns the caption to display when it
    /// differs from the one already showing.
    pub fn update<'a>(&mut self, track: &'a CaptionTrack, secs: f64) -> Option<&'a Caption> {
        let index = track.index_at(secs);
        if index == self.current {
            return None;
        }
        self.current = index;
        index.and_then(|i| track.captions.get(i))
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

// =============================================================================
// Audio preference
// =============================================================================

/// Visitor's audio setting, persisted across pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioPreference {
    pub enabled: bool,
    /// Playback position to resume from after navigation.
    pub resume_at_secs: f64,
}

impl Default for AudioPreference {
    fn default() -> Self {
        Self { enabled: true, resume_at_secs: 0.0 }
    }
}

impl AudioPreference {
    /// Flip audio on or off. Returns the fade the host should apply.
    pub fn toggle(&mut self) -> NarrationCommand {
        self.enabled = !self.enabled;
        log::debug!("narration audio {}", if self.enabled { "on" } else { "off" });
        NarrationCommand::FadeVolume { target: self.volume(), secs: VOLUME_FADE_SECS }
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        if self.enabled { 1.0 } else { 0.0 }
    }

    /// Remember the playback position so the next page can resume.
    pub fn record_position(&mut self, secs: f64) {
        if secs.is_finite() && secs >= 0.0 {
            self.resume_at_secs = secs;
        }
    }
}

// =============================================================================
// Director
// =============================================================================

/// Commands for the host's audio element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrationCommand {
    /// Start `track` from the beginning at `volume`.
    Play { track: String, volume: f64 },
    Stop,
    /// Ramp the volume to `target` over `secs`.
    FadeVolume { target: f64, secs: f64 },
}

/// Starts a point's narration when it gains focus and stops it when focus
/// is lost.
#[derive(Debug, Clone, Default)]
pub struct NarrationDirector {
    playing: Option<String>,
}

impl NarrationDirector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track currently playing, if any.
    #[must_use]
    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    /// React to a focus change. Points without narration stop playback.
    pub fn on_focus_changed(&mut self, focused: Option<&PointOfInterest>, preference: &AudioPreference) -> Vec<NarrationCommand> {
        let next = focused.and_then(|p| p.narration.clone());
        if next == self.playing {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if self.playing.take().is_some() {
            commands.push(NarrationCommand::Stop);
        }
        if let Some(track) = next {
            log::debug!("playing narration {track}");
            commands.push(NarrationCommand::Play { track: track.clone(), volume: preference.volume() });
            self.playing = Some(track);
        }
        commands
    }
}
