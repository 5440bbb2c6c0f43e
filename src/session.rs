//! A tour session: the engine wired to a progress store and the narration
//! director.
//!
//! `Session` is what a host drives. It forwards visitor and renderer events
//! to [`EngineCore`], writes progress whenever the engine reports a change,
//! starts and stops narration on focus changes, and hands back everything
//! the host must apply as [`Outbound`] messages. It is generic over the
//! store so the browser wrapper and native tests run the same code.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::Serialize;

use crate::config::TourConfig;
use crate::consts::NARRATION_SAVE_STEP_SECS;
use crate::engine::{Action, EngineCore};
use crate::narration::{AudioPreference, NarrationCommand, NarrationDirector};
use crate::proximity;
use crate::store::{self, ProgressStore};

/// A message for the host. Both kinds serialize with a `type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Action(Action),
    Narration(NarrationCommand),
}

pub struct Session<S: ProgressStore> {
    core: EngineCore,
    store: S,
    prefix: String,
    audio: AudioPreference,
    director: NarrationDirector,
    /// Playback position last written to the store.
    saved_position: f64,
}

impl<S: ProgressStore> Session<S> {
    /// Resume progress and audio preference from `store` and build the
    /// engine.
    #[must_use]
    pub fn open(config: &TourConfig, store: S) -> Self {
        let prefix = config.storage_prefix.clone();
        let persisted = store::load_progress(&store, &prefix);
        let audio = store::load_audio_preference(&store, &prefix);
        log::info!("tour session: {} points, resume {:?}", config.points.len(), persisted);

        Self {
            core: EngineCore::new(config, persisted),
            store,
            prefix,
            saved_position: audio.resume_at_secs,
            audio,
            director: NarrationDirector::new(),
        }
    }

    // --- Engine events ---

    pub fn start(&mut self) -> Vec<Outbound> {
        let actions = self.core.start();
        self.dispatch(actions)
    }

    pub fn request_focus(&mut self, id: &str) -> Vec<Outbound> {
        let actions = self.core.request_focus(id);
        self.dispatch(actions)
    }

    pub fn fly_to_arrived(&mut self, id: &str) -> Vec<Outbound> {
        let actions = self.core.fly_to_arrived(id);
        self.dispatch(actions)
    }

    pub fn return_arrived(&mut self) -> Vec<Outbound> {
        let actions = self.core.return_arrived();
        self.dispatch(actions)
    }

    pub fn confirm_leave(&mut self) -> Vec<Outbound> {
        let actions = self.core.confirm_leave();
        self.dispatch(actions)
    }

    pub fn close_overlay(&mut self) -> Vec<Outbound> {
        let actions = self.core.close_overlay();
        self.dispatch(actions)
    }

    pub fn proximity_scanned(&mut self, tag: &str) -> Vec<Outbound> {
        let actions = self.core.proximity_scanned(tag);
        self.dispatch(actions)
    }

    /// Raw NFC text-record payload. Undecodable records are logged and
    /// ignored.
    pub fn proximity_record(&mut self, record: &[u8]) -> Vec<Outbound> {
        match proximity::decode_text_record(record) {
            Ok(tag) => self.proximity_scanned(&tag),
            Err(e) => {
                log::warn!("{e}");
                Vec::new()
            }
        }
    }

    pub fn cancel_transition(&mut self) -> Vec<Outbound> {
        let actions = self.core.cancel_transition();
        self.dispatch(actions)
    }

    // --- Audio ---

    /// Flip narration audio on or off and persist the choice.
    pub fn toggle_audio(&mut self) -> Vec<Outbound> {
        let fade = self.audio.toggle();
        self.save_audio();
        vec![Outbound::Narration(fade)]
    }

    /// Playback position report. Written to the store only once it has
    /// moved by at least [`NARRATION_SAVE_STEP_SECS`].
    pub fn narration_time(&mut self, secs: f64) {
        self.audio.record_position(secs);
        if (self.audio.resume_at_secs - self.saved_position).abs() >= NARRATION_SAVE_STEP_SECS {
            self.save_audio();
        }
    }

    /// The page is going away. Flush the playback position.
    pub fn page_hidden(&mut self) {
        self.flush_position();
    }

    // --- Queries ---

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    #[must_use]
    pub fn audio(&self) -> &AudioPreference {
        &self.audio
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, e.g. to reopen the session after navigation.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    // --- Internals ---

    fn dispatch(&mut self, actions: Vec<Action>) -> Vec<Outbound> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            match &action {
                Action::ProgressChanged { progress } => {
                    if let Err(e) = store::save_progress(&mut self.store, &self.prefix, progress) {
                        log::error!("{e}");
                    }
                    out.push(Outbound::Action(action));
                }
                Action::FocusChanged { .. } => {
                    self.flush_position();
                    let commands = self.director.on_focus_changed(self.core.focused(), &self.audio);
                    out.push(Outbound::Action(action));
                    out.extend(commands.into_iter().map(Outbound::Narration));
                }
                _ => out.push(Outbound::Action(action)),
            }
        }
        out
    }

    fn flush_position(&mut self) {
        if (self.audio.resume_at_secs - self.saved_position).abs() > f64::EPSILON {
            self.save_audio();
        }
    }

    fn save_audio(&mut self) {
        match store::save_audio_preference(&mut self.store, &self.prefix, &self.audio) {
            Ok(()) => self.saved_position = self.audio.resume_at_secs,
            Err(e) => log::error!("{e}"),
        }
    }
}
