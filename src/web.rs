//! Browser wrapper around [`Session`].
//!
//! Backs the session with `localStorage` and forwards every
//! [`Outbound`] message to a JavaScript callback as a JSON string with a
//! `type` field. Also exposes flight sampling and caption lookup so the
//! page's render and audio loops stay thin.

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::config::TourConfig;
use crate::error::TourError;
use crate::narration::{CaptionCursor, CaptionTrack};
use crate::path::{FlightPath, FlightPlan, ease_in_out_cubic};
use crate::session::{Outbound, Session};
use crate::store::{MemoryStore, ProgressStore};

/// Install the panic hook and route `log` output to the browser console.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("logger already installed");
    }
}

// =============================================================================
// Storage
// =============================================================================

/// [`ProgressStore`] over `window.localStorage`.
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// `None` when there is no window or storage is disabled.
    #[must_use]
    pub fn open() -> Option<Self> {
        let window = web_sys::window()?;
        match window.local_storage() {
            Ok(Some(storage)) => Some(Self { storage }),
            Ok(None) => None,
            Err(e) => {
                log::warn!("localStorage unavailable: {e:?}");
                None
            }
        }
    }
}

impl ProgressStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read {key}: {e:?}");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TourError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| TourError::Storage { key: key.to_string(), reason: format!("{e:?}") })
    }
}

fn open_store() -> Box<dyn ProgressStore> {
    match LocalStore::open() {
        Some(local) => Box::new(local),
        None => {
            log::warn!("progress will not survive reloads");
            Box::new(MemoryStore::new())
        }
    }
}

fn to_js(err: &TourError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// =============================================================================
// Tour
// =============================================================================

#[wasm_bindgen]
pub struct WebTour {
    session: Session<Box<dyn ProgressStore>>,
    on_action: Function,
}

#[wasm_bindgen]
impl WebTour {
    /// Parse the tour definition, resume stored progress, and bind the
    /// callback that receives every action.
    ///
    /// # Errors
    ///
    /// Rejects an invalid tour definition with its error message.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, on_action: Function) -> Result<WebTour, JsValue> {
        let config = TourConfig::from_json(config_json).map_err(|e| to_js(&e))?;
        Ok(Self { session: Session::open(&config, open_store()), on_action })
    }

    pub fn start(&mut self) {
        let out = self.session.start();
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = markerClicked)]
    pub fn marker_clicked(&mut self, id: &str) {
        let out = self.session.request_focus(id);
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = flyToArrived)]
    pub fn fly_to_arrived(&mut self, id: &str) {
        let out = self.session.fly_to_arrived(id);
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = returnArrived)]
    pub fn return_arrived(&mut self) {
        let out = self.session.return_arrived();
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = confirmLeave)]
    pub fn confirm_leave(&mut self) {
        let out = self.session.confirm_leave();
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = closeOverlay)]
    pub fn close_overlay(&mut self) {
        let out = self.session.close_overlay();
        self.emit_all(&out);
    }

    /// Raw NFC text-record payload read near an exhibit.
    #[wasm_bindgen(js_name = proximityScanned)]
    pub fn proximity_scanned(&mut self, record: &[u8]) {
        let out = self.session.proximity_record(record);
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = cancelTransition)]
    pub fn cancel_transition(&mut self) {
        let out = self.session.cancel_transition();
        self.emit_all(&out);
    }

    #[wasm_bindgen(js_name = isTransitioning)]
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.session.core().is_transitioning()
    }

    /// Id of the outstanding flight, for the host's arrival timeout.
    #[wasm_bindgen(js_name = pendingTransition)]
    #[must_use]
    pub fn pending_transition(&self) -> Option<u64> {
        self.session.core().pending_transition().map(|t| t.0)
    }

    /// JSON read model of the whole tour.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.core().snapshot()).map_err(|e| to_js(&TourError::from(e)))
    }

    /// JSON artwork for the open overlay, or `undefined`.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    #[wasm_bindgen(js_name = overlayArtwork)]
    pub fn overlay_artwork(&self) -> Result<Option<String>, JsValue> {
        self.session
            .core()
            .overlay_artwork()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| to_js(&TourError::from(e)))
    }

    #[wasm_bindgen(js_name = toggleAudio)]
    pub fn toggle_audio(&mut self) -> bool {
        let out = self.session.toggle_audio();
        self.emit_all(&out);
        self.session.audio().enabled
    }

    /// Playback position report from the audio element.
    #[wasm_bindgen(js_name = narrationTime)]
    pub fn narration_time(&mut self, secs: f64) {
        self.session.narration_time(secs);
    }

    /// Call from `pagehide` so the playback position is not lost.
    #[wasm_bindgen(js_name = pageHidden)]
    pub fn page_hidden(&mut self) {
        self.session.page_hidden();
    }

    #[wasm_bindgen(js_name = resumeAt)]
    #[must_use]
    pub fn resume_at(&self) -> f64 {
        self.session.audio().resume_at_secs
    }
}

impl WebTour {
    fn emit_all(&self, out: &[Outbound]) {
        for message in out {
            self.emit(message);
        }
    }

    fn emit(&self, message: &Outbound) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                log::error!("failed to serialize message: {e}");
                return;
            }
        };
        if let Err(e) = self.on_action.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::error!("action callback threw: {e:?}");
        }
    }
}

// =============================================================================
// Flight
// =============================================================================

/// Sampled camera flight for the `plan` carried by a `fly_to` or
/// `fly_to_overview` action.
#[wasm_bindgen]
pub struct WebFlight {
    path: FlightPath,
}

#[wasm_bindgen]
impl WebFlight {
    /// # Errors
    ///
    /// Rejects JSON that is not a flight plan or whose timing is out of
    /// range.
    #[wasm_bindgen(constructor)]
    pub fn new(plan_json: &str) -> Result<WebFlight, JsValue> {
        let plan: FlightPlan = serde_json::from_str(plan_json).map_err(|e| to_js(&TourError::from(e)))?;
        plan.timing.validate().map_err(|e| to_js(&e))?;
        Ok(Self { path: plan.path() })
    }

    /// Camera pose at linear progress in `[0, 1]` as
    /// `[px, py, pz, tx, ty, tz]`.
    #[wasm_bindgen(js_name = poseAt)]
    #[must_use]
    pub fn pose_at(&self, progress: f64) -> Vec<f64> {
        let pose = self.path.pose_at(progress);
        let (p, t) = (pose.position, pose.target);
        vec![p.x, p.y, p.z, t.x, t.y, t.z]
    }

    /// Unit direction of travel at linear progress, as `[x, y, z]`.
    #[wasm_bindgen(js_name = tangentAt)]
    #[must_use]
    pub fn tangent_at(&self, progress: f64) -> Vec<f64> {
        let t = self.path.tangent_at(ease_in_out_cubic(progress));
        vec![t.x, t.y, t.z]
    }

    #[wasm_bindgen(js_name = durationSecs)]
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.path.duration_secs()
    }
}

// =============================================================================
// Captions
// =============================================================================

/// Caption cursor for one narration track.
#[wasm_bindgen]
pub struct WebCaptions {
    track: CaptionTrack,
    cursor: CaptionCursor,
}

#[wasm_bindgen]
impl WebCaptions {
    /// # Errors
    ///
    /// Rejects captions that are not a JSON array of `{ time, text }`.
    #[wasm_bindgen(constructor)]
    pub fn new(captions_json: &str) -> Result<WebCaptions, JsValue> {
        let track: CaptionTrack = serde_json::from_str(captions_json).map_err(|e| to_js(&TourError::from(e)))?;
        Ok(Self { track, cursor: CaptionCursor::new() })
    }

    /// Swap in the captions of another narration track.
    ///
    /// # Errors
    ///
    /// Rejects captions that are not a JSON array of `{ time, text }`; the
    /// current track is kept.
    #[wasm_bindgen(js_name = setTrack)]
    pub fn set_track(&mut self, captions_json: &str) -> Result<(), JsValue> {
        self.track = serde_json::from_str(captions_json).map_err(|e| to_js(&TourError::from(e)))?;
        self.cursor.reset();
        Ok(())
    }

    /// Caption text to show at `secs`, or `undefined` when unchanged.
    pub fn update(&mut self, secs: f64) -> Option<String> {
        self.cursor.update(&self.track, secs).map(|c| c.text.clone())
    }
}
