//! Tour definition parsed from a JSON document.
//!
//! A definition lists the points of interest in narrative order, the fixed
//! overview camera pose, the artwork catalog, and optional flight timing.
//!
//! ```json
//! {
//!   "overview": { "position": [-5.99, 6.46, 7.41], "target": [0, 4.7, -5] },
//!   "points": [
//!     { "id": "point_1", "position": [-0.02, 4.7, -2.62],
//!       "viewpoint": { "position": [-0.02, 6, 0.2], "target": [-0.02, 4.7, -2.62] },
//!       "tag": "vestige_1" }
//!   ],
//!   "artworks": [ { "title": "Ammonite", "description": "..." } ],
//!   "flight": { "segment_secs": 1.5 },
//!   "storage_prefix": "tour"
//! }
//! ```

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::camera::Viewpoint;
use crate::consts::DEFAULT_STORAGE_PREFIX;
use crate::content::ArtworkCatalog;
use crate::error::TourError;
use crate::path::FlightTiming;
use crate::tour::PointOfInterest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourConfig {
    /// Points of interest in narrative order.
    pub points: Vec<PointOfInterest>,
    /// Camera pose for browsing the map.
    pub overview: Viewpoint,
    #[serde(default)]
    pub artworks: ArtworkCatalog,
    #[serde(default)]
    pub flight: FlightTiming,
    /// Prefix for persisted keys, so several tours can share one store.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
}

fn default_storage_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}

impl TourConfig {
    /// Parse and validate a tour definition.
    ///
    /// # Errors
    ///
    /// Returns [`TourError::Json`] for malformed JSON and the validation
    /// errors of [`TourConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, TourError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the tour has points, that ids are unique, that every
    /// explicit artwork reference exists, and that flight timing is sane.
    ///
    /// # Errors
    ///
    /// Returns [`TourError::EmptyTour`], [`TourError::DuplicatePoint`],
    /// [`TourError::ArtworkOutOfRange`], or [`TourError::InvalidFlight`].
    pub fn validate(&self) -> Result<(), TourError> {
        if self.points.is_empty() {
            return Err(TourError::EmptyTour);
        }

        let mut seen = HashSet::new();
        for point in &self.points {
            if !seen.insert(point.id.as_str()) {
                return Err(TourError::DuplicatePoint(point.id.clone()));
            }
            if let Some(artwork_ref) = point.artwork_ref {
                if artwork_ref >= self.artworks.len() {
                    return Err(TourError::ArtworkOutOfRange {
                        point: point.id.clone(),
                        artwork_ref,
                        available: self.artworks.len(),
                    });
                }
            }
        }
        self.flight.validate()
    }
}
