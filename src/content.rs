//! Descriptive content shown in the overlay once the camera arrives at a
//! point of interest.

#[cfg(test)]
#[path = "content_test.rs"]
mod content_test;

use serde::{Deserialize, Serialize};

use crate::tour::PointOfInterest;

/// One artwork entry: what the overlay shows for a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub title: String,
    pub description: String,
    /// Icon name understood by the host's icon set.
    #[serde(default)]
    pub icon: Option<String>,
    /// Fallback route for visitors who cannot scan the proximity tag.
    #[serde(default)]
    pub link: Option<String>,
}

/// Ordered artwork entries, addressed by index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkCatalog {
    artworks: Vec<Artwork>,
}

impl ArtworkCatalog {
    #[must_use]
    pub fn new(artworks: Vec<Artwork>) -> Self {
        Self { artworks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artworks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artworks.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Artwork> {
        self.artworks.get(index)
    }

    /// Artwork for the point at `ordinal`: its explicit `artwork_ref`, or the
    /// entry at the same ordinal when none is set.
    #[must_use]
    pub fn for_point(&self, point: &PointOfInterest, ordinal: usize) -> Option<&Artwork> {
        self.get(point.artwork_ref.unwrap_or(ordinal))
    }
}
