//! Proximity trigger input: NFC text records scanned near an exhibit.
//!
//! A text record carries a route-like value (e.g. `vestige_1`). A point of
//! interest may declare the tag that belongs to it; scanning that tag while
//! the point is focused confirms the visit.

#[cfg(test)]
#[path = "proximity_test.rs"]
mod proximity_test;

use crate::error::TourError;
use crate::tour::PointOfInterest;

/// How a scanned tag relates to the focused point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// The tag is the point's own tag.
    Matches,
    /// The point declares no tag; any scan confirms it.
    Untagged,
    /// The point declares a different tag.
    Mismatch,
}

/// Decode the payload of a text record into a tag value.
///
/// Surrounding whitespace and a leading `/` are stripped so `"/vestige_1\n"`
/// and `"vestige_1"` are the same tag.
///
/// # Errors
///
/// Returns [`TourError::InvalidRecord`] when the payload is not UTF-8 or is
/// empty after trimming.
pub fn decode_text_record(data: &[u8]) -> Result<String, TourError> {
    let text = std::str::from_utf8(data).map_err(|e| TourError::InvalidRecord(e.to_string()))?;
    let tag = normalize_tag(text);
    if tag.is_empty() {
        return Err(TourError::InvalidRecord("empty text record".into()));
    }
    Ok(tag.to_string())
}

/// Compare a scanned tag with the point's declared tag.
#[must_use]
pub fn match_tag(point: &PointOfInterest, scanned: &str) -> TagMatch {
    match point.tag.as_deref() {
        None => TagMatch::Untagged,
        Some(own) if normalize_tag(own) == normalize_tag(scanned) => TagMatch::Matches,
        Some(_) => TagMatch::Mismatch,
    }
}

/// Strip whitespace and a leading `/` from a tag value.
#[must_use]
pub fn normalize_tag(tag: &str) -> &str {
    tag.trim().trim_start_matches('/')
}
