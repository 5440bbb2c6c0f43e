//! Error type for fallible tour operations.
//!
//! Engine transitions never fail; rejected input is a no-op. Errors only
//! surface when loading a tour definition, writing to a progress store, or
//! decoding a proximity record.

/// Error returned by config loading, storage writes, and record decoding.
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    /// The tour definition is not valid JSON or does not match the schema.
    #[error("failed to parse tour config: {0}")]
    Json(#[from] serde_json::Error),
    /// The tour definition has no points of interest.
    #[error("tour has no points of interest")]
    EmptyTour,
    /// Two points of interest share the same id.
    #[error("duplicate point id: {0}")]
    DuplicatePoint(String),
    /// A point references an artwork index past the end of the catalog.
    #[error("point {point} references artwork {artwork_ref}, but only {available} artworks exist")]
    ArtworkOutOfRange { point: String, artwork_ref: usize, available: usize },
    /// Flight timing is out of range.
    #[error("invalid flight timing: {0}")]
    InvalidFlight(String),
    /// The backing store rejected a write.
    #[error("failed to write {key}: {reason}")]
    Storage { key: String, reason: String },
    /// A proximity record could not be decoded as a text tag.
    #[error("invalid proximity record: {0}")]
    InvalidRecord(String),
}
