//! Error taxonomy for the tour engine

use thiserror::Error;

use crate::types::SkippedStop;

/// Errors that abort a whole optimization request.
///
/// Per-stop geocoding failures are not errors: they are collected as
/// [`SkippedStop`]s and reported alongside the route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// The matrix needs the start depot, at least one stop and the end depot.
    #[error("need depot + at least one point + end depot (got {available} points)")]
    InsufficientPoints { available: usize },

    /// Stops existed but none of them could be located.
    #[error("{} addresses could not be located", skipped.len())]
    NothingLocated { skipped: Vec<SkippedStop> },

    #[error("invalid route settings: {0}")]
    InvalidSettings(String),

    #[error("time window {start}-{end} ends before it starts")]
    InvalidTimeWindow { start: String, end: String },

    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    /// Matrix dimension disagrees with the point list. Always a bug.
    #[error("distance matrix has size {actual}, expected {expected}")]
    MatrixIndexMismatch { expected: usize, actual: usize },

    #[error("optimization request was cancelled")]
    Cancelled,
}

impl TourError {
    /// True for errors the user can act on (as opposed to internal defects).
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, TourError::MatrixIndexMismatch { .. })
    }
}
