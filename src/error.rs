use thiserror::Error;

use crate::drawing::{DrawingId, DrawingKind};

/// Errors raised while constructing or addressing drawings
#[derive(Debug, Error)]
pub enum DrawingError {
    #[error("{kind} takes {expected} point(s), got {found}")]
    PointCount {
        kind: DrawingKind,
        expected: usize,
        found: usize,
    },

    #[error("No drawing with id {0}")]
    UnknownDrawing(DrawingId),

    #[error("Invalid options for {kind}: {reason}")]
    InvalidOptions { kind: DrawingKind, reason: String },
}

/// Errors that can occur while saving, loading or exchanging drawing sets
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to (de)serialize drawings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to access drawing file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed controller message: {0}")]
    MalformedMessage(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors of toolbox operations that address a drawing and then persist
#[derive(Debug, Error)]
pub enum ToolboxError {
    #[error(transparent)]
    Drawing(#[from] DrawingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type ToolboxResult<T> = Result<T, ToolboxError>;
