//! Errors returned by element mutations.

use crate::element::ElementId;
use thiserror::Error;

/// Reasons a mutation was refused.
///
/// None of these are fatal: the gesture pipeline logs them and carries on,
/// leaving the element store untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Element id already in use: {0}")]
    DuplicateId(ElementId),
    #[error("Invalid geometry: {width}x{height} is below the {min} unit minimum")]
    InvalidGeometry { width: f64, height: f64, min: f64 },
    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),
}

/// Result type for element mutations.
pub type CanvasResult<T> = Result<T, CanvasError>;
