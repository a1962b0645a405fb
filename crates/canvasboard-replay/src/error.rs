//! Errors raised while loading or replaying a scenario.

use canvasboard_core::CanvasError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scenario rejected by the canvas: {0}")]
    Canvas(#[from] CanvasError),
}
