//! Tunable constants for the interaction engine.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest allowed zoom scale (10%).
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom scale (500%).
pub const MAX_ZOOM: f64 = 5.0;
/// Multiplier applied by a single zoom-in step.
pub const ZOOM_STEP: f64 = 1.1;
/// Zoom-to-fit never zooms in past this scale.
pub const FIT_MAX_ZOOM: f64 = 3.0;
/// Screen padding kept around content by zoom-to-fit.
pub const FIT_PADDING: f64 = 50.0;

/// How long a contact must stay put to count as a long-press.
pub const LONG_PRESS_MS: u64 = 500;
/// Window in which a second tap upgrades the first to a double-tap.
pub const DOUBLE_TAP_MS: u64 = 350;
/// Delay before two stationary contacts count as a two-finger tap.
pub const TWO_FINGER_TAP_MS: u64 = 150;
/// Screen distance a contact may travel and still be a tap.
pub const MOVE_THRESHOLD: f64 = 10.0;

/// Minimum width/height of an element in world units.
pub const MIN_ELEMENT_SIZE: f64 = 20.0;
/// Grid spacing used by snap-to-grid.
pub const GRID_SIZE: f64 = 20.0;
/// Marquees smaller than this (square world units) select nothing.
pub const MIN_MARQUEE_AREA: f64 = 100.0;
/// Maximum number of snapshots kept in the undo history.
pub const HISTORY_LIMIT: usize = 50;
/// Handle hit radius in screen pixels.
pub const HANDLE_TOLERANCE: f64 = 8.0;

/// Runtime configuration for a [`Canvas`](crate::Canvas).
///
/// Every field has a default, so a partial JSON object deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub fit_max_zoom: f64,
    pub fit_padding: f64,
    pub long_press_ms: u64,
    pub double_tap_ms: u64,
    pub two_finger_tap_ms: u64,
    pub move_threshold: f64,
    pub min_element_size: f64,
    pub grid_size: f64,
    pub snap_to_grid: bool,
    pub min_marquee_area: f64,
    pub history_limit: usize,
    pub handle_tolerance: f64,
    /// Size given to elements created by a tap with a draw tool.
    pub default_element_size: Size,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            fit_max_zoom: FIT_MAX_ZOOM,
            fit_padding: FIT_PADDING,
            long_press_ms: LONG_PRESS_MS,
            double_tap_ms: DOUBLE_TAP_MS,
            two_finger_tap_ms: TWO_FINGER_TAP_MS,
            move_threshold: MOVE_THRESHOLD,
            min_element_size: MIN_ELEMENT_SIZE,
            grid_size: GRID_SIZE,
            snap_to_grid: false,
            min_marquee_area: MIN_MARQUEE_AREA,
            history_limit: HISTORY_LIMIT,
            handle_tolerance: HANDLE_TOLERANCE,
            default_element_size: Size::new(120.0, 80.0),
        }
    }
}

impl CanvasConfig {
    /// Zoom limits as `(min, max)`, safe to clamp with.
    ///
    /// Non-finite or non-positive limits fall back to the defaults and an
    /// inverted pair is swapped.
    pub fn zoom_limits(&self) -> (f64, f64) {
        let sane = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        };
        let min = sane(self.min_zoom, MIN_ZOOM);
        let max = sane(self.max_zoom, MAX_ZOOM);
        if min > max {
            log::warn!("config: min_zoom {min} is above max_zoom {max}, swapping");
            (max, min)
        } else {
            (min, max)
        }
    }

    /// Timing and slop settings for the gesture recognizer.
    pub fn gesture_timing(&self) -> GestureTiming {
        GestureTiming {
            long_press: Duration::from_millis(self.long_press_ms),
            double_tap: Duration::from_millis(self.double_tap_ms),
            two_finger_tap: Duration::from_millis(self.two_finger_tap_ms),
            move_threshold: self.move_threshold,
        }
    }
}

/// The subset of [`CanvasConfig`] the gesture recognizer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTiming {
    pub long_press: Duration,
    pub double_tap: Duration,
    pub two_finger_tap: Duration,
    pub move_threshold: f64,
}

impl Default for GestureTiming {
    fn default() -> Self {
        CanvasConfig::default().gesture_timing()
    }
}
