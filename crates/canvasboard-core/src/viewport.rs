//! Viewport zoom/pan and screen <-> world conversion.
//!
//! Screen coordinates are relative to the canvas container. The pan offset is
//! stored in world units, so `world = screen / zoom - pan` and
//! `screen = (world + pan) * zoom`.

use crate::config::{CanvasConfig, FIT_MAX_ZOOM, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::Serialize;

/// Zoom and pan state of the canvas.
///
/// Serialize-only: a deserialized viewport could carry a zoom outside its
/// limits. Rebuild one with [`from_config`](Self::from_config) and
/// [`set_transform`](Self::set_transform) instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Current zoom scale (1.0 = 100%).
    zoom: f64,
    /// Pan offset in world units.
    pan: Vec2,
    /// Minimum allowed zoom level. Never above `max_zoom`.
    min_zoom: f64,
    /// Maximum allowed zoom level.
    max_zoom: f64,
    /// Multiplier for a single zoom step.
    pub zoom_step: f64,
    /// Cap applied by zoom-to-fit.
    pub fit_max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            fit_max_zoom: FIT_MAX_ZOOM,
        }
    }
}

/// Viewport state captured when a pinch begins.
///
/// Every pinch frame is computed from this baseline rather than from the
/// previous frame, so rounding never accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchBaseline {
    /// Distance between the two contacts at touch-down (screen px).
    pub initial_distance: f64,
    /// Zoom scale at touch-down.
    pub initial_zoom: f64,
    /// Pan offset at touch-down.
    pub initial_pan: Vec2,
    /// Midpoint of the two contacts at touch-down (screen).
    pub center: Point,
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport using the zoom limits from `config`.
    pub fn from_config(config: &CanvasConfig) -> Self {
        let (min_zoom, max_zoom) = config.zoom_limits();
        let mut viewport = Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            min_zoom,
            max_zoom,
            zoom_step: config.zoom_step,
            fit_max_zoom: config.fit_max_zoom,
        };
        viewport.zoom = viewport.clamp_zoom(1.0);
        viewport
    }

    /// The `(min, max)` zoom limits.
    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Current zoom scale.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current pan offset (world units).
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Zoom as an integer percentage, rounded.
    pub fn zoom_percentage(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Transform from world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.pan)
    }

    /// Transform from screen coordinates to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.pan) * Affine::scale(1.0 / self.zoom)
    }

    /// Convert a container-relative screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a world point to container-relative screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        self.transform() * world
    }

    /// Convert a screen distance to a world distance.
    pub fn screen_dist_to_world(&self, dist: f64) -> f64 {
        dist / self.zoom
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.max(self.min_zoom).min(self.max_zoom)
        } else {
            self.zoom
        }
    }

    /// Set zoom and pan directly. Zoom is clamped; a non-finite pan is ignored.
    pub fn set_transform(&mut self, zoom: f64, pan: Vec2) {
        self.zoom = self.clamp_zoom(zoom);
        if pan.is_finite() {
            self.pan = pan;
        }
    }

    /// Pan by a delta given in screen pixels.
    ///
    /// Returns true if the pan changed; zero and non-finite deltas do nothing.
    pub fn pan_by_screen(&mut self, delta: Vec2) -> bool {
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }
        self.pan += delta / self.zoom;
        true
    }

    /// Set the zoom, keeping the world point under `anchor` fixed on screen.
    ///
    /// Returns true if the zoom changed.
    pub fn zoom_to_at(&mut self, zoom: f64, anchor: Point) -> bool {
        let new_zoom = self.clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let world = self.screen_to_world(anchor);
        self.zoom = new_zoom;
        // Solve anchor / zoom - pan == world for the new pan.
        self.pan = anchor.to_vec2() / new_zoom - world.to_vec2();
        true
    }

    /// Multiply the zoom by `factor` around `anchor`.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        self.zoom_to_at(self.zoom * factor, anchor)
    }

    /// Zoom in one step around `anchor`.
    pub fn zoom_in(&mut self, anchor: Point) -> bool {
        self.zoom_at(anchor, self.zoom_step)
    }

    /// Zoom out one step around `anchor`.
    pub fn zoom_out(&mut self, anchor: Point) -> bool {
        self.zoom_at(anchor, 1.0 / self.zoom_step)
    }

    /// Set the zoom from an integer percentage (clamped to 10..=500 by the
    /// zoom limits), keeping `anchor` fixed.
    pub fn set_zoom_percentage(&mut self, pct: u32, anchor: Point) -> bool {
        self.zoom_to_at(f64::from(pct) / 100.0, anchor)
    }

    /// Fit `bounds` (world) inside a viewport of `viewport` size with `padding`
    /// screen pixels on every side, centering the content.
    ///
    /// The smaller of the two axis ratios wins and the result never exceeds
    /// `fit_max_zoom`. Empty bounds leave the viewport untouched.
    pub fn zoom_to_fit(&mut self, bounds: Rect, viewport: Size, padding: f64) -> bool {
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            return false;
        }

        let avail_w = (viewport.width - padding * 2.0).max(1.0);
        let avail_h = (viewport.height - padding * 2.0).max(1.0);

        let scale_x = if bounds.width() > 0.0 { avail_w / bounds.width() } else { f64::INFINITY };
        let scale_y = if bounds.height() > 0.0 { avail_h / bounds.height() } else { f64::INFINITY };
        let zoom = scale_x.min(scale_y).min(self.fit_max_zoom);
        self.zoom = self.clamp_zoom(zoom);

        let viewport_center = Vec2::new(viewport.width / 2.0, viewport.height / 2.0);
        self.pan = viewport_center / self.zoom - bounds.center().to_vec2();
        true
    }

    /// Capture the baseline for a pinch starting with the given contacts.
    pub fn pinch_baseline(&self, a: Point, b: Point) -> PinchBaseline {
        PinchBaseline {
            initial_distance: a.distance(b),
            initial_zoom: self.zoom,
            initial_pan: self.pan,
            center: a.midpoint(b),
        }
    }

    /// Apply one pinch frame.
    ///
    /// The distance ratio drives the zoom; the pan is chosen so the world
    /// point under the initial center stays under the current center, which
    /// combines pinch-zoom with two-finger pan.
    pub fn apply_pinch(&mut self, baseline: &PinchBaseline, distance: f64, center: Point) {
        let ratio = if baseline.initial_distance > f64::EPSILON && distance.is_finite() {
            distance / baseline.initial_distance
        } else {
            1.0
        };
        let zoom = self.clamp_zoom(baseline.initial_zoom * ratio);

        let anchor_world =
            baseline.center.to_vec2() / baseline.initial_zoom - baseline.initial_pan;
        let compensating = baseline.center.to_vec2() / zoom - anchor_world;
        let two_finger_pan = (center - baseline.center) / zoom;

        self.zoom = zoom;
        self.pan = compensating + two_finger_pan;
    }
}
