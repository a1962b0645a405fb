//! Resize and rotate handles around a selected element.

use crate::element::Element;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Distance from the top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Nw,
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
    ];

    /// Whether dragging this handle moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Whether dragging this handle moves the right edge.
    pub fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Whether dragging this handle moves the top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Whether dragging this handle moves the bottom edge.
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Position of the handle in unit box coordinates, (0,0) = top-left.
    pub fn unit_position(self) -> (f64, f64) {
        let x = if self.moves_left() {
            0.0
        } else if self.moves_right() {
            1.0
        } else {
            0.5
        };
        let y = if self.moves_top() {
            0.0
        } else if self.moves_bottom() {
            1.0
        } else {
            0.5
        };
        (x, y)
    }

    /// The handle on the opposite side; its point stays fixed while resizing.
    pub fn opposite(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::S => Self::N,
            Self::E => Self::W,
            Self::W => Self::E,
            Self::Ne => Self::Sw,
            Self::Nw => Self::Se,
            Self::Se => Self::Nw,
            Self::Sw => Self::Ne,
        }
    }
}

/// A manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    Resize(ResizeHandle),
    Rotate,
}

/// World position of a resize handle, rotation applied.
pub fn resize_handle_position(element: &Element, handle: ResizeHandle) -> Point {
    let r = element.rect();
    let (u, v) = handle.unit_position();
    element.rotation_transform() * Point::new(r.x0 + u * r.width(), r.y0 + v * r.height())
}

/// World position of the rotate handle. `offset` is in world units.
pub fn rotate_handle_position(element: &Element, offset: f64) -> Point {
    let r = element.rect();
    element.rotation_transform() * Point::new(r.center().x, r.y0 - offset)
}

/// All handles of an element with their world positions.
///
/// `zoom` converts the screen-space rotate offset into world units.
pub fn handles(element: &Element, zoom: f64) -> Vec<(Handle, Point)> {
    let mut handles: Vec<(Handle, Point)> = ResizeHandle::ALL
        .iter()
        .map(|&h| (Handle::Resize(h), resize_handle_position(element, h)))
        .collect();
    handles.push((
        Handle::Rotate,
        rotate_handle_position(element, ROTATE_HANDLE_OFFSET / zoom),
    ));
    handles
}

/// Find the handle under `point`. `tolerance` is in world units.
///
/// Locked elements expose no handles.
pub fn hit_test_handles(element: &Element, point: Point, tolerance: f64, zoom: f64) -> Option<Handle> {
    if element.locked {
        return None;
    }
    handles(element, zoom)
        .into_iter()
        .find(|(_, pos)| pos.distance_squared(point) <= tolerance * tolerance)
        .map(|(handle, _)| handle)
}
