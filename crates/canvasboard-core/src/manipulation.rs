//! Drag-move, resize and rotate of elements.
//!
//! Sessions edit the store without recording history on every pointer
//! move; the caller commits once when the gesture ends, so one drag is one
//! undo step.

use crate::element::{Element, ElementId, ElementKind};
use crate::handles::ResizeHandle;
use crate::selection::Marquee;
use crate::snap::{ANGLE_SNAP_INCREMENT, normalize_degrees, snap_angle, snap_to_grid, snap_value};
use crate::store::ElementStore;
use kurbo::{Point, Rect, Vec2};

/// Rotate a vector by `radians`.
fn rotate_vec(v: Vec2, radians: f64) -> Vec2 {
    let (sin, cos) = radians.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Moves one or more elements by the same delta.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSession {
    /// Element under the pointer when the drag began.
    pub anchor: ElementId,
    /// Press point minus the anchor's position.
    pub offset: Vec2,
    anchor_start: Point,
    starts: Vec<(ElementId, Point)>,
}

impl MoveSession {
    /// Start moving `ids`, grabbed at `press` on `anchor`.
    ///
    /// Locked elements are left out. Returns `None` if the anchor itself is
    /// locked or missing.
    pub fn begin(store: &ElementStore, ids: &[ElementId], anchor: &ElementId, press: Point) -> Option<Self> {
        let anchor_el = store.get(anchor).filter(|e| !e.locked)?;
        let mut starts: Vec<(ElementId, Point)> = ids
            .iter()
            .filter_map(|id| store.get(id))
            .filter(|e| !e.locked)
            .map(|e| (e.id.clone(), e.position))
            .collect();
        if !starts.iter().any(|(id, _)| id == anchor) {
            starts.push((anchor.clone(), anchor_el.position));
        }
        Some(Self {
            anchor: anchor.clone(),
            offset: press - anchor_el.position,
            anchor_start: anchor_el.position,
            starts,
        })
    }

    /// Ids being moved.
    pub fn ids(&self) -> impl Iterator<Item = &ElementId> {
        self.starts.iter().map(|(id, _)| id)
    }

    /// Delta the anchor would move for a pointer at `world`.
    pub fn delta_for(&self, world: Point, grid: Option<f64>) -> Vec2 {
        let mut target = world - self.offset;
        if let Some(grid) = grid {
            target = snap_to_grid(target, grid);
        }
        target - self.anchor_start
    }

    /// Move every element to follow the pointer. Returns the applied delta.
    pub fn update(&self, store: &mut ElementStore, world: Point, grid: Option<f64>) -> Vec2 {
        let delta = self.delta_for(world, grid);
        for (id, start) in &self.starts {
            if let Some(element) = store.get_mut_uncommitted(id) {
                element.position = *start + delta;
            }
        }
        delta
    }
}

/// Resize `rect` by dragging `handle` by `delta`. The opposite side stays
/// put. The result may be inverted if dragged past the opposite edge.
pub fn resize_rect(rect: Rect, handle: ResizeHandle, delta: Vec2) -> Rect {
    let mut r = rect;
    if handle.moves_left() {
        r.x0 += delta.x;
    }
    if handle.moves_right() {
        r.x1 += delta.x;
    }
    if handle.moves_top() {
        r.y0 += delta.y;
    }
    if handle.moves_bottom() {
        r.y1 += delta.y;
    }
    r
}

fn snap_moving_edges(rect: Rect, handle: ResizeHandle, grid: f64) -> Rect {
    let mut r = rect;
    if handle.moves_left() {
        r.x0 = snap_value(r.x0, grid);
    }
    if handle.moves_right() {
        r.x1 = snap_value(r.x1, grid);
    }
    if handle.moves_top() {
        r.y0 = snap_value(r.y0, grid);
    }
    if handle.moves_bottom() {
        r.y1 = snap_value(r.y1, grid);
    }
    r
}

/// World position of the point at unit coordinates `(u, v)` of `rect`
/// rotated by `radians` about the rect center.
fn world_at(rect: Rect, radians: f64, (u, v): (f64, f64)) -> Point {
    let c = rect.center();
    let local = Vec2::new(rect.x0 + u * rect.width() - c.x, rect.y0 + v * rect.height() - c.y);
    c + rotate_vec(local, radians)
}

/// New unrotated bounds for `element` after dragging `handle` by the
/// world-space `delta`.
///
/// For rotated elements the delta is taken in the element's frame and the
/// result is shifted so the opposite handle keeps its world position.
/// Returns `None` when either dimension would drop below `min_size`.
pub fn resized_bounds(
    element: &Element,
    handle: ResizeHandle,
    delta: Vec2,
    min_size: f64,
    grid: Option<f64>,
) -> Option<Rect> {
    let radians = element.rotation_radians();
    let original = element.rect();
    let local_delta = rotate_vec(delta, -radians);
    let mut rect = resize_rect(original, handle, local_delta);

    if element.rotation == 0.0 {
        if let Some(grid) = grid {
            rect = snap_moving_edges(rect, handle, grid);
        }
    }

    if rect.width() < min_size || rect.height() < min_size {
        return None;
    }

    if element.rotation != 0.0 {
        let fixed = handle.opposite().unit_position();
        let correction = world_at(original, radians, fixed) - world_at(rect, radians, fixed);
        rect = rect + correction;
    }
    Some(rect)
}

/// Resizes a single element from one of its handles.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub id: ElementId,
    pub handle: ResizeHandle,
    start_world: Point,
    original: Element,
}

impl ResizeSession {
    /// Start a resize. Returns `None` for missing or locked elements.
    pub fn begin(store: &ElementStore, id: &ElementId, handle: ResizeHandle, press: Point) -> Option<Self> {
        let original = store.get(id).filter(|e| !e.locked)?.clone();
        Some(Self {
            id: id.clone(),
            handle,
            start_world: press,
            original,
        })
    }

    /// Resize to follow the pointer. Frames that would break the minimum
    /// size are discarded and the element keeps its last valid bounds.
    ///
    /// Returns true if the frame was applied.
    pub fn update(&self, store: &mut ElementStore, world: Point, grid: Option<f64>) -> bool {
        let min_size = store.min_size();
        let Some(rect) = resized_bounds(&self.original, self.handle, world - self.start_world, min_size, grid) else {
            log::trace!("resize: discarded frame below {min_size} for {}", self.id);
            return false;
        };
        match store.get_mut_uncommitted(&self.id) {
            Some(element) => {
                element.position = rect.origin();
                element.size = rect.size();
                true
            }
            None => false,
        }
    }
}

/// Rotates a single element about its center.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateSession {
    pub id: ElementId,
    center: Point,
}

impl RotateSession {
    /// Start a rotation. Returns `None` for missing or locked elements.
    pub fn begin(store: &ElementStore, id: &ElementId) -> Option<Self> {
        let element = store.get(id).filter(|e| !e.locked)?;
        Some(Self {
            id: id.clone(),
            center: element.center(),
        })
    }

    /// Angle in degrees for a pointer at `world`; 0 points straight up.
    pub fn angle_for(&self, world: Point, snap: bool) -> f64 {
        let v = world - self.center;
        let angle = normalize_degrees(v.y.atan2(v.x).to_degrees() + 90.0);
        if snap { snap_angle(angle, ANGLE_SNAP_INCREMENT) } else { angle }
    }

    /// Rotate to face the pointer. Returns the new rotation in degrees.
    pub fn update(&self, store: &mut ElementStore, world: Point, snap: bool) -> f64 {
        let angle = self.angle_for(world, snap);
        if let Some(element) = store.get_mut_uncommitted(&self.id) {
            element.rotation = angle;
        }
        angle
    }
}

/// Drawing a new element with a creation tool.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSession {
    pub kind: ElementKind,
    pub start: Point,
    pub current: Point,
}

impl CreateSession {
    pub fn new(kind: ElementKind, start: Point) -> Self {
        Self {
            kind,
            start,
            current: start,
        }
    }

    /// Bounds spanned so far.
    pub fn rect(&self, grid: Option<f64>) -> Rect {
        match grid {
            Some(grid) => Rect::from_points(snap_to_grid(self.start, grid), snap_to_grid(self.current, grid)),
            None => Rect::from_points(self.start, self.current),
        }
    }
}

/// The manipulation in progress, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Manipulation {
    #[default]
    Idle,
    Moving(MoveSession),
    Resizing(ResizeSession),
    Rotating(RotateSession),
    Marquee(Marquee),
    /// Dragging the viewport; holds the previous screen point.
    Panning { last: Point },
    Creating(CreateSession),
}

impl Manipulation {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether an element is being dragged or resized.
    pub fn is_editing_elements(&self) -> bool {
        matches!(self, Self::Moving(_) | Self::Resizing(_) | Self::Rotating(_))
    }
}
