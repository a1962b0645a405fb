//! Canvas elements and the descriptors used to create and patch them.

use crate::error::{CanvasError, CanvasResult};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Opaque, stable identifier of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of element. Rendering is up to the presentation layer; the engine
/// treats every kind as a (possibly rotated) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
    Text,
    StickyNote,
    Line,
    Arrow,
    Freehand,
    Image,
    Frame,
}

/// Free-form style properties (colors, stroke width, font...).
pub type StyleMap = BTreeMap<String, serde_json::Value>;

/// A single element on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Top-left corner in world coordinates (before rotation).
    pub position: Point,
    pub size: Size,
    /// Rotation around the center, in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Locked elements can be selected but not dragged or resized.
    #[serde(default)]
    pub locked: bool,
    /// Layer this element belongs to, for visibility filtering.
    #[serde(default)]
    pub layer_id: Option<String>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub content: Option<String>,
}

impl Element {
    /// Unrotated bounds.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Center point (rotation pivot).
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Rotation in radians.
    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }

    /// Transform from the unrotated frame to world space.
    pub fn rotation_transform(&self) -> Affine {
        if self.rotation == 0.0 {
            return Affine::IDENTITY;
        }
        Affine::rotate_about(self.rotation_radians(), self.center())
    }

    /// The four corners in world space, rotation applied.
    pub fn corners(&self) -> [Point; 4] {
        let r = self.rect();
        let t = self.rotation_transform();
        [
            t * Point::new(r.x0, r.y0),
            t * Point::new(r.x1, r.y0),
            t * Point::new(r.x1, r.y1),
            t * Point::new(r.x0, r.y1),
        ]
    }

    /// Axis-aligned bounding box of the rotated element.
    pub fn bounds(&self) -> Rect {
        if self.rotation == 0.0 {
            return self.rect();
        }
        let [a, b, c, d] = self.corners();
        Rect::from_points(a, b).union_pt(c).union_pt(d)
    }

    /// Whether a world point lies inside the element, honoring rotation.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.rotation_transform().inverse() * point;
        let r = self.rect();
        local.x >= r.x0 && local.x <= r.x1 && local.y >= r.y0 && local.y <= r.y1
    }

    /// Move the element by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

/// Everything needed to create an element. Missing ids are generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementDescriptor {
    pub id: Option<ElementId>,
    pub kind: ElementKind,
    pub position: Point,
    pub size: Size,
    pub rotation: f64,
    pub locked: bool,
    pub layer_id: Option<String>,
    pub style: StyleMap,
    pub content: Option<String>,
}

impl ElementDescriptor {
    /// Create a descriptor for a box of the given kind.
    pub fn new(kind: ElementKind, position: Point, size: Size) -> Self {
        Self {
            kind,
            position,
            size,
            ..Self::default()
        }
    }

    /// Use an explicit id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Place the element on a layer.
    pub fn with_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    /// Set the locked flag.
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the text content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Build the element. Sizes below `min_size` are raised to it.
    pub(crate) fn into_element(self, min_size: f64) -> CanvasResult<Element> {
        check_point(self.position, "position")?;
        check_finite(self.size.width, "size.width")?;
        check_finite(self.size.height, "size.height")?;
        check_finite(self.rotation, "rotation")?;

        Ok(Element {
            id: self.id.unwrap_or_else(ElementId::generate),
            kind: self.kind,
            position: self.position,
            size: Size::new(self.size.width.max(min_size), self.size.height.max(min_size)),
            rotation: self.rotation,
            locked: self.locked,
            layer_id: self.layer_id,
            style: self.style,
            content: self.content,
        })
    }
}

/// A partial update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub locked: Option<bool>,
    /// `Some(None)` (JSON `null`) moves the element back to the default layer.
    #[serde(skip_serializing_if = "Option::is_none", with = "double_option")]
    pub layer_id: Option<Option<String>>,
    /// Merged into the existing style; a `null` value removes the key.
    pub style: Option<StyleMap>,
    /// `Some(None)` (JSON `null`) clears the content.
    #[serde(skip_serializing_if = "Option::is_none", with = "double_option")]
    pub content: Option<Option<String>>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Patch that only resizes the element.
    pub fn size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Patch that moves and resizes the element.
    pub fn bounds(rect: Rect) -> Self {
        Self {
            position: Some(rect.origin()),
            size: Some(rect.size()),
            ..Self::default()
        }
    }

    /// Patch that only rotates the element.
    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Validate the patch without touching any element.
    pub(crate) fn validate(&self, min_size: f64) -> CanvasResult<()> {
        if let Some(position) = self.position {
            check_point(position, "position")?;
        }
        if let Some(size) = self.size {
            check_finite(size.width, "size.width")?;
            check_finite(size.height, "size.height")?;
            if size.width < min_size || size.height < min_size {
                return Err(CanvasError::InvalidGeometry {
                    width: size.width,
                    height: size.height,
                    min: min_size,
                });
            }
        }
        if let Some(rotation) = self.rotation {
            check_finite(rotation, "rotation")?;
        }
        Ok(())
    }

    /// Apply an already validated patch.
    pub(crate) fn apply_to(&self, element: &mut Element) {
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            element.size = size;
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(layer_id) = &self.layer_id {
            element.layer_id = layer_id.clone();
        }
        if let Some(style) = &self.style {
            for (key, value) in style {
                if value.is_null() {
                    element.style.remove(key);
                } else {
                    element.style.insert(key.clone(), value.clone());
                }
            }
        }
        if let Some(content) = &self.content {
            element.content = content.clone();
        }
    }
}

/// Tells a missing field (`None`) apart from an explicit `null`
/// (`Some(None)`).
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(
        value: &Option<Option<T>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<T>>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

fn check_finite(value: f64, field: &'static str) -> CanvasResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CanvasError::NonFinite(field))
    }
}

fn check_point(point: Point, field: &'static str) -> CanvasResult<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(CanvasError::NonFinite(field))
    }
}
