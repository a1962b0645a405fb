//! Raw pointer input as delivered by the host.
//!
//! Events carry a timestamp relative to any fixed origin the host picks;
//! the engine never reads a clock of its own, which keeps the gesture
//! recognizer deterministic.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of one pointer or touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(pub u64);

/// The device a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Button that initiated a press. Touch and pen contacts are `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// One sample of a pointer stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    #[serde(default)]
    pub id: PointerId,
    #[serde(default)]
    pub kind: PointerKind,
    /// Position in client coordinates.
    pub position: Point,
    #[serde(default)]
    pub button: PointerButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Timestamp of the sample.
    #[serde(rename = "time_ms", with = "duration_ms")]
    pub time: Duration,
}

impl PointerSample {
    /// A primary-button sample with no modifiers.
    pub fn new(id: u64, kind: PointerKind, position: Point, time: Duration) -> Self {
        Self {
            id: PointerId(id),
            kind,
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            time,
        }
    }

    /// Touch contact `id` at `(x, y)` at `ms` milliseconds.
    pub fn touch(id: u64, x: f64, y: f64, ms: u64) -> Self {
        Self::new(id, PointerKind::Touch, Point::new(x, y), Duration::from_millis(ms))
    }

    /// Mouse sample at `(x, y)` at `ms` milliseconds.
    pub fn mouse(x: f64, y: f64, ms: u64) -> Self {
        Self::new(0, PointerKind::Mouse, Point::new(x, y), Duration::from_millis(ms))
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Same sample shifted into another coordinate space.
    pub fn offset_by(mut self, offset: Vec2) -> Self {
        self.position -= offset;
        self
    }
}

/// A scroll-wheel or trackpad scroll sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSample {
    /// Cursor position in client coordinates.
    pub position: Point,
    /// Scroll delta in screen pixels; positive y scrolls content up.
    pub delta: Vec2,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(rename = "time_ms", with = "duration_ms")]
    pub time: Duration,
}

/// Pointer event type for unified mouse/pen/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    /// The platform took the pointer away, or it left the canvas while
    /// pressed. Ends any drag the same way `Up` does.
    Cancel(PointerSample),
    Wheel(WheelSample),
}

impl PointerEvent {
    /// Timestamp of the event.
    pub fn time(&self) -> Duration {
        match self {
            Self::Down(s) | Self::Move(s) | Self::Up(s) | Self::Cancel(s) => s.time,
            Self::Wheel(w) => w.time,
        }
    }

    /// Client position of the event.
    pub fn position(&self) -> Point {
        match self {
            Self::Down(s) | Self::Move(s) | Self::Up(s) | Self::Cancel(s) => s.position,
            Self::Wheel(w) => w.position,
        }
    }

    /// Same event shifted into another coordinate space.
    pub fn offset_by(self, offset: Vec2) -> Self {
        match self {
            Self::Down(s) => Self::Down(s.offset_by(offset)),
            Self::Move(s) => Self::Move(s.offset_by(offset)),
            Self::Up(s) => Self::Up(s.offset_by(offset)),
            Self::Cancel(s) => Self::Cancel(s.offset_by(offset)),
            Self::Wheel(mut w) => {
                w.position -= offset;
                Self::Wheel(w)
            }
        }
    }
}

/// Durations as integer milliseconds on the wire.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
