//! CanvasBoard Core Library
//!
//! Viewport and gesture-interaction engine for an infinite-canvas
//! whiteboard. Platform-agnostic: the host feeds timestamped pointer events
//! and a container rectangle, and renders from the element store, the
//! selection and the viewport.

pub mod canvas;
pub mod config;
pub mod element;
pub mod error;
pub mod gesture;
pub mod handles;
pub mod history;
pub mod input;
pub mod manipulation;
pub mod selection;
pub mod snap;
pub mod store;
pub mod tools;
pub mod viewport;

pub use canvas::{Canvas, Notification};
pub use config::{CanvasConfig, GestureTiming};
pub use element::{Element, ElementDescriptor, ElementId, ElementKind, ElementPatch, StyleMap};
pub use error::{CanvasError, CanvasResult};
pub use gesture::{Gesture, GestureRecognizer, GestureState};
pub use handles::{Handle, ResizeHandle};
pub use history::History;
pub use hit_test::{LayerVisibility, SpatialIndex, hit_test};
pub use input::{Modifiers, PointerButton, PointerEvent, PointerId, PointerKind, PointerSample, WheelSample};
pub use manipulation::Manipulation;
pub use selection::{Marquee, MarqueePolicy, Selection};
pub use snap::snap_to_grid;
pub use store::ElementStore;
pub use tools::{ToolKind, ToolManager};
pub use viewport::{PinchBaseline, Viewport};
