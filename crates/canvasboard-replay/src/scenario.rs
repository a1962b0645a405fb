//! Scenario files: a canvas setup plus a timed list of steps.

use canvasboard_core::{
    Canvas, CanvasConfig, ElementDescriptor, PointerEvent, PointerSample, ToolKind, WheelSample,
};
use kurbo::Rect;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// A scripted session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: CanvasConfig,
    /// Container rectangle in client coordinates. Without one, pointer
    /// steps are ignored by the canvas.
    pub container: Option<Rect>,
    /// Elements present before the first step.
    pub elements: Vec<ElementDescriptor>,
    /// Layer visibility flags; unlisted layers are visible.
    pub layers: BTreeMap<String, bool>,
    pub tool: ToolKind,
    pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Cancel(PointerSample),
    Wheel(WheelSample),
    /// Advance the clock and fire due gesture timers.
    Tick { time_ms: u64 },
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ZoomToFitContent,
    SetZoom { percent: u32 },
    SetTool { tool: ToolKind },
    SetLayerVisible { layer: String, visible: bool },
    SelectAll,
    ClearSelection,
    DeleteSelected,
}

impl Step {
    /// Apply the step to `canvas`.
    pub fn apply(self, canvas: &mut Canvas) {
        match self {
            Step::Down(sample) => canvas.handle_pointer(PointerEvent::Down(sample)),
            Step::Move(sample) => canvas.handle_pointer(PointerEvent::Move(sample)),
            Step::Up(sample) => canvas.handle_pointer(PointerEvent::Up(sample)),
            Step::Cancel(sample) => canvas.handle_pointer(PointerEvent::Cancel(sample)),
            Step::Wheel(wheel) => canvas.handle_pointer(PointerEvent::Wheel(wheel)),
            Step::Tick { time_ms } => canvas.tick(Duration::from_millis(time_ms)),
            Step::Undo => {
                canvas.undo();
            }
            Step::Redo => {
                canvas.redo();
            }
            Step::ZoomIn => {
                canvas.zoom_in();
            }
            Step::ZoomOut => {
                canvas.zoom_out();
            }
            Step::ZoomToFitContent => {
                canvas.zoom_to_fit_content();
            }
            Step::SetZoom { percent } => {
                canvas.set_zoom_percentage(percent);
            }
            Step::SetTool { tool } => canvas.set_tool(tool),
            Step::SetLayerVisible { layer, visible } => canvas.set_layer_visible(layer, visible),
            Step::SelectAll => canvas.select_all(),
            Step::ClearSelection => canvas.clear_selection(),
            Step::DeleteSelected => {
                canvas.delete_selected();
            }
        }
    }
}
