//! Tool system for the canvas.

use crate::element::ElementKind;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
    Text,
    StickyNote,
    Frame,
}

impl ToolKind {
    /// Element kind created by a draw tool, `None` for `Select` and `Pan`.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            Self::Select | Self::Pan => None,
            Self::Rectangle => Some(ElementKind::Rectangle),
            Self::Ellipse => Some(ElementKind::Ellipse),
            Self::Diamond => Some(ElementKind::Diamond),
            Self::Triangle => Some(ElementKind::Triangle),
            Self::Text => Some(ElementKind::Text),
            Self::StickyNote => Some(ElementKind::StickyNote),
            Self::Frame => Some(ElementKind::Frame),
        }
    }

    pub fn is_drawing(self) -> bool {
        self.element_kind().is_some()
    }
}

/// Manages the current tool.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Keep a draw tool active after it created an element.
    pub keep_active: bool,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.current_tool != tool {
            log::debug!("tool: {:?} -> {tool:?}", self.current_tool);
        }
        self.current_tool = tool;
    }

    /// Called after a draw tool created an element. Returns true if the
    /// tool went back to `Select`.
    pub fn finish_creation(&mut self) -> bool {
        if self.keep_active || !self.current_tool.is_drawing() {
            return false;
        }
        self.set_tool(ToolKind::Select);
        true
    }
}
