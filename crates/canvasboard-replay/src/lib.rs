//! Headless replay of pointer scenarios.
//!
//! A scenario seeds a [`Canvas`], feeds it a scripted list of pointer
//! events, ticks and commands, and reports every notification the engine
//! emitted plus the final state.

mod args;
mod error;
pub mod scenario;

pub use args::Args;
pub use error::ReplayError;
pub use scenario::{Scenario, Step};

use canvasboard_core::{Canvas, Element, ElementId, Notification};
use kurbo::Vec2;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};

/// State of the canvas after the last step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalState {
    pub zoom: f64,
    pub pan: Vec2,
    pub selection: Vec<ElementId>,
    pub elements: Vec<Element>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Everything a replay produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub notifications: Vec<Notification>,
    pub final_state: FinalState,
}

/// Build a canvas from the scenario setup.
pub fn setup(scenario: &Scenario) -> Result<Canvas, ReplayError> {
    let mut canvas = Canvas::new(scenario.config.clone());
    if let Some(container) = scenario.container {
        canvas.set_container(container);
    }
    for (layer, visible) in &scenario.layers {
        canvas.set_layer_visible(layer.clone(), *visible);
    }
    for descriptor in &scenario.elements {
        canvas.add_element(descriptor.clone())?;
    }
    // Seeding is not something the user can undo.
    let seeded = canvas.elements().to_vec();
    canvas.load_elements(seeded);
    canvas.set_tool(scenario.tool);
    canvas.drain_notifications();
    Ok(canvas)
}

/// Run every step of `scenario`.
pub fn replay(scenario: Scenario) -> Result<Replay, ReplayError> {
    let mut canvas = setup(&scenario)?;
    let mut notifications = Vec::new();
    for (index, step) in scenario.steps.into_iter().enumerate() {
        debug!("step {index}: {step:?}");
        step.apply(&mut canvas);
        notifications.extend(canvas.drain_notifications());
    }

    let final_state = FinalState {
        zoom: canvas.viewport().zoom(),
        pan: canvas.viewport().pan(),
        selection: canvas.selected_ids(),
        elements: canvas.elements().to_vec(),
        can_undo: canvas.can_undo(),
        can_redo: canvas.can_redo(),
    };
    info!(
        "replay finished: {} notifications, {} elements",
        notifications.len(),
        final_state.elements.len()
    );
    Ok(Replay {
        notifications,
        final_state,
    })
}

/// Write one JSON line per notification, then the final state.
pub fn write_report<W: Write>(replay: &Replay, out: &mut W, pretty: bool) -> Result<(), ReplayError> {
    for notification in &replay.notifications {
        serde_json::to_writer(&mut *out, notification)?;
        writeln!(out)?;
    }
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &replay.final_state)?;
    } else {
        serde_json::to_writer(&mut *out, &replay.final_state)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Run the replay tool.
///
/// # Errors
///
/// Returns `ReplayError` for:
/// - File I/O errors
/// - Malformed scenario JSON
/// - Seed elements the canvas rejects
pub fn run(args: &Args) -> Result<(), ReplayError> {
    let source = fs::read_to_string(&args.scenario)?;
    let scenario: Scenario = serde_json::from_str(&source)?;
    let replay = replay(scenario)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&replay, &mut out, args.pretty)?;
    out.flush()?;
    Ok(())
}
