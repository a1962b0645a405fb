//! The interaction pipeline.
//!
//! [`Canvas`] owns every engine component and routes pointer input through
//! them: raw events go to the gesture recognizer, recognized gestures
//! update the selection, the viewport or a manipulation session, and
//! finished manipulations are committed to the element store as one history
//! snapshot. The host learns about the results through [`Notification`]s.

use crate::config::CanvasConfig;
use crate::element::{Element, ElementDescriptor, ElementId, ElementPatch};
use crate::error::CanvasResult;
use crate::gesture::{Gesture, GestureRecognizer};
use crate::handles::{Handle, hit_test_handles};
use crate::hit_test::{LayerVisibility, SpatialIndex, hit_test};
use crate::input::{Modifiers, PointerButton, PointerEvent, PointerKind};
use crate::manipulation::{CreateSession, Manipulation, MoveSession, ResizeSession, RotateSession};
use crate::selection::{Marquee, MarqueePolicy, Selection};
use crate::store::ElementStore;
use crate::tools::{ToolKind, ToolManager};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use serde::Serialize;
use std::time::Duration;

/// Something the presentation layer should react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Double-tap on an element.
    EditRequested {
        id: ElementId,
        screen: Point,
        world: Point,
    },
    /// Long-press or secondary press on an element.
    ContextMenuRequested {
        id: ElementId,
        screen: Point,
        world: Point,
    },
    /// Trigger platform feedback (vibration) if available.
    HapticFeedback,
    ElementsChanged,
    SelectionChanged,
    ViewportChanged,
}

/// Canvas viewport and interaction engine.
#[derive(Debug, Clone)]
pub struct Canvas {
    config: CanvasConfig,
    viewport: Viewport,
    store: ElementStore,
    selection: Selection,
    recognizer: GestureRecognizer,
    manipulation: Manipulation,
    layers: LayerVisibility,
    /// Container bounds in client coordinates.
    container: Option<Rect>,
    tools: ToolManager,
    notifications: Vec<Notification>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            viewport: Viewport::from_config(&config),
            store: ElementStore::from_config(&config),
            selection: Selection::new(),
            recognizer: GestureRecognizer::new(config.gesture_timing()),
            manipulation: Manipulation::Idle,
            layers: LayerVisibility::new(),
            container: None,
            tools: ToolManager::new(),
            notifications: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Elements in z-order, bottom first.
    pub fn elements(&self) -> &[Element] {
        self.store.elements()
    }

    pub fn layers(&self) -> &LayerVisibility {
        &self.layers
    }

    pub fn manipulation(&self) -> &Manipulation {
        &self.manipulation
    }

    /// The marquee being dragged, if any.
    pub fn marquee(&self) -> Option<&Marquee> {
        match &self.manipulation {
            Manipulation::Marquee(marquee) => Some(marquee),
            _ => None,
        }
    }

    /// Bounds of the element a draw tool is currently spanning.
    pub fn creation_preview(&self) -> Option<Rect> {
        match &self.manipulation {
            Manipulation::Creating(session) => Some(session.rect(self.grid())),
            _ => None,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    /// Keep draw tools active after they create an element.
    pub fn set_keep_tool_active(&mut self, keep: bool) {
        self.tools.keep_active = keep;
    }

    /// Set the container rectangle in client coordinates.
    pub fn set_container(&mut self, container: Rect) {
        self.container = Some(container);
    }

    /// Forget the container. Pointer input is ignored until it is set again.
    pub fn clear_container(&mut self) {
        self.container = None;
    }

    pub fn container(&self) -> Option<Rect> {
        self.container
    }

    pub fn container_size(&self) -> Option<Size> {
        self.container.map(|c| c.size())
    }

    pub fn set_layer_visible(&mut self, layer_id: impl Into<String>, visible: bool) {
        self.layers.set_visible(layer_id, visible);
    }

    /// Replace the per-layer visibility flags.
    pub fn set_layers(&mut self, layers: LayerVisibility) {
        self.layers = layers;
    }

    /// Take every notification emitted since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, notification: Notification) {
        // Consecutive duplicates of a change signal carry no extra information.
        if self.notifications.last() == Some(&notification) && is_change_signal(&notification) {
            return;
        }
        self.notifications.push(notification);
    }

    fn grid(&self) -> Option<f64> {
        self.config.snap_to_grid.then_some(self.config.grid_size)
    }

    // --- Coordinates ---

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.viewport.world_to_screen(world)
    }

    /// Convert client coordinates to world coordinates.
    ///
    /// Without a container this returns `Point::ZERO`.
    pub fn client_to_world(&self, client: Point) -> Point {
        match self.container {
            Some(container) => self.screen_to_world(client - container.origin().to_vec2()),
            None => {
                log::trace!("canvas: no container for client point {client:?}");
                Point::ZERO
            }
        }
    }

    fn container_center(&self) -> Point {
        self.container
            .map(|c| Point::new(c.width() / 2.0, c.height() / 2.0))
            .unwrap_or(Point::ZERO)
    }

    // --- Viewport ---

    fn viewport_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.notify(Notification::ViewportChanged);
        }
        changed
    }

    /// Zoom in one step around the container center.
    pub fn zoom_in(&mut self) -> bool {
        let anchor = self.container_center();
        let changed = self.viewport.zoom_in(anchor);
        self.viewport_changed(changed)
    }

    /// Zoom out one step around the container center.
    pub fn zoom_out(&mut self) -> bool {
        let anchor = self.container_center();
        let changed = self.viewport.zoom_out(anchor);
        self.viewport_changed(changed)
    }

    /// Zoom around a container-relative screen point.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        let changed = self.viewport.zoom_at(anchor, factor);
        self.viewport_changed(changed)
    }

    /// Set the zoom to `pct` percent around the container center.
    pub fn set_zoom_percentage(&mut self, pct: u32) -> bool {
        let anchor = self.container_center();
        let changed = self.viewport.set_zoom_percentage(pct, anchor);
        self.viewport_changed(changed)
    }

    /// Fit world `bounds` into the container. No-op without a container.
    pub fn zoom_to_fit(&mut self, bounds: Rect) -> bool {
        let Some(container) = self.container else {
            log::trace!("canvas: zoom_to_fit without container");
            return false;
        };
        let changed = self.viewport.zoom_to_fit(bounds, container.size(), self.config.fit_padding);
        self.viewport_changed(changed)
    }

    /// Fit every element into the container.
    pub fn zoom_to_fit_content(&mut self) -> bool {
        match self.store.bounds() {
            Some(bounds) => self.zoom_to_fit(bounds),
            None => false,
        }
    }

    /// Pan by a screen-space delta. Returns true if the viewport moved.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        let changed = self.viewport.pan_by_screen(delta);
        self.viewport_changed(changed)
    }

    // --- Selection ---

    fn change_selection(&mut self, f: impl FnOnce(&mut Selection)) {
        let before = self.selection.clone();
        f(&mut self.selection);
        if self.selection != before {
            self.notify(Notification::SelectionChanged);
        }
    }

    fn prune_selection(&mut self) {
        if self.selection.prune(&self.store) {
            self.notify(Notification::SelectionChanged);
        }
    }

    pub fn select_element(&mut self, id: ElementId, additive: bool) {
        self.change_selection(|selection| selection.select_element(id, additive));
    }

    pub fn select_multiple(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.change_selection(|selection| selection.select_multiple(ids));
    }

    pub fn clear_selection(&mut self) {
        self.change_selection(Selection::clear);
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.is_selected(id) && self.store.contains(id)
    }

    /// Selected ids, with deleted elements pruned.
    pub fn selected_ids(&mut self) -> Vec<ElementId> {
        self.prune_selection();
        self.selection.ids().to_vec()
    }

    /// Select every element on a visible layer.
    pub fn select_all(&mut self) {
        let ids: Vec<ElementId> = self
            .store
            .elements()
            .iter()
            .filter(|e| self.layers.shows(e))
            .map(|e| e.id.clone())
            .collect();
        self.select_multiple(ids);
    }

    // --- Mutation ---

    fn elements_changed<T>(&mut self, result: CanvasResult<T>, action: &str) -> CanvasResult<T> {
        match &result {
            Ok(_) => self.notify(Notification::ElementsChanged),
            Err(err) => log::warn!("canvas: {action} rejected: {err}"),
        }
        result
    }

    pub fn add_element(&mut self, descriptor: ElementDescriptor) -> CanvasResult<ElementId> {
        self.settle_manipulation();
        let result = self.store.add(descriptor);
        self.elements_changed(result, "add")
    }

    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        self.settle_manipulation();
        let result = self.store.update(id, patch);
        self.elements_changed(result, "update")
    }

    /// Update several elements as one undo step.
    pub fn update_elements(&mut self, patches: &[(ElementId, ElementPatch)]) -> CanvasResult<()> {
        self.settle_manipulation();
        let result = self.store.update_many(patches);
        self.elements_changed(result, "update")
    }

    pub fn delete_element(&mut self, id: &ElementId) -> CanvasResult<Element> {
        self.settle_manipulation();
        let result = self.store.delete(id);
        let result = self.elements_changed(result, "delete");
        self.prune_selection();
        result
    }

    /// Delete the selection as one undo step. Returns how many went.
    pub fn delete_selected(&mut self) -> usize {
        self.settle_manipulation();
        let ids = self.selected_ids();
        let removed = self.store.delete_many(&ids);
        if removed > 0 {
            self.notify(Notification::ElementsChanged);
        }
        self.clear_selection();
        removed
    }

    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        self.settle_manipulation();
        let changed = self.store.bring_to_front(id);
        self.z_order_changed(changed)
    }

    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        self.settle_manipulation();
        let changed = self.store.send_to_back(id);
        self.z_order_changed(changed)
    }

    pub fn bring_forward(&mut self, id: &ElementId) -> bool {
        self.settle_manipulation();
        let changed = self.store.bring_forward(id);
        self.z_order_changed(changed)
    }

    pub fn send_backward(&mut self, id: &ElementId) -> bool {
        self.settle_manipulation();
        let changed = self.store.send_backward(id);
        self.z_order_changed(changed)
    }

    fn z_order_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.notify(Notification::ElementsChanged);
        }
        changed
    }

    /// Replace the element collection and restart history.
    pub fn load_elements(&mut self, elements: Vec<Element>) {
        self.abort_manipulation();
        self.store.load(elements);
        self.notify(Notification::ElementsChanged);
        self.prune_selection();
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.abort_manipulation();
        let changed = self.store.undo();
        self.history_moved(changed)
    }

    pub fn redo(&mut self) -> bool {
        self.abort_manipulation();
        let changed = self.store.redo();
        self.history_moved(changed)
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    fn history_moved(&mut self, changed: bool) -> bool {
        if changed {
            self.notify(Notification::ElementsChanged);
            self.prune_selection();
        }
        changed
    }

    /// Commit an in-flight move, resize or rotate as its own undo step and
    /// end it, so a mutation arriving mid-drag never snapshots drag frames.
    /// The rest of the drag is ignored.
    fn settle_manipulation(&mut self) {
        if !self.manipulation.is_editing_elements() {
            return;
        }
        log::debug!("canvas: mutation during a drag, committing it early");
        if self.store.commit() {
            self.notify(Notification::ElementsChanged);
        }
        self.manipulation = Manipulation::Idle;
    }

    /// Drop an in-flight manipulation and its uncommitted edits.
    fn abort_manipulation(&mut self) {
        if self.manipulation.is_editing_elements() {
            self.store.revert();
            self.notify(Notification::ElementsChanged);
        }
        self.manipulation = Manipulation::Idle;
    }

    // --- Input ---

    /// Feed one pointer event in client coordinates.
    ///
    /// Ignored while no container is set.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let Some(container) = self.container else {
            log::trace!("canvas: pointer event without container ignored");
            return;
        };
        let event = event.offset_by(container.origin().to_vec2());
        let gestures = self.recognizer.handle(&event, &self.viewport);
        for gesture in gestures {
            self.dispatch(gesture);
        }
    }

    /// Fire gesture timers due at `now`.
    pub fn tick(&mut self, now: Duration) {
        let gestures = self.recognizer.tick(now);
        for gesture in gestures {
            self.dispatch(gesture);
        }
    }

    /// When the host should next call [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<Duration> {
        self.recognizer.next_deadline()
    }

    /// Abandon the current interaction (teardown, focus loss). An active
    /// drag ends as if released.
    pub fn cancel_interaction(&mut self) {
        let gestures = self.recognizer.reset();
        for gesture in gestures {
            self.dispatch(gesture);
        }
        self.abort_manipulation();
    }

    fn element_at(&self, screen: Point) -> Option<ElementId> {
        hit_test(self.screen_to_world(screen), self.store.elements(), &self.layers)
    }

    fn dispatch(&mut self, gesture: Gesture) {
        log::trace!("canvas: {gesture:?}");
        match gesture {
            Gesture::Tap { point, modifiers, .. } => self.on_tap(point, modifiers),
            Gesture::DoubleTap { point, .. } => {
                if let Some(id) = self.element_at(point) {
                    let world = self.screen_to_world(point);
                    self.notify(Notification::EditRequested { id, screen: point, world });
                }
            }
            Gesture::LongPress { point, .. } | Gesture::SecondaryPress { point, .. } => {
                if self.tool() != ToolKind::Select {
                    return;
                }
                if let Some(id) = self.element_at(point) {
                    let world = self.screen_to_world(point);
                    self.notify(Notification::ContextMenuRequested { id, screen: point, world });
                }
            }
            Gesture::HapticFeedback => self.notify(Notification::HapticFeedback),
            Gesture::DragStart {
                origin,
                kind,
                button,
                after_long_press,
                modifiers,
            } => self.begin_drag(origin, kind, button, after_long_press, modifiers),
            Gesture::DragMove { point, modifiers } => self.update_drag(point, modifiers),
            Gesture::DragEnd { point, modifiers, .. } => self.end_drag(point, modifiers),
            Gesture::TwoFingerTap { center, .. } => {
                if let Some(id) = self.element_at(center) {
                    self.select_element(id, true);
                }
            }
            Gesture::Pinch {
                baseline,
                distance,
                center,
            } => {
                self.viewport.apply_pinch(&baseline, distance, center);
                self.notify(Notification::ViewportChanged);
            }
            Gesture::PinchEnd => log::debug!("canvas: pinch ended at {}%", self.viewport.zoom_percentage()),
            Gesture::Wheel { point, delta, modifiers } => self.on_wheel(point, delta, modifiers),
        }
    }

    fn on_tap(&mut self, point: Point, modifiers: Modifiers) {
        let tool = self.tool();
        if let Some(kind) = tool.element_kind() {
            let size = self.config.default_element_size;
            let world = self.screen_to_world(point);
            let origin = world - Vec2::new(size.width / 2.0, size.height / 2.0);
            self.create_element(ElementDescriptor::new(kind, origin, size));
            return;
        }
        if tool != ToolKind::Select {
            return;
        }
        match self.element_at(point) {
            Some(id) => self.select_element(id, modifiers.shift),
            None if !modifiers.shift => self.clear_selection(),
            None => {}
        }
    }

    fn on_wheel(&mut self, point: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.command() {
            if delta.y < 0.0 {
                let changed = self.viewport.zoom_in(point);
                self.viewport_changed(changed);
            } else if delta.y > 0.0 {
                let changed = self.viewport.zoom_out(point);
                self.viewport_changed(changed);
            }
        } else {
            self.pan_by(-delta);
        }
    }

    fn create_element(&mut self, descriptor: ElementDescriptor) {
        if let Ok(id) = self.add_element(descriptor) {
            self.select_element(id, false);
            self.tools.finish_creation();
        }
    }

    fn begin_drag(
        &mut self,
        origin: Point,
        kind: PointerKind,
        button: PointerButton,
        after_long_press: bool,
        modifiers: Modifiers,
    ) {
        let world = self.screen_to_world(origin);
        let tool = self.tool();

        self.manipulation = if button == PointerButton::Middle || tool == ToolKind::Pan {
            Manipulation::Panning { last: origin }
        } else if let Some(element_kind) = tool.element_kind() {
            Manipulation::Creating(CreateSession::new(element_kind, world))
        } else if let Some(handle_drag) = self.begin_handle_drag(world) {
            handle_drag
        } else if let Some(id) = self.element_at(origin) {
            self.begin_move(id, world, modifiers)
        } else if kind == PointerKind::Touch && !after_long_press {
            Manipulation::Panning { last: origin }
        } else {
            let policy = if kind == PointerKind::Touch {
                MarqueePolicy::Intersects
            } else {
                MarqueePolicy::FullyContained
            };
            Manipulation::Marquee(Marquee::new(world, policy))
        };
        log::debug!("canvas: drag started: {:?}", self.manipulation);
    }

    /// Resize or rotate when the press lands on a handle of the single
    /// selected element.
    fn begin_handle_drag(&self, world: Point) -> Option<Manipulation> {
        let [id] = self.selection.ids() else {
            return None;
        };
        let element = self.store.get(id).filter(|e| self.layers.shows(e))?;
        let zoom = self.viewport.zoom();
        let tolerance = self.viewport.screen_dist_to_world(self.config.handle_tolerance);
        match hit_test_handles(element, world, tolerance, zoom)? {
            Handle::Resize(handle) => {
                ResizeSession::begin(&self.store, id, handle, world).map(Manipulation::Resizing)
            }
            Handle::Rotate => RotateSession::begin(&self.store, id).map(Manipulation::Rotating),
        }
    }

    fn begin_move(&mut self, id: ElementId, world: Point, modifiers: Modifiers) -> Manipulation {
        if !self.selection.is_selected(&id) {
            self.select_element(id.clone(), modifiers.shift);
        }
        let ids = self.selected_ids();
        match MoveSession::begin(&self.store, &ids, &id, world) {
            Some(session) => Manipulation::Moving(session),
            None => {
                log::debug!("canvas: {id} is locked, not moving");
                Manipulation::Idle
            }
        }
    }

    fn update_drag(&mut self, point: Point, modifiers: Modifiers) {
        let world = self.screen_to_world(point);
        let grid = self.grid();
        let changed = match &mut self.manipulation {
            Manipulation::Idle => return,
            Manipulation::Moving(session) => {
                session.update(&mut self.store, world, grid);
                Some(Notification::ElementsChanged)
            }
            Manipulation::Resizing(session) => session
                .update(&mut self.store, world, grid)
                .then_some(Notification::ElementsChanged),
            Manipulation::Rotating(session) => {
                session.update(&mut self.store, world, modifiers.shift);
                Some(Notification::ElementsChanged)
            }
            Manipulation::Marquee(marquee) => {
                marquee.end = world;
                None
            }
            Manipulation::Panning { last } => {
                let delta = point - *last;
                *last = point;
                self.viewport
                    .pan_by_screen(delta)
                    .then_some(Notification::ViewportChanged)
            }
            Manipulation::Creating(session) => {
                session.current = world;
                None
            }
        };
        if let Some(notification) = changed {
            self.notify(notification);
        }
    }

    fn end_drag(&mut self, point: Point, modifiers: Modifiers) {
        self.update_drag(point, modifiers);
        match std::mem::take(&mut self.manipulation) {
            Manipulation::Idle | Manipulation::Panning { .. } => {}
            Manipulation::Moving(_) | Manipulation::Resizing(_) | Manipulation::Rotating(_) => {
                if self.store.commit() {
                    self.notify(Notification::ElementsChanged);
                }
            }
            Manipulation::Marquee(marquee) => {
                let index = SpatialIndex::build(self.store.elements(), &self.layers);
                let min_area = self.config.min_marquee_area;
                self.change_selection(|selection| {
                    selection.select_marquee(&marquee, &index, min_area);
                });
            }
            Manipulation::Creating(session) => {
                let rect = session.rect(self.grid());
                let min = self.store.min_size();
                if rect.width() >= min && rect.height() >= min {
                    self.create_element(ElementDescriptor::new(session.kind, rect.origin(), rect.size()));
                } else {
                    log::debug!("canvas: discarded {:?} smaller than {min}", session.kind);
                }
            }
        }
    }
}

fn is_change_signal(notification: &Notification) -> bool {
    matches!(
        notification,
        Notification::ElementsChanged | Notification::SelectionChanged | Notification::ViewportChanged
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::input::PointerSample;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::default();
        canvas.set_container(Rect::new(0.0, 0.0, 800.0, 600.0));
        canvas
    }

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> ElementDescriptor {
        ElementDescriptor::new(ElementKind::Rectangle, Point::new(x, y), Size::new(w, h)).with_id(id)
    }

    fn mouse_drag(canvas: &mut Canvas, from: Point, to: Point, t0: u64) {
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(from.x, from.y, t0)));
        let mid = from.midpoint(to);
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(mid.x, mid.y, t0 + 10)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(to.x, to.y, t0 + 20)));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(to.x, to.y, t0 + 30)));
    }

    fn click(canvas: &mut Canvas, x: f64, y: f64, t0: u64) {
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(x, y, t0)));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(x, y, t0 + 40)));
        canvas.tick(Duration::from_millis(t0 + 1_000));
    }

    #[test]
    fn test_client_to_world_without_container() {
        let mut canvas = Canvas::default();
        assert_eq!(canvas.client_to_world(Point::new(50.0, 50.0)), Point::ZERO);
        canvas.set_container(Rect::new(100.0, 50.0, 900.0, 650.0));
        assert_eq!(canvas.client_to_world(Point::new(150.0, 70.0)), Point::new(50.0, 20.0));
    }

    #[test]
    fn test_pointer_ignored_without_container() {
        let mut canvas = Canvas::default();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.drain_notifications();
        click(&mut canvas, 50.0, 50.0, 0);
        assert!(canvas.selected_ids().is_empty());
        assert!(canvas.drain_notifications().is_empty());
    }

    #[test]
    fn test_click_selects_and_clears() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        click(&mut canvas, 50.0, 50.0, 0);
        assert_eq!(canvas.selected_ids(), vec![ElementId::from("a")]);
        click(&mut canvas, 500.0, 500.0, 2_000);
        assert!(canvas.selected_ids().is_empty());
    }

    #[test]
    fn test_shift_click_is_additive() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("b", 200.0, 0.0, 100.0, 100.0)).unwrap();
        click(&mut canvas, 50.0, 50.0, 0);
        canvas.handle_pointer(PointerEvent::Down(
            PointerSample::mouse(250.0, 50.0, 2_000).with_modifiers(Modifiers::SHIFT),
        ));
        canvas.handle_pointer(PointerEvent::Up(
            PointerSample::mouse(250.0, 50.0, 2_040).with_modifiers(Modifiers::SHIFT),
        ));
        canvas.tick(Duration::from_millis(3_000));
        assert_eq!(canvas.selected_ids().len(), 2);
    }

    #[test]
    fn test_double_click_requests_edit() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.drain_notifications();
        for t in [0, 150] {
            canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(50.0, 50.0, t)));
            canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(50.0, 50.0, t + 30)));
        }
        canvas.tick(Duration::from_millis(2_000));
        assert_eq!(canvas.drain_notifications(), vec![Notification::EditRequested {
            id: "a".into(),
            screen: Point::new(50.0, 50.0),
            world: Point::new(50.0, 50.0),
        }]);
    }

    #[test]
    fn test_long_press_requests_context_menu() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.drain_notifications();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(1, 40.0, 40.0, 0)));
        canvas.tick(Duration::from_millis(500));
        let notes = canvas.drain_notifications();
        assert!(matches!(&notes[0], Notification::ContextMenuRequested { id, .. } if id.as_str() == "a"));
        assert_eq!(notes[1], Notification::HapticFeedback);
    }

    #[test]
    fn test_secondary_press_requests_context_menu() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.drain_notifications();
        let sample = PointerSample::mouse(10.0, 10.0, 0).with_button(PointerButton::Secondary);
        canvas.handle_pointer(PointerEvent::Down(sample));
        canvas.handle_pointer(PointerEvent::Up(sample));
        assert!(matches!(
            canvas.drain_notifications().as_slice(),
            [Notification::ContextMenuRequested { .. }]
        ));
    }

    #[test]
    fn test_drag_moves_selection_as_one_undo_step() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("b", 200.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.select_multiple(["a".into(), "b".into()]);
        let history = canvas.store().history().len();

        mouse_drag(&mut canvas, Point::new(50.0, 50.0), Point::new(80.0, 90.0), 0);

        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::new(30.0, 40.0));
        assert_eq!(canvas.store().get(&"b".into()).unwrap().position, Point::new(230.0, 40.0));
        assert_eq!(canvas.store().history().len(), history + 1);

        assert!(canvas.undo());
        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_drag_unselected_element_selects_it() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("b", 200.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.select_element("a".into(), false);
        mouse_drag(&mut canvas, Point::new(250.0, 50.0), Point::new(250.0, 150.0), 0);
        assert_eq!(canvas.selected_ids(), vec![ElementId::from("b")]);
        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::ZERO);
        assert_eq!(canvas.store().get(&"b".into()).unwrap().position, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_locked_element_does_not_move() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0).locked(true)).unwrap();
        let history = canvas.store().history().len();
        mouse_drag(&mut canvas, Point::new(50.0, 50.0), Point::new(150.0, 150.0), 0);
        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::ZERO);
        assert_eq!(canvas.store().history().len(), history);
        assert!(canvas.is_selected(&"a".into()));
    }

    #[test]
    fn test_snap_to_grid_drag() {
        let mut canvas = Canvas::new(CanvasConfig {
            snap_to_grid: true,
            ..CanvasConfig::default()
        });
        canvas.set_container(Rect::new(0.0, 0.0, 800.0, 600.0));
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        mouse_drag(&mut canvas, Point::new(50.0, 50.0), Point::new(83.0, 96.0), 0);
        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_resize_handle_drag() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 100.0, 100.0, 100.0, 100.0)).unwrap();
        canvas.select_element("a".into(), false);
        mouse_drag(&mut canvas, Point::new(200.0, 200.0), Point::new(250.0, 230.0), 0);
        let el = canvas.store().get(&"a".into()).unwrap();
        assert_eq!(el.rect(), Rect::new(100.0, 100.0, 250.0, 230.0));
    }

    #[test]
    fn test_resize_below_floor_is_discarded() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 100.0, 100.0, 100.0, 100.0)).unwrap();
        canvas.select_element("a".into(), false);
        let history = canvas.store().history().len();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(200.0, 200.0, 0)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(105.0, 105.0, 10)));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(105.0, 105.0, 20)));
        assert_eq!(canvas.store().get(&"a".into()).unwrap().size, Size::new(100.0, 100.0));
        assert_eq!(canvas.store().history().len(), history);
    }

    #[test]
    fn test_rotate_handle_drag_with_snap() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 100.0, 100.0, 100.0, 100.0)).unwrap();
        canvas.select_element("a".into(), false);
        let start = Point::new(150.0, 76.0);
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(start.x, start.y, 0)));
        let shift = |x, y, t| PointerSample::mouse(x, y, t).with_modifiers(Modifiers::SHIFT);
        canvas.handle_pointer(PointerEvent::Move(shift(220.0, 80.0, 10)));
        canvas.handle_pointer(PointerEvent::Up(shift(220.0, 80.0, 20)));
        let rotation = canvas.store().get(&"a".into()).unwrap().rotation;
        assert!((rotation - 45.0).abs() < 1e-9, "rotation {rotation}");
    }

    #[test]
    fn test_mouse_marquee_fully_contained() {
        let mut canvas = canvas();
        canvas.add_element(rect("inside", 10.0, 10.0, 30.0, 30.0)).unwrap();
        canvas.add_element(rect("partial", 190.0, 190.0, 30.0, 30.0)).unwrap();
        // Start on empty canvas just off the first element.
        mouse_drag(&mut canvas, Point::new(0.0, 0.0), Point::new(200.0, 200.0), 0);
        assert_eq!(canvas.selected_ids(), vec![ElementId::from("inside")]);
        assert!(canvas.marquee().is_none());
    }

    #[test]
    fn test_touch_long_press_marquee_intersects() {
        let mut canvas = canvas();
        canvas.add_element(rect("inside", 10.0, 10.0, 30.0, 30.0)).unwrap();
        canvas.add_element(rect("partial", 190.0, 190.0, 30.0, 30.0)).unwrap();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(1, 200.0, 5.0, 0)));
        canvas.tick(Duration::from_millis(600));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::touch(1, 100.0, 100.0, 700)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::touch(1, 0.0, 200.0, 720)));
        assert!(matches!(canvas.marquee(), Some(m) if m.policy == MarqueePolicy::Intersects));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::touch(1, 0.0, 200.0, 740)));
        assert_eq!(canvas.selected_ids().len(), 2);
    }

    #[test]
    fn test_touch_drag_on_empty_canvas_pans() {
        let mut canvas = canvas();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(1, 100.0, 100.0, 0)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::touch(1, 150.0, 120.0, 50)));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::touch(1, 150.0, 120.0, 80)));
        assert_eq!(canvas.viewport().pan(), Vec2::new(50.0, 20.0));
        assert_eq!(canvas.screen_to_world(Point::new(150.0, 120.0)), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_pinch_zoom_clamped() {
        let mut canvas = canvas();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(1, 390.0, 300.0, 0)));
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(2, 410.0, 300.0, 10)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::touch(1, 300.0, 300.0, 50)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::touch(2, 500.0, 300.0, 60)));
        assert!(canvas.viewport().zoom() <= 5.0);
        assert!((canvas.viewport().zoom() - 5.0).abs() < 1e-9);
        let world = canvas.screen_to_world(Point::new(400.0, 300.0));
        assert!((world.x - 400.0).abs() < 1e-9 && (world.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_finger_tap_adds_to_selection() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("b", 200.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.select_element("a".into(), false);
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(1, 230.0, 50.0, 0)));
        canvas.handle_pointer(PointerEvent::Down(PointerSample::touch(2, 270.0, 50.0, 10)));
        canvas.tick(Duration::from_millis(200));
        assert_eq!(canvas.selected_ids(), vec![ElementId::from("a"), ElementId::from("b")]);
    }

    #[test]
    fn test_wheel_zoom_and_pan() {
        let mut canvas = canvas();
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        let wheel = |delta: Vec2, modifiers| {
            PointerEvent::Wheel(crate::input::WheelSample {
                position: Point::new(200.0, 100.0),
                delta,
                modifiers,
                time: Duration::ZERO,
            })
        };
        let anchor = canvas.screen_to_world(Point::new(200.0, 100.0));
        canvas.handle_pointer(wheel(Vec2::new(0.0, -50.0), ctrl));
        assert!((canvas.viewport().zoom() - 1.1).abs() < 1e-9);
        let after = canvas.screen_to_world(Point::new(200.0, 100.0));
        assert!((after.x - anchor.x).abs() < 1e-9 && (after.y - anchor.y).abs() < 1e-9);

        canvas.set_zoom_percentage(100);
        let pan = canvas.viewport().pan();
        canvas.handle_pointer(wheel(Vec2::new(0.0, 40.0), Modifiers::NONE));
        assert_eq!(canvas.viewport().pan(), pan - Vec2::new(0.0, 40.0));
    }

    #[test]
    fn test_draw_tool_creates_and_reverts() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Ellipse);
        mouse_drag(&mut canvas, Point::new(100.0, 100.0), Point::new(160.0, 140.0), 0);
        assert_eq!(canvas.elements().len(), 1);
        let el = &canvas.elements()[0];
        assert_eq!(el.kind, ElementKind::Ellipse);
        assert_eq!(el.rect(), Rect::new(100.0, 100.0, 160.0, 140.0));
        assert_eq!(canvas.tool(), ToolKind::Select);
        assert!(canvas.is_selected(&el.id));
    }

    #[test]
    fn test_draw_tool_tiny_drag_discarded() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::Rectangle);
        mouse_drag(&mut canvas, Point::new(100.0, 100.0), Point::new(130.0, 105.0), 0);
        assert!(canvas.elements().is_empty());
        assert_eq!(canvas.tool(), ToolKind::Rectangle);
    }

    #[test]
    fn test_draw_tool_tap_creates_default_size() {
        let mut canvas = canvas();
        canvas.set_tool(ToolKind::StickyNote);
        click(&mut canvas, 300.0, 300.0, 0);
        let el = &canvas.elements()[0];
        assert_eq!(el.size, Size::new(120.0, 80.0));
        assert_eq!(el.center(), Point::new(300.0, 300.0));
    }

    #[test]
    fn test_hidden_layer_not_hit() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0).with_layer("l1")).unwrap();
        canvas.set_layer_visible("l1", false);
        click(&mut canvas, 50.0, 50.0, 0);
        assert!(canvas.selected_ids().is_empty());
    }

    #[test]
    fn test_delete_selected_and_prune() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("b", 200.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.add_element(rect("c", 400.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.select_all();
        canvas.delete_element(&"c".into()).unwrap();
        assert_eq!(canvas.selected_ids().len(), 2);

        let history = canvas.store().history().len();
        assert_eq!(canvas.delete_selected(), 2);
        assert!(canvas.elements().is_empty());
        assert_eq!(canvas.store().history().len(), history + 1);

        assert!(canvas.undo());
        assert_eq!(canvas.elements().len(), 2);
        assert!(canvas.selected_ids().is_empty());
    }

    #[test]
    fn test_undo_prunes_selection() {
        let mut canvas = canvas();
        let id = canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.select_element(id.clone(), false);
        canvas.drain_notifications();
        assert!(canvas.undo());
        assert!(!canvas.is_selected(&id));
        assert_eq!(canvas.drain_notifications(), vec![
            Notification::ElementsChanged,
            Notification::SelectionChanged,
        ]);
        assert!(!canvas.undo());
    }

    #[test]
    fn test_zoom_to_fit_content() {
        let mut canvas = canvas();
        assert!(!canvas.zoom_to_fit_content());
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(canvas.zoom_to_fit_content());
        // 500 px of room for 100 units, capped at 300%.
        assert!((canvas.viewport().zoom() - 3.0).abs() < 1e-9);
        let center = canvas.world_to_screen(Point::new(50.0, 50.0));
        assert!((center.x - 400.0).abs() < 1e-9 && (center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_buttons_keep_center() {
        let mut canvas = canvas();
        let center = canvas.screen_to_world(Point::new(400.0, 300.0));
        assert!(canvas.zoom_in());
        assert!(canvas.zoom_out());
        assert!(canvas.set_zoom_percentage(1_000));
        assert_eq!(canvas.viewport().zoom_percentage(), 500);
        let after = canvas.screen_to_world(Point::new(400.0, 300.0));
        assert!((after.x - center.x).abs() < 1e-9 && (after.y - center.y).abs() < 1e-9);
    }

    #[test]
    fn test_change_notifications_coalesce() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.drain_notifications();
        mouse_drag(&mut canvas, Point::new(50.0, 50.0), Point::new(150.0, 50.0), 0);
        let notes = canvas.drain_notifications();
        assert_eq!(notes, vec![
            Notification::SelectionChanged,
            Notification::ElementsChanged,
        ]);
    }

    #[test]
    fn test_cancel_interaction_commits_drag() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(50.0, 50.0, 0)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(90.0, 50.0, 10)));
        canvas.cancel_interaction();
        assert!(canvas.manipulation().is_idle());
        assert!(canvas.next_deadline().is_none());
        assert_eq!(canvas.store().get(&"a".into()).unwrap().position, Point::new(40.0, 0.0));
        assert!(canvas.can_undo());
    }

    #[test]
    fn test_mutation_mid_drag_keeps_one_step_per_action() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        let history = canvas.store().history().len();

        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(50.0, 50.0, 0)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(90.0, 50.0, 10)));
        canvas.add_element(rect("b", 300.0, 300.0, 50.0, 50.0)).unwrap();
        assert!(canvas.manipulation().is_idle());

        // The rest of the interrupted drag does nothing.
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(150.0, 50.0, 20)));
        canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(150.0, 50.0, 30)));
        let a = ElementId::from("a");
        assert_eq!(canvas.store().get(&a).unwrap().position, Point::new(40.0, 0.0));
        assert_eq!(canvas.store().history().len(), history + 2);

        assert!(canvas.undo());
        assert!(canvas.store().get(&"b".into()).is_none());
        assert_eq!(canvas.store().get(&a).unwrap().position, Point::new(40.0, 0.0));
        assert!(canvas.undo());
        assert_eq!(canvas.store().get(&a).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_delete_mid_drag() {
        let mut canvas = canvas();
        canvas.add_element(rect("a", 0.0, 0.0, 100.0, 100.0)).unwrap();
        canvas.handle_pointer(PointerEvent::Down(PointerSample::mouse(50.0, 50.0, 0)));
        canvas.handle_pointer(PointerEvent::Move(PointerSample::mouse(90.0, 50.0, 10)));
        assert_eq!(canvas.delete_selected(), 1);
        canvas.handle_pointer(PointerEvent::Up(PointerSample::mouse(150.0, 50.0, 30)));
        assert!(canvas.elements().is_empty());

        assert!(canvas.undo());
        assert_eq!(canvas.elements()[0].position, Point::new(40.0, 0.0));
    }

    #[test]
    fn test_inverted_zoom_config_does_not_panic() {
        let config: CanvasConfig = serde_json::from_str(r#"{ "min_zoom": 2.0, "max_zoom": 1.5 }"#).unwrap();
        let mut canvas = Canvas::new(config);
        canvas.set_container(Rect::new(0.0, 0.0, 800.0, 600.0));
        assert!((canvas.viewport().zoom() - 1.5).abs() < 1e-9);
        canvas.zoom_in();
        canvas.zoom_in();
        canvas.zoom_in();
        canvas.zoom_in();
        assert!((canvas.viewport().zoom() - 2.0).abs() < 1e-9);
        canvas.set_zoom_percentage(10);
        assert_eq!(canvas.viewport().zoom_percentage(), 150);
    }

    #[test]
    fn test_empty_pan_is_silent() {
        let mut canvas = canvas();
        canvas.drain_notifications();
        assert!(!canvas.pan_by(Vec2::ZERO));
        assert!(!canvas.pan_by(Vec2::new(f64::INFINITY, 0.0)));
        assert!(canvas.drain_notifications().is_empty());
        assert!(canvas.pan_by(Vec2::new(5.0, 0.0)));
        assert_eq!(canvas.drain_notifications(), vec![Notification::ViewportChanged]);
    }
}
