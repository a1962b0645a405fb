//! Ordered element collection with snapshot history.

use crate::config::{CanvasConfig, HISTORY_LIMIT, MIN_ELEMENT_SIZE};
use crate::element::{Element, ElementDescriptor, ElementId, ElementPatch};
use crate::error::{CanvasError, CanvasResult};
use crate::history::History;
use kurbo::Rect;

/// Owns every element on the canvas.
///
/// Vector order is z-order: the last element is drawn on top. Each public
/// mutation records exactly one history snapshot of the resulting state.
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: Vec<Element>,
    history: History,
    min_size: f64,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            history: History::with_limit(Vec::new(), HISTORY_LIMIT),
            min_size: MIN_ELEMENT_SIZE,
        }
    }

    /// Create an empty store using limits from `config`.
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            elements: Vec::new(),
            history: History::with_limit(Vec::new(), config.history_limit),
            min_size: config.min_element_size,
        }
    }

    /// Replace the whole collection (e.g. loaded by the host) and restart
    /// history with it as the only snapshot.
    pub fn load(&mut self, elements: Vec<Element>) {
        self.history = History::with_limit(elements.clone(), self.history.limit());
        self.elements = elements;
    }

    /// Elements in z-order, bottom first.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.index_of(id).is_some()
    }

    fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Minimum width/height enforced on every element.
    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn snapshot(&mut self) {
        self.history.save(&self.elements);
    }

    /// Add an element on top of the stack.
    pub fn add(&mut self, descriptor: ElementDescriptor) -> CanvasResult<ElementId> {
        let element = descriptor.into_element(self.min_size)?;
        if self.contains(&element.id) {
            return Err(CanvasError::DuplicateId(element.id));
        }
        let id = element.id.clone();
        self.elements.push(element);
        self.snapshot();
        log::debug!("store: added {id}");
        Ok(id)
    }

    /// Apply a partial update to one element.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        patch.validate(self.min_size)?;
        let index = self
            .index_of(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.clone()))?;
        patch.apply_to(&mut self.elements[index]);
        self.snapshot();
        Ok(())
    }

    /// Apply several patches as one logical action.
    ///
    /// Either every patch applies or none does.
    pub fn update_many(&mut self, patches: &[(ElementId, ElementPatch)]) -> CanvasResult<()> {
        let mut indices = Vec::with_capacity(patches.len());
        for (id, patch) in patches {
            patch.validate(self.min_size)?;
            let index = self
                .index_of(id)
                .ok_or_else(|| CanvasError::ElementNotFound(id.clone()))?;
            indices.push(index);
        }
        if indices.is_empty() {
            return Ok(());
        }
        for (index, (_, patch)) in indices.into_iter().zip(patches) {
            patch.apply_to(&mut self.elements[index]);
        }
        self.snapshot();
        Ok(())
    }

    /// Remove one element.
    pub fn delete(&mut self, id: &ElementId) -> CanvasResult<Element> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.clone()))?;
        let removed = self.elements.remove(index);
        self.snapshot();
        log::debug!("store: deleted {id}");
        Ok(removed)
    }

    /// Remove every listed element that exists. Returns how many went.
    pub fn delete_many(&mut self, ids: &[ElementId]) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| !ids.contains(&e.id));
        let removed = before - self.elements.len();
        if removed > 0 {
            self.snapshot();
        }
        removed
    }

    /// Bring an element to the top of the stack.
    pub fn bring_to_front(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(index) if index + 1 < self.elements.len() => {
                let element = self.elements.remove(index);
                self.elements.push(element);
                self.snapshot();
                true
            }
            _ => false,
        }
    }

    /// Send an element to the bottom of the stack.
    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(index) if index > 0 => {
                let element = self.elements.remove(index);
                self.elements.insert(0, element);
                self.snapshot();
                true
            }
            _ => false,
        }
    }

    /// Move an element one step towards the top.
    pub fn bring_forward(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(index) if index + 1 < self.elements.len() => {
                self.elements.swap(index, index + 1);
                self.snapshot();
                true
            }
            _ => false,
        }
    }

    /// Move an element one step towards the bottom.
    pub fn send_backward(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(index) if index > 0 => {
                self.elements.swap(index, index - 1);
                self.snapshot();
                true
            }
            _ => false,
        }
    }

    /// Union of all element bounds, rotation included.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements
            .iter()
            .map(Element::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// Restore the previous snapshot. Returns false at the start of history.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false at the end of history.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Mutable access that bypasses history, for in-progress manipulation.
    /// Finish with [`commit`](Self::commit) or [`revert`](Self::revert).
    pub(crate) fn get_mut_uncommitted(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    /// Record uncommitted changes as one snapshot. No-op if nothing changed.
    pub(crate) fn commit(&mut self) -> bool {
        if self.elements.as_slice() == self.history.current() {
            return false;
        }
        self.snapshot();
        true
    }

    /// Throw away uncommitted changes.
    pub(crate) fn revert(&mut self) {
        self.elements = self.history.current().to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use kurbo::{Point, Size};

    fn rect(id: &str, x: f64, y: f64) -> ElementDescriptor {
        ElementDescriptor::new(ElementKind::Rectangle, Point::new(x, y), Size::new(50.0, 50.0)).with_id(id)
    }

    #[test]
    fn test_add_and_get() {
        let mut store = ElementStore::new();
        let id = store.add(rect("a", 0.0, 0.0)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = ElementStore::new();
        store.add(rect("a", 0.0, 0.0)).unwrap();
        let err = store.add(rect("a", 10.0, 0.0)).unwrap_err();
        assert_eq!(err, CanvasError::DuplicateId("a".into()));
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_each_mutation_saves_once() {
        let mut store = ElementStore::new();
        let id = store.add(rect("a", 0.0, 0.0)).unwrap();
        assert_eq!(store.history().len(), 2);
        store.update(&id, &ElementPatch::position(Point::new(5.0, 5.0))).unwrap();
        assert_eq!(store.history().len(), 3);
        store.delete(&id).unwrap();
        assert_eq!(store.history().len(), 4);
    }

    #[test]
    fn test_history_exactness() {
        let mut store = ElementStore::new();
        let s0 = store.elements().to_vec();
        let id = store.add(rect("a", 0.0, 0.0)).unwrap();
        let s1 = store.elements().to_vec();
        store.update(&id, &ElementPatch::position(Point::new(40.0, 40.0))).unwrap();
        let s2 = store.elements().to_vec();

        assert!(store.undo());
        assert!(store.undo());
        assert_eq!(store.elements(), s0.as_slice());
        assert!(store.redo());
        assert_eq!(store.elements(), s1.as_slice());
        assert!(store.redo());
        assert_eq!(store.elements(), s2.as_slice());

        store.undo();
        store.add(rect("b", 100.0, 0.0)).unwrap();
        assert!(!store.redo());
    }

    #[test]
    fn test_update_rejects_small_size() {
        let mut store = ElementStore::new();
        let id = store.add(rect("a", 0.0, 0.0)).unwrap();
        let err = store.update(&id, &ElementPatch::size(Size::new(5.0, 5.0))).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidGeometry { .. }));
        assert_eq!(store.get(&id).unwrap().size, Size::new(50.0, 50.0));
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_update_missing() {
        let mut store = ElementStore::new();
        let err = store
            .update(&"nope".into(), &ElementPatch::position(Point::ZERO))
            .unwrap_err();
        assert_eq!(err, CanvasError::ElementNotFound("nope".into()));
    }

    #[test]
    fn test_update_many_is_atomic() {
        let mut store = ElementStore::new();
        store.add(rect("a", 0.0, 0.0)).unwrap();
        store.add(rect("b", 100.0, 0.0)).unwrap();
        let before = store.history().len();

        let bad = vec![
            ("a".into(), ElementPatch::position(Point::new(1.0, 1.0))),
            ("missing".into(), ElementPatch::position(Point::new(1.0, 1.0))),
        ];
        assert!(store.update_many(&bad).is_err());
        assert_eq!(store.get(&"a".into()).unwrap().position, Point::ZERO);

        let good = vec![
            ("a".into(), ElementPatch::position(Point::new(1.0, 1.0))),
            ("b".into(), ElementPatch::position(Point::new(101.0, 1.0))),
        ];
        store.update_many(&good).unwrap();
        assert_eq!(store.history().len(), before + 1);
        assert_eq!(store.get(&"b".into()).unwrap().position, Point::new(101.0, 1.0));
    }

    #[test]
    fn test_delete_many() {
        let mut store = ElementStore::new();
        store.add(rect("a", 0.0, 0.0)).unwrap();
        store.add(rect("b", 0.0, 0.0)).unwrap();
        store.add(rect("c", 0.0, 0.0)).unwrap();
        let before = store.history().len();
        assert_eq!(store.delete_many(&["a".into(), "c".into(), "zz".into()]), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.history().len(), before + 1);
        assert_eq!(store.delete_many(&["zz".into()]), 0);
        assert_eq!(store.history().len(), before + 1);
    }

    #[test]
    fn test_z_order() {
        let mut store = ElementStore::new();
        store.add(rect("a", 0.0, 0.0)).unwrap();
        store.add(rect("b", 0.0, 0.0)).unwrap();
        store.add(rect("c", 0.0, 0.0)).unwrap();

        let order = |s: &ElementStore| s.elements().iter().map(|e| e.id.to_string()).collect::<Vec<_>>();

        assert!(store.bring_to_front(&"a".into()));
        assert_eq!(order(&store), ["b", "c", "a"]);
        assert!(!store.bring_to_front(&"a".into()));
        assert!(store.send_to_back(&"a".into()));
        assert_eq!(order(&store), ["a", "b", "c"]);
        assert!(store.bring_forward(&"a".into()));
        assert_eq!(order(&store), ["b", "a", "c"]);
        assert!(store.send_backward(&"c".into()));
        assert_eq!(order(&store), ["b", "c", "a"]);
    }

    #[test]
    fn test_commit_only_when_changed() {
        let mut store = ElementStore::new();
        let id = store.add(rect("a", 0.0, 0.0)).unwrap();
        assert!(!store.commit());

        store.get_mut_uncommitted(&id).unwrap().position = Point::new(9.0, 9.0);
        store.get_mut_uncommitted(&id).unwrap().position = Point::new(12.0, 9.0);
        assert!(store.commit());
        assert_eq!(store.history().len(), 3);

        store.get_mut_uncommitted(&id).unwrap().position = Point::new(99.0, 99.0);
        store.revert();
        assert_eq!(store.get(&id).unwrap().position, Point::new(12.0, 9.0));
    }

    #[test]
    fn test_load_resets_history() {
        let mut store = ElementStore::new();
        store.add(rect("a", 0.0, 0.0)).unwrap();
        let elements = store.elements().to_vec();
        store.load(elements);
        assert!(!store.can_undo());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bounds() {
        let mut store = ElementStore::new();
        assert!(store.bounds().is_none());
        store.add(rect("a", 0.0, 0.0)).unwrap();
        store.add(rect("b", 100.0, 200.0)).unwrap();
        assert_eq!(store.bounds().unwrap(), Rect::new(0.0, 0.0, 150.0, 250.0));
    }
}
