//! Selection set and marquee (rubber-band) selection.

use crate::element::ElementId;
use crate::hit_test::SpatialIndex;
use crate::store::ElementStore;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// How a marquee decides which elements it picks up.
///
/// Call sites in [`Canvas`](crate::Canvas):
/// - mouse/pen drag on empty canvas uses [`FullyContained`](Self::FullyContained);
/// - touch marquee (long-press on empty canvas, then drag) uses
///   [`Intersects`](Self::Intersects), since a fingertip box is imprecise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarqueePolicy {
    /// All four corners must lie inside the marquee.
    #[default]
    FullyContained,
    /// Any overlap with the marquee is enough.
    Intersects,
}

/// A marquee being dragged out in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    pub start: Point,
    pub end: Point,
    pub policy: MarqueePolicy,
}

impl Marquee {
    /// Start a zero-sized marquee at `start`.
    pub fn new(start: Point, policy: MarqueePolicy) -> Self {
        Self {
            start,
            end: start,
            policy,
        }
    }

    /// Normalized rectangle spanned by the two points.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    pub fn area(&self) -> f64 {
        self.rect().area()
    }
}

/// The set of selected element ids, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id`. Non-additive replaces the selection; additive toggles
    /// membership of `id`.
    pub fn select_element(&mut self, id: ElementId, additive: bool) {
        if !additive {
            self.ids.clear();
            self.ids.push(id);
            return;
        }
        if let Some(index) = self.ids.iter().position(|s| s == &id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id);
        }
    }

    /// Replace the selection wholesale. Duplicates are dropped.
    pub fn select_multiple(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids without pruning; call [`prune`](Self::prune) first when
    /// the store may have changed.
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    /// Drop ids that no longer exist in `store`. Returns true if any went.
    pub fn prune(&mut self, store: &ElementStore) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| store.contains(id));
        before != self.ids.len()
    }

    /// Finish a marquee: select what it covers under its policy, or clear
    /// the selection when the marquee is smaller than `min_area`.
    ///
    /// Returns the number of selected elements.
    pub fn select_marquee(&mut self, marquee: &Marquee, index: &SpatialIndex, min_area: f64) -> usize {
        if marquee.area() < min_area {
            self.clear();
            return 0;
        }
        self.select_multiple(index.query_rect(marquee.rect(), marquee.policy));
        self.ids.len()
    }
}
