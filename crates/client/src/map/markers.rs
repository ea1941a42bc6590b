use std::collections::HashMap;
use std::hash::Hash;

use super::source::Point;

/// Correlates rendering-layer marker handles with domain point ids, so a
/// tap on a pin resolves back to an entity without the render layer ever
/// holding domain identifiers.
///
/// Generic over the handle type: the rendering layer owns handle identity;
/// the table only needs it hashable. Handles from a previous build stop
/// resolving the moment `rebuild` (or `clear`) runs.
#[derive(Debug)]
pub struct MarkerTable<H> {
    entries: HashMap<H, String>,
}

impl<H: Eq + Hash> MarkerTable<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record one marker against a point id.
    pub fn register(&mut self, handle: H, point_id: impl Into<String>) {
        self.entries.insert(handle, point_id.into());
    }

    /// Replace every association: drop the previous generation, then create
    /// one marker per point through the rendering layer's `create_marker`.
    pub fn rebuild(&mut self, points: &[Point], mut create_marker: impl FnMut(&Point) -> H) {
        self.clear();
        for point in points {
            let handle = create_marker(point);
            self.register(handle, point.id.clone());
        }
    }

    /// The point id behind a marker, or `None` for unknown/stale handles.
    pub fn resolve(&self, handle: &H) -> Option<&str> {
        self.entries.get(handle).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Eq + Hash> Default for MarkerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
