// ============================================================================
// registry.rs — Branches
// Live pens keyed by identity. Ids only ever grow and every inserted pen is
// new, so key order is insertion order (oldest first).
// ============================================================================

use std::collections::BTreeMap;

use crate::pen::{Pen, PenId};

#[derive(Default, Debug)]
pub struct PenRegistry {
    pens: BTreeMap<PenId, Pen>,
}

impl PenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(pen: Pen) -> Self {
        let mut registry = Self::new();
        registry.insert(pen);
        registry
    }

    pub fn len(&self) -> usize {
        self.pens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pens.is_empty()
    }

    pub fn insert(&mut self, pen: Pen) {
        let previous = self.pens.insert(pen.id(), pen);
        debug_assert!(previous.is_none(), "pen identity inserted twice");
    }

    /// Remove by identity. Unknown ids are ignored.
    pub fn remove(&mut self, id: PenId) -> Option<Pen> {
        self.pens.remove(&id)
    }

    /// Append newly spawned pens after every existing one.
    pub fn append(&mut self, pens: Vec<Pen>) {
        for pen in pens {
            debug_assert!(
                self.pens.last_key_value().map_or(true, |(last, _)| *last < pen.id()),
                "appended pen is older than the registry tail"
            );
            self.insert(pen);
        }
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Pen> {
        self.pens.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pen> {
        self.pens.values_mut()
    }
}
