//! System ordering and persisted canvas geometry.
//!
//! `systems_order` is always derivable from `placement`: every operation here ends in
//! [`Model::rebuild_systems_order`], which is a fixed point once applied.

use rustc_hash::FxHashSet;

use crate::model::{Model, Placement};

impl Model {
    /// Gives `system` the next order slot if it has no placement yet.
    pub fn ensure_placement(&mut self, system: &str) {
        if self.placement.contains_key(system) {
            return;
        }
        let order = self.placement.len();
        self.placement
            .insert(system.to_string(), Placement::at(order));
        self.rebuild_systems_order();
    }

    /// Recomputes `systems_order` by a stable sort of placement entries on `order`.
    pub fn rebuild_systems_order(&mut self) {
        let mut entries: Vec<(&String, usize)> = self
            .placement
            .iter()
            .map(|(name, p)| (name, p.order))
            .collect();
        entries.sort_by_key(|&(_, order)| order);
        self.systems_order = entries.into_iter().map(|(name, _)| name.clone()).collect();
    }

    /// Synthesizes placement from `systems_order` (or the systems mapping) when placement is
    /// empty. Returns whether anything was migrated.
    pub fn migrate_legacy_placement_if_needed(&mut self) -> bool {
        if !self.placement.is_empty() {
            return false;
        }
        let names: Vec<String> = if self.systems_order.is_empty() {
            self.systems.keys().cloned().collect()
        } else {
            self.systems_order.clone()
        };
        if names.is_empty() {
            return false;
        }
        for (order, name) in names.into_iter().enumerate() {
            self.placement.insert(name, Placement::at(order));
        }
        self.rebuild_systems_order();
        true
    }

    /// Reassigns `order` from a user-reordered list. Names without a placement are skipped.
    ///
    /// Placed systems missing from the list move after it, keeping their previous relative
    /// order.
    pub fn apply_list_order_to_placement<S: AsRef<str>>(&mut self, ordered: &[S]) {
        let listed: FxHashSet<&str> = ordered.iter().map(|name| name.as_ref()).collect();
        let unlisted: Vec<String> = self
            .systems_order
            .iter()
            .filter(|name| !listed.contains(name.as_str()))
            .cloned()
            .collect();

        for (order, name) in ordered.iter().enumerate() {
            if let Some(p) = self.placement.get_mut(name.as_ref()) {
                p.order = order;
            }
        }
        for (offset, name) in unlisted.iter().enumerate() {
            if let Some(p) = self.placement.get_mut(name) {
                p.order = ordered.len() + offset;
            }
        }
        self.rebuild_systems_order();
    }

    /// Drops saved positions and sizes so the next canvas build lays systems out fresh.
    pub fn clear_saved_geometry(&mut self) {
        for p in self.placement.values_mut() {
            p.clear_geometry();
        }
    }

    /// Records a system container's current geometry.
    pub fn save_geometry(&mut self, system: &str, x: f64, y: f64, width: f64, height: f64) {
        if let Some(p) = self.placement.get_mut(system) {
            p.x = Some(x);
            p.y = Some(y);
            p.width = Some(width);
            p.height = Some(height);
        }
    }

    /// Whether `systems_order` equals placement sorted by `order`.
    pub fn is_order_consistent(&self) -> bool {
        let mut entries: Vec<(&String, usize)> = self
            .placement
            .iter()
            .map(|(name, p)| (name, p.order))
            .collect();
        entries.sort_by_key(|&(_, order)| order);
        entries.len() == self.systems_order.len()
            && entries
                .iter()
                .zip(&self.systems_order)
                .all(|((name, _), ordered)| *name == ordered)
    }
}
