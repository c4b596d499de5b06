//! Reference registry.
//!
//! Tracks named nodes for one translation run and accumulates the
//! definitions table. A slot is reserved when a name is registered and
//! filled once the walker has translated the node, so table order follows
//! registration order rather than completion order.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ir::Schema;
use crate::model::NodeId;

#[derive(Debug)]
struct Slot {
    node: NodeId,
    body: Option<Schema>,
}

/// Outcome of looking a name up.
#[derive(Debug)]
pub enum Resolution<'a> {
    Emitted(&'a Schema),
    /// Registered, translation not finished (or not started).
    Pending(NodeId),
    Unknown,
}

#[derive(Debug, Default)]
pub struct Registry {
    slots: IndexMap<String, Slot>,
    requested: IndexSet<String>,
    generated: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` under `id`. Registering the same node under the same id
    /// again is a no-op; a different node under a taken id is an error.
    /// Returns true when the name is new.
    pub fn register(&mut self, id: &str, node: NodeId) -> Result<bool> {
        match self.slots.get(id) {
            Some(slot) if slot.node == node => Ok(false),
            Some(_) => Err(Error::DuplicateId { id: id.to_string() }),
            None => {
                debug!(id, node = node.index(), "registered schema id");
                self.slots.insert(id.to_string(), Slot { node, body: None });
                Ok(true)
            }
        }
    }

    pub fn resolve(&self, id: &str) -> Resolution<'_> {
        match self.slots.get(id) {
            Some(Slot { body: Some(body), .. }) => Resolution::Emitted(body),
            Some(Slot { node, body: None }) => Resolution::Pending(*node),
            None => Resolution::Unknown,
        }
    }

    /// Reference construct for `id`. The id does not have to be registered
    /// yet; unresolved requests fail in [`Registry::finish`].
    pub fn link_to(&mut self, id: &str) -> Schema {
        self.requested.insert(id.to_string());
        Schema::reference(id)
    }

    pub fn emit(&mut self, id: &str, body: Schema) {
        if let Some(slot) = self.slots.get_mut(id) {
            debug!(id, "emitted definition");
            slot.body = Some(body);
        }
    }

    /// Registered names whose translation has not been stored yet.
    pub fn pending(&self) -> Vec<(String, NodeId)> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.body.is_none())
            .map(|(id, slot)| (id.clone(), slot.node))
            .collect()
    }

    /// A name of the form `shared-<n>` that is neither registered nor in
    /// `taken`.
    pub fn fresh_name(&mut self, taken: &HashSet<String>) -> String {
        loop {
            self.generated += 1;
            let name = format!("shared-{}", self.generated);
            if !taken.contains(&name) && !self.slots.contains_key(&name) {
                return name;
            }
        }
    }

    /// Close the run: every requested link must name a registered id.
    pub fn finish(self) -> Result<IndexMap<String, Schema>> {
        if let Some(missing) = self.requested.iter().find(|id| !self.slots.contains_key(*id)) {
            return Err(Error::UnresolvedLink { id: missing.clone() });
        }
        Ok(self
            .slots
            .into_iter()
            .filter_map(|(id, slot)| slot.body.map(|body| (id, body)))
            .collect())
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ty;

    #[test]
    fn same_node_may_register_twice() {
        let mut reg = Registry::new();
        assert!(reg.register("unit", NodeId(3)).unwrap());
        assert!(!reg.register("unit", NodeId(3)).unwrap());
    }

    #[test]
    fn different_node_under_same_id_is_rejected() {
        let mut reg = Registry::new();
        reg.register("unit", NodeId(3)).unwrap();
        let err = reg.register("unit", NodeId(4)).unwrap_err();
        assert!(matches!(err, Error::DuplicateId { ref id } if id == "unit"));
    }

    #[test]
    fn resolve_moves_from_pending_to_emitted() {
        let mut reg = Registry::new();
        assert!(matches!(reg.resolve("p"), Resolution::Unknown));
        reg.register("p", NodeId(0)).unwrap();
        assert!(matches!(reg.resolve("p"), Resolution::Pending(NodeId(0))));
        reg.emit("p", Schema::any());
        assert!(matches!(reg.resolve("p"), Resolution::Emitted(s) if matches!(s.ty, Ty::Any)));
        assert!(reg.pending().is_empty());
    }

    #[test]
    fn unresolved_link_fails_at_finish() {
        let mut reg = Registry::new();
        let r = reg.link_to("ghost");
        assert!(matches!(r.ty, Ty::Ref(ref n) if n == "ghost"));
        let err = reg.finish().unwrap_err();
        assert!(matches!(err, Error::UnresolvedLink { ref id } if id == "ghost"));
    }

    #[test]
    fn link_before_registration_resolves_later() {
        let mut reg = Registry::new();
        reg.link_to("late");
        reg.register("late", NodeId(1)).unwrap();
        reg.emit("late", Schema::any());
        let defs = reg.finish().unwrap();
        assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["late"]);
    }

    #[test]
    fn fresh_names_skip_taken_ones() {
        let mut reg = Registry::new();
        let taken: HashSet<String> = ["shared-1".to_string()].into_iter().collect();
        assert_eq!(reg.fresh_name(&taken), "shared-2");
        reg.register("shared-3", NodeId(0)).unwrap();
        assert_eq!(reg.fresh_name(&taken), "shared-4");
    }
}
