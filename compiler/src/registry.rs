// registry.rs — HLIR id registry (spec §3.3)
//
// Tracks every live entity under a `ProgramBuilder` session: a stable id,
// a namespace tag (which entity category it belongs to), a name index for
// namespace-scoped lookup, and an object-identity index used to recognize
// "the same Python object" references from the original builder API.
//
// Rust has no equivalent of CPython's `id()`; OQ-1 resolves the
// object-identity table by keying on the arena slot index the caller hands
// in at registration time (the position the component occupies in the
// builder's backing `Vec`), which is stable for the component's lifetime
// in the same way `id()` was stable for the program's lifetime.
//
// Preconditions: names are unique within a namespace at registration time
//   (checked by the builder before calling `register_new`/`register_with_id`).
// Postconditions: every registered id is resolvable by id, by
//   (namespace, name), and by (namespace, slot) until removed.
// Failure modes: none — all fallible operations return `Option`.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use crate::id::{EntityId, IdAllocator};

/// Which entity category an id belongs to. Namespaces never overlap: a
/// name collision only matters within the same namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Symbol,
    Tile,
    ObjectFifo,
    ExternalKernel,
    CoreFunction,
    Worker,
    TensorTiler,
    RuntimeSequence,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Symbol => "symbol",
            Namespace::Tile => "tile",
            Namespace::ObjectFifo => "object_fifo",
            Namespace::ExternalKernel => "external_kernel",
            Namespace::CoreFunction => "core_function",
            Namespace::Worker => "worker",
            Namespace::TensorTiler => "tensor_tiler",
            Namespace::RuntimeSequence => "runtime_sequence",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
struct Entry {
    namespace: Namespace,
    name: String,
    /// Arena slot index, for object-identity lookups (OQ-1).
    slot: usize,
}

/// The id registry backing one builder session.
#[derive(Debug, Default)]
pub struct IdRegistry {
    alloc: IdAllocator,
    by_id: HashMap<EntityId, Entry>,
    by_name: HashMap<(Namespace, String), EntityId>,
    by_slot: HashMap<(Namespace, usize), EntityId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self {
            alloc: IdAllocator::new(),
            ..Default::default()
        }
    }

    /// Allocate a fresh id for `name` in `namespace`, recorded at arena
    /// slot `slot`. Caller must have already checked for a name collision.
    pub fn register_new(&mut self, namespace: Namespace, name: impl Into<String>, slot: usize) -> EntityId {
        let id = self.alloc.alloc();
        self.insert_entry(id, namespace, name.into(), slot);
        id
    }

    /// Rebind `provided_id` to `name`/`slot` rather than allocating a new
    /// id — the update path used when a caller supplies an explicit id
    /// that already exists (spec §4.2's three-branch `provided_id` rule).
    pub fn register_with_provided_id(
        &mut self,
        provided_id: EntityId,
        namespace: Namespace,
        name: impl Into<String>,
        slot: usize,
    ) {
        // Remove any stale name/slot entries this id previously held.
        if let Some(old) = self.by_id.remove(&provided_id) {
            self.by_name.remove(&(old.namespace, old.name.clone()));
            self.by_slot.remove(&(old.namespace, old.slot));
        }
        self.insert_entry(provided_id, namespace, name.into(), slot);
    }

    fn insert_entry(&mut self, id: EntityId, namespace: Namespace, name: String, slot: usize) {
        self.by_name.insert((namespace, name.clone()), id);
        self.by_slot.insert((namespace, slot), id);
        self.by_id.insert(id, Entry { namespace, name, slot });
    }

    /// Rename the entity at `id` without changing its id or slot.
    pub fn rename(&mut self, id: EntityId, new_name: impl Into<String>) -> bool {
        let new_name = new_name.into();
        let Some(entry) = self.by_id.get_mut(&id) else {
            return false;
        };
        let namespace = entry.namespace;
        let old_name = std::mem::replace(&mut entry.name, new_name.clone());
        self.by_name.remove(&(namespace, old_name));
        self.by_name.insert((namespace, new_name), id);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.by_id.remove(&id) else {
            return false;
        };
        self.by_name.remove(&(entry.namespace, entry.name));
        self.by_slot.remove(&(entry.namespace, entry.slot));
        true
    }

    pub fn lookup_by_name(&self, namespace: Namespace, name: &str) -> Option<EntityId> {
        self.by_name.get(&(namespace, name.to_string())).copied()
    }

    pub fn lookup_by_slot(&self, namespace: Namespace, slot: usize) -> Option<EntityId> {
        self.by_slot.get(&(namespace, slot)).copied()
    }

    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.by_id.get(&id).map(|e| e.name.as_str())
    }

    pub fn namespace_of(&self, id: EntityId) -> Option<Namespace> {
        self.by_id.get(&id).map(|e| e.namespace)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_new_allocates_fresh_ids() {
        let mut r = IdRegistry::new();
        let a = r.register_new(Namespace::Tile, "shim0", 0);
        let b = r.register_new(Namespace::Tile, "shim1", 1);
        assert_ne!(a, b);
        assert_eq!(r.lookup_by_name(Namespace::Tile, "shim0"), Some(a));
        assert_eq!(r.lookup_by_slot(Namespace::Tile, 1), Some(b));
    }

    #[test]
    fn provided_id_rebinds_rather_than_allocating() {
        let mut r = IdRegistry::new();
        let a = r.register_new(Namespace::Tile, "shim0", 0);
        r.register_with_provided_id(a, Namespace::Tile, "shim0_renamed", 0);
        assert_eq!(r.lookup_by_name(Namespace::Tile, "shim0"), None);
        assert_eq!(r.lookup_by_name(Namespace::Tile, "shim0_renamed"), Some(a));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn remove_clears_all_indexes() {
        let mut r = IdRegistry::new();
        let a = r.register_new(Namespace::Worker, "w0", 5);
        assert!(r.remove(a));
        assert!(!r.contains(a));
        assert_eq!(r.lookup_by_name(Namespace::Worker, "w0"), None);
        assert_eq!(r.lookup_by_slot(Namespace::Worker, 5), None);
    }

    #[test]
    fn namespaces_do_not_collide_on_same_name() {
        let mut r = IdRegistry::new();
        let a = r.register_new(Namespace::Tile, "x", 0);
        let b = r.register_new(Namespace::Worker, "x", 0);
        assert_ne!(a, b);
        assert_eq!(r.lookup_by_name(Namespace::Tile, "x"), Some(a));
        assert_eq!(r.lookup_by_name(Namespace::Worker, "x"), Some(b));
    }

    #[test]
    fn rename_preserves_id_and_slot() {
        let mut r = IdRegistry::new();
        let a = r.register_new(Namespace::Symbol, "old", 2);
        assert!(r.rename(a, "new"));
        assert_eq!(r.lookup_by_name(Namespace::Symbol, "old"), None);
        assert_eq!(r.lookup_by_name(Namespace::Symbol, "new"), Some(a));
        assert_eq!(r.lookup_by_slot(Namespace::Symbol, 2), Some(a));
    }
}
