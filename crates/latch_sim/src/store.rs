//! Component store (§4.3): one [`ComponentPool`] per registered component
//! type, addressed by `type_index`.

use serde::{Deserialize, Serialize};

use crate::component::UserComponent;
use crate::error::{EngineError, EngineResult};
use crate::pool::{ComponentPool, SlotId};

/// A stable handle to one component instance: which type's pool it lives in,
/// plus its slot within that pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompStoreId {
    pub type_index: usize,
    pub slot_id: SlotId,
}

/// Every component in this engine is a [`UserComponent`] — the schema lives
/// in data (`ComponentDef`), not in the Rust type system — so the store
/// needs no type erasure: a flat `Vec` of pools indexed by `type_index`.
#[derive(Default)]
pub struct ComponentStore {
    pools: Vec<ComponentPool<UserComponent>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        ComponentStore { pools: Vec::new() }
    }

    fn ensure_type(&mut self, type_index: usize) {
        if self.pools.len() <= type_index {
            self.pools.resize_with(type_index + 1, ComponentPool::new);
        }
    }

    pub fn insert(&mut self, type_index: usize, component: UserComponent) -> CompStoreId {
        self.ensure_type(type_index);
        let slot_id = self.pools[type_index].insert(component);
        CompStoreId {
            type_index,
            slot_id,
        }
    }

    pub fn get(&self, id: CompStoreId) -> EngineResult<&UserComponent> {
        self.pools
            .get(id.type_index)
            .ok_or(EngineError::NotFound(id.slot_id))?
            .get(id.slot_id)
    }

    pub fn get_mut(&mut self, id: CompStoreId) -> EngineResult<&mut UserComponent> {
        self.pools
            .get_mut(id.type_index)
            .ok_or(EngineError::NotFound(id.slot_id))?
            .get_mut(id.slot_id)
    }

    pub fn remove(&mut self, id: CompStoreId) -> EngineResult<UserComponent> {
        self.pools
            .get_mut(id.type_index)
            .ok_or(EngineError::NotFound(id.slot_id))?
            .remove(id.slot_id)
    }

    pub fn iter_type(&self, type_index: usize) -> Box<dyn Iterator<Item = (SlotId, &UserComponent)> + '_> {
        match self.pools.get(type_index) {
            Some(pool) => Box::new(pool.iter()),
            None => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentDef;
    use crate::value::{DeclaredType, Tag};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sample_def() -> Arc<ComponentDef> {
        let mut schema = HashMap::new();
        schema.insert("x".to_string(), DeclaredType::Primitive(Tag::Int32));
        Arc::new(ComponentDef::new("Position", schema))
    }

    #[test]
    fn insert_and_get_round_trips() {
        let mut store = ComponentStore::new();
        let id = store.insert(0, UserComponent::new(sample_def()));
        assert!(store.get(id).is_ok());
    }

    #[test]
    fn stale_handle_after_removal_is_not_found() {
        let mut store = ComponentStore::new();
        let id = store.insert(0, UserComponent::new(sample_def()));
        store.remove(id).unwrap();
        assert!(store.get(id).is_err());
    }

    #[test]
    fn unregistered_type_index_is_not_found() {
        let mut store = ComponentStore::new();
        let live = store.insert(0, UserComponent::new(sample_def()));
        let bogus = CompStoreId {
            type_index: 3,
            slot_id: live.slot_id,
        };
        assert!(store.get(bogus).is_err());
    }
}
