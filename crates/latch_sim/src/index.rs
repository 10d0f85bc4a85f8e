//! Entity and component-type indices (§4.4): the bookkeeping that lets the
//! interpreter resolve an `AttributeRef { entity_id, component, attribute }`
//! down to a concrete [`CompStoreId`] without scanning every pool.

use std::collections::{HashMap, HashSet};

use crate::error::{EngineError, EngineResult};
use crate::store::{ComponentStore, CompStoreId};
use crate::value::Value;

pub type EntityId = u64;

/// Tracks which components are attached to which entities.
#[derive(Default)]
pub struct EntityIndex {
    next_entity_id: EntityId,
    entity_components: HashMap<EntityId, HashSet<CompStoreId>>,
}

impl EntityIndex {
    pub fn new() -> Self {
        EntityIndex {
            next_entity_id: 1,
            entity_components: HashMap::new(),
        }
    }

    /// Allocate a fresh entity id, skipping zero (`UNSET_ENTITY_ID`) and any
    /// id already claimed by a caller-supplied entity.
    pub fn add_entity_id(&mut self) -> EntityId {
        loop {
            let candidate = self.next_entity_id;
            self.next_entity_id += 1;
            if candidate != 0 && !self.entity_components.contains_key(&candidate) {
                self.entity_components.entry(candidate).or_default();
                return candidate;
            }
        }
    }

    /// Register a caller-supplied entity id, bumping the fresh-id counter
    /// past it so later `add_entity_id` calls never collide.
    pub fn set_entity_id(&mut self, entity_id: EntityId) {
        self.entity_components.entry(entity_id).or_default();
        if entity_id >= self.next_entity_id {
            self.next_entity_id = entity_id + 1;
        }
    }

    pub fn attach(&mut self, entity_id: EntityId, comp: CompStoreId) {
        self.entity_components.entry(entity_id).or_default().insert(comp);
    }

    pub fn detach(&mut self, entity_id: EntityId, comp: CompStoreId) {
        if let Some(set) = self.entity_components.get_mut(&entity_id) {
            set.remove(&comp);
        }
    }

    pub fn components_of(&self, entity_id: EntityId) -> impl Iterator<Item = CompStoreId> + '_ {
        self.entity_components
            .get(&entity_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn contains_entity(&self, entity_id: EntityId) -> bool {
        self.entity_components.contains_key(&entity_id)
    }
}

/// Maps component type names to the dense `type_index` their pool lives at
/// in the [`ComponentStore`]. Registration is idempotent.
#[derive(Default)]
pub struct ComponentTypeIndex {
    name_to_index: HashMap<String, usize>,
}

impl ComponentTypeIndex {
    pub fn new() -> Self {
        ComponentTypeIndex {
            name_to_index: HashMap::new(),
        }
    }

    pub fn add_component_type(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.name_to_index.get(name) {
            return idx;
        }
        let idx = self.name_to_index.len();
        self.name_to_index.insert(name.to_string(), idx);
        idx
    }

    pub fn type_index_of(&self, name: &str) -> EngineResult<usize> {
        self.name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownComponentType {
                name: name.to_string(),
            })
    }
}

/// Combines both indices to resolve an attribute reference against the
/// component store.
#[derive(Default)]
pub struct IndexStore {
    pub entities: EntityIndex,
    pub types: ComponentTypeIndex,
}

impl IndexStore {
    pub fn new() -> Self {
        IndexStore {
            entities: EntityIndex::new(),
            types: ComponentTypeIndex::new(),
        }
    }

    /// Intersect "live handles of `component` type" with "handles attached
    /// to `entity_id`". Zero matches is `AttrNotFound`; more than one is
    /// ambiguous (this engine's construction never attaches two components
    /// of the same type to the same entity, but resolution does not assume
    /// that — it is checked generically).
    fn resolve_component<'a>(
        &self,
        store: &'a ComponentStore,
        entity_id: EntityId,
        component: &str,
        attribute: &str,
    ) -> EngineResult<CompStoreId> {
        let type_index = self.types.type_index_of(component).map_err(|_| {
            EngineError::AttrNotFound {
                component: component.to_string(),
                entity_id,
                attribute: attribute.to_string(),
            }
        })?;

        let attached: HashSet<CompStoreId> = self.entities.components_of(entity_id).collect();
        let mut matches = store
            .iter_type(type_index)
            .filter(|(slot, _)| {
                attached.contains(&CompStoreId {
                    type_index,
                    slot_id: *slot,
                })
            })
            .map(|(slot, _)| CompStoreId { type_index, slot_id: slot });

        let first = matches.next().ok_or_else(|| EngineError::AttrNotFound {
            component: component.to_string(),
            entity_id,
            attribute: attribute.to_string(),
        })?;

        let rest = matches.count();
        if rest > 0 {
            return Err(EngineError::Ambiguous {
                component: component.to_string(),
                entity_id,
                attribute: attribute.to_string(),
                count: rest + 1,
            });
        }
        Ok(first)
    }

    pub fn resolve_attribute<'a>(
        &self,
        store: &'a ComponentStore,
        entity_id: EntityId,
        component: &str,
        attribute: &str,
    ) -> EngineResult<&'a Value> {
        let id = self.resolve_component(store, entity_id, component, attribute)?;
        store.get(id)?.get_value(attribute)
    }

    pub fn resolve_component_id(
        &self,
        store: &ComponentStore,
        entity_id: EntityId,
        component: &str,
        attribute: &str,
    ) -> EngineResult<CompStoreId> {
        self.resolve_component(store, entity_id, component, attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDef, UserComponent};
    use crate::value::{DeclaredType, Primitive, Tag};
    use std::sync::Arc;

    fn position_def() -> Arc<ComponentDef> {
        let mut schema = HashMap::new();
        schema.insert("x".to_string(), DeclaredType::Primitive(Tag::Float64));
        Arc::new(ComponentDef::new("Position", schema))
    }

    #[test]
    fn fresh_entity_ids_never_collide_with_preset_ones() {
        let mut idx = EntityIndex::new();
        idx.set_entity_id(1);
        let fresh = idx.add_entity_id();
        assert_ne!(fresh, 1);
    }

    #[test]
    fn resolve_attribute_finds_attached_component() {
        let mut store = ComponentStore::new();
        let mut idx = IndexStore::new();
        let type_index = idx.types.add_component_type("Position");
        let entity = idx.entities.add_entity_id();
        let mut comp = UserComponent::new(position_def());
        comp.set_value("x", Value::from_primitive(Primitive::Float64(3.0)))
            .unwrap();
        let id = store.insert(type_index, comp);
        idx.entities.attach(entity, id);

        let value = idx
            .resolve_attribute(&store, entity, "Position", "x")
            .unwrap();
        assert_eq!(value.as_f64().unwrap(), 3.0);
    }

    #[test]
    fn resolve_attribute_missing_component_is_attr_not_found() {
        let store = ComponentStore::new();
        let mut idx = IndexStore::new();
        idx.types.add_component_type("Position");
        let entity = idx.entities.add_entity_id();
        let err = idx
            .resolve_attribute(&store, entity, "Position", "x")
            .unwrap_err();
        assert!(matches!(err, EngineError::AttrNotFound { .. }));
    }

    #[test]
    fn resolve_attribute_two_attached_is_ambiguous() {
        let mut store = ComponentStore::new();
        let mut idx = IndexStore::new();
        let type_index = idx.types.add_component_type("Position");
        let entity = idx.entities.add_entity_id();
        let a = store.insert(type_index, UserComponent::new(position_def()));
        let b = store.insert(type_index, UserComponent::new(position_def()));
        idx.entities.attach(entity, a);
        idx.entities.attach(entity, b);
        let err = idx
            .resolve_attribute(&store, entity, "Position", "x")
            .unwrap_err();
        assert!(matches!(err, EngineError::Ambiguous { .. }));
    }
}
