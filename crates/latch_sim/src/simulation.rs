//! Simulation definition, construction, and the per-step driver (§4.5).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::component::{ComponentDef, UserComponent};
use crate::error::{EngineError, EngineResult};
use crate::index::{EntityId, IndexStore};
use crate::interp::{evaluate, run_graph, AttributeRef, EvalContext, Graph, Node};
use crate::store::ComponentStore;
use crate::value::Value;

/// An entity as supplied by a caller: `id == 0` means "assign me one".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub id: EntityId,
    pub components: Vec<String>,
}

/// A system as supplied by a caller: `id == 0` means "assign me one".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDef {
    pub id: u64,
    pub graph: Graph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationDef {
    pub name: String,
    pub components: Vec<ComponentDef>,
    pub entities: Vec<EntityDef>,
    pub systems: Vec<SystemDef>,
    pub init_graph: Option<Graph>,
}

/// A materialized simulation: its def, the component store and index store
/// built from it, and whether it has executed at least one step.
pub struct Simulation {
    pub def: SimulationDef,
    pub comp_store: ComponentStore,
    pub index_store: IndexStore,
    pub locked: bool,
}

impl Simulation {
    /// Build a `Simulation` from a `SimulationDef`, assigning fresh entity
    /// and system ids where the caller left them at zero (§4.5's five
    /// steps). Caller-supplied non-zero ids must be unique among
    /// themselves.
    #[instrument(skip(def), fields(sim_name = %def.name))]
    pub fn materialize(mut def: SimulationDef) -> EngineResult<Simulation> {
        let mut comp_defs: HashMap<String, Arc<ComponentDef>> = HashMap::new();
        for c in &def.components {
            if comp_defs.insert(c.name.clone(), Arc::new(c.clone())).is_some() {
                return Err(EngineError::domain(
                    "ApplySimulation",
                    format!("duplicate component def '{}'", c.name),
                ));
            }
        }

        let mut index_store = IndexStore::new();
        for name in comp_defs.keys() {
            index_store.types.add_component_type(name);
        }

        let mut seen_entity_ids = HashSet::new();
        for e in &def.entities {
            if e.id != 0 {
                if !seen_entity_ids.insert(e.id) {
                    return Err(EngineError::domain(
                        "ApplySimulation",
                        format!("duplicate entity id {}", e.id),
                    ));
                }
                index_store.entities.set_entity_id(e.id);
            }
        }

        let mut comp_store = ComponentStore::new();
        for e in def.entities.iter_mut() {
            let entity_id = if e.id == 0 {
                index_store.entities.add_entity_id()
            } else {
                e.id
            };
            e.id = entity_id;

            for comp_name in &e.components {
                let comp_def = comp_defs
                    .get(comp_name)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownComponentType {
                        name: comp_name.clone(),
                    })?;
                let type_index = index_store.types.add_component_type(comp_name);
                let handle = comp_store.insert(type_index, UserComponent::new(comp_def));
                index_store.entities.attach(entity_id, handle);
            }
        }

        let mut seen_system_ids = HashSet::new();
        let mut max_system_id = 0u64;
        for s in &def.systems {
            if s.id != 0 {
                if !seen_system_ids.insert(s.id) {
                    return Err(EngineError::domain(
                        "ApplySimulation",
                        format!("duplicate system id {}", s.id),
                    ));
                }
                max_system_id = max_system_id.max(s.id);
            }
        }
        for s in def.systems.iter_mut() {
            if s.id == 0 {
                max_system_id += 1;
                s.id = max_system_id;
            }
        }
        def.systems.sort_by_key(|s| s.id);

        info!(entities = def.entities.len(), systems = def.systems.len(), "materialized simulation");

        Ok(Simulation {
            def,
            comp_store,
            index_store,
            locked: false,
        })
    }

    /// Run the init graph once, if present. Called inside `ApplySimulation`
    /// after materialization; a failure here does not roll back the
    /// simulation entry (§9).
    pub fn run_init_graph(&mut self, rng: &mut dyn rand::RngCore) -> EngineResult<()> {
        let Some(graph) = self.def.init_graph.clone() else {
            return Ok(());
        };
        let mut ctx = EvalContext {
            store: &mut self.comp_store,
            index: &self.index_store,
            rng,
        };
        run_graph(&graph, &mut ctx)
    }

    /// Run every system's graph in ascending `system.id` order, locking the
    /// simulation on the first call.
    #[instrument(skip(self, rng), fields(sim_name = %self.def.name))]
    pub fn step(&mut self, rng: &mut dyn rand::RngCore) -> EngineResult<()> {
        self.locked = true;
        for system in &self.def.systems {
            let mut ctx = EvalContext {
                store: &mut self.comp_store,
                index: &self.index_store,
                rng,
            };
            run_graph(&system.graph, &mut ctx)
                .map_err(|e| e.context(format!("system {}", system.id)))?;
        }
        Ok(())
    }

    pub fn get_attribute(&self, attr: &AttributeRef) -> EngineResult<Value> {
        self.index_store
            .resolve_attribute(&self.comp_store, attr.entity_id, &attr.component, &attr.attribute)
            .cloned()
    }

    /// Translate to a synthetic `Mutate` and reuse the interpreter's own
    /// resolution and coercion path, guaranteeing identical semantics to an
    /// in-graph `Mutate` (§4.7).
    pub fn set_attribute(
        &mut self,
        attr: &AttributeRef,
        value: Value,
        rng: &mut dyn rand::RngCore,
    ) -> EngineResult<()> {
        let mut ctx = EvalContext {
            store: &mut self.comp_store,
            index: &self.index_store,
            rng,
        };
        let node = Node::Mutate(attr.clone(), Box::new(Node::Const(value)));
        evaluate(&node, &mut ctx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DeclaredType, Primitive, Tag};
    use rand::rngs::mock::StepRng;
    use std::collections::HashMap as Map;

    fn pos_def() -> ComponentDef {
        let mut schema = Map::new();
        schema.insert("height".to_string(), DeclaredType::Primitive(Tag::Int64));
        ComponentDef::new("Pos", schema)
    }

    fn s1_def() -> SimulationDef {
        SimulationDef {
            name: "s1".to_string(),
            components: vec![pos_def()],
            entities: vec![EntityDef {
                id: 0,
                components: vec!["Pos".to_string()],
            }],
            systems: vec![SystemDef {
                id: 0,
                graph: Graph::new(
                    vec![],
                    vec![Node::Mutate(
                        AttributeRef {
                            component: "Pos".to_string(),
                            entity_id: 0,
                            attribute: "height".to_string(),
                        },
                        Box::new(Node::Add(
                            Box::new(Node::Retrieve(AttributeRef {
                                component: "Pos".to_string(),
                                entity_id: 0,
                                attribute: "height".to_string(),
                            })),
                            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
                        )),
                    )],
                ),
            }],
            init_graph: None,
        }
    }

    #[test]
    fn materialize_assigns_fresh_entity_and_system_ids() {
        let sim = Simulation::materialize(s1_def()).unwrap();
        assert_ne!(sim.def.entities[0].id, 0);
        assert_eq!(sim.def.systems[0].id, 1);
    }

    #[test]
    fn s1_scenario_three_steps_reach_height_three() {
        let mut sim = Simulation::materialize(s1_def()).unwrap();
        let entity_id = sim.def.entities[0].id;
        sim.def.systems[0].graph.outputs[0] = Node::Mutate(
            AttributeRef {
                component: "Pos".to_string(),
                entity_id,
                attribute: "height".to_string(),
            },
            Box::new(Node::Add(
                Box::new(Node::Retrieve(AttributeRef {
                    component: "Pos".to_string(),
                    entity_id,
                    attribute: "height".to_string(),
                })),
                Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
            )),
        );
        let mut rng = StepRng::new(0, 1);
        for _ in 0..3 {
            sim.step(&mut rng).unwrap();
        }
        let v = sim
            .get_attribute(&AttributeRef {
                component: "Pos".to_string(),
                entity_id,
                attribute: "height".to_string(),
            })
            .unwrap();
        assert_eq!(v.as_i64().unwrap(), 3);
    }

    #[test]
    fn duplicate_entity_ids_are_rejected() {
        let mut def = s1_def();
        def.entities.push(EntityDef {
            id: 7,
            components: vec![],
        });
        def.entities.push(EntityDef {
            id: 7,
            components: vec![],
        });
        assert!(Simulation::materialize(def).is_err());
    }

    #[test]
    fn set_attribute_widens_int32_into_int64_schema() {
        let def = s1_def();
        let mut sim = Simulation::materialize(def).unwrap();
        let entity_id = sim.def.entities[0].id;
        let attr = AttributeRef {
            component: "Pos".to_string(),
            entity_id,
            attribute: "height".to_string(),
        };
        let mut rng = StepRng::new(0, 1);
        sim.set_attribute(&attr, Value::from_primitive(Primitive::Int32(5)), &mut rng)
            .unwrap();
        let v = sim.get_attribute(&attr).unwrap();
        assert_eq!(v.as_i64().unwrap(), 5);
    }
}
