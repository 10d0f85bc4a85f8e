//! `EngineFacade` (§4.7): the process-global simulation registry plus the
//! eight request handlers, returning [`ServiceError`] for the failure codes
//! the external interface promises.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use thiserror::Error;
use tracing::{info, instrument};

use latch_sim::interp::AttributeRef;
use latch_sim::value::Value;
use latch_sim::{EngineError, Simulation, SimulationDef};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("simulation '{name}' already exists and is locked")]
    AlreadyExists { name: String },

    #[error("simulation '{name}' not found")]
    NotFound { name: String },

    #[error("internal error: {0}")]
    Internal(#[from] EngineError),
}

/// Process-global registry of named simulations, each independently
/// lockable so one simulation's `Step` cannot interleave with another
/// request against the *same* simulation while different simulations
/// proceed independently (§5).
#[derive(Default)]
pub struct EngineFacade {
    registry: RwLock<HashMap<String, Mutex<Simulation>>>,
}

fn recover<T>(result: Result<T, std::sync::PoisonError<T>>) -> T {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EngineFacade {
    pub fn new() -> Self {
        EngineFacade {
            registry: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Mutex<Simulation>>> {
        recover(self.registry.read())
    }

    fn lock_entry<'a>(entry: &'a Mutex<Simulation>) -> MutexGuard<'a, Simulation> {
        recover(entry.lock())
    }

    pub fn get_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Reject if the named simulation exists and is locked; otherwise
    /// materialize and install the new def, then run its init graph. The
    /// entry is installed *before* the init graph runs and is not rolled
    /// back if the init graph fails (§9).
    #[instrument(skip(self, def), fields(sim_name = %def.name))]
    pub fn apply_simulation(&self, def: SimulationDef) -> Result<SimulationDef, ServiceError> {
        let name = def.name.clone();
        if let Some(entry) = self.read().get(&name) {
            if Self::lock_entry(entry).locked {
                return Err(ServiceError::AlreadyExists { name });
            }
        }

        let mut sim = Simulation::materialize(def)?;
        let echoed = sim.def.clone();
        let mut rng = rand::thread_rng();
        let init_result = sim.run_init_graph(&mut rng);

        recover(self.registry.write()).insert(name.clone(), Mutex::new(sim));
        init_result?;

        info!(sim_name = %name, "applied simulation");
        Ok(echoed)
    }

    pub fn get_simulation(&self, name: &str) -> Result<SimulationDef, ServiceError> {
        let registry = self.read();
        let entry = registry
            .get(name)
            .ok_or_else(|| ServiceError::NotFound { name: name.to_string() })?;
        Ok(Self::lock_entry(entry).def.clone())
    }

    pub fn list_simulation(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    #[instrument(skip(self))]
    pub fn drop_simulation(&self, name: &str) -> Result<(), ServiceError> {
        recover(self.registry.write())
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound { name: name.to_string() })
    }

    #[instrument(skip(self))]
    pub fn step_simulation(&self, name: &str) -> Result<(), ServiceError> {
        let registry = self.read();
        let entry = registry
            .get(name)
            .ok_or_else(|| ServiceError::NotFound { name: name.to_string() })?;
        let mut sim = Self::lock_entry(entry);
        let mut rng = rand::thread_rng();
        sim.step(&mut rng)
            .map_err(|e| ServiceError::Internal(e.context(format!("stepping simulation '{name}'"))))
    }

    pub fn get_attribute(&self, name: &str, attr: &AttributeRef) -> Result<Value, ServiceError> {
        let registry = self.read();
        let entry = registry
            .get(name)
            .ok_or_else(|| ServiceError::NotFound { name: name.to_string() })?;
        Ok(Self::lock_entry(entry).get_attribute(attr)?)
    }

    pub fn set_attribute(
        &self,
        name: &str,
        attr: &AttributeRef,
        value: Value,
    ) -> Result<(), ServiceError> {
        let registry = self.read();
        let entry = registry
            .get(name)
            .ok_or_else(|| ServiceError::NotFound { name: name.to_string() })?;
        let mut sim = Self::lock_entry(entry);
        let mut rng = rand::thread_rng();
        sim.set_attribute(attr, value, &mut rng)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latch_sim::component::ComponentDef;
    use latch_sim::interp::{Graph, Node};
    use latch_sim::value::{DeclaredType, Primitive, Tag};
    use latch_sim::{EntityDef, SystemDef};
    use std::collections::HashMap as Map;

    fn height_def(name: &str) -> SimulationDef {
        let mut schema = Map::new();
        schema.insert("height".to_string(), DeclaredType::Primitive(Tag::Int64));
        SimulationDef {
            name: name.to_string(),
            components: vec![ComponentDef::new("Pos", schema)],
            entities: vec![EntityDef {
                id: 0,
                components: vec!["Pos".to_string()],
            }],
            systems: vec![],
            init_graph: None,
        }
    }

    #[test]
    fn s3_applying_a_locked_simulation_is_already_exists() {
        let facade = EngineFacade::new();
        facade.apply_simulation(height_def("A")).unwrap();
        facade.step_simulation("A").unwrap();
        let err = facade.apply_simulation(height_def("A")).unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[test]
    fn s6_drop_frees_name_for_reapply() {
        let facade = EngineFacade::new();
        facade.apply_simulation(height_def("A")).unwrap();
        facade.step_simulation("A").unwrap();
        facade.drop_simulation("A").unwrap();
        assert!(facade.list_simulation().is_empty());
        facade.apply_simulation(height_def("A")).unwrap();
    }

    #[test]
    fn s4_set_attribute_widens_int32_into_int64() {
        let facade = EngineFacade::new();
        let echoed = facade.apply_simulation(height_def("A")).unwrap();
        let entity_id = echoed.entities[0].id;
        let attr = AttributeRef {
            component: "Pos".to_string(),
            entity_id,
            attribute: "height".to_string(),
        };
        facade
            .set_attribute("A", &attr, Value::from_primitive(Primitive::Int32(5)))
            .unwrap();
        let v = facade.get_attribute("A", &attr).unwrap();
        assert_eq!(v.as_i64().unwrap(), 5);
    }

    #[test]
    fn unknown_simulation_name_is_not_found() {
        let facade = EngineFacade::new();
        assert!(matches!(
            facade.step_simulation("ghost"),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn s6_get_simulation_round_trips_non_id_fields_with_assigned_ids() {
        let facade = EngineFacade::new();
        let echoed = facade.apply_simulation(height_def("A")).unwrap();
        assert_ne!(echoed.entities[0].id, 0);

        let fetched = facade.get_simulation("A").unwrap();
        assert_eq!(fetched, echoed);
        assert_eq!(fetched.components, height_def("A").components);
    }

    #[test]
    fn s7_apply_simulation_is_idempotent_on_a_draft() {
        let facade = EngineFacade::new();
        let first = facade.apply_simulation(height_def("A")).unwrap();
        let second = facade.apply_simulation(height_def("A")).unwrap();
        assert_eq!(first, second);
        assert_eq!(facade.get_simulation("A").unwrap(), second);
    }

    #[test]
    fn s8_drop_then_get_simulation_is_not_found() {
        let facade = EngineFacade::new();
        facade.apply_simulation(height_def("A")).unwrap();
        facade.drop_simulation("A").unwrap();
        assert!(matches!(
            facade.get_simulation("A"),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn s2_cycle_100_resets_at_boundary() {
        let mut schema = Map::new();
        schema.insert("height".to_string(), DeclaredType::Primitive(Tag::Int64));
        let mut def = SimulationDef {
            name: "cycle".to_string(),
            components: vec![ComponentDef::new("Pos", schema)],
            entities: vec![EntityDef {
                id: 0,
                components: vec!["Pos".to_string()],
            }],
            systems: vec![],
            init_graph: None,
        };
        let facade = EngineFacade::new();
        let echoed = facade.apply_simulation(def.clone()).unwrap();
        let entity_id = echoed.entities[0].id;
        let attr = |a: &str| AttributeRef {
            component: "Pos".to_string(),
            entity_id,
            attribute: a.to_string(),
        };
        def.systems = vec![SystemDef {
            id: 0,
            graph: Graph::new(
                vec![],
                vec![Node::Mutate(
                    attr("height"),
                    Box::new(Node::Switch {
                        cond: Box::new(Node::Gt(
                            Box::new(Node::Retrieve(attr("height"))),
                            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(100)))),
                        )),
                        if_true: Box::new(Node::Const(Value::from_primitive(Primitive::Int64(0)))),
                        if_false: Box::new(Node::Add(
                            Box::new(Node::Retrieve(attr("height"))),
                            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
                        )),
                    }),
                )],
            ),
        }];
        facade.apply_simulation(def).unwrap();
        for _ in 0..102 {
            facade.step_simulation("cycle").unwrap();
        }
        let v = facade.get_attribute("cycle", &attr("height")).unwrap();
        assert_eq!(v.as_i64().unwrap(), 0);
    }
}
