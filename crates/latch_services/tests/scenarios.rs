//! End-to-end scenarios S1-S6, exercising the facade the way a caller
//! actually would: apply, step, read/write attributes, drop.

use std::collections::HashMap;

use latch_services::{EngineFacade, ServiceError};
use latch_sim::component::ComponentDef;
use latch_sim::interp::{AttributeRef, Graph, Node};
use latch_sim::value::{DeclaredType, Primitive, Tag, Value};
use latch_sim::{EntityDef, SimulationDef, SystemDef};

fn pos_component() -> ComponentDef {
    let mut schema = HashMap::new();
    schema.insert("height".to_string(), DeclaredType::Primitive(Tag::Int64));
    ComponentDef::new("Pos", schema)
}

fn height_attr(entity_id: u64) -> AttributeRef {
    AttributeRef {
        component: "Pos".to_string(),
        entity_id,
        attribute: "height".to_string(),
    }
}

fn increment_system(entity_id: u64) -> SystemDef {
    SystemDef {
        id: 0,
        graph: Graph::new(
            vec![],
            vec![Node::Mutate(
                height_attr(entity_id),
                Box::new(Node::Add(
                    Box::new(Node::Retrieve(height_attr(entity_id))),
                    Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
                )),
            )],
        ),
    }
}

fn bare_def(name: &str) -> SimulationDef {
    SimulationDef {
        name: name.to_string(),
        components: vec![pos_component()],
        entities: vec![EntityDef {
            id: 0,
            components: vec!["Pos".to_string()],
        }],
        systems: vec![],
        init_graph: None,
    }
}

#[test]
fn s1_setup_and_single_step_mutation() {
    let facade = EngineFacade::new();
    let echoed = facade.apply_simulation(bare_def("s1")).unwrap();
    let entity_id = echoed.entities[0].id;

    let mut def = echoed;
    def.systems = vec![increment_system(entity_id)];
    facade.apply_simulation(def).unwrap();

    for _ in 0..3 {
        facade.step_simulation("s1").unwrap();
    }

    let v = facade.get_attribute("s1", &height_attr(entity_id)).unwrap();
    assert_eq!(v.as_i64().unwrap(), 3);
}

#[test]
fn s2_cycle_100_wraps_back_to_zero() {
    let facade = EngineFacade::new();
    let echoed = facade.apply_simulation(bare_def("s2")).unwrap();
    let entity_id = echoed.entities[0].id;
    let attr = height_attr(entity_id);

    let mut def = echoed;
    def.systems = vec![SystemDef {
        id: 0,
        graph: Graph::new(
            vec![],
            vec![Node::Mutate(
                attr.clone(),
                Box::new(Node::Switch {
                    cond: Box::new(Node::Gt(
                        Box::new(Node::Retrieve(attr.clone())),
                        Box::new(Node::Const(Value::from_primitive(Primitive::Int64(100)))),
                    )),
                    if_true: Box::new(Node::Const(Value::from_primitive(Primitive::Int64(0)))),
                    if_false: Box::new(Node::Add(
                        Box::new(Node::Retrieve(attr.clone())),
                        Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
                    )),
                }),
            )],
        ),
    }];
    facade.apply_simulation(def).unwrap();

    for _ in 0..102 {
        facade.step_simulation("s2").unwrap();
    }

    let v = facade.get_attribute("s2", &attr).unwrap();
    assert_eq!(v.as_i64().unwrap(), 0);
}

#[test]
fn s3_locking_rejects_reapply() {
    let facade = EngineFacade::new();
    facade.apply_simulation(bare_def("s3")).unwrap();
    facade.step_simulation("s3").unwrap();

    let err = facade.apply_simulation(bare_def("s3")).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { name } if name == "s3"));
}

#[test]
fn s4_implicit_widening_on_set_attribute() {
    let facade = EngineFacade::new();
    let echoed = facade.apply_simulation(bare_def("s4")).unwrap();
    let entity_id = echoed.entities[0].id;
    let attr = height_attr(entity_id);

    facade
        .set_attribute("s4", &attr, Value::from_primitive(Primitive::Int32(5)))
        .unwrap();

    let v = facade.get_attribute("s4", &attr).unwrap();
    assert_eq!(v.declared_type(), DeclaredType::Primitive(Tag::Int64));
    assert_eq!(v.as_i64().unwrap(), 5);
}

#[test]
fn s5_two_components_of_the_same_type_on_one_entity_is_ambiguous() {
    let facade = EngineFacade::new();
    let mut def = bare_def("s5");
    def.entities[0].components = vec!["Pos".to_string(), "Pos".to_string()];
    let echoed = facade.apply_simulation(def).unwrap();
    let entity_id = echoed.entities[0].id;

    let err = facade.get_attribute("s5", &height_attr(entity_id)).unwrap_err();
    assert!(matches!(err, ServiceError::Internal(_)));
}

#[test]
fn s6_drop_frees_resources_for_a_fresh_apply() {
    let facade = EngineFacade::new();
    facade.apply_simulation(bare_def("s6")).unwrap();
    facade.step_simulation("s6").unwrap();
    facade.drop_simulation("s6").unwrap();

    assert!(facade.list_simulation().is_empty());
    facade.apply_simulation(bare_def("s6")).unwrap();
}
