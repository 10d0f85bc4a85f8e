//! Component schemas and instances (§3 / §4.1).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::value::{DeclaredType, Primitive, Value};

/// A named, schema-typed component kind. Shared by every instance of that
/// component via an `Arc`, since the schema never changes once a
/// simulation is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    pub schema: HashMap<String, DeclaredType>,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, schema: HashMap<String, DeclaredType>) -> Self {
        ComponentDef {
            name: name.into(),
            schema,
        }
    }

    /// The zero-ish default value for a declared type, used to populate a
    /// freshly instantiated component's `values` map (§4.5).
    fn default_value(declared: DeclaredType) -> Value {
        match declared {
            DeclaredType::Primitive(tag) => {
                let p = match tag {
                    crate::value::Tag::Int32 => Primitive::Int32(0),
                    crate::value::Tag::Int64 => Primitive::Int64(0),
                    crate::value::Tag::Float32 => Primitive::Float32(0.0),
                    crate::value::Tag::Float64 => Primitive::Float64(0.0),
                    crate::value::Tag::Bool => Primitive::Bool(false),
                    crate::value::Tag::Str => Primitive::Str(String::new()),
                };
                Value::from_primitive(p)
            }
            DeclaredType::Array(elem) => Value::from_array(crate::value::ArrayValue {
                element_type: elem,
                dimensions: Vec::new(),
                values: Vec::new(),
            }),
        }
    }
}

/// A live component instance: the def it was built from, plus every schema
/// attribute's current value. Every attribute named in the schema always
/// has an entry — components are never partially populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComponent {
    pub def: Arc<ComponentDef>,
    values: HashMap<String, Value>,
}

impl UserComponent {
    /// Instantiate a component from its def, populating every schema
    /// attribute with its default value.
    pub fn new(def: Arc<ComponentDef>) -> Self {
        let values = def
            .schema
            .iter()
            .map(|(attr, declared)| (attr.clone(), ComponentDef::default_value(*declared)))
            .collect();
        UserComponent { def, values }
    }

    pub fn component_name(&self) -> &str {
        &self.def.name
    }

    pub fn get_value(&self, attribute: &str) -> EngineResult<&Value> {
        self.values
            .get(attribute)
            .ok_or_else(|| EngineError::SchemaViolation {
                component: self.def.name.clone(),
                attribute: attribute.to_string(),
            })
    }

    /// Set `attribute` to `incoming`, coercing it to the attribute's
    /// declared type. The attribute must already be present in the
    /// component's schema — this never adds new attributes.
    pub fn set_value(&mut self, attribute: &str, incoming: Value) -> EngineResult<()> {
        let declared = *self
            .def
            .schema
            .get(attribute)
            .ok_or_else(|| EngineError::SchemaViolation {
                component: self.def.name.clone(),
                attribute: attribute.to_string(),
            })?;
        let coerced = incoming.coerced_to(declared)?;
        self.values.insert(attribute.to_string(), coerced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Tag;

    fn def() -> Arc<ComponentDef> {
        let mut schema = HashMap::new();
        schema.insert("hp".to_string(), DeclaredType::Primitive(Tag::Int32));
        schema.insert("name".to_string(), DeclaredType::Primitive(Tag::Str));
        Arc::new(ComponentDef::new("Health", schema))
    }

    #[test]
    fn instantiation_populates_every_schema_attribute() {
        let c = UserComponent::new(def());
        assert_eq!(c.get_value("hp").unwrap().as_i64().unwrap(), 0);
        assert_eq!(c.get_value("name").unwrap().as_str().unwrap(), "");
    }

    #[test]
    fn set_value_rejects_unknown_attribute() {
        let mut c = UserComponent::new(def());
        let err = c
            .set_value("mana", Value::from_primitive(Primitive::Int32(5)))
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaViolation { .. }));
    }

    #[test]
    fn set_value_coerces_numeric_widening() {
        let mut c = UserComponent::new(def());
        c.set_value("hp", Value::from_primitive(Primitive::Int32(42)))
            .unwrap();
        assert_eq!(c.get_value("hp").unwrap().as_i64().unwrap(), 42);
    }

    #[test]
    fn set_value_rejects_type_mismatch() {
        let mut c = UserComponent::new(def());
        let err = c
            .set_value("hp", Value::from_primitive(Primitive::Str("nope".into())))
            .unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }
}
