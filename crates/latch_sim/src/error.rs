//! Error types for the ECS store and graph interpreter.

use thiserror::Error;

use crate::value::Tag;

/// Errors raised while resolving or mutating component/attribute state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("value of tag {actual:?} cannot be read as {expected:?}")]
    TypeMismatch { expected: Tag, actual: Tag },

    #[error("{op} is not defined for the given operand(s): {reason}")]
    DomainError { op: &'static str, reason: String },

    #[error(
        "attribute '{attribute}' on component '{component}' for entity {entity_id} not found"
    )]
    AttrNotFound {
        component: String,
        entity_id: u64,
        attribute: String,
    },

    #[error(
        "attribute '{attribute}' on component '{component}' for entity {entity_id} is ambiguous \
         ({count} matching components)"
    )]
    Ambiguous {
        component: String,
        entity_id: u64,
        attribute: String,
        count: usize,
    },

    #[error("attribute '{attribute}' is not part of component '{component}'s schema")]
    SchemaViolation {
        component: String,
        attribute: String,
    },

    #[error("component type '{name}' is not registered")]
    UnknownComponentType { name: String },

    #[error("component slot {0:?} is not live")]
    NotFound(crate::pool::SlotId),

    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn domain(op: &'static str, reason: impl Into<String>) -> Self {
        EngineError::DomainError {
            op,
            reason: reason.into(),
        }
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        EngineError::Internal {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
