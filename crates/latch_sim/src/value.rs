//! The dynamically-typed value model shared by component attributes and
//! graph nodes.
//!
//! `Value` is a tagged variant (primitive or array) carrying a *declared*
//! type alongside its payload. The declared type is what a schema or a
//! `Mutate` target claims the value satisfies; the payload tag is what is
//! actually stored. The two agree exactly except at a numeric boundary,
//! where [`coerce_into`] performs the implicit widening/narrowing described
//! in the data model.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Primitive type tag. The four [`Tag::is_numeric`] variants participate in
/// implicit coercion and arithmetic; `Bool` and `Str` never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Str,
}

impl Tag {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Tag::Int32 | Tag::Int64 | Tag::Float32 | Tag::Float64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Tag::Float32 | Tag::Float64)
    }
}

/// Declared type of a `Value`: either a primitive tag, or an array of a
/// declared element tag. Matches the wire `Type { primitive | array }`
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    Primitive(Tag),
    Array(Tag),
}

impl DeclaredType {
    pub fn tag(self) -> Tag {
        match self {
            DeclaredType::Primitive(t) => t,
            DeclaredType::Array(t) => t,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, DeclaredType::Array(_))
    }
}

/// A single scalar payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Str(String),
}

impl Primitive {
    pub fn tag(&self) -> Tag {
        match self {
            Primitive::Int32(_) => Tag::Int32,
            Primitive::Int64(_) => Tag::Int64,
            Primitive::Float32(_) => Tag::Float32,
            Primitive::Float64(_) => Tag::Float64,
            Primitive::Bool(_) => Tag::Bool,
            Primitive::Str(_) => Tag::Str,
        }
    }

    /// Widen/narrow a numeric primitive to `target` using the same
    /// direct-cast semantics as the original's `(Y)x` numeric cast: int-to-int
    /// casts wrap (e.g. `Int64(2^32 + 5)` into `Int32` is `5`, not
    /// `i32::MAX`), matching Rust's native `as` int-to-int behavior. Panics if
    /// `self` or `target` is non-numeric; callers must check first.
    fn cast_numeric(&self, target: Tag) -> Primitive {
        debug_assert!(self.tag().is_numeric() && target.is_numeric());
        match (self, target) {
            (Primitive::Int32(v), Tag::Int32) => Primitive::Int32(*v),
            (Primitive::Int32(v), Tag::Int64) => Primitive::Int64(*v as i64),
            (Primitive::Int32(v), Tag::Float32) => Primitive::Float32(*v as f32),
            (Primitive::Int32(v), Tag::Float64) => Primitive::Float64(*v as f64),

            (Primitive::Int64(v), Tag::Int32) => Primitive::Int32(*v as i32),
            (Primitive::Int64(v), Tag::Int64) => Primitive::Int64(*v),
            (Primitive::Int64(v), Tag::Float32) => Primitive::Float32(*v as f32),
            (Primitive::Int64(v), Tag::Float64) => Primitive::Float64(*v as f64),

            (Primitive::Float32(v), Tag::Int32) => Primitive::Int32(*v as i32),
            (Primitive::Float32(v), Tag::Int64) => Primitive::Int64(*v as i64),
            (Primitive::Float32(v), Tag::Float32) => Primitive::Float32(*v),
            (Primitive::Float32(v), Tag::Float64) => Primitive::Float64(*v as f64),

            (Primitive::Float64(v), Tag::Int32) => Primitive::Int32(*v as i32),
            (Primitive::Float64(v), Tag::Int64) => Primitive::Int64(*v as i64),
            (Primitive::Float64(v), Tag::Float32) => Primitive::Float32(*v as f32),
            (Primitive::Float64(v), Tag::Float64) => Primitive::Float64(*v),

            _ => unreachable!("non-numeric primitive or target"),
        }
    }
}

/// An array payload: row-major values under a declared element type and
/// shape. No elementwise coercion and no arithmetic operator set over
/// arrays — see spec.md's Non-goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub element_type: Tag,
    pub dimensions: Vec<usize>,
    pub values: Vec<Primitive>,
}

/// What a `Value` actually holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Primitive(Primitive),
    Array(ArrayValue),
}

impl Payload {
    pub fn tag(&self) -> Tag {
        match self {
            Payload::Primitive(p) => p.tag(),
            Payload::Array(a) => a.element_type,
        }
    }
}

/// A tagged value: exactly one payload, plus the declared type it claims to
/// satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    declared_type: DeclaredType,
    payload: Payload,
}

impl Value {
    /// Construct a value whose declared type is exactly the payload's
    /// natural tag — `set(val, payload)` from the data model.
    pub fn from_primitive(p: Primitive) -> Self {
        let tag = p.tag();
        Value {
            declared_type: DeclaredType::Primitive(tag),
            payload: Payload::Primitive(p),
        }
    }

    pub fn from_array(a: ArrayValue) -> Self {
        let elem = a.element_type;
        Value {
            declared_type: DeclaredType::Array(elem),
            payload: Payload::Array(a),
        }
    }

    pub fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_tag(&self) -> Tag {
        self.payload.tag()
    }

    pub fn is_tag(&self, tag: Tag) -> bool {
        self.payload.tag() == tag
    }

    pub fn declared_type_matches_payload(&self) -> bool {
        match (self.declared_type, &self.payload) {
            (DeclaredType::Primitive(t), Payload::Primitive(p)) => t == p.tag(),
            (DeclaredType::Array(t), Payload::Array(a)) => t == a.element_type,
            _ => false,
        }
    }

    pub fn as_primitive(&self) -> EngineResult<&Primitive> {
        match &self.payload {
            Payload::Primitive(p) => Ok(p),
            Payload::Array(_) => Err(EngineError::TypeMismatch {
                expected: self.declared_type.tag(),
                actual: self.payload.tag(),
            }),
        }
    }

    pub fn as_array(&self) -> EngineResult<&ArrayValue> {
        match &self.payload {
            Payload::Array(a) => Ok(a),
            Payload::Primitive(p) => Err(EngineError::TypeMismatch {
                expected: self.declared_type.tag(),
                actual: p.tag(),
            }),
        }
    }

    pub fn as_i64(&self) -> EngineResult<i64> {
        match self.as_primitive()? {
            Primitive::Int32(v) => Ok(*v as i64),
            Primitive::Int64(v) => Ok(*v),
            other => Err(EngineError::TypeMismatch {
                expected: Tag::Int64,
                actual: other.tag(),
            }),
        }
    }

    pub fn as_f64(&self) -> EngineResult<f64> {
        match self.as_primitive()? {
            Primitive::Int32(v) => Ok(*v as f64),
            Primitive::Int64(v) => Ok(*v as f64),
            Primitive::Float32(v) => Ok(*v as f64),
            Primitive::Float64(v) => Ok(*v),
            other => Err(EngineError::TypeMismatch {
                expected: Tag::Float64,
                actual: other.tag(),
            }),
        }
    }

    pub fn as_bool(&self) -> EngineResult<bool> {
        match self.as_primitive()? {
            Primitive::Bool(v) => Ok(*v),
            other => Err(EngineError::TypeMismatch {
                expected: Tag::Bool,
                actual: other.tag(),
            }),
        }
    }

    pub fn as_str(&self) -> EngineResult<&str> {
        match self.as_primitive()? {
            Primitive::Str(v) => Ok(v.as_str()),
            other => Err(EngineError::TypeMismatch {
                expected: Tag::Str,
                actual: other.tag(),
            }),
        }
    }

    /// Re-declare this value under `target`, applying implicit numeric
    /// coercion at the boundary (§4.1). Arrays require an exact element-type
    /// match; everything else requires an exact tag match unless both sides
    /// are numeric.
    pub fn coerced_to(&self, target: DeclaredType) -> EngineResult<Value> {
        match (target, &self.payload) {
            (DeclaredType::Array(target_elem), Payload::Array(a)) => {
                if a.element_type != target_elem {
                    return Err(EngineError::TypeMismatch {
                        expected: target_elem,
                        actual: a.element_type,
                    });
                }
                Ok(Value {
                    declared_type: target,
                    payload: self.payload.clone(),
                })
            }
            (DeclaredType::Primitive(target_tag), Payload::Primitive(p)) => {
                let source_tag = p.tag();
                if source_tag == target_tag {
                    return Ok(Value {
                        declared_type: target,
                        payload: Payload::Primitive(p.clone()),
                    });
                }
                if source_tag.is_numeric() && target_tag.is_numeric() {
                    return Ok(Value {
                        declared_type: target,
                        payload: Payload::Primitive(p.cast_numeric(target_tag)),
                    });
                }
                Err(EngineError::TypeMismatch {
                    expected: target_tag,
                    actual: source_tag,
                })
            }
            (_, payload) => Err(EngineError::TypeMismatch {
                expected: target.tag(),
                actual: payload.tag(),
            }),
        }
    }
}

/// Total promotion table for binary numeric ops (§4.6): int widens to the
/// wider int, int+float takes the float's width, float widens to the wider
/// float. Non-numeric tags are rejected.
pub fn promote(a: Tag, b: Tag) -> EngineResult<Tag> {
    use Tag::*;
    if !a.is_numeric() || !b.is_numeric() {
        return Err(EngineError::domain(
            "numeric promotion",
            format!("{:?} and {:?} are not both numeric", a, b),
        ));
    }
    let rank = |t: Tag| -> u8 {
        match t {
            Int32 => 0,
            Int64 => 1,
            Float32 => 2,
            Float64 => 3,
            _ => unreachable!(),
        }
    };
    Ok(if rank(a) >= rank(b) { a } else { b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_widens_int32_into_int64_schema() {
        let v = Value::from_primitive(Primitive::Int32(5));
        let coerced = v.coerced_to(DeclaredType::Primitive(Tag::Int64)).unwrap();
        assert_eq!(coerced.as_i64().unwrap(), 5);
        assert_eq!(coerced.declared_type(), DeclaredType::Primitive(Tag::Int64));
    }

    #[test]
    fn coercion_rejects_str_into_int() {
        let v = Value::from_primitive(Primitive::Str("hi".into()));
        assert!(v.coerced_to(DeclaredType::Primitive(Tag::Int32)).is_err());
    }

    #[test]
    fn array_requires_exact_element_type() {
        let a = ArrayValue {
            element_type: Tag::Int32,
            dimensions: vec![2],
            values: vec![Primitive::Int32(1), Primitive::Int32(2)],
        };
        let v = Value::from_array(a);
        assert!(v.coerced_to(DeclaredType::Array(Tag::Int64)).is_err());
        assert!(v.coerced_to(DeclaredType::Array(Tag::Int32)).is_ok());
    }

    #[test]
    fn narrowing_int64_into_int32_wraps_like_a_native_cast() {
        let v = Value::from_primitive(Primitive::Int64(1i64 << 32 | 5));
        let coerced = v.coerced_to(DeclaredType::Primitive(Tag::Int32)).unwrap();
        assert_eq!(coerced.as_i64().unwrap(), 5);
    }

    #[test]
    fn promotion_table_picks_wider_kind() {
        assert_eq!(promote(Tag::Int32, Tag::Int64).unwrap(), Tag::Int64);
        assert_eq!(promote(Tag::Int64, Tag::Float32).unwrap(), Tag::Float32);
        assert_eq!(promote(Tag::Float32, Tag::Float64).unwrap(), Tag::Float64);
        assert!(promote(Tag::Bool, Tag::Int32).is_err());
    }
}
