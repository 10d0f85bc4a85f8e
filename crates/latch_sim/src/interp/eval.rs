//! The recursive evaluator (§4.6). Evaluation is eager, depth-first,
//! left-to-right: every sub-expression is fully evaluated before the
//! operator that consumes it runs.

use std::cmp::Ordering;

use rand::Rng;

use crate::error::{EngineError, EngineResult};
use crate::index::IndexStore;
use crate::store::ComponentStore;
use crate::value::{promote, Primitive, Tag, Value};

use super::node::{AttributeRef, Node};

/// Everything a single `evaluate` call needs: the stores it resolves
/// `Retrieve`/`Mutate` against, and a source of randomness for `Random`.
pub struct EvalContext<'a> {
    pub store: &'a mut ComponentStore,
    pub index: &'a IndexStore,
    pub rng: &'a mut dyn rand::RngCore,
}

pub fn evaluate(node: &Node, ctx: &mut EvalContext) -> EngineResult<Value> {
    match node {
        Node::Const(v) => Ok(v.clone()),
        Node::Retrieve(r) => retrieve(ctx, r),
        Node::Mutate(r, src) => {
            let v = evaluate(src, ctx)?;
            mutate(ctx, r, v.clone())?;
            Ok(v)
        }
        Node::Switch {
            cond,
            if_true,
            if_false,
        } => {
            let c = evaluate(cond, ctx)?.as_bool()?;
            if c {
                evaluate(if_true, ctx)
            } else {
                evaluate(if_false, ctx)
            }
        }

        Node::Add(x, y) => eval_numeric_binary(
            "Add",
            x,
            y,
            ctx,
            |a, b| a.checked_add(b).ok_or_else(|| EngineError::domain("Add", "integer overflow")),
            |a, b| a + b,
        ),
        Node::Sub(x, y) => eval_numeric_binary(
            "Sub",
            x,
            y,
            ctx,
            |a, b| a.checked_sub(b).ok_or_else(|| EngineError::domain("Sub", "integer overflow")),
            |a, b| a - b,
        ),
        Node::Mul(x, y) => eval_numeric_binary(
            "Mul",
            x,
            y,
            ctx,
            |a, b| a.checked_mul(b).ok_or_else(|| EngineError::domain("Mul", "integer overflow")),
            |a, b| a * b,
        ),
        Node::Div(x, y) => eval_numeric_binary(
            "Div",
            x,
            y,
            ctx,
            |a, b| {
                a.checked_div(b)
                    .ok_or_else(|| EngineError::domain("Div", "division by zero or overflow"))
            },
            |a, b| a / b,
        ),
        Node::Max(x, y) => eval_numeric_binary(
            "Max",
            x,
            y,
            ctx,
            |a, b| Ok(if a >= b { a } else { b }),
            |a, b| if a >= b { a } else { b },
        ),
        Node::Min(x, y) => eval_numeric_binary(
            "Min",
            x,
            y,
            ctx,
            |a, b| Ok(if a <= b { a } else { b }),
            |a, b| if a <= b { a } else { b },
        ),
        Node::Pow(x, y) => eval_numeric_binary(
            "Pow",
            x,
            y,
            ctx,
            |a, b| Ok((a as f64).powf(b as f64) as i64),
            |a, b| a.powf(b),
        ),
        Node::Mod(x, y) => eval_mod(x, y, ctx),

        Node::Abs(x) => eval_abs(x, ctx),
        Node::Floor(x) => eval_round("Floor", x, ctx, f64::floor),
        Node::Ceil(x) => eval_round("Ceil", x, ctx, f64::ceil),

        Node::Sin(x) => eval_numeric_unary("Sin", x, ctx, f64::sin),
        Node::Cos(x) => eval_numeric_unary("Cos", x, ctx, f64::cos),
        Node::Tan(x) => eval_numeric_unary("Tan", x, ctx, f64::tan),
        Node::ArcTan(x) => eval_numeric_unary("ArcTan", x, ctx, f64::atan),
        Node::ArcSin(x) => eval_inverse_trig("ArcSin", x, ctx, f64::asin),
        Node::ArcCos(x) => eval_inverse_trig("ArcCos", x, ctx, f64::acos),

        Node::Random(low, high) => eval_random(low, high, ctx),

        Node::And(x, y) => eval_bool_binary("And", x, y, ctx, |a, b| a && b),
        Node::Or(x, y) => eval_bool_binary("Or", x, y, ctx, |a, b| a || b),
        Node::Not(x) => {
            let v = evaluate(x, ctx)?;
            let b = v
                .as_bool()
                .map_err(|_| EngineError::domain("Not", "operand must be BOOL"))?;
            Ok(Value::from_primitive(Primitive::Bool(!b)))
        }

        Node::Eq(x, y) => eval_eq(x, y, ctx),
        Node::Gt(x, y) => eval_compare("Gt", x, y, ctx, |o| o == Ordering::Greater),
        Node::Lt(x, y) => eval_compare("Lt", x, y, ctx, |o| o == Ordering::Less),
        Node::Ge(x, y) => eval_compare("Ge", x, y, ctx, |o| o != Ordering::Less),
        Node::Le(x, y) => eval_compare("Le", x, y, ctx, |o| o != Ordering::Greater),
    }
}

fn retrieve(ctx: &mut EvalContext, r: &AttributeRef) -> EngineResult<Value> {
    ctx.index
        .resolve_attribute(ctx.store, r.entity_id, &r.component, &r.attribute)
        .cloned()
}

fn mutate(ctx: &mut EvalContext, r: &AttributeRef, value: Value) -> EngineResult<()> {
    let id = ctx
        .index
        .resolve_component_id(ctx.store, r.entity_id, &r.component, &r.attribute)?;
    ctx.store.get_mut(id)?.set_value(&r.attribute, value)
}

fn primitive_from_f64(tag: Tag, v: f64) -> Primitive {
    match tag {
        Tag::Float32 => Primitive::Float32(v as f32),
        Tag::Float64 => Primitive::Float64(v),
        _ => unreachable!("non-float result tag"),
    }
}

fn primitive_from_i64(tag: Tag, v: i64) -> Primitive {
    match tag {
        Tag::Int32 => Primitive::Int32(v as i32),
        Tag::Int64 => Primitive::Int64(v),
        _ => unreachable!("non-int result tag"),
    }
}

fn eval_numeric_binary<FI, FF>(
    op: &'static str,
    x: &Node,
    y: &Node,
    ctx: &mut EvalContext,
    int_op: FI,
    float_op: FF,
) -> EngineResult<Value>
where
    FI: Fn(i64, i64) -> EngineResult<i64>,
    FF: Fn(f64, f64) -> f64,
{
    let xv = evaluate(x, ctx)?;
    let yv = evaluate(y, ctx)?;
    let result_tag = promote(xv.as_primitive()?.tag(), yv.as_primitive()?.tag())
        .map_err(|_| EngineError::domain(op, "operands must both be numeric"))?;
    let value = if result_tag.is_float() {
        primitive_from_f64(result_tag, float_op(xv.as_f64()?, yv.as_f64()?))
    } else {
        primitive_from_i64(result_tag, int_op(xv.as_i64()?, yv.as_i64()?)?)
    };
    Ok(Value::from_primitive(value))
}

fn eval_mod(x: &Node, y: &Node, ctx: &mut EvalContext) -> EngineResult<Value> {
    let xv = evaluate(x, ctx)?;
    let yv = evaluate(y, ctx)?;
    let xt = xv.as_primitive()?.tag();
    let yt = yv.as_primitive()?.tag();
    if xt.is_float() || yt.is_float() {
        return Err(EngineError::domain("Mod", "modulo requires integer operands"));
    }
    let result_tag = promote(xt, yt).map_err(|_| EngineError::domain("Mod", "operands must be numeric"))?;
    let xi = xv.as_i64()?;
    let yi = yv.as_i64()?;
    if yi == 0 {
        return Err(EngineError::domain("Mod", "modulo by zero"));
    }
    let r = xi
        .checked_rem(yi)
        .ok_or_else(|| EngineError::domain("Mod", "overflow"))?;
    Ok(Value::from_primitive(primitive_from_i64(result_tag, r)))
}

fn eval_abs(x: &Node, ctx: &mut EvalContext) -> EngineResult<Value> {
    let xv = evaluate(x, ctx)?;
    let p = match xv.as_primitive()? {
        Primitive::Int32(v) => Primitive::Int32(
            v.checked_abs()
                .ok_or_else(|| EngineError::domain("Abs", "integer overflow"))?,
        ),
        Primitive::Int64(v) => Primitive::Int64(
            v.checked_abs()
                .ok_or_else(|| EngineError::domain("Abs", "integer overflow"))?,
        ),
        Primitive::Float32(v) => Primitive::Float32(v.abs()),
        Primitive::Float64(v) => Primitive::Float64(v.abs()),
        other => return Err(EngineError::domain("Abs", format!("non-numeric operand: {:?}", other.tag()))),
    };
    Ok(Value::from_primitive(p))
}

fn eval_round<F>(op: &'static str, x: &Node, ctx: &mut EvalContext, f: F) -> EngineResult<Value>
where
    F: Fn(f64) -> f64,
{
    let xv = evaluate(x, ctx)?;
    match xv.as_primitive()? {
        Primitive::Int32(_) | Primitive::Int64(_) => Ok(xv.clone()),
        Primitive::Float32(v) => Ok(Value::from_primitive(Primitive::Float32(f(*v as f64) as f32))),
        Primitive::Float64(v) => Ok(Value::from_primitive(Primitive::Float64(f(*v)))),
        other => Err(EngineError::domain(op, format!("non-numeric operand: {:?}", other.tag()))),
    }
}

fn eval_numeric_unary<F>(op: &'static str, x: &Node, ctx: &mut EvalContext, f: F) -> EngineResult<Value>
where
    F: Fn(f64) -> f64,
{
    let xv = evaluate(x, ctx)?;
    let xt = xv.as_primitive()?.tag();
    if !xt.is_numeric() {
        return Err(EngineError::domain(op, format!("non-numeric operand: {:?}", xt)));
    }
    let out = f(xv.as_f64()?);
    let p = if xt == Tag::Float32 {
        Primitive::Float32(out as f32)
    } else {
        Primitive::Float64(out)
    };
    Ok(Value::from_primitive(p))
}

fn eval_inverse_trig<F>(op: &'static str, x: &Node, ctx: &mut EvalContext, f: F) -> EngineResult<Value>
where
    F: Fn(f64) -> f64,
{
    let xv = evaluate(x, ctx)?;
    let xt = xv.as_primitive()?.tag();
    if !xt.is_numeric() {
        return Err(EngineError::domain(op, format!("non-numeric operand: {:?}", xt)));
    }
    let input = xv.as_f64()?;
    if !(-1.0..=1.0).contains(&input) {
        return Err(EngineError::domain(op, format!("{} outside domain [-1, 1]", input)));
    }
    let out = f(input);
    let p = if xt == Tag::Float32 {
        Primitive::Float32(out as f32)
    } else {
        Primitive::Float64(out)
    };
    Ok(Value::from_primitive(p))
}

fn eval_random(low: &Node, high: &Node, ctx: &mut EvalContext) -> EngineResult<Value> {
    let lv = evaluate(low, ctx)?;
    let hv = evaluate(high, ctx)?;
    let lt = lv.as_primitive()?.tag();
    let ht = hv.as_primitive()?.tag();
    if !lt.is_float() || !ht.is_float() {
        return Err(EngineError::domain("Random", "bounds must be float32 or float64"));
    }
    let result_tag = if lt == Tag::Float64 || ht == Tag::Float64 {
        Tag::Float64
    } else {
        Tag::Float32
    };
    let lo = lv.as_f64()?;
    let hi = hv.as_f64()?;
    if lo > hi {
        return Err(EngineError::domain("Random", "low bound greater than high bound"));
    }
    let sample = if lo == hi { lo } else { ctx.rng.gen_range(lo..=hi) };
    Ok(Value::from_primitive(primitive_from_f64(result_tag, sample)))
}

fn eval_bool_binary<F>(op: &'static str, x: &Node, y: &Node, ctx: &mut EvalContext, f: F) -> EngineResult<Value>
where
    F: Fn(bool, bool) -> bool,
{
    let xv = evaluate(x, ctx)?;
    let yv = evaluate(y, ctx)?;
    let a = xv
        .as_bool()
        .map_err(|_| EngineError::domain(op, "operands must be BOOL"))?;
    let b = yv
        .as_bool()
        .map_err(|_| EngineError::domain(op, "operands must be BOOL"))?;
    Ok(Value::from_primitive(Primitive::Bool(f(a, b))))
}

fn eval_eq(x: &Node, y: &Node, ctx: &mut EvalContext) -> EngineResult<Value> {
    let xv = evaluate(x, ctx)?;
    let yv = evaluate(y, ctx)?;
    let xp = xv.as_primitive()?;
    let yp = yv.as_primitive()?;
    let xt = xp.tag();
    let yt = yp.tag();
    let result = if xt.is_numeric() && yt.is_numeric() {
        let result_tag = promote(xt, yt)?;
        if result_tag.is_float() {
            xv.as_f64()? == yv.as_f64()?
        } else {
            xv.as_i64()? == yv.as_i64()?
        }
    } else if xt == Tag::Bool && yt == Tag::Bool {
        xv.as_bool()? == yv.as_bool()?
    } else if xt == Tag::Str && yt == Tag::Str {
        xv.as_str()? == yv.as_str()?
    } else {
        return Err(EngineError::domain("Eq", format!("cannot compare {:?} and {:?}", xt, yt)));
    };
    Ok(Value::from_primitive(Primitive::Bool(result)))
}

fn eval_compare<F>(op: &'static str, x: &Node, y: &Node, ctx: &mut EvalContext, accept: F) -> EngineResult<Value>
where
    F: Fn(Ordering) -> bool,
{
    let xv = evaluate(x, ctx)?;
    let yv = evaluate(y, ctx)?;
    let result_tag = promote(xv.as_primitive()?.tag(), yv.as_primitive()?.tag())
        .map_err(|_| EngineError::domain(op, "operands must both be numeric"))?;
    let ordering = if result_tag.is_float() {
        xv.as_f64()?
            .partial_cmp(&yv.as_f64()?)
            .ok_or_else(|| EngineError::domain(op, "NaN comparison"))?
    } else {
        xv.as_i64()?.cmp(&yv.as_i64()?)
    };
    Ok(Value::from_primitive(Primitive::Bool(accept(ordering))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDef, UserComponent};
    use crate::value::{ArrayValue, DeclaredType};
    use rand::rngs::mock::StepRng;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn height_fixture() -> (ComponentStore, IndexStore, crate::index::EntityId) {
        let mut schema = HashMap::new();
        schema.insert("height".to_string(), DeclaredType::Primitive(Tag::Int64));
        let def = Arc::new(ComponentDef::new("Pos", schema));

        let mut store = ComponentStore::new();
        let mut index = IndexStore::new();
        let type_index = index.types.add_component_type("Pos");
        let entity = index.entities.add_entity_id();
        let comp = UserComponent::new(def);
        let id = store.insert(type_index, comp);
        index.entities.attach(entity, id);
        (store, index, entity)
    }

    fn attr(entity: crate::index::EntityId, attribute: &str) -> AttributeRef {
        AttributeRef {
            component: "Pos".to_string(),
            entity_id: entity,
            attribute: attribute.to_string(),
        }
    }

    #[test]
    fn s1_three_steps_accumulate_height() {
        let (mut store, index, entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let system = Node::Mutate(
            attr(entity, "height"),
            Box::new(Node::Add(
                Box::new(Node::Retrieve(attr(entity, "height"))),
                Box::new(Node::Const(Value::from_primitive(Primitive::Int64(1)))),
            )),
        );
        for _ in 0..3 {
            let mut ctx = EvalContext {
                store: &mut store,
                index: &index,
                rng: &mut rng,
            };
            evaluate(&system, &mut ctx).unwrap();
        }
        let v = index
            .resolve_attribute(&store, entity, "Pos", "height")
            .unwrap();
        assert_eq!(v.as_i64().unwrap(), 3);
    }

    #[test]
    fn int_division_truncates_toward_zero() {
        let (mut store, index, _entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = EvalContext {
            store: &mut store,
            index: &index,
            rng: &mut rng,
        };
        let node = Node::Div(
            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(-7)))),
            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(2)))),
        );
        let v = evaluate(&node, &mut ctx).unwrap();
        assert_eq!(v.as_i64().unwrap(), -3);
    }

    #[test]
    fn mod_rejects_float_operands() {
        let (mut store, index, _entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = EvalContext {
            store: &mut store,
            index: &index,
            rng: &mut rng,
        };
        let node = Node::Mod(
            Box::new(Node::Const(Value::from_primitive(Primitive::Float64(4.0)))),
            Box::new(Node::Const(Value::from_primitive(Primitive::Int64(2)))),
        );
        let err = evaluate(&node, &mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::DomainError { .. }));
    }

    #[test]
    fn arcsin_domain_check() {
        let (mut store, index, _entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = EvalContext {
            store: &mut store,
            index: &index,
            rng: &mut rng,
        };
        let ok = Node::ArcSin(Box::new(Node::Const(Value::from_primitive(Primitive::Float64(1.0)))));
        let v = evaluate(&ok, &mut ctx).unwrap();
        assert!((v.as_f64().unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let out_of_domain = Node::ArcSin(Box::new(Node::Const(Value::from_primitive(Primitive::Float64(2.0)))));
        assert!(evaluate(&out_of_domain, &mut ctx).is_err());
    }

    #[test]
    fn random_with_equal_bounds_is_exact() {
        let (mut store, index, _entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = EvalContext {
            store: &mut store,
            index: &index,
            rng: &mut rng,
        };
        let node = Node::Random(
            Box::new(Node::Const(Value::from_primitive(Primitive::Float64(0.0)))),
            Box::new(Node::Const(Value::from_primitive(Primitive::Float64(0.0)))),
        );
        let v = evaluate(&node, &mut ctx).unwrap();
        assert_eq!(v.as_f64().unwrap(), 0.0);
    }

    #[test]
    fn array_operands_reject_arithmetic() {
        let (mut store, index, _entity) = height_fixture();
        let mut rng = StepRng::new(0, 1);
        let mut ctx = EvalContext {
            store: &mut store,
            index: &index,
            rng: &mut rng,
        };
        let arr = Value::from_array(ArrayValue {
            element_type: Tag::Int32,
            dimensions: vec![1],
            values: vec![Primitive::Int32(1)],
        });
        let node = Node::Add(
            Box::new(Node::Const(arr)),
            Box::new(Node::Const(Value::from_primitive(Primitive::Int32(1)))),
        );
        assert!(evaluate(&node, &mut ctx).is_err());
    }
}
