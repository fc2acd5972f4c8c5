//! Value comparison shared by bound checks and filter evaluation
//!
//! No type coercion: numbers compare numerically, strings lexically,
//! booleans false < true. Anything else (mixed types, null, arrays,
//! objects) is incomparable and never matches.

use std::cmp::Ordering;

use serde_json::Value;

use super::{BinaryCondition, BoundType};

/// Orders two values of the same kind, `None` when incomparable
pub fn compare_values(actual: &Value, other: &Value) -> Option<Ordering> {
    match (actual, other) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return Some(ai.cmp(&bi));
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(af), Some(bf)) => af.partial_cmp(&bf),
                _ => None,
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Evaluates `actual <condition> expected`
pub fn condition_holds(condition: BinaryCondition, actual: &Value, expected: &Value) -> bool {
    let Some(ordering) = compare_values(actual, expected) else {
        return false;
    };
    match condition {
        BinaryCondition::Eq => ordering == Ordering::Equal,
        BinaryCondition::Ge => ordering != Ordering::Less,
        BinaryCondition::Gt => ordering == Ordering::Greater,
        BinaryCondition::Le => ordering != Ordering::Greater,
        BinaryCondition::Lt => ordering == Ordering::Less,
    }
}

/// Evaluates `actual <bound> value` for an index bound
pub(crate) fn bound_holds(bound: BoundType, actual: &Value, value: &Value) -> bool {
    let condition = match bound {
        BoundType::Eq => BinaryCondition::Eq,
        BoundType::Ge => BinaryCondition::Ge,
        BoundType::Gt => BinaryCondition::Gt,
        BoundType::Le => BinaryCondition::Le,
        BoundType::Lt => BinaryCondition::Lt,
    };
    condition_holds(condition, actual, value)
}
