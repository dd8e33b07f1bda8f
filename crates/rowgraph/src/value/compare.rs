use crate::{record::Record, value::Value};
use std::cmp::Ordering;

/// Total canonical comparator used by sort, grouping, and join surfaces.
///
/// Ordering rules:
/// 1. Canonical variant rank
/// 2. Variant-specific comparison for same-ranked values
///
/// Mixed-variant comparisons are rank-only and must remain deterministic.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.kind().rank().cmp(&right.kind().rank());
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_kind(left, right)
}

fn canonical_cmp_same_kind(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        // total_cmp keeps NaN and signed zero ordered so Eq/Ord stay lawful
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => canonical_cmp_list(a, b),
        (Value::Record(a), Value::Record(b)) => canonical_cmp_record(a, b),
        _ => Ordering::Equal,
    }
}

fn canonical_cmp_list(left: &[Value], right: &[Value]) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = canonical_cmp(left, right);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}

fn canonical_cmp_record(left: &Record, right: &Record) -> Ordering {
    for ((left_name, left_value), (right_name, right_value)) in left.iter().zip(right.iter()) {
        let name_cmp = left_name.cmp(right_name);
        if name_cmp != Ordering::Equal {
            return name_cmp;
        }

        let value_cmp = canonical_cmp(left_value, right_value);
        if value_cmp != Ordering::Equal {
            return value_cmp;
        }
    }

    left.len().cmp(&right.len())
}

/// Lexicographic comparison of two projected key-value sequences.
///
/// Both sides must come from the same key tuple, so lengths match.
#[must_use]
pub(crate) fn compare_key_values(left: &[Value], right: &[Value]) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = canonical_cmp(left, right);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    Ordering::Equal
}
