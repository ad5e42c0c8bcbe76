//! Fixed probe inputs for comparing programs beyond the user's examples.
//!
//! Probes are deterministic so registry deduplication and verification
//! give the same answer on every run.

use crate::value::{Type, Value};

const INT_PROBES: [i64; 10] = [0, 1, -1, 2, -3, 5, 7, 10, -12, 100];

/// Representative values of a first-order type. Function types have no
/// probes.
pub fn probe_values(ty: &Type) -> Vec<Value> {
    match ty {
        Type::Int => INT_PROBES.iter().map(|v| Value::Int(*v)).collect(),
        Type::Bool => vec![Value::Bool(false), Value::Bool(true)],
        Type::List => vec![
            Value::List(vec![]),
            Value::List(vec![1]),
            Value::List(vec![0, 1, 2]),
            Value::List(vec![-2, 5, 3]),
            Value::List(vec![4, 4, 1, 0]),
        ],
        Type::Func { .. } => Vec::new(),
    }
}

/// Input tuples for a parameter list, at most `limit` of them.
///
/// Returns the full cartesian product when it fits; otherwise walks the
/// product with a fixed stride so every parameter still varies.
pub fn probe_inputs(params: &[Type], limit: usize) -> Vec<Vec<Value>> {
    let pools: Vec<Vec<Value>> = params.iter().map(probe_values).collect();
    if pools.iter().any(Vec::is_empty) || limit == 0 {
        return if params.is_empty() { vec![Vec::new()] } else { Vec::new() };
    }

    let total = pools
        .iter()
        .try_fold(1usize, |acc, p| acc.checked_mul(p.len()))
        .unwrap_or(usize::MAX);
    let take = total.min(limit);
    let stride = if total <= limit { 1 } else { total / limit };

    (0..take)
        .map(|n| {
            let mut rest = n.saturating_mul(stride);
            pools
                .iter()
                .map(|pool| {
                    let v = pool[rest % pool.len()].clone();
                    rest /= pool.len();
                    v
                })
                .collect()
        })
        .collect()
}
