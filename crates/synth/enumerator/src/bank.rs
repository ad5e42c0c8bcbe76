//! Arena of retained candidates, indexed by result type and size.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use maple_synth_types::{Expression, PrimitiveId, Type, Value};

/// How a retained candidate was built. Children are arena indices.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Expression),
    Apply {
        primitive: PrimitiveId,
        children: Vec<usize>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub node: Node,
    pub ty: Type,
    pub size: usize,
    /// One output per example.
    pub outputs: Arc<[Value]>,
}

/// Retained candidates plus the set of output vectors already claimed.
///
/// The first candidate to produce a given output vector keeps it; every
/// later one is observationally equivalent on the examples and dropped.
#[derive(Debug, Default)]
pub(crate) struct Bank {
    entries: Vec<Entry>,
    by_type_size: HashMap<(Type, usize), Vec<usize>>,
    seen: HashSet<Arc<[Value]>>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, index: usize) -> &Entry {
        &self.entries[index]
    }

    /// Retained entries of exactly this type and size, in insertion order.
    pub fn of(&self, ty: &Type, size: usize) -> &[usize] {
        self.by_type_size
            .get(&(ty.clone(), size))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Insert unless an equivalent entry exists. Returns the new index.
    pub fn insert(&mut self, entry: Entry) -> Option<usize> {
        if self.seen.contains(&entry.outputs) {
            return None;
        }
        let index = self.entries.len();
        self.seen.insert(Arc::clone(&entry.outputs));
        self.by_type_size
            .entry((entry.ty.clone(), entry.size))
            .or_default()
            .push(index);
        self.entries.push(entry);
        Some(index)
    }

    /// Rebuild the expression tree rooted at `index`.
    pub fn expression(&self, index: usize) -> Expression {
        match &self.entries[index].node {
            Node::Leaf(e) => e.clone(),
            Node::Apply {
                primitive,
                children,
            } => Expression::apply(
                *primitive,
                children.iter().map(|c| self.expression(*c)).collect(),
            ),
        }
    }
}

/// Ordered ways to write `total` as `parts` positive summands, in
/// lexicographic order. `parts == 0` yields one empty split for `total == 0`.
pub(crate) fn compositions(total: usize, parts: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(parts);
    compose_into(total, parts, &mut current, &mut out);
    out
}

fn compose_into(remaining: usize, parts: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if parts == 0 {
        if remaining == 0 {
            out.push(current.clone());
        }
        return;
    }
    if remaining < parts {
        return;
    }
    for first in 1..=remaining - (parts - 1) {
        current.push(first);
        compose_into(remaining - first, parts - 1, current, out);
        current.pop();
    }
}
