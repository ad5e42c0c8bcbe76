//! Random well-typed tree construction.

use std::collections::BTreeMap;

use maple_synth_types::{terminals, Expression, PrimitiveId, PrimitiveTable, Type};
use rand::seq::SliceRandom;
use rand::Rng;

/// Tree-building method for a new individual or subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Leaves may appear at any depth.
    Grow,
    /// Interior nodes down to the depth limit wherever the types allow.
    Full,
}

/// Builds random expressions of a requested type from the terminals of
/// one problem and the producers in a primitive table.
pub struct TreeGenerator<'t> {
    table: &'t dyn PrimitiveTable,
    terminals: BTreeMap<Type, Vec<Expression>>,
    producers: BTreeMap<Type, Vec<PrimitiveId>>,
}

impl<'t> TreeGenerator<'t> {
    pub fn new(table: &'t dyn PrimitiveTable, inputs: &[Type], int_constants: &[i64]) -> Self {
        let mut by_type: BTreeMap<Type, Vec<Expression>> = BTreeMap::new();
        for (expr, ty) in terminals(table, inputs, int_constants) {
            by_type.entry(ty).or_default().push(expr);
        }
        let mut producers: BTreeMap<Type, Vec<PrimitiveId>> = BTreeMap::new();
        for p in table.primitives() {
            producers.entry(p.signature.ret.clone()).or_default().push(p.id);
        }
        Self {
            table,
            terminals: by_type,
            producers,
        }
    }

    pub fn table(&self) -> &'t dyn PrimitiveTable {
        self.table
    }

    /// A random tree of type `ty` with depth at most `depth`, or `None`
    /// when the vocabulary cannot produce that type within the bound.
    pub fn generate(&self, ty: &Type, depth: usize, method: Method, rng: &mut impl Rng) -> Option<Expression> {
        let leaves = self.terminals_of(ty);
        let producers = self.producers.get(ty).map(Vec::as_slice).unwrap_or(&[]);

        let leaf_first = depth == 0
            || producers.is_empty()
            || (method == Method::Grow
                && !leaves.is_empty()
                && rng.gen_bool(leaves.len() as f64 / (leaves.len() + producers.len()) as f64));
        if leaf_first {
            if let Some(leaf) = leaves.choose(rng) {
                return Some(leaf.clone());
            }
            if depth == 0 {
                return None;
            }
        }

        let mut order = producers.to_vec();
        order.shuffle(rng);
        'producers: for id in order {
            let Some(prim) = self.table.get(id) else {
                continue;
            };
            let mut args = Vec::with_capacity(prim.arity());
            for param in &prim.signature.params {
                match self.generate(param, depth - 1, method, rng) {
                    Some(arg) => args.push(arg),
                    None => continue 'producers,
                }
            }
            return Some(Expression::apply(id, args));
        }
        leaves.choose(rng).cloned()
    }

    /// A random terminal of type `ty`.
    pub fn terminal(&self, ty: &Type, rng: &mut impl Rng) -> Option<Expression> {
        self.terminals_of(ty).choose(rng).cloned()
    }

    pub fn terminals_of(&self, ty: &Type) -> &[Expression] {
        self.terminals.get(ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Primitives other than `id` with exactly the same signature.
    pub fn alternatives(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        let Some(prim) = self.table.get(id) else {
            return Vec::new();
        };
        self.producers
            .get(&prim.signature.ret)
            .into_iter()
            .flatten()
            .copied()
            .filter(|other| *other != id)
            .filter(|other| {
                self.table
                    .get(*other)
                    .is_some_and(|p| p.signature == prim.signature)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple_synth_types::builtin_table;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_trees_are_well_typed_and_bounded() {
        let table = builtin_table();
        let generator = TreeGenerator::new(&table, &[Type::Int, Type::Int], &[0, 1, 2]);
        let mut rng = StdRng::seed_from_u64(7);
        for depth in 0..=3 {
            for method in [Method::Grow, Method::Full] {
                for _ in 0..50 {
                    let e = generator.generate(&Type::Int, depth, method, &mut rng).unwrap();
                    assert!(e.depth() <= depth);
                    assert_eq!(e.infer_type(&table, &[Type::Int, Type::Int]).unwrap(), Type::Int);
                }
            }
        }
    }

    #[test]
    fn full_method_reaches_depth_when_possible() {
        let table = builtin_table();
        let generator = TreeGenerator::new(&table, &[Type::Int], &[1]);
        let mut rng = StdRng::seed_from_u64(1);
        let e = generator.generate(&Type::Int, 2, Method::Full, &mut rng).unwrap();
        assert_eq!(e.depth(), 2);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let table = builtin_table();
        let generator = TreeGenerator::new(&table, &[Type::Int], &[0, 1, 2]);
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10)
                .map(|_| generator.generate(&Type::Int, 3, Method::Grow, &mut rng))
                .collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10)
                .map(|_| generator.generate(&Type::Int, 3, Method::Grow, &mut rng))
                .collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn alternatives_share_signature() {
        let table = builtin_table();
        let generator = TreeGenerator::new(&table, &[Type::Int], &[0]);
        let add = table.find("add").unwrap().id;
        let alts = generator.alternatives(add);
        assert!(alts.contains(&table.find("mul").unwrap().id));
        assert!(!alts.contains(&add));
        assert!(!alts.contains(&table.find("eq").unwrap().id));
    }

    #[test]
    fn ungenerable_type_yields_none() {
        let table = builtin_table();
        let generator = TreeGenerator::new(&table, &[Type::Int], &[0]);
        let mut rng = StdRng::seed_from_u64(3);
        let pred = Type::func(vec![Type::Int], Type::Bool);
        assert!(generator.generate(&pred, 0, Method::Grow, &mut rng).is_none());
    }
}
