//! Typed crossover and mutation.
//!
//! Every operator preserves the type of the subterm it touches, so
//! offspring of well-typed parents stay well-typed.

use maple_synth_types::{Expression, Path, Type};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::generate::{Method, TreeGenerator};

/// Mutation operators, chosen uniformly when a mutation fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Swap one node for a same-signature primitive or same-type terminal.
    Point,
    /// Regenerate a random subtree of the same type.
    Subtree,
    /// Replace the individual with one of its own subtrees of the root type.
    Hoist,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [Self::Point, Self::Subtree, Self::Hoist];
}

/// Subterm paths with their inferred types. Subterms that fail to type
/// are skipped.
pub fn typed_subterms(expr: &Expression, generator: &TreeGenerator<'_>, inputs: &[Type]) -> Vec<(Path, Type)> {
    expr.subterms()
        .into_iter()
        .filter_map(|(path, sub)| {
            sub.infer_type(generator.table(), inputs)
                .ok()
                .map(|ty| (path, ty))
        })
        .collect()
}

/// Swap a random pair of same-typed subtrees between `a` and `b`.
///
/// The pair is drawn from every type-compatible (`a`, `b`) position pair;
/// the parents come back unchanged only when no such pair exists.
pub fn crossover(
    a: &Expression,
    b: &Expression,
    generator: &TreeGenerator<'_>,
    inputs: &[Type],
    rng: &mut impl Rng,
) -> (Expression, Expression) {
    let points_b = typed_subterms(b, generator, inputs);
    let pairs: Vec<(Path, &Path)> = typed_subterms(a, generator, inputs)
        .into_iter()
        .flat_map(|(path_a, ty)| {
            points_b
                .iter()
                .filter(move |(_, t)| *t == ty)
                .map(move |(path_b, _)| (path_a.clone(), path_b))
        })
        .collect();
    let Some((path_a, path_b)) = pairs.choose(rng) else {
        return (a.clone(), b.clone());
    };

    match (a.at(path_a), b.at(path_b)) {
        (Some(sub_a), Some(sub_b)) => (
            a.replace_at(path_a, sub_b.clone()),
            b.replace_at(path_b, sub_a.clone()),
        ),
        _ => (a.clone(), b.clone()),
    }
}

/// Apply one mutation of the given kind.
pub fn mutate(
    expr: &Expression,
    kind: MutationKind,
    generator: &TreeGenerator<'_>,
    inputs: &[Type],
    max_depth: usize,
    rng: &mut impl Rng,
) -> Expression {
    let points = typed_subterms(expr, generator, inputs);
    match kind {
        MutationKind::Point => {
            let Some((path, ty)) = points.choose(rng) else {
                return expr.clone();
            };
            let replacement = match expr.at(path) {
                Some(Expression::Apply { primitive, args }) => generator
                    .alternatives(*primitive)
                    .choose(rng)
                    .map(|alt| Expression::apply(*alt, args.clone())),
                Some(_) => generator.terminal(ty, rng),
                None => None,
            };
            match replacement {
                Some(r) => expr.replace_at(path, r),
                None => expr.clone(),
            }
        }
        MutationKind::Subtree => {
            let Some((path, ty)) = points.choose(rng) else {
                return expr.clone();
            };
            let budget = max_depth.saturating_sub(path.len());
            match generator.generate(ty, budget, Method::Grow, rng) {
                Some(sub) => expr.replace_at(path, sub),
                None => expr.clone(),
            }
        }
        MutationKind::Hoist => {
            let Some((_, root_ty)) = points.first() else {
                return expr.clone();
            };
            let inner: Vec<&Path> = points
                .iter()
                .skip(1)
                .filter(|(_, t)| t == root_ty)
                .map(|(p, _)| p)
                .collect();
            match inner.choose(rng).and_then(|p| expr.at(p)) {
                Some(sub) => sub.clone(),
                None => expr.clone(),
            }
        }
    }
}
