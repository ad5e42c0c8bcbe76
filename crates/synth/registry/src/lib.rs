#![deny(unsafe_code)]
//! # maple-synth-registry
//!
//! The capability registry: an append-only arena of [`Primitive`]s
//! indexed by stable [`PrimitiveId`]. It is seeded with the builtin set
//! and grows only through [`CapabilityRegistry::register`], which refuses
//! programs that behave like an existing primitive on a fixed probe set.
//!
//! Searches never hold the registry itself; they take a
//! [`RegistrySnapshot`], which is cheap to clone and unaffected by later
//! registrations.

use std::sync::Arc;

use maple_synth_types::{
    probe_inputs, Builtin, EvalLimits, Evaluator, Expression, Primitive, PrimitiveId,
    PrimitiveRule, PrimitiveTable, Signature, SynthError, SynthResult, Value,
};
use tracing::{debug, info};

/// Default number of probe tuples used to tell primitives apart.
pub const DEFAULT_PROBE_LIMIT: usize = 64;

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The program was appended under a fresh id.
    Admitted(PrimitiveId),
    /// An existing primitive already behaves identically; nothing changed.
    Duplicate { existing: PrimitiveId },
}

impl RegistrationOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    pub fn id(&self) -> PrimitiveId {
        match self {
            Self::Admitted(id) | Self::Duplicate { existing: id } => *id,
        }
    }
}

/// Append-only store of synthesis primitives.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    primitives: Vec<Arc<Primitive>>,
    builtin_count: usize,
    probe_limit: usize,
    limits: EvalLimits,
}

impl CapabilityRegistry {
    /// Registry seeded with every builtin, in registration order.
    pub fn with_builtins() -> Self {
        Self::from_builtins(Builtin::all())
    }

    /// Registry seeded with a chosen subset of builtins. Useful for
    /// isolated searches over a restricted vocabulary.
    pub fn from_builtins(builtins: &[Builtin]) -> Self {
        let primitives: Vec<Arc<Primitive>> = builtins
            .iter()
            .enumerate()
            .map(|(i, b)| Arc::new(Primitive::builtin(PrimitiveId(i as u32), *b)))
            .collect();
        let builtin_count = primitives.len();
        Self {
            primitives,
            builtin_count,
            probe_limit: DEFAULT_PROBE_LIMIT,
            limits: EvalLimits::default(),
        }
    }

    /// A registry with no primitives at all.
    pub fn empty() -> Self {
        Self::from_builtins(&[])
    }

    pub fn with_probe_limit(mut self, probe_limit: usize) -> Self {
        self.probe_limit = probe_limit.max(1);
        self
    }

    pub fn with_eval_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Number of seed primitives.
    pub fn builtin_count(&self) -> usize {
        self.builtin_count
    }

    /// Primitives admitted after seeding, in admission order.
    pub fn learned(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.primitives[self.builtin_count..].iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.primitives.iter().map(|p| p.name.clone()).collect()
    }

    /// Frozen view for one request.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            primitives: self.primitives.clone().into(),
        }
    }

    /// Frozen view of the seed primitives alone, without anything learned.
    pub fn seed_snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            primitives: self.primitives[..self.builtin_count].to_vec().into(),
        }
    }

    /// Append `body` as a new primitive named `name`.
    ///
    /// `body` refers to argument `i` as `Variable(i)` and must type-check
    /// against `signature`. Returns [`RegistrationOutcome::Duplicate`]
    /// without modifying the registry when an existing primitive with the
    /// same signature is indistinguishable on the probe set.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        body: Expression,
        cost: u32,
    ) -> SynthResult<RegistrationOutcome> {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(SynthError::DuplicateName(name));
        }
        let actual = body.infer_type(&*self, &signature.params)?;
        if actual != signature.ret {
            return Err(SynthError::TypeMismatch(format!(
                "{} body returns {}, declared {}",
                name, actual, signature.ret
            )));
        }

        if let Some(existing) = self.find_equivalent(&signature, &body) {
            debug!(
                name = %name,
                existing = %self.primitives[existing.index()].name,
                "Capability is a semantic duplicate"
            );
            return Ok(RegistrationOutcome::Duplicate { existing });
        }

        let id = PrimitiveId(self.primitives.len() as u32);
        let primitive = Primitive::learned(id, name, signature, body, cost);
        info!(
            id = %id,
            capability = %primitive,
            body = %primitive_body(&primitive, &*self),
            "Capability admitted"
        );
        self.primitives.push(Arc::new(primitive));
        Ok(RegistrationOutcome::Admitted(id))
    }

    /// An existing primitive with `signature` that agrees with `body` on
    /// every probe input, counting matching failures as agreement.
    pub fn find_equivalent(&self, signature: &Signature, body: &Expression) -> Option<PrimitiveId> {
        let probes = probe_inputs(&signature.params, self.probe_limit);
        let evaluator = Evaluator::new(self, self.limits);
        let candidate: Vec<Option<Value>> = probes
            .iter()
            .map(|args| evaluator.eval(body, args).ok())
            .collect();

        self.primitives
            .iter()
            .filter(|p| p.signature == *signature)
            .find(|p| {
                if probes.is_empty() {
                    // Nothing to probe with; fall back to structural identity.
                    return matches!(&p.rule, PrimitiveRule::Learned { body: b } if b == body);
                }
                probes
                    .iter()
                    .zip(&candidate)
                    .all(|(args, expected)| evaluator.apply(p.id, args.clone()).ok() == *expected)
            })
            .map(|p| p.id)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PrimitiveTable for CapabilityRegistry {
    fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id.index()).map(|p| p.as_ref())
    }

    fn len(&self) -> usize {
        self.primitives.len()
    }
}

/// Immutable view of the registry at one point in time.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    primitives: Arc<[Arc<Primitive>]>,
}

impl RegistrySnapshot {
    /// Copy of every primitive, e.g. for persistence by the caller.
    pub fn export(&self) -> Vec<Primitive> {
        self.primitives.iter().map(|p| p.as_ref().clone()).collect()
    }
}

impl PrimitiveTable for RegistrySnapshot {
    fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id.index()).map(|p| p.as_ref())
    }

    fn len(&self) -> usize {
        self.primitives.len()
    }
}

fn primitive_body(primitive: &Primitive, table: &dyn PrimitiveTable) -> String {
    match &primitive.rule {
        PrimitiveRule::Learned { body } => body.render(table),
        PrimitiveRule::Builtin(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple_synth_types::Type;

    fn id(registry: &CapabilityRegistry, name: &str) -> PrimitiveId {
        registry.find(name).unwrap().id
    }

    fn square(registry: &CapabilityRegistry) -> Expression {
        let mul = id(registry, "mul");
        Expression::apply(mul, vec![Expression::var(0), Expression::var(0)])
    }

    fn int_unary() -> Signature {
        Signature::new(vec![Type::Int], Type::Int)
    }

    #[test]
    fn seeded_with_builtins() {
        let registry = CapabilityRegistry::with_builtins();
        assert_eq!(registry.len(), Builtin::all().len());
        assert_eq!(registry.builtin_count(), registry.len());
        assert_eq!(registry.learned().count(), 0);
        assert_eq!(registry.names()[0], "add");
    }

    #[test]
    fn restricted_seed() {
        let registry = CapabilityRegistry::from_builtins(&[Builtin::Add, Builtin::Neg]);
        assert_eq!(registry.len(), 2);
        assert_eq!(id(&registry, "neg"), PrimitiveId(1));
        assert!(CapabilityRegistry::empty().is_empty());
    }

    #[test]
    fn register_admits_new_behaviour() {
        let mut registry = CapabilityRegistry::with_builtins();
        let body = square(&registry);
        let outcome = registry.register("square", int_unary(), body, 1).unwrap();
        assert!(outcome.is_admitted());
        assert_eq!(outcome.id().index(), Builtin::all().len());
        assert_eq!(registry.learned().count(), 1);

        let evaluator = Evaluator::new(&registry, EvalLimits::default());
        let v = evaluator.apply(outcome.id(), vec![Value::Int(7)]).unwrap();
        assert_eq!(v, Value::Int(49));
    }

    #[test]
    fn register_semantic_duplicate_is_noop() {
        let mut registry = CapabilityRegistry::with_builtins();
        let body = square(&registry);
        registry.register("square", int_unary(), body, 1).unwrap();
        let before = registry.len();

        // x * x written the other way round behaves identically.
        let mul = id(&registry, "mul");
        let same = Expression::apply(
            mul,
            vec![Expression::var(0), Expression::apply(id(&registry, "identity"), vec![Expression::var(0)])],
        );
        let outcome = registry.register("square_again", int_unary(), same, 1).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Duplicate { existing: id(&registry, "square") });
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn duplicate_of_builtin_detected() {
        let mut registry = CapabilityRegistry::with_builtins();
        let neg = id(&registry, "neg");
        let negate = Expression::apply(
            id(&registry, "sub"),
            vec![Expression::int(0), Expression::var(0)],
        );
        let outcome = registry.register("negate", int_unary(), negate, 1).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Duplicate { existing: neg });
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut registry = CapabilityRegistry::with_builtins();
        let err = registry
            .register("add", int_unary(), Expression::var(0), 1)
            .unwrap_err();
        assert!(matches!(err, SynthError::DuplicateName(ref n) if n == "add"));
    }

    #[test]
    fn ill_typed_body_rejected() {
        let mut registry = CapabilityRegistry::with_builtins();
        let body = Expression::apply(id(&registry, "not"), vec![Expression::var(0)]);
        let err = registry.register("bad", int_unary(), body, 1).unwrap_err();
        assert!(matches!(err, SynthError::TypeMismatch(_)));

        let body = Expression::apply(id(&registry, "eq"), vec![Expression::var(0), Expression::int(0)]);
        let err = registry.register("bad2", int_unary(), body, 1).unwrap_err();
        assert!(matches!(err, SynthError::TypeMismatch(ref m) if m.contains("declared int")));
    }

    #[test]
    fn snapshot_is_isolated_from_later_growth() {
        let mut registry = CapabilityRegistry::with_builtins();
        let snapshot = registry.snapshot();
        let body = square(&registry);
        registry.register("square", int_unary(), body, 1).unwrap();
        assert_eq!(snapshot.len(), Builtin::all().len());
        assert!(snapshot.find("square").is_none());
        assert!(registry.snapshot().find("square").is_some());
        assert_eq!(registry.snapshot().export().len(), registry.len());
    }

    #[test]
    fn seed_snapshot_excludes_learned_primitives() {
        let mut registry = CapabilityRegistry::from_builtins(&[Builtin::Mul, Builtin::Add]);
        let body = square(&registry);
        registry.register("square", int_unary(), body, 1).unwrap();
        let seed = registry.seed_snapshot();
        assert_eq!(seed.len(), 2);
        assert!(seed.find("square").is_none());
        assert!(seed.find("mul").is_some());
        assert_eq!(registry.snapshot().len(), 3);
    }
}
