//! Primitives: fixed-arity named operations with declared signatures.
//!
//! A [`Primitive`] is immutable once registered. Builtins carry a closed
//! [`Builtin`] evaluation rule; learned primitives carry the expression
//! they were promoted from, with `Variable(i)` bound to argument `i`.

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::value::Type;

// ── Identifiers ─────────────────────────────────────────────────────

/// Stable arena index of a primitive inside a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimitiveId(pub u32);

impl PrimitiveId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prim#{}", self.0)
    }
}

// ── Signatures ──────────────────────────────────────────────────────

/// Declared argument and result types of a primitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_first_order(&self) -> bool {
        self.params.iter().all(Type::is_first_order) && self.ret.is_first_order()
    }

    /// The function type a closure over this primitive has.
    pub fn as_type(&self) -> Type {
        Type::func(self.params.clone(), self.ret.clone())
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_type())
    }
}

// ── Builtins ────────────────────────────────────────────────────────

/// The seed operations every registry starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Eq,
    Lt,
    Gt,
    And,
    Or,
    Not,
    If,
    Identity,
    Compose,
    Fix,
    Map,
    Filter,
    Fold,
    Head,
    Tail,
    Cons,
    Length,
}

impl Builtin {
    /// All builtins in registration order.
    pub fn all() -> &'static [Builtin] {
        &[
            Builtin::Add,
            Builtin::Sub,
            Builtin::Mul,
            Builtin::Div,
            Builtin::Mod,
            Builtin::Neg,
            Builtin::Eq,
            Builtin::Lt,
            Builtin::Gt,
            Builtin::And,
            Builtin::Or,
            Builtin::Not,
            Builtin::If,
            Builtin::Identity,
            Builtin::Compose,
            Builtin::Fix,
            Builtin::Map,
            Builtin::Filter,
            Builtin::Fold,
            Builtin::Head,
            Builtin::Tail,
            Builtin::Cons,
            Builtin::Length,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::If => "if",
            Self::Identity => "identity",
            Self::Compose => "compose",
            Self::Fix => "fix",
            Self::Map => "map",
            Self::Filter => "filter",
            Self::Fold => "fold",
            Self::Head => "head",
            Self::Tail => "tail",
            Self::Cons => "cons",
            Self::Length => "length",
        }
    }

    pub fn signature(self) -> Signature {
        use Type::{Bool, Int, List};
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod => {
                Signature::new(vec![Int, Int], Int)
            }
            Self::Neg | Self::Identity => Signature::new(vec![Int], Int),
            Self::Eq | Self::Lt | Self::Gt => Signature::new(vec![Int, Int], Bool),
            Self::And | Self::Or => Signature::new(vec![Bool, Bool], Bool),
            Self::Not => Signature::new(vec![Bool], Bool),
            Self::If => Signature::new(vec![Bool, Int, Int], Int),
            Self::Compose => Signature::new(
                vec![Type::int_unary(), Type::int_unary()],
                Type::int_unary(),
            ),
            Self::Fix => Signature::new(vec![Type::int_unary(), Int], Int),
            Self::Map => Signature::new(vec![Type::int_unary(), List], List),
            Self::Filter => Signature::new(vec![Type::func(vec![Int], Bool), List], List),
            Self::Fold => Signature::new(
                vec![Type::func(vec![Int, Int], Int), Int, List],
                Int,
            ),
            Self::Head => Signature::new(vec![List], Int),
            Self::Tail => Signature::new(vec![List], List),
            Self::Cons => Signature::new(vec![Int, List], List),
            Self::Length => Signature::new(vec![List], Int),
        }
    }

    /// Weight contributed to an expression's size.
    pub fn cost(self) -> u32 {
        match self {
            Self::If | Self::Compose | Self::Map | Self::Filter | Self::Fold => 2,
            Self::Fix => 3,
            _ => 1,
        }
    }

    pub fn is_conditional(self) -> bool {
        matches!(self, Self::If)
    }

    pub fn is_fixpoint(self) -> bool {
        matches!(self, Self::Fix)
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ── Primitive ───────────────────────────────────────────────────────

/// How a primitive computes its result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveRule {
    Builtin(Builtin),
    /// A promoted program; `Variable(i)` refers to argument `i`.
    Learned { body: Expression },
}

/// A named, fixed-arity operation available to the synthesizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub name: String,
    pub signature: Signature,
    pub rule: PrimitiveRule,
    /// Weight contributed to an expression's size.
    pub cost: u32,
}

impl Primitive {
    pub fn builtin(id: PrimitiveId, builtin: Builtin) -> Self {
        Self {
            id,
            name: builtin.name().to_string(),
            signature: builtin.signature(),
            rule: PrimitiveRule::Builtin(builtin),
            cost: builtin.cost(),
        }
    }

    pub fn learned(
        id: PrimitiveId,
        name: impl Into<String>,
        signature: Signature,
        body: Expression,
        cost: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            rule: PrimitiveRule::Learned { body },
            cost: cost.max(1),
        }
    }

    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    pub fn as_builtin(&self) -> Option<Builtin> {
        match &self.rule {
            PrimitiveRule::Builtin(b) => Some(*b),
            PrimitiveRule::Learned { .. } => None,
        }
    }

    pub fn is_learned(&self) -> bool {
        matches!(self.rule, PrimitiveRule::Learned { .. })
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.name, self.signature)
    }
}

// ── Table Trait ─────────────────────────────────────────────────────

/// Read access to an arena of primitives indexed by [`PrimitiveId`].
///
/// Search and evaluation only ever see a table by reference, so callers
/// can hand in an isolated registry or a per-request snapshot.
pub trait PrimitiveTable {
    fn get(&self, id: PrimitiveId) -> Option<&Primitive>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primitives in registration order.
    fn primitives(&self) -> Box<dyn Iterator<Item = &Primitive> + '_> {
        Box::new((0..self.len()).filter_map(move |i| self.get(PrimitiveId(i as u32))))
    }

    fn find(&self, name: &str) -> Option<&Primitive> {
        self.primitives().find(|p| p.name == name)
    }
}

impl PrimitiveTable for [Primitive] {
    fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        <[Primitive]>::get(self, id.index())
    }

    fn len(&self) -> usize {
        <[Primitive]>::len(self)
    }
}

impl PrimitiveTable for Vec<Primitive> {
    fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.as_slice().get(id.index())
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// The builtin set as a plain vector, in registration order.
pub fn builtin_table() -> Vec<Primitive> {
    Builtin::all()
        .iter()
        .enumerate()
        .map(|(i, b)| Primitive::builtin(PrimitiveId(i as u32), *b))
        .collect()
}
