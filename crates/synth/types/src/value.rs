//! Runtime values and their static types.

use serde::{Deserialize, Serialize};

use crate::primitive::PrimitiveId;

// ── Types ───────────────────────────────────────────────────────────

/// Static type of an expression or primitive argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    /// A list of integers.
    List,
    Func { params: Vec<Type>, ret: Box<Type> },
}

impl Type {
    pub fn func(params: Vec<Type>, ret: Type) -> Self {
        Self::Func {
            params,
            ret: Box::new(ret),
        }
    }

    /// `Int -> Int`, the shape consumed by `map`, `fix` and `compose`.
    pub fn int_unary() -> Self {
        Self::func(vec![Type::Int], Type::Int)
    }

    pub fn is_first_order(&self) -> bool {
        !matches!(self, Self::Func { .. })
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::List => write!(f, "list"),
            Self::Func { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "({} -> {})", params.join(", "), ret)
            }
        }
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A function value: an unapplied primitive or a composition of two.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Closure {
    Primitive(PrimitiveId),
    /// `x ↦ outer(inner(x))`.
    Compose(Box<Closure>, Box<Closure>),
}

impl std::fmt::Display for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(id) => write!(f, "fn#{}", id.0),
            Self::Compose(outer, inner) => write!(f, "compose({}, {})", outer, inner),
        }
    }
}

/// A runtime value. Values are hashable so output vectors can key the
/// observational-equivalence table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    List(Vec<i64>),
    Func(Closure),
}

impl Value {
    /// Type of a first-order value. Function values need a primitive
    /// table to be typed and yield `None` here.
    pub fn first_order_type(&self) -> Option<Type> {
        match self {
            Self::Int(_) => Some(Type::Int),
            Self::Bool(_) => Some(Type::Bool),
            Self::List(_) => Some(Type::List),
            Self::Func(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            Self::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            Self::Func(c) => Some(c),
            _ => None,
        }
    }

    /// Integers carried by this value, used for value-range features.
    pub fn integers(&self) -> Vec<i64> {
        match self {
            Self::Int(v) => vec![*v],
            Self::List(xs) => xs.clone(),
            Self::Bool(_) | Self::Func(_) => Vec::new(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<i64>> for Value {
    fn from(xs: Vec<i64>) -> Self {
        Self::List(xs)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(xs) => {
                let items: Vec<String> = xs.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Func(c) => write!(f, "{}", c),
        }
    }
}
