//! Typed expression trees over a primitive table.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::primitive::{PrimitiveId, PrimitiveTable};
use crate::value::{Closure, Type, Value};

/// Position of a subterm: child indices from the root.
pub type Path = Vec<usize>;

/// A program: literals, input variables and primitive applications.
///
/// Invariant for well-formed trees: `args.len()` equals the primitive's
/// arity and every argument has the declared parameter type. Trees built
/// through [`Expression::checked_apply`] are checked on construction; the
/// search strategies build trees type-directed and skip the check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Literal(Value),
    Variable(usize),
    Apply {
        primitive: PrimitiveId,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn int(v: i64) -> Self {
        Self::Literal(Value::Int(v))
    }

    pub fn bool(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }

    pub fn var(index: usize) -> Self {
        Self::Variable(index)
    }

    /// Unapplied primitive used as a function argument.
    pub fn func(primitive: PrimitiveId) -> Self {
        Self::Literal(Value::Func(Closure::Primitive(primitive)))
    }

    pub fn apply(primitive: PrimitiveId, args: Vec<Expression>) -> Self {
        Self::Apply { primitive, args }
    }

    /// Build an application, rejecting ill-typed arguments.
    pub fn checked_apply(
        table: &dyn PrimitiveTable,
        inputs: &[Type],
        primitive: PrimitiveId,
        args: Vec<Expression>,
    ) -> SynthResult<Self> {
        let expr = Self::apply(primitive, args);
        expr.infer_type(table, inputs)?;
        Ok(expr)
    }

    // ── Shape ───────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Variable(_) => 1,
            Self::Apply { args, .. } => 1 + args.iter().map(Self::node_count).sum::<usize>(),
        }
    }

    /// Depth of the tree; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Variable(_) => 0,
            Self::Apply { args, .. } => 1 + args.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Node count weighted by primitive cost. Leaves weigh 1.
    pub fn size(&self, table: &dyn PrimitiveTable) -> usize {
        match self {
            Self::Literal(_) | Self::Variable(_) => 1,
            Self::Apply { primitive, args } => {
                let cost = table.get(*primitive).map(|p| p.cost).unwrap_or(1) as usize;
                cost + args.iter().map(|a| a.size(table)).sum::<usize>()
            }
        }
    }

    /// Highest variable index referenced, if any.
    pub fn max_variable(&self) -> Option<usize> {
        match self {
            Self::Literal(_) => None,
            Self::Variable(i) => Some(*i),
            Self::Apply { args, .. } => args.iter().filter_map(Self::max_variable).max(),
        }
    }

    /// Whether any application in the tree satisfies `pred`.
    pub fn any_application(&self, pred: &mut dyn FnMut(PrimitiveId) -> bool) -> bool {
        match self {
            Self::Literal(Value::Func(c)) => closure_any(c, pred),
            Self::Literal(_) | Self::Variable(_) => false,
            Self::Apply { primitive, args } => {
                pred(*primitive) || args.iter().any(|a| a.any_application(pred))
            }
        }
    }

    // ── Subterms ────────────────────────────────────────────────────

    /// All subterms in pre-order, paired with their paths.
    pub fn subterms(&self) -> Vec<(Path, &Expression)> {
        let mut out = Vec::new();
        self.collect_subterms(&mut Vec::new(), &mut out);
        out
    }

    fn collect_subterms<'a>(&'a self, path: &mut Path, out: &mut Vec<(Path, &'a Expression)>) {
        out.push((path.clone(), self));
        if let Self::Apply { args, .. } = self {
            for (i, arg) in args.iter().enumerate() {
                path.push(i);
                arg.collect_subterms(path, out);
                path.pop();
            }
        }
    }

    pub fn at(&self, path: &[usize]) -> Option<&Expression> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => match self {
                Self::Apply { args, .. } => args.get(*first)?.at(rest),
                _ => None,
            },
        }
    }

    /// Copy of the tree with the subterm at `path` replaced.
    /// An invalid path leaves the tree unchanged.
    pub fn replace_at(&self, path: &[usize], replacement: Expression) -> Expression {
        match path.split_first() {
            None => replacement,
            Some((first, rest)) => match self {
                Self::Apply { primitive, args } if *first < args.len() => {
                    let mut args = args.clone();
                    args[*first] = args[*first].replace_at(rest, replacement);
                    Self::Apply {
                        primitive: *primitive,
                        args,
                    }
                }
                _ => self.clone(),
            },
        }
    }

    // ── Typing ──────────────────────────────────────────────────────

    /// Infer the result type, checking every application against its
    /// declared signature.
    pub fn infer_type(&self, table: &dyn PrimitiveTable, inputs: &[Type]) -> SynthResult<Type> {
        match self {
            Self::Literal(Value::Func(c)) => closure_type(c, table),
            Self::Literal(v) => v
                .first_order_type()
                .ok_or_else(|| SynthError::TypeMismatch(format!("untyped literal {}", v))),
            Self::Variable(i) => inputs.get(*i).cloned().ok_or_else(|| {
                SynthError::TypeMismatch(format!(
                    "variable x{} out of range for {} inputs",
                    i,
                    inputs.len()
                ))
            }),
            Self::Apply { primitive, args } => {
                let prim = table
                    .get(*primitive)
                    .ok_or(SynthError::UnknownPrimitive(*primitive))?;
                if args.len() != prim.arity() {
                    return Err(SynthError::TypeMismatch(format!(
                        "{} expects {} arguments, got {}",
                        prim.name,
                        prim.arity(),
                        args.len()
                    )));
                }
                for (i, (arg, expected)) in args.iter().zip(&prim.signature.params).enumerate() {
                    let actual = arg.infer_type(table, inputs)?;
                    if &actual != expected {
                        return Err(SynthError::TypeMismatch(format!(
                            "{} argument {} expects {}, got {}",
                            prim.name, i, expected, actual
                        )));
                    }
                }
                Ok(prim.signature.ret.clone())
            }
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Human-readable rendering, e.g. `add(x0, 1)`.
    pub fn render(&self, table: &dyn PrimitiveTable) -> String {
        match self {
            Self::Literal(Value::Func(c)) => render_closure(c, table),
            Self::Literal(v) => v.to_string(),
            Self::Variable(i) => format!("x{}", i),
            Self::Apply { primitive, args } => {
                let args: Vec<String> = args.iter().map(|a| a.render(table)).collect();
                format!("{}({})", primitive_name(*primitive, table), args.join(", "))
            }
        }
    }
}

/// Type of a function value.
pub fn closure_type(closure: &Closure, table: &dyn PrimitiveTable) -> SynthResult<Type> {
    match closure {
        Closure::Primitive(id) => table
            .get(*id)
            .map(|p| p.signature.as_type())
            .ok_or(SynthError::UnknownPrimitive(*id)),
        Closure::Compose(outer, inner) => {
            let outer_ty = closure_type(outer, table)?;
            let inner_ty = closure_type(inner, table)?;
            match (outer_ty, inner_ty) {
                (
                    Type::Func {
                        params: outer_params,
                        ret: outer_ret,
                    },
                    Type::Func {
                        params: inner_params,
                        ret: inner_ret,
                    },
                ) if outer_params.len() == 1 && outer_params[0] == *inner_ret => {
                    Ok(Type::Func {
                        params: inner_params,
                        ret: outer_ret,
                    })
                }
                (o, i) => Err(SynthError::TypeMismatch(format!(
                    "cannot compose {} after {}",
                    o, i
                ))),
            }
        }
    }
}

fn closure_any(closure: &Closure, pred: &mut dyn FnMut(PrimitiveId) -> bool) -> bool {
    match closure {
        Closure::Primitive(id) => pred(*id),
        Closure::Compose(outer, inner) => closure_any(outer, pred) || closure_any(inner, pred),
    }
}

fn primitive_name(id: PrimitiveId, table: &dyn PrimitiveTable) -> String {
    table
        .get(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn render_closure(closure: &Closure, table: &dyn PrimitiveTable) -> String {
    match closure {
        Closure::Primitive(id) => primitive_name(*id, table),
        Closure::Compose(outer, inner) => format!(
            "compose({}, {})",
            render_closure(outer, table),
            render_closure(inner, table)
        ),
    }
}
