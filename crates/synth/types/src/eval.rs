//! Expression evaluation with guarded primitives and bounded iteration.

use thiserror::Error;

use crate::expr::Expression;
use crate::primitive::{Builtin, PrimitiveId, PrimitiveRule, PrimitiveTable};
use crate::value::{Closure, Value};

/// Why an evaluation failed. These are data inside the search: a
/// candidate that fails on any example is discarded, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("empty list")]
    EmptyList,

    #[error("unbound variable x{0}")]
    UnboundVariable(usize),

    #[error("unknown primitive {0}")]
    UnknownPrimitive(PrimitiveId),

    #[error("value is not a function")]
    NotAFunction,

    #[error("{name} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("fixpoint not reached within {cap} iterations")]
    FixpointDiverged { cap: usize },

    #[error("call depth exceeded {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("type error: {0}")]
    TypeError(String),
}

impl EvalError {
    /// Whether the failure indicates a suspected non-terminating program
    /// rather than a domain error.
    pub fn is_non_termination(&self) -> bool {
        matches!(
            self,
            Self::FixpointDiverged { .. } | Self::CallDepthExceeded { .. }
        )
    }
}

/// Bounds applied during evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalLimits {
    /// Maximum iterations of a `fix` application.
    pub fix_iteration_cap: usize,
    /// Maximum nesting of closure and learned-primitive calls.
    pub max_call_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            fix_iteration_cap: 100,
            max_call_depth: 64,
        }
    }
}

/// Tree-walking evaluator over a primitive table.
///
/// `if` is non-strict here: only the taken branch is evaluated.
pub struct Evaluator<'t> {
    table: &'t dyn PrimitiveTable,
    limits: EvalLimits,
}

impl<'t> Evaluator<'t> {
    pub fn new(table: &'t dyn PrimitiveTable, limits: EvalLimits) -> Self {
        Self { table, limits }
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    pub fn table(&self) -> &'t dyn PrimitiveTable {
        self.table
    }

    /// Evaluate `expr` with `inputs` bound to `x0, x1, ...`.
    pub fn eval(&self, expr: &Expression, inputs: &[Value]) -> Result<Value, EvalError> {
        self.eval_at(expr, inputs, 0)
    }

    /// Apply a primitive to already-evaluated arguments.
    pub fn apply(&self, id: PrimitiveId, args: Vec<Value>) -> Result<Value, EvalError> {
        self.apply_at(id, args, 0)
    }

    /// Call a function value.
    pub fn call(&self, closure: &Closure, args: Vec<Value>) -> Result<Value, EvalError> {
        self.call_at(closure, args, 0)
    }

    /// Whether `id` names the builtin conditional.
    pub fn is_conditional(&self, id: PrimitiveId) -> bool {
        self.builtin_of(id).is_some_and(Builtin::is_conditional)
    }

    fn builtin_of(&self, id: PrimitiveId) -> Option<Builtin> {
        self.table.get(id).and_then(|p| p.as_builtin())
    }

    fn eval_at(&self, expr: &Expression, inputs: &[Value], depth: usize) -> Result<Value, EvalError> {
        match expr {
            Expression::Literal(v) => Ok(v.clone()),
            Expression::Variable(i) => inputs
                .get(*i)
                .cloned()
                .ok_or(EvalError::UnboundVariable(*i)),
            Expression::Apply { primitive, args } if self.is_conditional(*primitive) => {
                if args.len() != 3 {
                    return Err(EvalError::ArityMismatch {
                        name: "if".into(),
                        expected: 3,
                        actual: args.len(),
                    });
                }
                let cond = expect_bool(&self.eval_at(&args[0], inputs, depth)?)?;
                let branch = if cond { &args[1] } else { &args[2] };
                self.eval_at(branch, inputs, depth)
            }
            Expression::Apply { primitive, args } => {
                let values = args
                    .iter()
                    .map(|a| self.eval_at(a, inputs, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply_at(*primitive, values, depth)
            }
        }
    }

    fn apply_at(&self, id: PrimitiveId, args: Vec<Value>, depth: usize) -> Result<Value, EvalError> {
        if depth > self.limits.max_call_depth {
            return Err(EvalError::CallDepthExceeded {
                limit: self.limits.max_call_depth,
            });
        }
        let prim = self.table.get(id).ok_or(EvalError::UnknownPrimitive(id))?;
        if args.len() != prim.arity() {
            return Err(EvalError::ArityMismatch {
                name: prim.name.clone(),
                expected: prim.arity(),
                actual: args.len(),
            });
        }
        match &prim.rule {
            PrimitiveRule::Builtin(b) => self.apply_builtin(*b, args, depth),
            PrimitiveRule::Learned { body } => self.eval_at(body, &args, depth + 1),
        }
    }

    fn call_at(&self, closure: &Closure, args: Vec<Value>, depth: usize) -> Result<Value, EvalError> {
        match closure {
            Closure::Primitive(id) => self.apply_at(*id, args, depth + 1),
            Closure::Compose(outer, inner) => {
                let mid = self.call_at(inner, args, depth + 1)?;
                self.call_at(outer, vec![mid], depth + 1)
            }
        }
    }

    fn apply_builtin(&self, b: Builtin, args: Vec<Value>, depth: usize) -> Result<Value, EvalError> {
        use Builtin::*;
        let v = match b {
            Add => Value::Int(int(&args[0])?.checked_add(int(&args[1])?).ok_or(EvalError::Overflow)?),
            Sub => Value::Int(int(&args[0])?.checked_sub(int(&args[1])?).ok_or(EvalError::Overflow)?),
            Mul => Value::Int(int(&args[0])?.checked_mul(int(&args[1])?).ok_or(EvalError::Overflow)?),
            Div => {
                let (a, d) = (int(&args[0])?, int(&args[1])?);
                if d == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Int(a.checked_div(d).ok_or(EvalError::Overflow)?)
            }
            Mod => {
                let (a, d) = (int(&args[0])?, int(&args[1])?);
                if d == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Int(a.checked_rem_euclid(d).ok_or(EvalError::Overflow)?)
            }
            Neg => Value::Int(int(&args[0])?.checked_neg().ok_or(EvalError::Overflow)?),
            Eq => Value::Bool(int(&args[0])? == int(&args[1])?),
            Lt => Value::Bool(int(&args[0])? < int(&args[1])?),
            Gt => Value::Bool(int(&args[0])? > int(&args[1])?),
            And => Value::Bool(expect_bool(&args[0])? && expect_bool(&args[1])?),
            Or => Value::Bool(expect_bool(&args[0])? || expect_bool(&args[1])?),
            Not => Value::Bool(!expect_bool(&args[0])?),
            If => {
                let mut args = args;
                let otherwise = args.pop().ok_or(EvalError::NotAFunction)?;
                let then = args.pop().ok_or(EvalError::NotAFunction)?;
                if expect_bool(&args[0])? {
                    then
                } else {
                    otherwise
                }
            }
            Identity => Value::Int(int(&args[0])?),
            Compose => {
                let outer = closure(&args[0])?.clone();
                let inner = closure(&args[1])?.clone();
                Value::Func(Closure::Compose(Box::new(outer), Box::new(inner)))
            }
            Fix => {
                let f = closure(&args[0])?;
                let mut current = int(&args[1])?;
                for _ in 0..self.limits.fix_iteration_cap {
                    let next = int(&self.call_at(f, vec![Value::Int(current)], depth)?)?;
                    if next == current {
                        return Ok(Value::Int(current));
                    }
                    current = next;
                }
                return Err(EvalError::FixpointDiverged {
                    cap: self.limits.fix_iteration_cap,
                });
            }
            Map => {
                let f = closure(&args[0])?;
                let out = list(&args[1])?
                    .iter()
                    .map(|x| int(&self.call_at(f, vec![Value::Int(*x)], depth)?))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(out)
            }
            Filter => {
                let p = closure(&args[0])?;
                let mut out = Vec::new();
                for x in list(&args[1])? {
                    if expect_bool(&self.call_at(p, vec![Value::Int(*x)], depth)?)? {
                        out.push(*x);
                    }
                }
                Value::List(out)
            }
            Fold => {
                let f = closure(&args[0])?;
                let mut acc = int(&args[1])?;
                for x in list(&args[2])? {
                    acc = int(&self.call_at(f, vec![Value::Int(acc), Value::Int(*x)], depth)?)?;
                }
                Value::Int(acc)
            }
            Head => Value::Int(*list(&args[0])?.first().ok_or(EvalError::EmptyList)?),
            Tail => {
                let xs = list(&args[0])?;
                if xs.is_empty() {
                    return Err(EvalError::EmptyList);
                }
                Value::List(xs[1..].to_vec())
            }
            Cons => {
                let mut out = Vec::with_capacity(list(&args[1])?.len() + 1);
                out.push(int(&args[0])?);
                out.extend_from_slice(list(&args[1])?);
                Value::List(out)
            }
            Length => Value::Int(list(&args[0])?.len() as i64),
        };
        Ok(v)
    }
}

fn int(v: &Value) -> Result<i64, EvalError> {
    v.as_int()
        .ok_or_else(|| EvalError::TypeError(format!("expected int, got {}", v)))
}

fn expect_bool(v: &Value) -> Result<bool, EvalError> {
    v.as_bool()
        .ok_or_else(|| EvalError::TypeError(format!("expected bool, got {}", v)))
}

fn list(v: &Value) -> Result<&[i64], EvalError> {
    v.as_list()
        .ok_or_else(|| EvalError::TypeError(format!("expected list, got {}", v)))
}

fn closure(v: &Value) -> Result<&Closure, EvalError> {
    v.as_closure().ok_or(EvalError::NotAFunction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{builtin_table, Primitive, Signature};
    use crate::value::Type;

    fn id(name: &str) -> PrimitiveId {
        builtin_table().find(name).unwrap().id
    }

    fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::apply(id(name), args)
    }

    fn eval(expr: &Expression, inputs: &[Value]) -> Result<Value, EvalError> {
        let table = builtin_table();
        Evaluator::new(&table, EvalLimits::default()).eval(expr, inputs)
    }

    #[test]
    fn arithmetic() {
        let e = call("add", vec![Expression::var(0), Expression::int(1)]);
        assert_eq!(eval(&e, &[Value::Int(100)]).unwrap(), Value::Int(101));
        let e = call("mod", vec![Expression::int(-7), Expression::int(3)]);
        assert_eq!(eval(&e, &[]).unwrap(), Value::Int(2));
    }

    #[test]
    fn division_by_zero_is_guarded() {
        let e = call("div", vec![Expression::var(0), Expression::var(1)]);
        assert_eq!(
            eval(&e, &[Value::Int(4), Value::Int(0)]).unwrap_err(),
            EvalError::DivisionByZero
        );
        assert_eq!(eval(&e, &[Value::Int(9), Value::Int(2)]).unwrap(), Value::Int(4));
    }

    #[test]
    fn overflow_is_guarded() {
        let e = call("mul", vec![Expression::var(0), Expression::var(0)]);
        assert_eq!(eval(&e, &[Value::Int(i64::MAX)]).unwrap_err(), EvalError::Overflow);
    }

    #[test]
    fn if_is_lazy() {
        let guarded = call(
            "if",
            vec![
                call("eq", vec![Expression::var(0), Expression::int(0)]),
                Expression::int(0),
                call("div", vec![Expression::int(10), Expression::var(0)]),
            ],
        );
        assert_eq!(eval(&guarded, &[Value::Int(0)]).unwrap(), Value::Int(0));
        assert_eq!(eval(&guarded, &[Value::Int(5)]).unwrap(), Value::Int(2));
    }

    #[test]
    fn strict_if_through_apply() {
        let table = builtin_table();
        let ev = Evaluator::new(&table, EvalLimits::default());
        let v = ev
            .apply(id("if"), vec![Value::Bool(false), Value::Int(1), Value::Int(2)])
            .unwrap();
        assert_eq!(v, Value::Int(2));
    }

    #[test]
    fn list_operations() {
        let xs = Value::List(vec![3, 1, 2]);
        assert_eq!(eval(&call("head", vec![Expression::var(0)]), &[xs.clone()]).unwrap(), Value::Int(3));
        assert_eq!(
            eval(&call("tail", vec![Expression::var(0)]), &[xs.clone()]).unwrap(),
            Value::List(vec![1, 2])
        );
        assert_eq!(
            eval(&call("cons", vec![Expression::int(0), Expression::var(0)]), &[xs.clone()]).unwrap(),
            Value::List(vec![0, 3, 1, 2])
        );
        assert_eq!(eval(&call("length", vec![Expression::var(0)]), &[xs]).unwrap(), Value::Int(3));
        assert_eq!(
            eval(&call("head", vec![Expression::var(0)]), &[Value::List(vec![])]).unwrap_err(),
            EvalError::EmptyList
        );
    }

    #[test]
    fn higher_order_operations() {
        let xs = Value::List(vec![1, -2, 3]);
        let mapped = call("map", vec![Expression::func(id("neg")), Expression::var(0)]);
        assert_eq!(eval(&mapped, &[xs.clone()]).unwrap(), Value::List(vec![-1, 2, -3]));
        let folded = call(
            "fold",
            vec![Expression::func(id("add")), Expression::int(0), Expression::var(0)],
        );
        assert_eq!(eval(&folded, &[xs]).unwrap(), Value::Int(2));
    }

    #[test]
    fn compose_then_map() {
        let composed = call(
            "compose",
            vec![Expression::func(id("neg")), Expression::func(id("neg"))],
        );
        let mapped = call("map", vec![composed, Expression::var(0)]);
        let xs = Value::List(vec![4, 5]);
        assert_eq!(eval(&mapped, &[xs.clone()]).unwrap(), xs);
    }

    #[test]
    fn fix_reaches_fixpoint() {
        let e = call("fix", vec![Expression::func(id("identity")), Expression::var(0)]);
        assert_eq!(eval(&e, &[Value::Int(7)]).unwrap(), Value::Int(7));
    }

    #[test]
    fn fix_iteration_is_capped() {
        let e = call("fix", vec![Expression::func(id("neg")), Expression::var(0)]);
        let err = eval(&e, &[Value::Int(3)]).unwrap_err();
        assert_eq!(err, EvalError::FixpointDiverged { cap: 100 });
        assert!(err.is_non_termination());
        assert!(!EvalError::DivisionByZero.is_non_termination());
    }

    #[test]
    fn learned_primitive_binds_arguments() {
        let mut table = builtin_table();
        let square = Primitive::learned(
            PrimitiveId(table.len() as u32),
            "square",
            Signature::new(vec![Type::Int], Type::Int),
            Expression::apply(id("mul"), vec![Expression::var(0), Expression::var(0)]),
            1,
        );
        let square_id = square.id;
        table.push(square);
        let ev = Evaluator::new(&table, EvalLimits::default());
        let e = Expression::apply(square_id, vec![Expression::apply(square_id, vec![Expression::var(0)])]);
        assert_eq!(ev.eval(&e, &[Value::Int(3)]).unwrap(), Value::Int(81));
    }

    #[test]
    fn unbound_variable_and_arity_errors() {
        assert_eq!(eval(&Expression::var(1), &[Value::Int(0)]).unwrap_err(), EvalError::UnboundVariable(1));
        let bad = call("neg", vec![]);
        assert!(matches!(eval(&bad, &[]).unwrap_err(), EvalError::ArityMismatch { .. }));
    }
}
