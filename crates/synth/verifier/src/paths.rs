//! Forced-branch evaluation for bounded path exploration.

use std::collections::HashMap;

use maple_synth_types::{EvalError, Evaluator, Expression, Path, Value};

/// Paths of every conditional application, in pre-order.
pub(crate) fn conditional_sites(expr: &Expression, evaluator: &Evaluator<'_>) -> Vec<Path> {
    expr.subterms()
        .into_iter()
        .filter(|(_, sub)| matches!(sub, Expression::Apply { primitive, .. } if evaluator.is_conditional(*primitive)))
        .map(|(path, _)| path)
        .collect()
}

/// Evaluation of one input under a forced branch assignment.
#[derive(Debug)]
pub(crate) struct ForcedRun {
    pub value: Result<Value, EvalError>,
    /// True when every conditional reached agreed with its forced branch,
    /// i.e. this input naturally follows the assignment.
    pub natural: bool,
}

/// Evaluate `expr`, taking the branch `assignment` dictates at every
/// conditional site it names.
pub(crate) fn eval_forced(
    evaluator: &Evaluator<'_>,
    expr: &Expression,
    inputs: &[Value],
    assignment: &HashMap<Path, bool>,
) -> ForcedRun {
    let mut natural = true;
    let mut path = Vec::new();
    let value = walk(evaluator, expr, inputs, assignment, &mut path, &mut natural);
    ForcedRun { value, natural }
}

fn walk(
    evaluator: &Evaluator<'_>,
    expr: &Expression,
    inputs: &[Value],
    assignment: &HashMap<Path, bool>,
    path: &mut Path,
    natural: &mut bool,
) -> Result<Value, EvalError> {
    match expr {
        Expression::Apply { primitive, args } if evaluator.is_conditional(*primitive) && args.len() == 3 => {
            path.push(0);
            let cond = walk(evaluator, &args[0], inputs, assignment, path, natural);
            path.pop();
            let cond = cond?
                .as_bool()
                .ok_or_else(|| EvalError::TypeError("condition is not a boolean".into()))?;
            let taken = match assignment.get(path.as_slice()) {
                Some(forced) => {
                    if *forced != cond {
                        *natural = false;
                    }
                    *forced
                }
                None => cond,
            };
            let branch = if taken { 1 } else { 2 };
            path.push(branch);
            let value = walk(evaluator, &args[branch], inputs, assignment, path, natural);
            path.pop();
            value
        }
        Expression::Apply { primitive, args } => {
            let mut values = Vec::with_capacity(args.len());
            for (i, arg) in args.iter().enumerate() {
                path.push(i);
                let v = walk(evaluator, arg, inputs, assignment, path, natural);
                path.pop();
                values.push(v?);
            }
            evaluator.apply(*primitive, values)
        }
        leaf => evaluator.eval(leaf, inputs),
    }
}
