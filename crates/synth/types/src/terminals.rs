//! Leaves available to both search strategies.

use std::collections::BTreeSet;

use crate::expr::Expression;
use crate::primitive::PrimitiveTable;
use crate::value::{Type, Value};

/// Function types some registered primitive accepts as a parameter.
pub fn function_param_types(table: &dyn PrimitiveTable) -> BTreeSet<Type> {
    table
        .primitives()
        .flat_map(|p| p.signature.params.iter())
        .filter(|t| !t.is_first_order())
        .cloned()
        .collect()
}

/// Terminal expressions for a problem with the given input types, in
/// generation order: variables, integer constants, booleans, the empty
/// list, then one function literal per usable first-order primitive in
/// registration order.
pub fn terminals(
    table: &dyn PrimitiveTable,
    inputs: &[Type],
    int_constants: &[i64],
) -> Vec<(Expression, Type)> {
    let mut out: Vec<(Expression, Type)> = inputs
        .iter()
        .enumerate()
        .map(|(i, t)| (Expression::var(i), t.clone()))
        .collect();

    out.extend(int_constants.iter().map(|c| (Expression::int(*c), Type::Int)));
    out.push((Expression::bool(true), Type::Bool));
    out.push((Expression::bool(false), Type::Bool));
    out.push((Expression::Literal(Value::List(Vec::new())), Type::List));

    let wanted = function_param_types(table);
    out.extend(
        table
            .primitives()
            .filter(|p| p.signature.is_first_order())
            .map(|p| (p.id, p.signature.as_type()))
            .filter(|(_, ty)| wanted.contains(ty))
            .map(|(id, ty)| (Expression::func(id), ty)),
    );
    out
}
