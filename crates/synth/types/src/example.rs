//! Input/output examples and the problem signature they imply.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::value::{Type, Value};

/// One observed behaviour: `inputs` map to `output`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IOExample {
    pub inputs: Vec<Value>,
    pub output: Value,
}

impl IOExample {
    pub fn new(inputs: Vec<Value>, output: Value) -> Self {
        Self { inputs, output }
    }

    /// Shorthand for integer-only examples.
    pub fn ints(inputs: &[i64], output: i64) -> Self {
        Self {
            inputs: inputs.iter().map(|v| Value::Int(*v)).collect(),
            output: Value::Int(output),
        }
    }
}

impl std::fmt::Display for IOExample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(|v| v.to_string()).collect();
        write!(f, "({}) -> {}", inputs.join(", "), self.output)
    }
}

/// Input and output types shared by every example of a problem.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemSignature {
    pub inputs: Vec<Type>,
    pub output: Type,
}

impl ProblemSignature {
    /// Derive the signature from a non-empty, consistently typed example set.
    pub fn infer(examples: &[IOExample]) -> SynthResult<Self> {
        let first = examples
            .first()
            .ok_or_else(|| SynthError::InvalidProblem("example set is empty".into()))?;

        let inputs = first
            .inputs
            .iter()
            .map(value_type)
            .collect::<SynthResult<Vec<_>>>()?;
        let output = value_type(&first.output)?;

        for (i, ex) in examples.iter().enumerate().skip(1) {
            if ex.inputs.len() != inputs.len() {
                return Err(SynthError::InvalidProblem(format!(
                    "example {} has {} inputs, expected {}",
                    i,
                    ex.inputs.len(),
                    inputs.len()
                )));
            }
            for (j, (v, ty)) in ex.inputs.iter().zip(&inputs).enumerate() {
                let actual = value_type(v)?;
                if actual != *ty {
                    return Err(SynthError::InvalidProblem(format!(
                        "example {} input {} is {}, expected {}",
                        i, j, actual, ty
                    )));
                }
            }
            let actual = value_type(&ex.output)?;
            if actual != output {
                return Err(SynthError::InvalidProblem(format!(
                    "example {} output is {}, expected {}",
                    i, actual, output
                )));
            }
        }

        Ok(Self { inputs, output })
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// The signature a program solving this problem would carry as a primitive.
    pub fn as_primitive_signature(&self) -> crate::primitive::Signature {
        crate::primitive::Signature::new(self.inputs.clone(), self.output.clone())
    }
}

impl std::fmt::Display for ProblemSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Type::func(self.inputs.clone(), self.output.clone()))
    }
}

fn value_type(v: &Value) -> SynthResult<Type> {
    v.first_order_type().ok_or_else(|| {
        SynthError::InvalidProblem("examples must carry first-order values".into())
    })
}
