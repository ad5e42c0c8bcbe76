//! Sample problems for the demo run.

use maple_synth_types::{IOExample, Value};

/// A named example set.
pub struct Problem {
    pub name: &'static str,
    pub examples: Vec<IOExample>,
}

fn unary(xs: impl IntoIterator<Item = i64>, f: impl Fn(i64) -> i64) -> Vec<IOExample> {
    xs.into_iter().map(|x| IOExample::ints(&[x], f(x))).collect()
}

pub fn showcase() -> Vec<Problem> {
    vec![
        Problem {
            name: "successor",
            examples: unary(0..3, |x| x + 1),
        },
        Problem {
            name: "doubling",
            examples: unary(0..5, |x| 2 * x),
        },
        Problem {
            name: "product plus one (zero divisors present)",
            examples: [(6, 0), (2, 3), (4, 2), (0, 5), (3, 3), (5, 1)]
                .iter()
                .map(|&(x, y)| IOExample::ints(&[x, y], x * y + 1))
                .collect(),
        },
        Problem {
            name: "list length plus one",
            examples: [vec![], vec![4], vec![1, 2, 3], vec![9, 9]]
                .into_iter()
                .map(|xs: Vec<i64>| {
                    let len = xs.len() as i64;
                    IOExample::new(vec![Value::List(xs)], Value::Int(len + 1))
                })
                .collect(),
        },
    ]
}
