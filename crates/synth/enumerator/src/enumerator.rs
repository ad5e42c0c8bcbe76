//! Size-ordered bottom-up search.
//!
//! Level `n` holds every retained candidate of weighted size `n`. A
//! candidate of size `n` applies a primitive of cost `c` to children
//! whose sizes sum to `n - c`, all taken from lower levels. Children
//! are only ever retained candidates, so every composed program
//! evaluates successfully on every example.

use std::time::{Duration, Instant};

use maple_synth_types::{
    terminals, EvalLimits, Evaluator, Expression, IOExample, PrimitiveId, PrimitiveTable,
    ProblemSignature, SynthError, SynthResult, SynthesisConfig, Type, Value,
};
use tracing::{debug, warn};

use crate::bank::{compositions, Bank, Entry, Node};
use crate::stats::{EnumerationStats, Exhaustion};

/// Number of candidates between wall-clock checks.
const CLOCK_STRIDE: usize = 256;

/// The smallest program found, with its weighted size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub expression: Expression,
    pub size: usize,
}

/// Outcome of one enumeration run.
#[derive(Debug, Clone)]
pub struct EnumerationResult {
    /// `None` when a budget ran out first; the caller should escalate.
    pub solution: Option<Solution>,
    pub stats: EnumerationStats,
}

/// Bottom-up enumerative synthesizer over a primitive table.
pub struct Enumerator<'t> {
    table: &'t dyn PrimitiveTable,
    limits: EvalLimits,
    int_constants: Vec<i64>,
    max_candidates: usize,
}

impl<'t> Enumerator<'t> {
    pub fn new(table: &'t dyn PrimitiveTable, config: &SynthesisConfig) -> Self {
        Self {
            table,
            limits: config.eval_limits(),
            int_constants: config.int_constants.clone(),
            max_candidates: config.max_candidates,
        }
    }

    pub fn with_int_constants(mut self, constants: Vec<i64>) -> Self {
        self.int_constants = constants;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Search for the smallest expression matching every example.
    ///
    /// Returns `Err` only for a malformed example set, an empty table or
    /// a zero size budget. Running out of budget is a normal outcome and
    /// yields a result without a solution.
    pub fn synthesize(
        &self,
        examples: &[IOExample],
        max_size: usize,
        time_budget: Duration,
    ) -> SynthResult<EnumerationResult> {
        let signature = ProblemSignature::infer(examples)?;
        if self.table.is_empty() {
            return Err(SynthError::InvalidConfiguration("primitive table is empty".into()));
        }
        if max_size == 0 {
            return Err(SynthError::InvalidConfiguration("max_size must be positive".into()));
        }

        let mut search = Search {
            table: self.table,
            evaluator: Evaluator::new(self.table, self.limits),
            examples,
            target: examples.iter().map(|e| e.output.clone()).collect(),
            output_type: signature.output.clone(),
            bank: Bank::new(),
            stats: EnumerationStats::default(),
            deadline: Instant::now().checked_add(time_budget),
            max_candidates: self.max_candidates,
        };

        let step = search.run(&signature.inputs, &self.int_constants, max_size);
        let mut stats = search.stats;
        let solution = match step {
            Step::Found(index) => {
                let expression = search.bank.expression(index);
                let size = search.bank.entry(index).size;
                debug!(
                    size,
                    candidates = stats.candidates,
                    retained = stats.retained,
                    program = %expression.render(self.table),
                    "Enumeration found match"
                );
                Some(Solution { expression, size })
            }
            Step::Stop(reason) => {
                if reason == Exhaustion::MaxSize {
                    debug!(max_size, candidates = stats.candidates, "Enumeration exhausted size bound");
                } else {
                    warn!(
                        reason = %reason,
                        levels = stats.levels_completed,
                        candidates = stats.candidates,
                        "Enumeration budget exhausted"
                    );
                }
                stats.exhausted_by = Some(reason);
                None
            }
            Step::Continue => None,
        };

        Ok(EnumerationResult { solution, stats })
    }
}

enum Step {
    Continue,
    Found(usize),
    Stop(Exhaustion),
}

struct Search<'a, 't> {
    table: &'t dyn PrimitiveTable,
    evaluator: Evaluator<'t>,
    examples: &'a [IOExample],
    target: Vec<Value>,
    output_type: Type,
    bank: Bank,
    stats: EnumerationStats,
    deadline: Option<Instant>,
    max_candidates: usize,
}

impl Search<'_, '_> {
    fn run(&mut self, inputs: &[Type], int_constants: &[i64], max_size: usize) -> Step {
        // ── Size 1: terminals ──
        for (expr, ty) in terminals(self.table, inputs, int_constants) {
            let outputs: Result<Vec<Value>, _> = self
                .examples
                .iter()
                .map(|ex| self.evaluator.eval(&expr, &ex.inputs))
                .collect();
            let step = match outputs {
                Ok(outputs) => self.offer(Node::Leaf(expr), ty, 1, outputs),
                Err(_) => self.discard(),
            };
            if !matches!(step, Step::Continue) {
                return step;
            }
        }
        self.finish_level(1);

        // ── Larger sizes: compose retained candidates ──
        let primitives: Vec<(PrimitiveId, usize, Vec<Type>, Type)> = self
            .table
            .primitives()
            .map(|p| {
                (
                    p.id,
                    p.cost.max(1) as usize,
                    p.signature.params.clone(),
                    p.signature.ret.clone(),
                )
            })
            .collect();

        for size in 2..=max_size {
            for (id, cost, params, ret) in &primitives {
                let Some(rest) = size.checked_sub(*cost) else {
                    continue;
                };
                for split in compositions(rest, params.len()) {
                    let step = self.compose(*id, params, ret, &split, size);
                    if !matches!(step, Step::Continue) {
                        return step;
                    }
                }
            }
            self.finish_level(size);
            if self.out_of_time() {
                return Step::Stop(Exhaustion::TimeBudget);
            }
        }
        Step::Stop(Exhaustion::MaxSize)
    }

    /// Every application of `id` whose argument sizes follow `split`,
    /// in odometer order over the bank (last argument varies fastest).
    fn compose(&mut self, id: PrimitiveId, params: &[Type], ret: &Type, split: &[usize], size: usize) -> Step {
        let pools: Vec<Vec<usize>> = params
            .iter()
            .zip(split)
            .map(|(ty, s)| self.bank.of(ty, *s).to_vec())
            .collect();
        if pools.iter().any(Vec::is_empty) {
            return Step::Continue;
        }

        let mut digits = vec![0usize; pools.len()];
        loop {
            let children: Vec<usize> = digits.iter().zip(&pools).map(|(d, pool)| pool[*d]).collect();
            let step = self.apply(id, children, ret.clone(), size);
            if !matches!(step, Step::Continue) {
                return step;
            }

            let mut pos = digits.len();
            loop {
                if pos == 0 {
                    return Step::Continue;
                }
                pos -= 1;
                digits[pos] += 1;
                if digits[pos] < pools[pos].len() {
                    break;
                }
                digits[pos] = 0;
            }
        }
    }

    fn apply(&mut self, id: PrimitiveId, children: Vec<usize>, ty: Type, size: usize) -> Step {
        let mut outputs = Vec::with_capacity(self.examples.len());
        for e in 0..self.examples.len() {
            let args: Vec<Value> = children
                .iter()
                .map(|c| self.bank.entry(*c).outputs[e].clone())
                .collect();
            match self.evaluator.apply(id, args) {
                Ok(v) => outputs.push(v),
                Err(_) => return self.discard(),
            }
        }
        self.offer(
            Node::Apply {
                primitive: id,
                children,
            },
            ty,
            size,
            outputs,
        )
    }

    fn offer(&mut self, node: Node, ty: Type, size: usize, outputs: Vec<Value>) -> Step {
        if let Some(stop) = self.count_candidate() {
            return stop;
        }
        let matches = ty == self.output_type && outputs == self.target;
        let entry = Entry {
            node,
            ty,
            size,
            outputs: outputs.into(),
        };
        match self.bank.insert(entry) {
            Some(index) => {
                self.stats.retained += 1;
                if matches {
                    Step::Found(index)
                } else {
                    Step::Continue
                }
            }
            None => {
                self.stats.pruned_equivalent += 1;
                Step::Continue
            }
        }
    }

    fn discard(&mut self) -> Step {
        if let Some(stop) = self.count_candidate() {
            return stop;
        }
        self.stats.discarded_failures += 1;
        Step::Continue
    }

    fn count_candidate(&mut self) -> Option<Step> {
        if self.stats.candidates >= self.max_candidates {
            return Some(Step::Stop(Exhaustion::CandidateLimit));
        }
        self.stats.candidates += 1;
        if self.stats.candidates % CLOCK_STRIDE == 0 && self.out_of_time() {
            return Some(Step::Stop(Exhaustion::TimeBudget));
        }
        None
    }

    fn out_of_time(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn finish_level(&mut self, size: usize) {
        self.stats.levels_completed = size;
        debug!(
            size,
            bank = self.bank.len(),
            candidates = self.stats.candidates,
            pruned = self.stats.pruned_equivalent,
            "Enumerated size level"
        );
    }
}
