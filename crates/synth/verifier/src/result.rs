//! Verification outcomes and the plain-text certificate.

use std::fmt;

use maple_synth_types::{SynthError, SynthResult, Value};
use serde::{Deserialize, Serialize};

/// The ordered checks a program goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Check {
    ExampleReplay,
    TypeConsistency,
    PathExploration,
    TerminationBound,
}

impl Check {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExampleReplay => "example replay",
            Self::TypeConsistency => "type consistency",
            Self::PathExploration => "path exploration",
            Self::TerminationBound => "termination bound",
        }
    }

    /// Whether failing this check makes a program inadmissible.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::ExampleReplay | Self::TypeConsistency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Passed,
    Failed,
    /// Ran but could not establish the property; lowers confidence only.
    Downgraded,
    Skipped,
}

/// One check as it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub check: Check,
    pub outcome: CheckOutcome,
    pub detail: String,
}

impl fmt::Display for CheckRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.outcome {
            CheckOutcome::Passed => "+",
            CheckOutcome::Failed => "x",
            CheckOutcome::Downgraded => "~",
            CheckOutcome::Skipped => "-",
        };
        write!(f, "[{}] {}: {}", mark, self.check.label(), self.detail)
    }
}

/// How far verification got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    /// A mandatory check failed; the bounded checks did not run.
    Replay,
    /// Replay, static typing, bounded path exploration and the termination bound.
    Bounded,
}

/// An input on which the program disagrees with the examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterexample {
    pub inputs: Vec<Value>,
    pub expected: Value,
    /// The produced value, or the evaluation error it raised.
    pub actual: Result<Value, String>,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(|v| v.to_string()).collect();
        match &self.actual {
            Ok(v) => write!(f, "({}) expected {}, got {}", inputs.join(", "), self.expected, v),
            Err(e) => write!(f, "({}) expected {}, failed: {}", inputs.join(", "), self.expected, e),
        }
    }
}

/// Result of verifying one program against one problem.
///
/// `verified` requires every check to pass. `admissible` requires only the
/// mandatory checks; a program can be admissible yet unverified when an
/// untested branch or a suspected non-termination lowered confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub admissible: bool,
    pub method: VerificationMethod,
    /// 1.0 when verified, 0.0 when inadmissible, in between when downgraded.
    pub confidence: f64,
    pub counterexample: Option<Counterexample>,
    pub notes: Vec<String>,
    pub checks: Vec<CheckRecord>,
}

impl VerificationResult {
    pub fn outcome_of(&self, check: Check) -> Option<CheckOutcome> {
        self.checks.iter().find(|r| r.check == check).map(|r| r.outcome)
    }

    /// Short verdict, e.g. `verified` or `unverified: untested branch`.
    pub fn verdict(&self) -> String {
        if self.verified {
            return "verified".into();
        }
        if !self.admissible {
            return "rejected".into();
        }
        let reasons: Vec<&str> = self
            .checks
            .iter()
            .filter(|r| r.outcome == CheckOutcome::Downgraded)
            .map(|r| match r.check {
                Check::PathExploration => "untested branch",
                Check::TerminationBound => "suspected non-termination",
                _ => "incomplete check",
            })
            .collect();
        format!("unverified: {}", reasons.join(", "))
    }

    /// `Ok` only for fully verified programs.
    ///
    /// A suspected non-termination maps to
    /// [`SynthError::NonTerminationSuspected`]; every other shortfall to
    /// [`SynthError::VerificationFailed`].
    pub fn require_verified(&self) -> SynthResult<()> {
        if self.verified {
            return Ok(());
        }
        if self.admissible {
            if let Some(record) = self
                .checks
                .iter()
                .find(|r| r.check == Check::TerminationBound && r.outcome == CheckOutcome::Downgraded)
            {
                return Err(SynthError::NonTerminationSuspected(record.detail.clone()));
            }
        }
        let reason = match &self.counterexample {
            Some(cx) => format!("{}, counterexample {}", self.verdict(), cx),
            None => self.verdict(),
        };
        Err(SynthError::VerificationFailed(reason))
    }

    /// Plain-text summary of every check that ran and its outcome.
    pub fn certificate(&self) -> String {
        let mut out = String::from("verification certificate\n");
        for record in &self.checks {
            out.push_str("  ");
            out.push_str(&record.to_string());
            out.push('\n');
        }
        if let Some(cx) = &self.counterexample {
            out.push_str(&format!("  counterexample: {}\n", cx));
        }
        for note in &self.notes {
            out.push_str(&format!("  note: {}\n", note));
        }
        out.push_str(&format!(
            "  verdict: {} (confidence {:.2})\n",
            self.verdict(),
            self.confidence
        ));
        out
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (confidence {:.2})", self.verdict(), self.confidence)
    }
}
