#![deny(unsafe_code)]
//! Synthesis demo binary.
//!
//! Solves a handful of example-driven problems, then runs the capability
//! emergence demonstration and prints what the meta-learner picked up.
//!
//! Usage: `maple-synth-demo [config.json]`. Logging follows `RUST_LOG`
//! and defaults to `warn`.

mod problems;

use anyhow::Context;
use maple_synth_orchestrator::{Orchestrator, SynthesizedProgram};
use maple_synth_types::SynthesisConfig;
use tracing_subscriber::EnvFilter;

// ── Formatting Helpers ──────────────────────────────────────────────────

fn section(title: &str) {
    println!();
    println!(" ── {} {}", title, "─".repeat(60usize.saturating_sub(title.len() + 4)));
}

fn ok(msg: &str) {
    println!("   [OK]  {}", msg);
}

fn info(msg: &str) {
    println!("   [--]  {}", msg);
}

fn warn(msg: &str) {
    println!("   [!!]  {}", msg);
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run_demo() {
        eprintln!();
        eprintln!("   [FATAL]  Demo failed: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config() -> anyhow::Result<SynthesisConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            SynthesisConfig::from_json(&json).with_context(|| format!("parsing config {}", path))
        }
        None => Ok(SynthesisConfig::default()),
    }
}

fn run_demo() -> anyhow::Result<()> {
    // ── Phase A: Configuration ──────────────────────────────────────
    section("Phase A: Configuration");

    let config = load_config()?;
    info(&format!(
        "max_size={}  max_depth={}  population={}x{}  seed={}",
        config.max_size, config.max_depth, config.population_size, config.generations, config.seed
    ));
    tracing::debug!(seed = config.seed, "Demo configuration loaded");
    let mut orch = Orchestrator::new(config).context("building orchestrator")?;
    ok(&format!("{} primitives registered", orch.capabilities().total()));

    // ── Phase B: Example-driven synthesis ───────────────────────────
    section("Phase B: Synthesis");

    let mut last: Option<SynthesizedProgram> = None;
    for problem in problems::showcase() {
        match orch.synthesize(&problem.examples, None)? {
            Some(program) => {
                ok(&format!("{:<42} {}", problem.name, program));
                last = Some(program);
            }
            None => warn(&format!("{:<42} no solution", problem.name)),
        }
    }
    if let Some(verification) = last.as_ref().and_then(|p| p.verification.as_ref()) {
        info("certificate of the last program:");
        for line in verification.certificate().lines() {
            println!("          {}", line);
        }
    }

    // ── Phase C: Capability emergence ───────────────────────────────
    section("Phase C: Capability Emergence");

    let report = orch.demonstrate_emergence()?;
    for line in report.to_string().lines() {
        info(line);
    }
    if report.emerged() {
        ok("target became solvable through learned capabilities");
    } else {
        warn("target did not change solvability");
    }

    // ── Phase D: What was learned ───────────────────────────────────
    section("Phase D: Meta-Learner and Metrics");

    let insights = orch.insights();
    info(&format!(
        "attempts={}  successful={}  success rate={:.1}%",
        insights.total_attempts,
        insights.successful_attempts,
        insights.success_rate * 100.0
    ));
    for s in &insights.strategies {
        info(&format!(
            "{:<12} {} ok / {} failed  mean {:.1} ms",
            s.strategy.as_str(),
            s.successes,
            s.failures,
            s.mean_latency_ms
        ));
    }
    for (bucket, strategy) in &insights.preferred {
        info(&format!("prefer {:<12} for {}", strategy.as_str(), bucket));
    }

    let m = orch.metrics();
    info(&format!(
        "problems {}/{} solved ({} verified), {} capabilities admitted",
        m.problems_solved, m.problems_attempted, m.verified_solutions, m.capabilities_admitted
    ));
    info(&format!("learned: {}", orch.capabilities().learned.join(", ")));

    println!();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
