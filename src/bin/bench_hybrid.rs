// SPDX-License-Identifier: AGPL-3.0-only

//! Hybrid vs pure-f64 throughput micro-benchmark.
//!
//! Runs the same exhaustive search (a target with no short closed form, so
//! nothing short-circuits) in both evaluation modes and reports wall time,
//! evaluation counts, and the hybrid speedup factor. The filter pass is
//! 1–2 orders of magnitude cheaper per evaluation than full verification,
//! so the speedup approaches the filter's rejection rate.
//!
//!   cargo run --release --bin bench_hybrid -- --max-k=5 --reps=5

use std::time::Instant;

use closedform::cli;
use closedform::provenance::ARBITRARY_DECIMAL;
use closedform::search::{search, EvalMode, SearchConfig, SearchStats};

const WARMUP: usize = 1;

fn run_mode(cfg: &SearchConfig, reps: usize) -> Option<(f64, SearchStats)> {
    for _ in 0..WARMUP {
        search(cfg).ok()?;
    }
    let t0 = Instant::now();
    let mut stats = SearchStats::default();
    for _ in 0..reps {
        let outcome = search(cfg).ok()?;
        stats = outcome.stats;
    }
    Some((t0.elapsed().as_secs_f64() / reps as f64, stats))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let max_k = cli::parse_u32(&args, "--max-k", 5);
    let reps = cli::parse_u32(&args, "--reps", 5) as usize;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Hybrid Filter Throughput Benchmark                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("  target = {} (exhaustive: no early exit)", ARBITRARY_DECIMAL.target);
    println!("  K ∈ [1, {max_k}], {reps} reps after {WARMUP} warmup");
    println!();

    let base = SearchConfig::new(ARBITRARY_DECIMAL.target, ARBITRARY_DECIMAL.uncertainty)
        .with_k_range(1, max_k);

    let full = run_mode(&base.clone().with_mode(EvalMode::Full), reps);
    let hybrid = run_mode(&base.with_mode(EvalMode::Hybrid), reps);

    let (Some((full_s, full_stats)), Some((hybrid_s, hybrid_stats))) = (full, hybrid) else {
        eprintln!("benchmark search failed");
        std::process::exit(1);
    };

    println!("  {:<10} {:>12} {:>14} {:>14} {:>12}", "mode", "time/rep", "f32 evals", "f64 evals", "evals/s");
    println!(
        "  {:<10} {:>11.3}s {:>14} {:>14} {:>12.3e}",
        "full",
        full_s,
        full_stats.reduced_evals,
        full_stats.full_evals,
        full_stats.full_evals as f64 / full_s
    );
    println!(
        "  {:<10} {:>11.3}s {:>14} {:>14} {:>12.3e}",
        "hybrid",
        hybrid_s,
        hybrid_stats.reduced_evals,
        hybrid_stats.full_evals,
        (hybrid_stats.reduced_evals + hybrid_stats.full_evals) as f64 / hybrid_s
    );
    println!();
    println!(
        "  filter rejection: {:.4}% of combinations never reached f64",
        100.0 * (1.0 - hybrid_stats.full_evals as f64 / hybrid_stats.reduced_evals.max(1) as f64)
    );
    println!("  hybrid speedup: {:.2}x", full_s / hybrid_s);
}
