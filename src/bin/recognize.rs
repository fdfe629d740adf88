// SPDX-License-Identifier: AGPL-3.0-only

//! Constant recognition CLI.
//!
//! Searches for a closed-form expression matching `--target` within
//! `--uncertainty`, in parallel across `--workers` disjoint partitions.
//!
//!   recognize --target=4.141592653589793 --uncertainty=1e-6 --max-k=6
//!   recognize --target=2.718281828459045 --workers=8 --json
//!
//! Exit codes: 0 — search completed (success or not, see output);
//! 2 — invalid invocation.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use closedform::cli;
use closedform::runner::{run_parallel, ParallelConfig};
use closedform::search::{EvalMode, SearchEvent, SearchStatus};

fn usage() {
    println!("Usage: recognize --target=<z> [options]");
    println!();
    println!("Options:");
    println!("  --target=<f64>        value to identify (required)");
    println!("  --uncertainty=<f64>   absolute Δz, 0 = exact match (default 1e-9)");
    println!("  --min-k=<u32>         minimum expression length (default 1)");
    println!("  --max-k=<u32>         maximum expression length (default 6)");
    println!("  --workers=<u32>       parallel workers (default: available cores)");
    println!("  --mode=full           disable the f32 filter tier");
    println!("  --json                emit a JSON report after the summary");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if cli::parse_flag(&args, "--help") {
        usage();
        return;
    }

    let target = cli::parse_f64(&args, "--target", f64::NAN);
    if !target.is_finite() {
        usage();
        std::process::exit(2);
    }
    let uncertainty = cli::parse_f64(&args, "--uncertainty", 1e-9);
    let min_k = cli::parse_u32(&args, "--min-k", 1);
    let max_k = cli::parse_u32(&args, "--max-k", 6);
    let default_workers = thread::available_parallelism().map_or(4, |n| n.get() as u32);
    let workers = cli::parse_u32(&args, "--workers", default_workers);
    let mode = if args.iter().any(|a| a == "--mode=full") {
        EvalMode::Full
    } else {
        EvalMode::Hybrid
    };
    let emit_json = cli::parse_flag(&args, "--json");

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  closedform — constant recognition                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("  z  = {target:.17}");
    println!("  Δz = {uncertainty:.3e}");
    println!("  K ∈ [{min_k}, {max_k}], {workers} workers, {mode:?} evaluation");
    println!();

    let cfg = ParallelConfig::new(target, uncertainty, workers)
        .with_k_range(min_k, max_k)
        .with_mode(mode);

    // Live progress: improvements stream in worker order of discovery.
    let (tx, rx) = mpsc::channel::<SearchEvent>();
    let printer = thread::spawn(move || {
        for event in rx {
            if let SearchEvent::Improved { worker_id, best } = event {
                println!(
                    "  worker {worker_id}: {}  (K={}, rel_err={:.3e}, CR={:.2})",
                    best.code(),
                    best.k,
                    best.rel_err,
                    best.compression_ratio
                );
            }
        }
    });

    let t0 = Instant::now();
    let outcome = match run_parallel(&cfg, Some(tx)) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();
    let _ = printer.join();

    let reduced: u64 = outcome.workers.iter().map(|w| w.stats.reduced_evals).sum();
    let full: u64 = outcome.workers.iter().map(|w| w.stats.full_evals).sum();

    println!();
    println!("═══════════════════════════════════════════════════════════");
    match outcome.status {
        SearchStatus::Success => println!("  RESULT: SUCCESS"),
        SearchStatus::Failure => println!("  RESULT: FAILURE (closest found below)"),
        SearchStatus::Aborted => println!("  RESULT: ABORTED"),
    }
    if let Some(best) = &outcome.best {
        println!("  RPN:   {}", best.code());
        println!("  value: {:.17}", best.value);
        println!("  K = {}, rel_err = {:.6e}, CR = {:.3}", best.k, best.rel_err, best.compression_ratio);
    }
    println!(
        "  {:.2}s — {} f32 evals, {} f64 evals ({:.1}:1 filter ratio)",
        elapsed,
        reduced,
        full,
        reduced as f64 / full.max(1) as f64
    );
    println!("═══════════════════════════════════════════════════════════");

    if emit_json {
        let candidates: Vec<serde_json::Value> = outcome
            .candidates
            .iter()
            .take(20)
            .map(|m| {
                serde_json::json!({
                    "RPN": m.code(),
                    "K": m.k,
                    "REL_ERR": m.rel_err,
                    "COMPRESSION_RATIO": m.compression_ratio,
                    "value": m.value,
                })
            })
            .collect();
        let report = serde_json::json!({
            "z": target,
            "dz": uncertainty,
            "minK": min_k,
            "maxK": max_k,
            "workers": workers,
            "result": outcome.status,
            "RPN": outcome.best.as_ref().map(closedform::search::Match::code),
            "REL_ERR": outcome.best.as_ref().map(|m| m.rel_err),
            "COMPRESSION_RATIO": outcome.best.as_ref().map(|m| m.compression_ratio),
            "K": outcome.best.as_ref().map(|m| m.k),
            "results": candidates,
            "fp32_evals": reduced,
            "fp64_evals": full,
            "elapsed_s": elapsed,
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    }
}
