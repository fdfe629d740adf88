// SPDX-License-Identifier: AGPL-3.0-only

//! Work partitioner validation.
//!
//! Proves disjointness and coverage of both partition strategies over the
//! real form geometry, then the worker-exclusivity scenario: with four
//! independent workers, exactly one can recognize `e` — its siblings own
//! disjoint slices that do not contain the matching token.
//!
//! Exit code 0 = all checks pass, 1 = any check fails.

use std::collections::HashSet;

use closedform::forms::generate_forms;
use closedform::partition::{Partition, PartitionStrategy};
use closedform::provenance::EULER_EXACT;
use closedform::runner::{run_parallel, ParallelConfig};
use closedform::search::{search, SearchConfig, SearchStatus};
use closedform::validation::ValidationHarness;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Work Partitioner Validation                                ║");
    println!("║  Disjointness, coverage, worker exclusivity                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("partition");

    for strategy in [PartitionStrategy::IndexStride, PartitionStrategy::FormRoundRobin] {
        coverage_and_disjointness(&mut harness, strategy);
    }
    worker_exclusivity(&mut harness);
    merged_parallel_run(&mut harness);

    harness.finish();
}

/// Union over workers covers 100% of each K's (form, index) space with no
/// duplicates, for workerCount ∈ {1, 2, 4, 8}.
fn coverage_and_disjointness(harness: &mut ValidationHarness, strategy: PartitionStrategy) {
    println!("── {strategy:?}: coverage and disjointness, K ≤ 4 ──");
    let expected: u64 = (1..=4)
        .map(|k| generate_forms(k).iter().map(|f| f.total_combinations).sum::<u64>())
        .sum();
    println!("    full space K ≤ 4: {expected} combinations");

    for worker_count in [1u32, 2, 4, 8] {
        let mut seen: HashSet<(u32, usize, u64)> = HashSet::new();
        let mut duplicates: u64 = 0;

        for k in 1..=4 {
            let forms = generate_forms(k);
            for worker_id in 0..worker_count {
                let partition = match Partition::new(worker_id, worker_count) {
                    Ok(p) => p,
                    Err(e) => {
                        harness.check_bool(&format!("partition built [{e}]"), false);
                        return;
                    }
                };
                for (ordinal, form) in forms.iter().enumerate() {
                    let assignment = partition.assignment(strategy, ordinal, form.total_combinations);
                    for index in assignment.indices() {
                        if !seen.insert((k, ordinal, index)) {
                            duplicates += 1;
                        }
                    }
                }
            }
        }

        harness.check_abs(
            &format!("{strategy:?} N={worker_count} coverage"),
            seen.len() as f64,
            expected as f64,
            0.5,
        );
        harness.check_abs(
            &format!("{strategy:?} N={worker_count} duplicates"),
            duplicates as f64,
            0.0,
            0.5,
        );
    }
}

/// Scenario: target = e, K ∈ [1, 2], four independent workers. Exactly one
/// owns the matching combination index; the rest exhaust their slices.
fn worker_exclusivity(harness: &mut ValidationHarness) {
    println!("── worker exclusivity: e across 4 independent workers ──");
    let mut successes = 0;
    let mut failures = 0;
    for worker_id in 0..4 {
        let partition = match Partition::new(worker_id, 4) {
            Ok(p) => p,
            Err(e) => {
                harness.check_bool(&format!("worker {worker_id} built [{e}]"), false);
                continue;
            }
        };
        let cfg = SearchConfig::new(EULER_EXACT.target, EULER_EXACT.uncertainty)
            .with_k_range(1, 2)
            .with_partition(partition);
        match search(&cfg) {
            Ok(outcome) => match outcome.status {
                SearchStatus::Success => {
                    successes += 1;
                    harness.check_code(
                        &format!("worker {worker_id} winner"),
                        outcome.best.as_ref(),
                        EULER_EXACT.expected_code,
                    );
                }
                SearchStatus::Failure => failures += 1,
                SearchStatus::Aborted => {}
            },
            Err(e) => harness.check_bool(&format!("worker {worker_id} ran [{e}]"), false),
        }
    }
    harness.check_abs("exactly one success", f64::from(successes), 1.0, 0.5);
    harness.check_abs("three exhaustive failures", f64::from(failures), 3.0, 0.5);
}

/// The orchestrated run merges the same four workers into one SUCCESS.
fn merged_parallel_run(harness: &mut ValidationHarness) {
    println!("── merged 4-worker run ──");
    let cfg = ParallelConfig::new(EULER_EXACT.target, EULER_EXACT.uncertainty, 4).with_k_range(1, 2);
    match run_parallel(&cfg, None) {
        Ok(outcome) => {
            harness.check_status("merged status", outcome.status, SearchStatus::Success);
            harness.check_code("merged winner", outcome.best.as_ref(), EULER_EXACT.expected_code);
            let worker_successes = outcome
                .workers
                .iter()
                .filter(|w| w.status == SearchStatus::Success)
                .count();
            harness.check_abs("merged worker successes", worker_successes as f64, 1.0, 0.5);
        }
        Err(e) => harness.check_bool(&format!("merged run ran [{e}]"), false),
    }
}
