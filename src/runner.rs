// SPDX-License-Identifier: AGPL-3.0-only

//! Parallel orchestration: N workers over disjoint partitions, merged.
//!
//! Each worker runs the search driver on its own OS thread over its own
//! partition; there is no shared mutable search state. Communication is
//! one-directional (worker → collector) over `std::sync::mpsc`. The first
//! worker to accept a match raises the shared abort flag so siblings stop
//! within their bounded abort latency instead of grinding out the rest of
//! their slice.
//!
//! The collector treats incoming candidates as an unordered multiset:
//! ranking and value-deduplication happen after collection, per the
//! driver's own rules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use serde::Serialize;

use crate::error::ClosedformError;
use crate::partition::{Partition, PartitionStrategy};
use crate::search::{
    dedup_by_value, search_with_hooks, EvalMode, Match, SearchConfig, SearchEvent, SearchHooks,
    SearchOutcome, SearchStatus,
};

/// Parameters for a multi-worker search.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct ParallelConfig {
    pub target: f64,
    pub uncertainty: f64,
    pub min_k: u32,
    pub max_k: u32,
    pub worker_count: u32,
    pub strategy: PartitionStrategy,
    pub mode: EvalMode,
}

impl ParallelConfig {
    /// Hybrid search over K ∈ [1, 5] with the given worker count.
    pub fn new(target: f64, uncertainty: f64, worker_count: u32) -> Self {
        Self {
            target,
            uncertainty,
            min_k: 1,
            max_k: 5,
            worker_count,
            strategy: PartitionStrategy::default(),
            mode: EvalMode::Hybrid,
        }
    }

    pub const fn with_k_range(mut self, min_k: u32, max_k: u32) -> Self {
        self.min_k = min_k;
        self.max_k = max_k;
        self
    }

    pub const fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    fn worker_config(&self, worker_id: u32) -> Result<SearchConfig, ClosedformError> {
        Ok(SearchConfig::new(self.target, self.uncertainty)
            .with_k_range(self.min_k, self.max_k)
            .with_partition(Partition::new(worker_id, self.worker_count)?)
            .with_strategy(self.strategy)
            .with_mode(self.mode))
    }
}

/// Merged result of all workers.
#[derive(Debug, Clone, Serialize)]
pub struct ParallelOutcome {
    /// `Success` if any worker accepted; otherwise `Aborted` if any worker
    /// was cut short; otherwise `Failure`.
    pub status: SearchStatus,
    /// The displayed winner: among accepted candidates the one maximizing
    /// the compression ratio; on Failure the globally closest found.
    pub best: Option<Match>,
    /// All improvements seen across workers, deduplicated by value and
    /// ranked by (rel_err, K).
    pub candidates: Vec<Match>,
    /// Per-worker terminal reports, indexed by worker id.
    pub workers: Vec<SearchOutcome>,
}

/// Run `worker_count` workers to completion and merge their reports.
///
/// `progress` receives every worker's `SearchEvent` stream as it happens
/// (unordered across workers).
pub fn run_parallel(
    cfg: &ParallelConfig,
    progress: Option<Sender<SearchEvent>>,
) -> Result<ParallelOutcome, ClosedformError> {
    // Validate every worker's inputs before spawning anything.
    if cfg.worker_count == 0 {
        return Err(ClosedformError::InvalidPartition { worker_id: 0, worker_count: 0 });
    }
    let worker_cfgs: Result<Vec<SearchConfig>, ClosedformError> =
        (0..cfg.worker_count).map(|id| cfg.worker_config(id)).collect();
    let worker_cfgs = worker_cfgs?;
    for wc in &worker_cfgs {
        wc.validate()?;
    }

    let abort = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<SearchEvent>();

    let mut results: Vec<Result<SearchOutcome, ClosedformError>> = Vec::new();
    let mut improvements: Vec<Match> = Vec::new();

    thread::scope(|scope| {
        let handles: Vec<_> = worker_cfgs
            .iter()
            .map(|wc| {
                let hooks = SearchHooks {
                    abort: Some(Arc::clone(&abort)),
                    progress: Some(tx.clone()),
                };
                let abort = Arc::clone(&abort);
                scope.spawn(move || {
                    let outcome = search_with_hooks(wc, &hooks);
                    if matches!(&outcome, Ok(o) if o.status == SearchStatus::Success) {
                        abort.store(true, Ordering::Relaxed);
                    }
                    outcome
                })
            })
            .collect();

        // The collector owns the last sender; dropping it after the workers
        // finish closes the channel and ends the drain loop.
        drop(tx);
        for event in rx.iter() {
            if let SearchEvent::Improved { best, .. } = &event {
                improvements.push(best.clone());
            }
            if let Some(external) = &progress {
                let _ = external.send(event);
            }
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            results.push(handle.join().unwrap_or(Err(ClosedformError::WorkerPanicked {
                worker_id: worker_id as u32,
            })));
        }
    });

    let workers: Result<Vec<SearchOutcome>, ClosedformError> = results.into_iter().collect();
    let workers = workers?;

    Ok(merge(workers, improvements))
}

/// Merge per-worker reports into the caller-facing outcome.
fn merge(workers: Vec<SearchOutcome>, mut improvements: Vec<Match>) -> ParallelOutcome {
    for w in &workers {
        if let Some(best) = &w.best {
            improvements.push(best.clone());
        }
    }
    let candidates = dedup_by_value(improvements);

    let any_success = workers.iter().any(|w| w.status == SearchStatus::Success);
    let any_aborted = workers.iter().any(|w| w.status == SearchStatus::Aborted);
    let status = if any_success {
        SearchStatus::Success
    } else if any_aborted {
        SearchStatus::Aborted
    } else {
        SearchStatus::Failure
    };

    // Accepted winners compete on compression ratio; without one, fall
    // back to the ranked closest-found.
    let best = if any_success {
        workers
            .iter()
            .filter(|w| w.status == SearchStatus::Success)
            .filter_map(|w| w.best.clone())
            .max_by(|a, b| a.compression_ratio.total_cmp(&b.compression_ratio))
    } else {
        candidates.first().cloned()
    };

    ParallelOutcome { status, best, candidates, workers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{E, PI};

    #[test]
    fn four_workers_find_e_exactly_once() {
        let cfg = ParallelConfig::new(E, 0.0, 4).with_k_range(1, 2);
        let outcome = run_parallel(&cfg, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        let successes: Vec<_> = outcome
            .workers
            .iter()
            .filter(|w| w.status == SearchStatus::Success)
            .collect();
        assert_eq!(successes.len(), 1);
        assert_eq!(outcome.best.as_ref().unwrap().code(), "EULER");
    }

    #[test]
    fn solo_parallel_matches_direct_search() {
        let cfg = ParallelConfig::new(PI, 5e-15, 1).with_k_range(1, 3);
        let outcome = run_parallel(&cfg, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        assert_eq!(outcome.best.unwrap().code(), "PI");
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = ParallelConfig::new(PI, 0.0, 0);
        assert!(matches!(
            run_parallel(&cfg, None).unwrap_err(),
            ClosedformError::InvalidPartition { .. }
        ));
    }

    #[test]
    fn merged_failure_reports_global_closest() {
        let cfg = ParallelConfig::new(123.456_789, 1e-12, 2).with_k_range(1, 2);
        let outcome = run_parallel(&cfg, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Failure);
        assert!(outcome.best.is_some());
        assert!(!outcome.candidates.is_empty());
        // Candidates are ranked: the merged best is the head of the list.
        let best_code = outcome.best.as_ref().unwrap().code();
        assert_eq!(outcome.candidates[0].code(), best_code);
    }

    #[test]
    fn round_robin_strategy_covers_the_space_too() {
        let mut cfg = ParallelConfig::new(1.0 + PI, 1e-6, 3).with_k_range(1, 4);
        cfg.strategy = PartitionStrategy::FormRoundRobin;
        let outcome = run_parallel(&cfg, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        assert_eq!(outcome.best.unwrap().k, 3);
    }
}
