// SPDX-License-Identifier: AGPL-3.0-only

//! Search driver: one worker's walk over its partition of the
//! (K, form, combination-index) space.
//!
//! For each K from `min_k` to `max_k` the driver generates the valid forms,
//! enumerates this worker's slice of each form's combination space, and
//! scores candidates against the target. Two evaluation policies:
//!
//! - **Full** — every combination is evaluated in f64 directly.
//! - **Hybrid** — every combination first passes a cheap f32 filter against
//!   a relaxed threshold; only survivors are re-evaluated in f64 against
//!   the true tolerance. The filter rejects ~99.99% of candidates, and the
//!   f64 verification of survivors runs data-parallel. A true match that
//!   f32 rounding pushes past the relaxed threshold is lost — a documented
//!   approximation (`tolerances::FP32_FILTER_BASE`), not a correctness bug.
//!
//! The driver terminates the moment a candidate is accepted (complexity
//! grows monotonically with K, so the first acceptance is the shortest),
//! when the K range is exhausted, or when the cooperative abort flag is
//! observed — checked at least every `tolerances::ABORT_CHECK_INTERVAL`
//! evaluations, so abort latency is bounded in evaluation counts even
//! inside a form with millions of combinations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::ClosedformError;
use crate::eval::{eval_f32, eval_f64};
use crate::forms::{generate_forms, Form, MAX_SEARCH_K};
use crate::indexer::{index_to_tokens, index_to_tokens_into};
use crate::partition::{FormAssignment, Partition, PartitionStrategy};
use crate::tolerances;
use crate::vocab::{code_string, Token, TokenClass, VOCAB_SIZE};

/// Relative error of a candidate value against the target; absolute when
/// the target is zero.
#[must_use]
pub fn rel_err(value: f64, target: f64) -> f64 {
    if target == 0.0 {
        value.abs()
    } else {
        (value / target - 1.0).abs()
    }
}

fn rel_err_f32(value: f32, target: f32) -> f32 {
    if target == 0.0 {
        value.abs()
    } else {
        (value / target - 1.0).abs()
    }
}

/// Compression ratio: digits of the target explained per token-information
/// spent. `CR = −log10(max(rel_err, ε)) / (K · log10(36))`. CR ≈ 1 is
/// indistinguishable from coincidence; well above 1 means the expression
/// compresses the target.
#[must_use]
pub fn compression_ratio(rel_err: f64, k: u32) -> f64 {
    let digits_explained = -rel_err.max(f64::EPSILON).log10();
    digits_explained / (f64::from(k) * (VOCAB_SIZE as f64).log10())
}

/// Evaluation policy (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvalMode {
    Full,
    Hybrid,
}

/// One search invocation's parameters.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct SearchConfig {
    /// The value to identify.
    pub target: f64,
    /// Absolute uncertainty Δz. Zero means a floating-point-exact match
    /// is required (within the 16·ε equality window).
    pub uncertainty: f64,
    /// Inclusive complexity range, 1 ≤ min_k ≤ max_k ≤ MAX_SEARCH_K.
    pub min_k: u32,
    pub max_k: u32,
    /// This worker's slice of the space.
    pub partition: Partition,
    pub strategy: PartitionStrategy,
    pub mode: EvalMode,
}

impl SearchConfig {
    /// Solo hybrid search over K ∈ [1, 5].
    pub fn new(target: f64, uncertainty: f64) -> Self {
        Self {
            target,
            uncertainty,
            min_k: 1,
            max_k: 5,
            partition: Partition::solo(),
            strategy: PartitionStrategy::default(),
            mode: EvalMode::Hybrid,
        }
    }

    pub const fn with_k_range(mut self, min_k: u32, max_k: u32) -> Self {
        self.min_k = min_k;
        self.max_k = max_k;
        self
    }

    pub const fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub const fn with_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub const fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject invalid inputs before any enumeration work.
    pub fn validate(&self) -> Result<(), ClosedformError> {
        if !self.target.is_finite() {
            return Err(ClosedformError::NonFiniteTarget);
        }
        if self.min_k == 0 || self.min_k > self.max_k {
            return Err(ClosedformError::EmptyKRange { min_k: self.min_k, max_k: self.max_k });
        }
        if self.max_k > MAX_SEARCH_K {
            return Err(ClosedformError::DepthExceeded { max_k: self.max_k, limit: MAX_SEARCH_K });
        }
        Partition::new(self.partition.worker_id, self.partition.worker_count)?;
        Ok(())
    }
}

/// A scored candidate worth reporting: the realized token sequence plus
/// its value and error metrics.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    /// RPN token sequence (class + opcode per position).
    pub tokens: Vec<Token>,
    pub k: u32,
    pub value: f64,
    pub rel_err: f64,
    pub compression_ratio: f64,
}

impl Match {
    /// Opcode-name rendering, e.g. `"ONE, PI, PLUS"`.
    #[must_use]
    pub fn code(&self) -> String {
        code_string(&self.tokens)
    }
}

/// Terminal search status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    /// A candidate met the acceptance criteria; enumeration was cut short.
    Success,
    /// The K range was exhausted without an acceptable match.
    Failure,
    /// The caller's abort signal was observed before completion.
    Aborted,
}

/// Evaluation counters for one worker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    /// f32 filter-tier evaluations (hybrid mode only).
    pub reduced_evals: u64,
    /// f64 evaluations (every evaluation in full mode; survivors in hybrid).
    pub full_evals: u64,
    /// Filter survivors handed to full-precision verification.
    pub candidates: u64,
    /// Forms with a non-empty assignment for this worker.
    pub forms_scanned: u64,
    /// Filter survivors dropped past `tolerances::FORM_CANDIDATE_CAP`.
    pub filter_overflow: u64,
}

/// Terminal report of one worker's search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    /// Best candidate seen. `None` only if nothing in the partition
    /// produced a finite value (or the search aborted before any did).
    pub best: Option<Match>,
    /// Highest K level whose assignment was fully enumerated. Lets callers
    /// distinguish "searched exhaustively" from "cut short" on Failure
    /// vs Abort.
    pub completed_k: Option<u32>,
    pub worker_id: u32,
    pub stats: SearchStats,
}

/// Progress messages streamed while a worker runs. Within one worker these
/// are causally ordered; across workers no ordering is guaranteed.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// The worker's best candidate strictly improved.
    Improved { worker_id: u32, best: Match },
    /// A K level's assignment was fully enumerated.
    LevelComplete { worker_id: u32, k: u32, best: Option<Match> },
}

/// Cooperative control surface for a running search.
#[derive(Default, Clone)]
pub struct SearchHooks {
    /// Checked between forms and every `ABORT_CHECK_INTERVAL` evaluations.
    pub abort: Option<Arc<AtomicBool>>,
    /// Receives `SearchEvent`s; send failures are ignored (a disconnected
    /// listener must not stop the search).
    pub progress: Option<Sender<SearchEvent>>,
}

/// Run a search with default hooks (no abort channel, no progress events).
pub fn search(cfg: &SearchConfig) -> Result<SearchOutcome, ClosedformError> {
    search_with_hooks(cfg, &SearchHooks::default())
}

/// Run a search; the worker side of the engine.
pub fn search_with_hooks(
    cfg: &SearchConfig,
    hooks: &SearchHooks,
) -> Result<SearchOutcome, ClosedformError> {
    cfg.validate()?;

    let mut driver = Driver {
        cfg,
        hooks,
        best: None,
        best_reduced: None,
        stats: SearchStats::default(),
        evals_since_check: 0,
        abort_seen: false,
        accepted: false,
    };

    let mut completed_k = None;
    'levels: for k in cfg.min_k..=cfg.max_k {
        if driver.abort_requested() {
            break;
        }
        let forms = generate_forms(k);
        for (ordinal, form) in forms.iter().enumerate() {
            let assignment = cfg.partition.assignment(cfg.strategy, ordinal, form.total_combinations);
            if assignment.is_empty() {
                continue;
            }
            driver.stats.forms_scanned += 1;
            match cfg.mode {
                EvalMode::Full => driver.scan_form_full(form, &assignment),
                EvalMode::Hybrid => driver.scan_form_hybrid(form, ordinal, &assignment),
            }
            if driver.accepted || driver.abort_seen {
                break 'levels;
            }
        }
        completed_k = Some(k);
        if let Some(tx) = &hooks.progress {
            let _ = tx.send(SearchEvent::LevelComplete {
                worker_id: cfg.partition.worker_id,
                k,
                best: driver.best.clone(),
            });
        }
    }

    if driver.best.is_none() && !driver.accepted {
        driver.promote_reduced_best();
    }

    let status = if driver.accepted {
        SearchStatus::Success
    } else if driver.abort_seen {
        SearchStatus::Aborted
    } else {
        SearchStatus::Failure
    };

    Ok(SearchOutcome {
        status,
        best: driver.best,
        completed_k,
        worker_id: cfg.partition.worker_id,
        stats: driver.stats,
    })
}

/// Rank, then collapse candidates that are numerically the same constant
/// (12 significant digits); the lowest-(rel_err, K) representative
/// survives. Callers merging multiple workers' reports apply this after
/// collection — worker emission order is meaningless.
#[must_use]
pub fn dedup_by_value(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by(|a, b| a.rel_err.total_cmp(&b.rel_err).then(a.k.cmp(&b.k)));
    let mut seen = std::collections::HashSet::new();
    matches.retain(|m| seen.insert(value_key(m.value)));
    matches
}

fn value_key(value: f64) -> String {
    format!("{:.*e}", tolerances::DEDUP_SIG_DIGITS - 1, value)
}

// ═══════════════════════════════════════════════════════════════════
// Driver internals
// ═══════════════════════════════════════════════════════════════════

struct Driver<'a> {
    cfg: &'a SearchConfig,
    hooks: &'a SearchHooks,
    best: Option<Match>,
    /// Best f32 filter-tier sighting (k, form ordinal, index, f32 error) —
    /// promoted to a verified Match only if the filter never produced a
    /// survivor, so a hybrid Failure still reports a closest-found.
    best_reduced: Option<(u32, usize, u64, f32)>,
    stats: SearchStats,
    evals_since_check: u64,
    abort_seen: bool,
    accepted: bool,
}

impl Driver<'_> {
    fn abort_requested(&mut self) -> bool {
        if self.abort_seen {
            return true;
        }
        if let Some(flag) = &self.hooks.abort {
            if flag.load(Ordering::Relaxed) {
                self.abort_seen = true;
            }
        }
        self.abort_seen
    }

    /// Per-evaluation bookkeeping; true means stop now.
    fn tick(&mut self) -> bool {
        self.evals_since_check += 1;
        if self.evals_since_check >= tolerances::ABORT_CHECK_INTERVAL {
            self.evals_since_check = 0;
            return self.abort_requested();
        }
        false
    }

    fn best_rel_err(&self) -> f64 {
        self.best.as_ref().map_or(f64::MAX, |m| m.rel_err)
    }

    /// Score a verified f64 value; record and emit on strict improvement.
    /// Returns true once a candidate is accepted.
    fn consider(&mut self, form: &Form, index: u64, value: f64) -> bool {
        let err = rel_err(value, self.cfg.target);
        if err >= self.best_rel_err() {
            return false;
        }
        let k = form.k();
        let cr = compression_ratio(err, k);
        let improved = Match {
            tokens: index_to_tokens(form, index),
            k,
            value,
            rel_err: err,
            compression_ratio: cr,
        };
        if let Some(tx) = &self.hooks.progress {
            let _ = tx.send(SearchEvent::Improved {
                worker_id: self.cfg.partition.worker_id,
                best: improved.clone(),
            });
        }
        self.best = Some(improved);
        if self.accepts(value, err, cr) {
            self.accepted = true;
        }
        self.accepted
    }

    /// Acceptance: floating-point-exact, or inside Δz with enough
    /// compression to rule out coincidence.
    fn accepts(&self, value: f64, err: f64, cr: f64) -> bool {
        if err <= tolerances::EXACT_REL_ERR {
            return true;
        }
        (value - self.cfg.target).abs() <= self.cfg.uncertainty
            && cr >= tolerances::MIN_COMPRESSION_RATIO
    }

    fn scan_form_full(&mut self, form: &Form, assignment: &FormAssignment) {
        let mut tokens =
            vec![Token { class: TokenClass::Constant, opcode: 0 }; form.classes.len()];
        for index in assignment.indices() {
            if self.tick() {
                return;
            }
            self.stats.full_evals += 1;
            index_to_tokens_into(form, index, &mut tokens);
            let Some(value) = eval_f64(&tokens) else { continue };
            if self.consider(form, index, value) {
                return;
            }
        }
    }

    fn scan_form_hybrid(&mut self, form: &Form, ordinal: usize, assignment: &FormAssignment) {
        let threshold = tolerances::fp32_filter_threshold(self.cfg.target, self.best_rel_err());
        let target32 = self.cfg.target as f32;
        let mut tokens =
            vec![Token { class: TokenClass::Constant, opcode: 0 }; form.classes.len()];
        let mut survivors: Vec<(u64, f32)> = Vec::new();

        for index in assignment.indices() {
            if self.tick() {
                return;
            }
            self.stats.reduced_evals += 1;
            index_to_tokens_into(form, index, &mut tokens);
            let Some(value32) = eval_f32(&tokens) else { continue };
            let err32 = rel_err_f32(value32, target32);

            if self.best_reduced.map_or(true, |(_, _, _, e)| err32 < e) {
                self.best_reduced = Some((form.k(), ordinal, index, err32));
            }

            if err32 < threshold {
                if survivors.len() >= tolerances::FORM_CANDIDATE_CAP {
                    self.stats.filter_overflow += 1;
                    continue;
                }
                survivors.push((index, err32));
            }
        }

        if survivors.is_empty() {
            return;
        }
        self.stats.candidates += survivors.len() as u64;
        self.stats.full_evals += survivors.len() as u64;

        // Verify the most promising first so acceptance short-circuits the
        // candidate list, not just the enumeration.
        survivors.sort_by(|a, b| a.1.total_cmp(&b.1));
        let verified: Vec<(u64, f64)> = survivors
            .par_iter()
            .filter_map(|&(index, _)| eval_f64(&index_to_tokens(form, index)).map(|v| (index, v)))
            .collect();

        for (index, value) in verified {
            if self.consider(form, index, value) {
                return;
            }
        }
    }

    /// Failure path with an empty survivor set: verify the best f32
    /// sighting so the outcome still carries a closest-found.
    fn promote_reduced_best(&mut self) {
        let Some((k, ordinal, index, _)) = self.best_reduced else { return };
        let forms = generate_forms(k);
        let Some(form) = forms.get(ordinal) else { return };
        self.stats.full_evals += 1;
        if let Some(value) = eval_f64(&index_to_tokens(form, index)) {
            self.consider(form, index, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{E, PI};

    #[test]
    fn pi_recognized_at_k1() {
        let cfg = SearchConfig::new(PI, 5e-15).with_k_range(1, 3);
        let outcome = search(&cfg).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        let best = outcome.best.unwrap();
        assert_eq!(best.k, 1);
        assert_eq!(best.code(), "PI");
        assert!(best.rel_err <= tolerances::EXACT_REL_ERR);
    }

    #[test]
    fn one_plus_pi_recognized_at_k3() {
        let cfg = SearchConfig::new(1.0 + PI, 1e-6).with_k_range(1, 4);
        let outcome = search(&cfg).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        let best = outcome.best.unwrap();
        assert_eq!(best.k, 3);
        assert!(best.rel_err < 1e-6 / (1.0 + PI));
        // ONE PI PLUS or PI ONE PLUS, whichever enumerates first
        assert!(best.code().contains("PI") && best.code().contains("ONE"));
    }

    #[test]
    fn full_and_hybrid_agree_on_the_winner() {
        for mode in [EvalMode::Full, EvalMode::Hybrid] {
            let cfg = SearchConfig::new(1.0 + PI, 1e-6).with_k_range(1, 4).with_mode(mode);
            let outcome = search(&cfg).unwrap();
            assert_eq!(outcome.status, SearchStatus::Success, "{mode:?}");
            assert_eq!(outcome.best.unwrap().k, 3, "{mode:?}");
        }
    }

    #[test]
    fn arbitrary_decimal_fails_with_closest_found() {
        let cfg = SearchConfig::new(123.456_789, 1e-12).with_k_range(1, 3);
        let outcome = search(&cfg).unwrap();
        assert_eq!(outcome.status, SearchStatus::Failure);
        assert_eq!(outcome.completed_k, Some(3));
        let best = outcome.best.expect("failure still reports closest-found");
        assert!(best.rel_err > 1e-9, "rel_err {} suspiciously small", best.rel_err);
    }

    #[test]
    fn search_is_deterministic() {
        let cfg = SearchConfig::new(2.0_f64.sqrt(), 1e-10).with_k_range(1, 3);
        let a = search(&cfg).unwrap();
        let b = search(&cfg).unwrap();
        assert_eq!(a.status, b.status);
        let (ba, bb) = (a.best.unwrap(), b.best.unwrap());
        assert_eq!(ba.code(), bb.code());
        assert_eq!(ba.value.to_bits(), bb.value.to_bits());
    }

    #[test]
    fn preset_abort_returns_promptly() {
        let abort = Arc::new(AtomicBool::new(true));
        let hooks = SearchHooks { abort: Some(abort), progress: None };
        let cfg = SearchConfig::new(E, 0.0).with_k_range(1, 9);
        let outcome = search_with_hooks(&cfg, &hooks).unwrap();
        assert_eq!(outcome.status, SearchStatus::Aborted);
        assert_eq!(outcome.completed_k, None);
        assert!(
            outcome.stats.reduced_evals + outcome.stats.full_evals
                <= tolerances::ABORT_CHECK_INTERVAL
        );
    }

    #[test]
    fn invalid_inputs_rejected_before_work() {
        let nan = SearchConfig::new(f64::NAN, 0.0);
        assert_eq!(search(&nan).unwrap_err(), ClosedformError::NonFiniteTarget);

        let empty = SearchConfig::new(1.0, 0.0).with_k_range(4, 2);
        assert!(matches!(search(&empty).unwrap_err(), ClosedformError::EmptyKRange { .. }));

        let deep = SearchConfig::new(1.0, 0.0).with_k_range(1, MAX_SEARCH_K + 1);
        assert!(matches!(search(&deep).unwrap_err(), ClosedformError::DepthExceeded { .. }));
    }

    #[test]
    fn zero_uncertainty_requires_fp_exact() {
        let cfg = SearchConfig::new(2.0_f64.sqrt(), 0.0).with_k_range(1, 2);
        let outcome = search(&cfg).unwrap();
        assert_eq!(outcome.status, SearchStatus::Success);
        assert_eq!(outcome.best.unwrap().code(), "TWO, SQRT");
    }

    #[test]
    fn compression_ratio_matches_definition() {
        let cr = compression_ratio(1e-8, 3);
        let expected = 8.0 / (3.0 * 36.0_f64.log10());
        assert!((cr - expected).abs() < 1e-12);
        // Exact matches clamp at ε
        assert!(compression_ratio(0.0, 1) > 9.0);
    }

    #[test]
    fn dedup_keeps_lowest_k_representative() {
        let make = |k: u32, value: f64, rel: f64| Match {
            tokens: Vec::new(),
            k,
            value,
            rel_err: rel,
            compression_ratio: compression_ratio(rel, k),
        };
        let deduped = dedup_by_value(vec![
            make(5, PI, 1e-16),
            make(1, PI, 1e-16),
            make(3, E, 1e-12),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].k, 1);
    }

    #[test]
    fn rel_err_zero_target_is_absolute() {
        assert_eq!(rel_err(0.25, 0.0), 0.25);
        assert_eq!(rel_err(PI, PI), 0.0);
    }
}
