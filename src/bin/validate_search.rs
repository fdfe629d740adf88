// SPDX-License-Identifier: AGPL-3.0-only

//! Search engine validation.
//!
//! Recognition scenarios with hardcoded expectations (see `provenance`),
//! determinism, two-tier precision consistency, and abort latency.
//!
//! Exit code 0 = all checks pass, 1 = any check fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use closedform::eval::{eval_f32, eval_f64};
use closedform::forms::generate_forms;
use closedform::indexer::index_to_tokens;
use closedform::provenance::{ARBITRARY_DECIMAL, EULER_EXACT, ONE_PLUS_PI, PI_EXACT, SQRT_TWO};
use closedform::search::{
    search, search_with_hooks, EvalMode, SearchConfig, SearchHooks, SearchStatus,
};
use closedform::tolerances;
use closedform::validation::ValidationHarness;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Search Engine Validation                                   ║");
    println!("║  Recognition scenarios, determinism, two-tier consistency   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("search");

    scenario_pi(&mut harness);
    scenario_one_plus_pi(&mut harness);
    scenario_sqrt_two(&mut harness);
    scenario_arbitrary_decimal(&mut harness);
    scenario_determinism(&mut harness);
    scenario_two_tier_consistency(&mut harness);
    scenario_abort(&mut harness);

    harness.finish();
}

// ── Scenario 1: π recognized as the single-token constant ──
fn scenario_pi(harness: &mut ValidationHarness) {
    println!("── π at K=1 ──");
    let cfg = SearchConfig::new(PI_EXACT.target, PI_EXACT.uncertainty).with_k_range(1, 3);
    match search(&cfg) {
        Ok(outcome) => {
            harness.check_status("pi status", outcome.status, SearchStatus::Success);
            harness.check_code("pi code", outcome.best.as_ref(), PI_EXACT.expected_code);
            if let Some(best) = &outcome.best {
                harness.check_abs("pi K", f64::from(best.k), f64::from(PI_EXACT.expected_k), 0.5);
                harness.check_upper("pi rel_err", best.rel_err, tolerances::EXACT_REL_ERR);
            }
        }
        Err(e) => harness.check_bool(&format!("pi search ran [{e}]"), false),
    }
}

// ── Scenario 2: 1 + π needs three tokens and the Δz acceptance path ──
fn scenario_one_plus_pi(harness: &mut ValidationHarness) {
    println!("── 1 + π at K=3, both evaluation modes ──");
    for mode in [EvalMode::Hybrid, EvalMode::Full] {
        let cfg = SearchConfig::new(ONE_PLUS_PI.target, ONE_PLUS_PI.uncertainty)
            .with_k_range(1, 4)
            .with_mode(mode);
        match search(&cfg) {
            Ok(outcome) => {
                let tag = format!("1+pi {mode:?}");
                harness.check_status(&format!("{tag} status"), outcome.status, SearchStatus::Success);
                harness.check_code(
                    &format!("{tag} code"),
                    outcome.best.as_ref(),
                    ONE_PLUS_PI.expected_code,
                );
                if let Some(best) = &outcome.best {
                    harness.check_upper(
                        &format!("{tag} abs_err"),
                        (best.value - ONE_PLUS_PI.target).abs(),
                        ONE_PLUS_PI.uncertainty,
                    );
                }
            }
            Err(e) => harness.check_bool(&format!("1+pi {mode:?} ran [{e}]"), false),
        }
    }
}

// ── Zero-uncertainty exact path at K=2 ──
fn scenario_sqrt_two(harness: &mut ValidationHarness) {
    println!("── √2 with Δz = 0 ──");
    let cfg = SearchConfig::new(SQRT_TWO.target, SQRT_TWO.uncertainty).with_k_range(1, 2);
    match search(&cfg) {
        Ok(outcome) => {
            harness.check_status("sqrt2 status", outcome.status, SearchStatus::Success);
            harness.check_code("sqrt2 code", outcome.best.as_ref(), SQRT_TWO.expected_code);
        }
        Err(e) => harness.check_bool(&format!("sqrt2 search ran [{e}]"), false),
    }
}

// ── Scenario 3: arbitrary decimal must fail, reporting a distant closest ──
fn scenario_arbitrary_decimal(harness: &mut ValidationHarness) {
    println!("── arbitrary decimal fails at K ≤ 3 ──");
    let cfg =
        SearchConfig::new(ARBITRARY_DECIMAL.target, ARBITRARY_DECIMAL.uncertainty).with_k_range(1, 3);
    match search(&cfg) {
        Ok(outcome) => {
            harness.check_status("arbitrary status", outcome.status, SearchStatus::Failure);
            harness.check_bool("arbitrary completed_k", outcome.completed_k == Some(3));
            match &outcome.best {
                Some(best) => {
                    // The closest K ≤ 3 form is orders of magnitude outside Δz.
                    harness.check_bool("arbitrary closest is distant", best.rel_err > 1e-4);
                }
                None => harness.check_bool("arbitrary closest reported", false),
            }
        }
        Err(e) => harness.check_bool(&format!("arbitrary search ran [{e}]"), false),
    }
}

// ── Identical inputs → identical outcome, including value bits ──
fn scenario_determinism(harness: &mut ValidationHarness) {
    println!("── determinism ──");
    let cfg = SearchConfig::new(EULER_EXACT.target, 1e-9).with_k_range(1, 5);
    match (search(&cfg), search(&cfg)) {
        (Ok(a), Ok(b)) => {
            harness.check_bool("determinism status", a.status == b.status);
            let codes = match (&a.best, &b.best) {
                (Some(x), Some(y)) => x.code() == y.code() && x.value.to_bits() == y.value.to_bits(),
                (None, None) => true,
                _ => false,
            };
            harness.check_bool("determinism winner", codes);
        }
        _ => harness.check_bool("determinism searches ran", false),
    }
}

// ── Two-tier consistency: f32 tracks f64 for every K ≤ 2 sequence ──
fn scenario_two_tier_consistency(harness: &mut ValidationHarness) {
    println!("── two-tier precision consistency, exhaustive K ≤ 2 ──");
    let mut compared: u64 = 0;
    let mut violations: u64 = 0;
    for k in 1..=2 {
        for form in generate_forms(k) {
            for index in 0..form.total_combinations {
                let tokens = index_to_tokens(&form, index);
                let (Some(full), Some(reduced)) = (eval_f64(&tokens), eval_f32(&tokens)) else {
                    continue;
                };
                compared += 1;
                let bound = tolerances::FP32_VS_FP64_AGREEMENT * full.abs().max(1.0);
                if (f64::from(reduced) - full).abs() > bound {
                    violations += 1;
                }
            }
        }
    }
    println!("    {compared} sequences compared across both precisions");
    harness.check_bool("two-tier sequences compared", compared > 200);
    harness.check_abs("two-tier violations", violations as f64, 0.0, 0.5);
}

// ── Scenario 5: abort observed within bounded evaluation latency ──
fn scenario_abort(harness: &mut ValidationHarness) {
    println!("── abort latency ──");

    // Pre-set flag: the driver must stop before the first check interval.
    let hooks = SearchHooks {
        abort: Some(Arc::new(AtomicBool::new(true))),
        progress: None,
    };
    let cfg = SearchConfig::new(ARBITRARY_DECIMAL.target, 0.0).with_k_range(1, 9);
    match search_with_hooks(&cfg, &hooks) {
        Ok(outcome) => {
            harness.check_status("preset abort status", outcome.status, SearchStatus::Aborted);
            harness.check_upper(
                "preset abort evals",
                (outcome.stats.reduced_evals + outcome.stats.full_evals) as f64,
                (tolerances::ABORT_CHECK_INTERVAL + 1) as f64,
            );
        }
        Err(e) => harness.check_bool(&format!("preset abort ran [{e}]"), false),
    }

    // Mid-flight signal: K ≤ 9 is days of enumeration, so a prompt return
    // can only come from the abort path.
    let abort = Arc::new(AtomicBool::new(false));
    let hooks = SearchHooks { abort: Some(Arc::clone(&abort)), progress: None };
    let cfg = SearchConfig::new(ARBITRARY_DECIMAL.target, 0.0).with_k_range(1, 9);
    let worker = thread::spawn(move || search_with_hooks(&cfg, &hooks));
    thread::sleep(Duration::from_millis(50));
    abort.store(true, Ordering::Relaxed);
    match worker.join() {
        Ok(Ok(outcome)) => {
            harness.check_status("mid-flight abort status", outcome.status, SearchStatus::Aborted);
            harness.check_bool(
                "mid-flight abort cut short",
                outcome.completed_k.unwrap_or(0) < 9,
            );
        }
        _ => harness.check_bool("mid-flight abort ran", false),
    }
}
