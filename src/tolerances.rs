// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized thresholds with justification.
//!
//! Every numeric threshold the search driver uses is defined here with its
//! origin and rationale. No ad-hoc magic numbers in the hot loop.
//!
//! # Threshold categories
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Machine precision | IEEE 754 f64 | 16·ε equality window |
//! | Filter tier | IEEE 754 f32 | 1e-4 base filter threshold |
//! | Statistical | Information estimate | compression ratio ≥ 1.05 |

// ═══════════════════════════════════════════════════════════════════
// Full-precision (f64) acceptance
// ═══════════════════════════════════════════════════════════════════

/// Relative error at or below which a candidate counts as a
/// floating-point-exact match.
///
/// 16 ulp of headroom over f64 ε (2.22e-16): stack evaluation of a K≤12
/// expression accumulates a handful of correctly-rounded operations, so a
/// genuinely identical closed form lands within a few ulp of the target;
/// 16 leaves margin for the worst composition without admitting near-misses.
pub const EXACT_REL_ERR: f64 = 16.0 * f64::EPSILON;

/// Minimum compression ratio for a within-tolerance match to be accepted.
///
/// CR = 1 means the expression "spends" exactly as much information as the
/// digits it explains — indistinguishable from coincidence. 1.05 demands a
/// 5% surplus, which empirically filters the dense near-miss cloud at
/// K ≥ 6 while keeping every genuine short identity.
pub const MIN_COMPRESSION_RATIO: f64 = 1.05;

// ═══════════════════════════════════════════════════════════════════
// Reduced-precision (f32) filter tier
// ═══════════════════════════════════════════════════════════════════

/// Base relative-error threshold of the f32 filter pass.
///
/// f32 carries ~7 decimal digits; a true match evaluates to relative error
/// ≲ 1e-6 in f32, so 1e-4 keeps two orders of safety margin against
/// rounding along deep stacks while rejecting ~99.99% of candidates.
pub const FP32_FILTER_BASE: f32 = 1e-4;

/// Upper cap on the magnitude-widened filter threshold (1%).
///
/// For large targets f32 relative precision degrades with ln|z|; the
/// widening below compensates, but past 1% the filter would stop
/// filtering.
pub const FP32_FILTER_CAP: f32 = 1e-2;

/// Floor under the adaptively-tightened filter threshold.
///
/// Once a verified best exists the filter tightens to chase it, but never
/// below ~8× f32 ε — tighter would round away true matches.
pub const FP32_FILTER_FLOOR: f32 = 1e-6;

/// Documented agreement bound between the two precision paths.
///
/// For sequences whose f64 value is finite and well-scaled, the f32 path
/// agrees within this relative bound (guarded to magnitude ≥ 1). It is the
/// basis for `FP32_FILTER_BASE`: the filter threshold must sit above the
/// cross-precision disagreement or true matches would be filtered out.
pub const FP32_VS_FP64_AGREEMENT: f64 = 1e-4;

/// Dynamic filter threshold for a given target and current best.
///
/// Base threshold, widened by `1 + ln|z|/10` for |z| > 1 (f32 precision is
/// relative, so large targets need more slack), capped at
/// `FP32_FILTER_CAP`. Once full-precision verification has produced a best
/// candidate, the threshold tightens to 100× its relative error (floored)
/// so the filter only passes genuine contenders.
#[must_use]
pub fn fp32_filter_threshold(target: f64, best_rel_err: f64) -> f32 {
    let magnitude = target.abs() as f32;
    let mut threshold = if magnitude > 1.0 {
        (FP32_FILTER_BASE * (1.0 + magnitude.ln() / 10.0)).min(FP32_FILTER_CAP)
    } else {
        FP32_FILTER_BASE
    };
    if best_rel_err > 0.0 && best_rel_err < f64::from(threshold) {
        threshold = ((best_rel_err * 100.0) as f32).max(FP32_FILTER_FLOOR);
    }
    threshold
}

// ═══════════════════════════════════════════════════════════════════
// Driver mechanics
// ═══════════════════════════════════════════════════════════════════

/// Evaluations between cooperative abort checks.
///
/// Bounds abort latency in evaluation counts, not wall-clock: at ~1e7
/// evals/s per core this is sub-millisecond responsiveness, while the
/// atomic load stays invisible next to the evaluation itself.
pub const ABORT_CHECK_INTERVAL: u64 = 4096;

/// Per-form cap on f32 filter survivors held for verification.
///
/// A threshold that is accidentally loose (target near a dense value
/// cluster) could otherwise swamp memory; overflow beyond the cap is
/// counted in `SearchStats::filter_overflow` rather than silently
/// dropped. 8192 survivors × 12 bytes is noise, and a form with more
/// genuine contenders than that has a useless filter threshold anyway.
pub const FORM_CANDIDATE_CAP: usize = 8192;

/// Significant decimal digits used for value-identity deduplication.
///
/// Two expressions within 1e-12 relative of each other are the same
/// constant for ranking purposes (f64 spacing at 12 digits), so only the
/// lowest-K representative surfaces.
pub const DEDUP_SIG_DIGITS: usize = 12;
