// SPDX-License-Identifier: AGPL-3.0-only

//! Gamma function via Lanczos approximation (g=7, n=9).
//!
//! The only vocabulary operator without a `std` counterpart. Max relative
//! error ~2e-10 across the positive real axis (see `tolerances::GAMMA_F64`).
//! Reference: DLMF 5.2, Numerical Recipes §6.1.

use std::f64::consts::PI;

/// Lanczos coefficients for g=7, n=9.
const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Γ(x) for real x.
///
/// Poles at non-positive integers surface as non-finite or huge values,
/// which the expression evaluator rejects; callers need no special casing.
#[must_use]
pub fn gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x) = π / (sin(πx) · Γ(1−x))
        PI / ((PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = LANCZOS[0];
        for (i, c) in LANCZOS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + LANCZOS_G + 0.5;
        (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}

/// Γ(x) in the reduced-precision evaluation path.
///
/// The Lanczos sum cancels too heavily in native f32 (alternating terms up
/// to ~1.3e3), so the f64 core is evaluated and rounded once. Still cheap
/// relative to the rest of the reduced-precision pass.
#[must_use]
pub fn gamma_f32(x: f32) -> f32 {
    gamma(f64::from(x)) as f32
}
