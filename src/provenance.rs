// SPDX-License-Identifier: AGPL-3.0-only

//! Reference targets for validation binaries.
//!
//! Every hardcoded expectation in a validation binary traces back to a
//! known closed form, evaluated through `std` f64 arithmetic at the exact
//! token semantics of the vocabulary. Centralizing them here keeps the
//! binaries free of bare magic decimals.

use std::f64::consts::{E, PI};

/// A target value with a known shortest closed form.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTarget {
    /// Human-readable label
    pub label: &'static str,
    /// The value handed to the search
    pub target: f64,
    /// Absolute uncertainty Δz for the invocation
    pub uncertainty: f64,
    /// Expected winning code (opcode names), empty if the search must fail
    pub expected_code: &'static str,
    /// Expected winning K (0 if the search must fail)
    pub expected_k: u32,
    /// Where the value comes from
    pub note: &'static str,
}

/// π as a single token.
pub const PI_EXACT: ReferenceTarget = ReferenceTarget {
    label: "pi single token",
    target: PI,
    uncertainty: 5e-15,
    expected_code: "PI",
    expected_k: 1,
    note: "IEEE 754 double of pi (std::f64::consts::PI)",
};

/// 1 + π, the canonical three-token sum.
pub const ONE_PLUS_PI: ReferenceTarget = ReferenceTarget {
    label: "1 + pi",
    target: 1.0 + PI,
    uncertainty: 1e-6,
    expected_code: "ONE, PI, PLUS",
    expected_k: 3,
    note: "f64 sum 1.0 + PI; loose tolerance exercises the Δz path",
};

/// e as a single token; the partition-exclusivity scenario.
pub const EULER_EXACT: ReferenceTarget = ReferenceTarget {
    label: "e single token",
    target: E,
    uncertainty: 0.0,
    expected_code: "EULER",
    expected_k: 1,
    note: "IEEE 754 double of e (std::f64::consts::E)",
};

/// √2, exercising the zero-uncertainty exact path at K=2.
pub const SQRT_TWO: ReferenceTarget = ReferenceTarget {
    label: "sqrt(2)",
    target: std::f64::consts::SQRT_2,
    uncertainty: 0.0,
    expected_code: "TWO, SQRT",
    expected_k: 2,
    note: "IEEE 754 double of sqrt(2) (std::f64::consts::SQRT_2)",
};

/// An arbitrary decimal with no short closed form: must fail at K ≤ 3.
pub const ARBITRARY_DECIMAL: ReferenceTarget = ReferenceTarget {
    label: "arbitrary decimal",
    target: 123.456_789,
    uncertainty: 1e-12,
    expected_code: "",
    expected_k: 0,
    note: "digit pattern with no K<=3 representation; failure scenario",
};

/// All reference targets, for sweep-style validation.
pub const REFERENCE_TARGETS: [ReferenceTarget; 5] =
    [PI_EXACT, ONE_PLUS_PI, EULER_EXACT, SQRT_TWO, ARBITRARY_DECIMAL];
