// SPDX-License-Identifier: AGPL-3.0-only

//! `--key=value` argument parsing shared by the binaries.
//!
//! Deliberately minimal: the binaries take a handful of numeric knobs and
//! flags, not subcommands.

/// Parse `--key=<u32>`, falling back to `default` when absent or malformed.
#[must_use]
pub fn parse_u32(args: &[String], key: &str, default: u32) -> u32 {
    let prefix = format!("{key}=");
    args.iter()
        .find(|a| a.starts_with(&prefix))
        .and_then(|a| a.strip_prefix(&prefix)?.parse().ok())
        .unwrap_or(default)
}

/// Parse `--key=<f64>`, falling back to `default` when absent or malformed.
#[must_use]
pub fn parse_f64(args: &[String], key: &str, default: f64) -> f64 {
    let prefix = format!("{key}=");
    args.iter()
        .find(|a| a.starts_with(&prefix))
        .and_then(|a| a.strip_prefix(&prefix)?.parse().ok())
        .unwrap_or(default)
}

/// True if the bare flag `--key` is present.
#[must_use]
pub fn parse_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}
