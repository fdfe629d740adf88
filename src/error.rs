// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for search invocation.
//!
//! All variants are invalid-input errors: they are reported synchronously,
//! before any enumeration work begins. Evaluation-domain failures (NaN,
//! overflow, division by zero inside a candidate expression) are never
//! errors — the evaluator rejects those candidates silently.

use std::fmt;

/// Errors rejecting a search invocation before any work is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedformError {
    /// Target value is NaN or infinite.
    NonFiniteTarget,

    /// The K range is empty: `min_k == 0` or `min_k > max_k`.
    EmptyKRange { min_k: u32, max_k: u32 },

    /// `max_k` exceeds the supported expression depth.
    DepthExceeded { max_k: u32, limit: u32 },

    /// Partition parameters violate `worker_id < worker_count`.
    InvalidPartition { worker_id: u32, worker_count: u32 },

    /// A worker thread panicked; its partition was not completed.
    WorkerPanicked { worker_id: u32 },
}

impl fmt::Display for ClosedformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteTarget => write!(f, "Target value must be finite"),
            Self::EmptyKRange { min_k, max_k } => {
                write!(f, "Empty K range: min_k={min_k}, max_k={max_k} (need 1 <= min_k <= max_k)")
            }
            Self::DepthExceeded { max_k, limit } => {
                write!(f, "max_k={max_k} exceeds the supported depth {limit}")
            }
            Self::InvalidPartition { worker_id, worker_count } => {
                write!(
                    f,
                    "Invalid partition: worker_id={worker_id}, worker_count={worker_count} \
                     (need worker_id < worker_count, worker_count > 0)"
                )
            }
            Self::WorkerPanicked { worker_id } => {
                write!(f, "Worker {worker_id} panicked before completing its partition")
            }
        }
    }
}

impl std::error::Error for ClosedformError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_non_finite_target() {
        let err = ClosedformError::NonFiniteTarget;
        assert_eq!(err.to_string(), "Target value must be finite");
    }

    #[test]
    fn display_empty_k_range() {
        let err = ClosedformError::EmptyKRange { min_k: 4, max_k: 2 };
        assert_eq!(
            err.to_string(),
            "Empty K range: min_k=4, max_k=2 (need 1 <= min_k <= max_k)"
        );
    }

    #[test]
    fn display_invalid_partition() {
        let err = ClosedformError::InvalidPartition { worker_id: 4, worker_count: 4 };
        assert_eq!(
            err.to_string(),
            "Invalid partition: worker_id=4, worker_count=4 \
             (need worker_id < worker_count, worker_count > 0)"
        );
    }

    #[test]
    fn error_trait_object_safe() {
        let err: Box<dyn std::error::Error> =
            Box::new(ClosedformError::DepthExceeded { max_k: 20, limit: 12 });
        assert!(err.to_string().contains("max_k=20"));
    }
}
