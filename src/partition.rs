// SPDX-License-Identifier: AGPL-3.0-only

//! Work partitioning: deterministic, disjoint, collectively-exhaustive
//! assignment of the (K, form, combination-index) space to workers.
//!
//! Assignment is a pure function of the static space geometry and
//! `(worker_id, worker_count)` — no wall-clock dependence, so coverage and
//! disjointness are testable without running any worker.

use serde::Serialize;

use crate::error::ClosedformError;

/// One worker's identity within a worker group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub worker_id: u32,
    pub worker_count: u32,
}

impl Partition {
    /// Validated constructor: `worker_id < worker_count`, `worker_count > 0`.
    pub fn new(worker_id: u32, worker_count: u32) -> Result<Self, ClosedformError> {
        if worker_count == 0 || worker_id >= worker_count {
            return Err(ClosedformError::InvalidPartition { worker_id, worker_count });
        }
        Ok(Self { worker_id, worker_count })
    }

    /// The single-worker partition covering the whole space.
    #[must_use]
    pub const fn solo() -> Self {
        Self { worker_id: 0, worker_count: 1 }
    }

    /// This worker's slice of one form's combination space.
    #[must_use]
    pub fn assignment(
        self,
        strategy: PartitionStrategy,
        form_ordinal: usize,
        total_combinations: u64,
    ) -> FormAssignment {
        match strategy {
            PartitionStrategy::IndexStride => FormAssignment {
                start: u64::from(self.worker_id),
                stride: u64::from(self.worker_count),
                total: total_combinations,
            },
            PartitionStrategy::FormRoundRobin => {
                if form_ordinal as u64 % u64::from(self.worker_count)
                    == u64::from(self.worker_id)
                {
                    FormAssignment { start: 0, stride: 1, total: total_combinations }
                } else {
                    FormAssignment::empty()
                }
            }
        }
    }
}

/// How the space is split across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PartitionStrategy {
    /// Worker i takes combination indices i, i+N, i+2N, … within every
    /// form. Keeps all workers busy even when one form dominates a K level.
    #[default]
    IndexStride,
    /// Whole forms are dealt round-robin by form ordinal. Coarser; only
    /// competitive when forms vastly outnumber workers.
    FormRoundRobin,
}

/// An arithmetic progression of combination indices inside one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormAssignment {
    pub start: u64,
    pub stride: u64,
    pub total: u64,
}

impl FormAssignment {
    const fn empty() -> Self {
        Self { start: 0, stride: 1, total: 0 }
    }

    /// Number of indices assigned.
    #[must_use]
    pub const fn len(&self) -> u64 {
        if self.start >= self.total {
            0
        } else {
            (self.total - self.start - 1) / self.stride + 1
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The assigned indices, ascending.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        (self.start..self.total).step_by(self.stride as usize)
    }
}
