// SPDX-License-Identifier: AGPL-3.0-only
#![allow(clippy::unwrap_used)]

//! Integration tests: work partitioner against the real form geometry.
//!
//! For every strategy and worker count, the union of assignments must
//! equal the full (K, form, index) space with zero duplicates — the
//! structural guarantee that makes lock-free parallel search correct.

use std::collections::HashSet;

use closedform::forms::generate_forms;
use closedform::partition::{Partition, PartitionStrategy};

fn full_space(max_k: u32) -> u64 {
    (1..=max_k)
        .map(|k| generate_forms(k).iter().map(|f| f.total_combinations).sum::<u64>())
        .sum()
}

#[test]
fn stride_partition_covers_without_duplicates() {
    let max_k = 4;
    let expected = full_space(max_k);
    for worker_count in [1u32, 2, 4, 8] {
        let mut seen: HashSet<(u32, usize, u64)> = HashSet::new();
        for worker_id in 0..worker_count {
            let partition = Partition::new(worker_id, worker_count).unwrap();
            for k in 1..=max_k {
                for (ordinal, form) in generate_forms(k).iter().enumerate() {
                    let assignment = partition.assignment(
                        PartitionStrategy::IndexStride,
                        ordinal,
                        form.total_combinations,
                    );
                    for index in assignment.indices() {
                        assert!(
                            seen.insert((k, ordinal, index)),
                            "duplicate (K={k}, form={ordinal}, index={index}) at N={worker_count}"
                        );
                    }
                }
            }
        }
        assert_eq!(seen.len() as u64, expected, "coverage gap at N={worker_count}");
    }
}

#[test]
fn round_robin_partition_covers_without_duplicates() {
    let max_k = 4;
    let expected = full_space(max_k);
    for worker_count in [1u32, 2, 4, 8] {
        let mut seen: HashSet<(u32, usize, u64)> = HashSet::new();
        for worker_id in 0..worker_count {
            let partition = Partition::new(worker_id, worker_count).unwrap();
            for k in 1..=max_k {
                for (ordinal, form) in generate_forms(k).iter().enumerate() {
                    let assignment = partition.assignment(
                        PartitionStrategy::FormRoundRobin,
                        ordinal,
                        form.total_combinations,
                    );
                    for index in assignment.indices() {
                        assert!(seen.insert((k, ordinal, index)));
                    }
                }
            }
        }
        assert_eq!(seen.len() as u64, expected, "coverage gap at N={worker_count}");
    }
}

#[test]
fn assignment_lengths_sum_to_form_totals() {
    for worker_count in [1u32, 3, 7] {
        for (ordinal, form) in generate_forms(3).iter().enumerate() {
            let total: u64 = (0..worker_count)
                .map(|id| {
                    Partition::new(id, worker_count)
                        .unwrap()
                        .assignment(PartitionStrategy::IndexStride, ordinal, form.total_combinations)
                        .len()
                })
                .sum();
            assert_eq!(total, form.total_combinations);
        }
    }
}

#[test]
fn assignment_is_timing_independent() {
    // Pure function of geometry: repeated calls yield identical slices.
    let partition = Partition::new(2, 4).unwrap();
    let a: Vec<u64> = partition
        .assignment(PartitionStrategy::IndexStride, 0, 845)
        .indices()
        .collect();
    let b: Vec<u64> = partition
        .assignment(PartitionStrategy::IndexStride, 0, 845)
        .indices()
        .collect();
    assert_eq!(a, b);
    assert!(a.iter().all(|i| i % 4 == 2));
}
