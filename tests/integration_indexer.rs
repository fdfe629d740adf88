// SPDX-License-Identifier: AGPL-3.0-only
#![allow(clippy::unwrap_used)]

//! Integration tests: combination indexer public API.
//!
//! The index ↔ sequence mapping must be a bijection over
//! [0, totalCombinations) for every form — the partitioner's disjointness
//! guarantee collapses without it.

use std::collections::HashSet;

use closedform::forms::generate_forms;
use closedform::indexer::{index_to_tokens, index_to_tokens_into, tokens_to_index};
use closedform::vocab::{code_string, Token, TokenClass};

#[test]
fn bijection_full_coverage_k3() {
    for form in generate_forms(3) {
        let mut seen = HashSet::new();
        for index in 0..form.total_combinations {
            let tokens = index_to_tokens(&form, index);
            assert_eq!(tokens.len(), form.classes.len());
            assert!(seen.insert(tokens.clone()), "collision at index {index}");
            assert_eq!(tokens_to_index(&form, &tokens), Some(index));
        }
        assert_eq!(seen.len() as u64, form.total_combinations);
    }
}

#[test]
fn classes_of_decoded_tokens_match_the_form() {
    for form in generate_forms(4) {
        // Sample the corners and a stride through the middle.
        let probes = [0, 1, form.total_combinations / 2, form.total_combinations - 1];
        for &index in &probes {
            for (token, class) in index_to_tokens(&form, index).iter().zip(&form.classes) {
                assert_eq!(token.class, *class);
                assert!((token.opcode as usize) < class.cardinality());
            }
        }
    }
}

#[test]
fn allocating_and_in_place_decodes_agree() {
    let form = generate_forms(3)
        .into_iter()
        .find(|f| f.radices == [13, 13, 5])
        .unwrap();
    let mut buffer = vec![Token { class: TokenClass::Constant, opcode: 0 }; 3];
    for index in [0u64, 4, 52, 844] {
        index_to_tokens_into(&form, index, &mut buffer);
        assert_eq!(buffer, index_to_tokens(&form, index));
    }
}

#[test]
fn known_sequence_decodes_at_its_expected_index() {
    // [const, const, binary]: index = c0 + 13·c1 + 169·b.
    // ONE(4) PI(0) PLUS(0) → 4.
    let form = generate_forms(3)
        .into_iter()
        .find(|f| f.radices == [13, 13, 5])
        .unwrap();
    let tokens = index_to_tokens(&form, 4);
    assert_eq!(code_string(&tokens), "ONE, PI, PLUS");
    assert_eq!(tokens_to_index(&form, &tokens), Some(4));
}

#[test]
fn indexing_is_pure_and_repeatable() {
    let form = generate_forms(2).remove(0);
    for index in 0..form.total_combinations {
        assert_eq!(index_to_tokens(&form, index), index_to_tokens(&form, index));
    }
}
