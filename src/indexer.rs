// SPDX-License-Identifier: AGPL-3.0-only

//! Combination indexer: mixed-radix bijection between a flat u64 index and
//! a concrete token sequence within a form.
//!
//! Position 0 is the least significant digit. The mapping is a pure
//! function of (form, index) — no state, trivially safe to call from any
//! number of workers. Index arithmetic is u64 throughout: combination
//! counts exceed 2^32 from K=8 with the full vocabulary.

use crate::forms::Form;
use crate::vocab::{Token, TokenClass};

/// Decode `index` into `out`, which must be exactly K tokens long.
///
/// Hot-loop variant: no allocation. `index` must be below
/// `form.total_combinations`; digits beyond that range would decode to an
/// aliased sequence, so the debug build asserts.
pub fn index_to_tokens_into(form: &Form, index: u64, out: &mut [Token]) {
    debug_assert_eq!(out.len(), form.classes.len());
    debug_assert!(index < form.total_combinations);

    let mut remaining = index;
    for (slot, (&class, &radix)) in out.iter_mut().zip(form.classes.iter().zip(&form.radices)) {
        let opcode = (remaining % radix) as u8;
        remaining /= radix;
        *slot = Token { class, opcode };
    }
}

/// Decode `index` into a fresh token sequence.
#[must_use]
pub fn index_to_tokens(form: &Form, index: u64) -> Vec<Token> {
    let mut out = vec![Token { class: TokenClass::Constant, opcode: 0 }; form.classes.len()];
    index_to_tokens_into(form, index, &mut out);
    out
}

/// Re-encode a token sequence to its flat index.
///
/// Returns `None` if the sequence does not fit the form (wrong length,
/// class mismatch, or opcode outside the class radix).
#[must_use]
pub fn tokens_to_index(form: &Form, tokens: &[Token]) -> Option<u64> {
    if tokens.len() != form.classes.len() {
        return None;
    }
    let mut index = 0u64;
    for ((token, &class), &radix) in
        tokens.iter().zip(form.classes.iter()).zip(&form.radices).rev()
    {
        if token.class != class || u64::from(token.opcode) >= radix {
            return None;
        }
        index = index * radix + u64::from(token.opcode);
    }
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::generate_forms;

    #[test]
    fn roundtrip_over_small_forms() {
        for k in 1..=3 {
            for form in generate_forms(k) {
                for index in 0..form.total_combinations {
                    let tokens = index_to_tokens(&form, index);
                    assert_eq!(tokens_to_index(&form, &tokens), Some(index));
                }
            }
        }
    }

    #[test]
    fn position_zero_is_least_significant() {
        // Form [const, const, binary]: index 1 bumps the first constant.
        let form = generate_forms(3)
            .into_iter()
            .find(|f| f.radices == [13, 13, 5])
            .unwrap();
        let t0 = index_to_tokens(&form, 0);
        let t1 = index_to_tokens(&form, 1);
        assert_eq!(t1[0].opcode, t0[0].opcode + 1);
        assert_eq!(t1[1].opcode, t0[1].opcode);
        assert_eq!(t1[2].opcode, t0[2].opcode);
    }

    #[test]
    fn distinct_indices_decode_distinct_sequences() {
        use std::collections::HashSet;
        let form = generate_forms(2).remove(0); // [const, unary], 234 combinations
        let mut seen = HashSet::new();
        for index in 0..form.total_combinations {
            assert!(seen.insert(index_to_tokens(&form, index)), "collision at {index}");
        }
        assert_eq!(seen.len(), form.total_combinations as usize);
    }

    #[test]
    fn mismatched_sequence_rejected() {
        let forms = generate_forms(3);
        let ccb = forms.iter().find(|f| f.radices == [13, 13, 5]).unwrap();
        let cuu = forms.iter().find(|f| f.radices == [13, 18, 18]).unwrap();
        let tokens = index_to_tokens(ccb, 42);
        assert_eq!(tokens_to_index(cuu, &tokens), None);
        assert_eq!(tokens_to_index(ccb, &tokens[..2]), None);
    }
}
