// Bitcoin script and wire-message library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rebuilding a script with operations matching a predicate removed.

use super::canon::decode;
use super::op::{get_push_op, Op};
use crate::opcodes::OP_CODESEPARATOR;

/// Rebuilds `script`, re-encoding every operation that does *not* satisfy
/// `predicate`, in original order, and returns it along with the count of
/// operations that were dropped. When the count is zero the returned bytes
/// are still a faithful re-encoding of `script` (callers that want to
/// preserve the original allocation on a no-op can short-circuit on a zero
/// count themselves).
pub fn find_and_delete(script: &[u8], predicate: impl Fn(&Op) -> bool) -> (Vec<u8>, usize) {
    let ops = decode(script);
    let mut out = Vec::with_capacity(script.len());
    let mut count = 0;
    for op in &ops {
        if predicate(op) {
            count += 1;
            continue;
        }
        out.extend_from_slice(&op.encode());
    }
    (out, count)
}

/// Predicate matching a single-byte opcode exactly.
pub fn by_opcode(code: u8) -> impl Fn(&Op) -> bool { move |op| matches!(op, Op::Opcode(c) if *c == code) }

/// Predicate matching a push whose original wire form was tagged with push
/// opcode `code` (a direct length byte, `OP_PUSHDATA1/2/4`, or
/// `OP_1NEGATE`) and whose data equals `data` exactly. Unlike
/// [`by_pushed_bytes`], two pushes of the same bytes in different forms are
/// distinguished: this only matches the one encoded with `code`.
pub fn by_opcode_and_pushed_bytes(code: u8, data: Vec<u8>) -> impl Fn(&Op) -> bool {
    move |op| match op {
        Op::Push { data: d, .. } if *d == data => op.encode().first() == Some(&code),
        _ => false,
    }
}

/// Predicate matching a push whose bytes equal the canonical encoding of
/// `data` exactly. A push of the same logical value in a non-canonical form
/// does not match -- this mirrors the legacy signature-hash algorithm,
/// which scans for a literal byte match against a freshly serialized
/// target rather than comparing decoded values.
pub fn by_pushed_bytes(data: Vec<u8>) -> impl Fn(&Op) -> bool {
    let target = get_push_op(&data);
    move |op| op.encode() == target
}

/// Strips every `OP_CODESEPARATOR` from `script`. Used to normalize a
/// subscript before it is embedded in a signature hash.
pub fn strip_code_separators(script: &[u8]) -> Vec<u8> {
    find_and_delete(script, by_opcode(OP_CODESEPARATOR)).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::op::get_push_op;
    use proptest::prelude::*;

    #[test]
    fn strips_code_separator_between_pushes() {
        let mut script = get_push_op(b"abc");
        script.push(OP_CODESEPARATOR);
        script.extend(get_push_op(b"def"));

        let (cleaned, count) = find_and_delete(&script, by_opcode(OP_CODESEPARATOR));
        assert_eq!(count, 1);

        let mut expected = get_push_op(b"abc");
        expected.extend(get_push_op(b"def"));
        assert_eq!(cleaned, expected);
    }

    #[test]
    fn zero_matches_preserves_content() {
        let script = get_push_op(b"abc");
        let (cleaned, count) = find_and_delete(&script, by_opcode(OP_CODESEPARATOR));
        assert_eq!(count, 0);
        assert_eq!(cleaned, script);
    }

    #[test]
    fn by_pushed_bytes_matches_exact_data() {
        let mut script = get_push_op(b"sig");
        script.extend(get_push_op(b"sig"));
        script.extend(get_push_op(b"other"));

        let (cleaned, count) = find_and_delete(&script, by_pushed_bytes(b"sig".to_vec()));
        assert_eq!(count, 2);
        assert_eq!(cleaned, get_push_op(b"other"));
    }

    #[test]
    fn by_pushed_bytes_ignores_a_non_canonical_encoding_of_the_same_value() {
        use crate::opcodes::OP_PUSHDATA1;
        let mut script = vec![OP_PUSHDATA1, 3];
        script.extend_from_slice(b"sig");

        let (cleaned, count) = find_and_delete(&script, by_pushed_bytes(b"sig".to_vec()));
        assert_eq!(count, 0);
        assert_eq!(cleaned, script);
    }

    #[test]
    fn by_opcode_and_pushed_bytes_pins_down_the_form() {
        use crate::opcodes::OP_PUSHDATA1;
        let mut non_canonical = vec![OP_PUSHDATA1, 3];
        non_canonical.extend_from_slice(b"sig");
        let mut script = non_canonical.clone();
        script.extend(get_push_op(b"sig"));

        let (cleaned, count) =
            find_and_delete(&script, by_opcode_and_pushed_bytes(OP_PUSHDATA1, b"sig".to_vec()));
        assert_eq!(count, 1);
        assert_eq!(cleaned, get_push_op(b"sig"));
    }

    proptest! {
        #[test]
        fn find_and_delete_removes_exactly_the_matching_pushes(
            keep in prop::collection::vec(1u8..=250, 0..6),
            noise in prop::collection::vec(1u8..=250, 0..6),
        ) {
            let target = b"target".to_vec();
            let mut script = Vec::new();
            for b in &keep {
                script.extend(get_push_op(&[*b]));
            }
            for _ in &noise {
                script.extend(get_push_op(&target));
            }

            let (cleaned, count) = find_and_delete(&script, by_pushed_bytes(target.clone()));
            prop_assert_eq!(count, noise.len());

            let mut expected = Vec::new();
            for b in &keep {
                expected.extend(get_push_op(&[*b]));
            }
            prop_assert_eq!(cleaned, expected);

            let (decoded, _) = find_and_delete(&cleaned, by_pushed_bytes(target));
            prop_assert_eq!(decoded, cleaned);
        }
    }
}
