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

//! Boolean-valued script analyses. None of these reject anything consensus
//! accepts -- they are predicates, not validation gates.

use super::op::{read_next, Op};

/// Decodes every operation of `script`, stopping at the first [`Op::Invalid`]
/// (inclusive).
pub fn decode(script: &[u8]) -> Vec<Op> {
    let mut pos = 0;
    let mut ops = Vec::new();
    while let Some(op) = read_next(script, &mut pos) {
        let stop = matches!(op, Op::Invalid);
        ops.push(op);
        if stop {
            break;
        }
    }
    ops
}

/// True iff every operation is a push (`Push` or `Small`) and none of them
/// is `Invalid`.
pub fn is_push_only(script: &[u8]) -> bool {
    decode(script).iter().all(|op| matches!(op, Op::Push { .. } | Op::Small(_)))
}

/// True iff every push in `script` used its shortest encoding, per
/// [`Op::is_canonical_push`], and no op is `Invalid`.
pub fn has_canonical_pushes(script: &[u8]) -> bool {
    decode(script).iter().all(|op| !matches!(op, Op::Invalid) && op.is_canonical_push())
}

/// True iff `script` decodes cleanly from end to end with no `Invalid` op
/// and the decoded ops re-encode back to the original bytes.
pub fn is_valid(script: &[u8]) -> bool {
    let ops = decode(script);
    if ops.iter().any(|op| matches!(op, Op::Invalid)) {
        return false;
    }
    let reencoded: Vec<u8> = ops.iter().flat_map(Op::encode).collect();
    reencoded == script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::*;

    #[test]
    fn push_only_accepts_pushes() {
        let script = [OP_PUSHBYTES_3, b'a', b'b', b'c', OP_PUSHNUM_1];
        assert!(is_push_only(&script));
    }

    #[test]
    fn push_only_rejects_opcodes() {
        let script = [OP_PUSHBYTES_3, b'a', b'b', b'c', OP_CHECKSIG];
        assert!(!is_push_only(&script));
    }

    #[test]
    fn canonical_pushes_rejects_non_minimal_form() {
        let mut script = vec![OP_PUSHDATA1, 3];
        script.extend_from_slice(b"abc");
        assert!(!has_canonical_pushes(&script));
    }

    #[test]
    fn canonical_pushes_accepts_minimal_direct_push() {
        let script = [OP_PUSHBYTES_3, b'a', b'b', b'c'];
        assert!(has_canonical_pushes(&script));
    }

    #[test]
    fn is_valid_rejects_truncated_script() {
        let script = [OP_PUSHDATA2, 0xFF];
        assert!(!is_valid(&script));
    }

    #[test]
    fn is_valid_accepts_well_formed_script() {
        let script = [OP_DUP, OP_HASH160, OP_PUSHBYTES_20, 0u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, OP_EQUALVERIFY, OP_CHECKSIG];
        assert!(is_valid(&script));
    }

    #[test]
    fn is_valid_accepts_non_canonical_but_well_formed_script() {
        // OP_PUSHDATA1 3 "abc" parses cleanly and re-encodes to itself, even
        // though a direct push would have been shorter.
        let mut script = vec![OP_PUSHDATA1, 3];
        script.extend_from_slice(b"abc");
        assert!(is_valid(&script));
        assert!(!has_canonical_pushes(&script));
    }
}
