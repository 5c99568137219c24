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

//! Signature-operation counting, in both the approximate (pre-BIP16) and
//! accurate (consensus) modes.

use super::canon::{decode, is_push_only};
use super::op::Op;
use crate::opcodes::{OP_CHECKMULTISIG, OP_CHECKMULTISIGVERIFY, OP_CHECKSIG, OP_CHECKSIGVERIFY};

const ACCURATE_MULTISIG_DEFAULT: u32 = 20;

/// Counts signature operations in `script`. In accurate mode, a
/// `CHECKMULTISIG`/`CHECKMULTISIGVERIFY` counts the value of the
/// immediately preceding `OP_1..OP_16`, or 20 if no such op precedes it;
/// otherwise (approximate mode) every multisig op counts flatly as 20.
/// `CHECKSIG`/`CHECKSIGVERIFY` always count 1.
pub fn count_sig_ops(script: &[u8], accurate: bool) -> u32 {
    let ops = decode(script);
    let mut total = 0u32;
    let mut prev_small: Option<u8> = None;
    for op in &ops {
        match op {
            Op::Opcode(c) if *c == OP_CHECKSIG || *c == OP_CHECKSIGVERIFY => total += 1,
            Op::Opcode(c) if *c == OP_CHECKMULTISIG || *c == OP_CHECKMULTISIGVERIFY => {
                total += if accurate {
                    prev_small.map(u32::from).unwrap_or(ACCURATE_MULTISIG_DEFAULT)
                } else {
                    ACCURATE_MULTISIG_DEFAULT
                };
            }
            _ => {}
        }
        prev_small = match op {
            Op::Small(n) => Some(*n),
            _ => None,
        };
    }
    total
}

/// Signature-operation count for a P2SH output: re-parses the last pushed
/// element of `script_sig` as a redeem script and counts it in accurate
/// mode, provided `script_sig` is push-only. A `script_sig` that is not
/// push-only (and therefore cannot be the canonical P2SH spend form)
/// contributes zero.
pub fn count_p2sh_sig_ops(script_sig: &[u8]) -> u32 {
    if !is_push_only(script_sig) {
        return 0;
    }
    let ops = decode(script_sig);
    let redeem_script = ops.iter().rev().find_map(|op| match op {
        Op::Push { data, .. } => Some(data.as_slice()),
        _ => None,
    });
    match redeem_script {
        Some(redeem) => count_sig_ops(redeem, true),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::OP_PUSHNUM_2;
    use crate::script::op::get_push_op;

    fn pubkey(byte: u8) -> Vec<u8> { vec![byte; 33] }

    #[test]
    fn checksig_counts_one() {
        assert_eq!(count_sig_ops(&[OP_CHECKSIG], true), 1);
        assert_eq!(count_sig_ops(&[OP_CHECKSIG], false), 1);
    }

    #[test]
    fn multisig_accurate_uses_preceding_small_push() {
        // OP_2 <pkA> <pkB> OP_2 OP_CHECKMULTISIG
        let mut script = vec![OP_PUSHNUM_2];
        script.extend(get_push_op(&pubkey(0xAA)));
        script.extend(get_push_op(&pubkey(0xBB)));
        script.push(OP_PUSHNUM_2);
        script.push(OP_CHECKMULTISIG);

        assert_eq!(count_sig_ops(&script, true), 2);
        assert_eq!(count_sig_ops(&script, false), 20);
    }

    #[test]
    fn multisig_accurate_with_no_preceding_push_defaults_to_twenty() {
        let script = [OP_CHECKMULTISIG];
        assert_eq!(count_sig_ops(&script, true), 20);
    }

    #[test]
    fn p2sh_sig_op_count_from_last_push() {
        let mut redeem = vec![OP_PUSHNUM_2];
        redeem.extend(get_push_op(&pubkey(1)));
        redeem.extend(get_push_op(&pubkey(2)));
        redeem.extend(get_push_op(&pubkey(3)));
        redeem.push(OP_PUSHNUM_2 + 1);
        redeem.push(OP_CHECKMULTISIG);

        let mut script_sig = get_push_op(b"sigA");
        script_sig.extend(get_push_op(b"sigB"));
        script_sig.extend(get_push_op(&redeem));

        assert_eq!(count_p2sh_sig_ops(&script_sig), 2);
    }

    #[test]
    fn p2sh_sig_op_count_zero_when_not_push_only() {
        let mut script_sig = get_push_op(b"sigA");
        script_sig.push(OP_CHECKSIG);
        assert_eq!(count_p2sh_sig_ops(&script_sig), 0);
    }
}
