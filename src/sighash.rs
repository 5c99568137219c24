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

//! The legacy (pre-segwit) transaction signature hash. Computes the digest
//! a signer binds to for a given input, subject to transaction-shape
//! mutations governed by the hash-type mask.

use crate::hash::Hash256;
use crate::script::{find_and_delete, Op, ScriptPubkey};
use crate::tx::{Sats, Tx, TxIn, TxOut};
use crate::varint::ConsensusEncode;
use crate::opcodes::OP_CODESEPARATOR;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The low-5-bit mode of a [`SighashType`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SighashMode {
    All,
    None,
    Single,
}

/// A signature hash type: a mode plus the `AnyoneCanPay` modifier. Any
/// low-5-bit value other than `1`/`2`/`3` behaves as `All` -- this is a
/// historic consensus fall-through and must not be "corrected".
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SighashType {
    pub mode: SighashMode,
    pub anyone_can_pay: bool,
}

impl SighashType {
    pub const ALL: SighashType = SighashType { mode: SighashMode::All, anyone_can_pay: false };
    pub const NONE: SighashType = SighashType { mode: SighashMode::None, anyone_can_pay: false };
    pub const SINGLE: SighashType = SighashType { mode: SighashMode::Single, anyone_can_pay: false };

    /// Parses the raw `u32` hash-type value. Unrecognized low-5-bit values
    /// decode as `All` rather than being rejected.
    pub fn from_consensus(value: u32) -> Self {
        let mode = match value & 0x1F {
            2 => SighashMode::None,
            3 => SighashMode::Single,
            _ => SighashMode::All,
        };
        Self { mode, anyone_can_pay: value & 0x80 != 0 }
    }

    pub fn to_consensus(self) -> u32 {
        let mode = match self.mode {
            SighashMode::All => 1,
            SighashMode::None => 2,
            SighashMode::Single => 3,
        };
        mode | if self.anyone_can_pay { 0x80 } else { 0 }
    }

    pub fn anyone_can_pay(self) -> Self { Self { anyone_can_pay: true, ..self } }
}

/// The sentinel digest `uint256(1)`, little-endian encoded (`0x01` followed
/// by 31 zero bytes). Returned by [`SigHashEngine::legacy_sighash`] for the
/// two documented out-of-range edge cases; this is a contract, not an
/// error, and callers that treat it as a real digest will simply fail
/// signature verification.
pub fn sentinel_one() -> Hash256 {
    let mut bytes = [0u8; 32];
    bytes[0] = 1;
    Hash256::from(amplify::Bytes32::from(bytes))
}

/// Computes the legacy signature hash. Stateless; kept as a zero-sized type
/// so call sites read `SigHashEngine::legacy_sighash(...)` the way they
/// would a namespaced free function, while leaving room for a future
/// cache-carrying variant without breaking callers.
pub struct SigHashEngine;

impl SigHashEngine {
    /// `tx`: the transaction being signed. `input_index`: the input whose
    /// signature is being computed. `subscript`: the script the signature
    /// commits to (the `script_pubkey` being spent, or the redeem script
    /// for P2SH). `sighash_type`: the raw hash-type byte, widened to
    /// `u32` and written as such into the trailing digest input.
    pub fn legacy_sighash(
        tx: &Tx,
        input_index: usize,
        subscript: &[u8],
        sighash_type: SighashType,
    ) -> Hash256 {
        if input_index >= tx.inputs.len() {
            return sentinel_one();
        }
        if matches!(sighash_type.mode, SighashMode::Single) && input_index >= tx.outputs.len() {
            return sentinel_one();
        }

        let (stripped_subscript, _) =
            find_and_delete(subscript, |op: &Op| matches!(op, Op::Opcode(c) if *c == OP_CODESEPARATOR));

        let mut inputs: Vec<TxIn> = tx
            .inputs
            .iter()
            .enumerate()
            .map(|(j, input)| {
                let script_sig = if j == input_index {
                    stripped_subscript.clone()
                } else {
                    Vec::new()
                };
                TxIn {
                    previous_outpoint: input.previous_outpoint,
                    script_sig: script_sig.into(),
                    sequence: input.sequence,
                }
            })
            .collect();

        let mut outputs = tx.outputs.clone();

        match sighash_type.mode {
            SighashMode::None => {
                outputs.clear();
                for (j, input) in inputs.iter_mut().enumerate() {
                    if j != input_index {
                        input.sequence = crate::tx::SeqNo(0);
                    }
                }
            }
            SighashMode::Single => {
                outputs.truncate(input_index + 1);
                for (j, output) in outputs.iter_mut().enumerate() {
                    if j < input_index {
                        *output = TxOut { value: Sats::SENTINEL, script_pubkey: ScriptPubkey::new() };
                    }
                }
                for (j, input) in inputs.iter_mut().enumerate() {
                    if j != input_index {
                        input.sequence = crate::tx::SeqNo(0);
                    }
                }
            }
            SighashMode::All => {}
        }

        if sighash_type.anyone_can_pay {
            inputs = vec![inputs[input_index].clone()];
        }

        let projected = Tx { version: tx.version, inputs, outputs, lock_time: tx.lock_time };

        let mut buf = Vec::new();
        projected.consensus_encode(&mut buf).expect("writing to a Vec never fails");
        buf.extend_from_slice(&sighash_type.to_consensus().to_le_bytes());

        Hash256::hash(&buf)
    }
}
