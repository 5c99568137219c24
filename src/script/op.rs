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

//! The script operation model: a single decoded step of a script, the
//! push-form canonicalization rule, and the byte-stream reader.

use crate::opcodes::*;

/// A single decoded step of a script.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Op {
    /// A data push, carrying the pushed bytes and the form that encoded it.
    Push { data: Vec<u8>, form: PushForm },
    /// `OP_0` (empty push) or `OP_1..OP_16` (push of a single byte 1..16).
    Small(u8),
    /// Any other single-byte opcode.
    Opcode(u8),
    /// A malformed or truncated push; the reader stops after emitting this.
    Invalid,
}

/// Which encoding produced a [`Op::Push`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PushForm {
    /// Direct length prefix, `0x01..=0x4B`.
    Direct,
    /// `OP_PUSHDATA1` followed by a `u8` length.
    PushData1,
    /// `OP_PUSHDATA2` followed by a little-endian `u16` length.
    PushData2,
    /// `OP_PUSHDATA4` followed by a little-endian `u32` length.
    PushData4,
    /// `OP_1NEGATE`: the single-byte special-cased push of `[0x81]`. Not a
    /// length-prefixed form at all; kept distinct so re-encoding emits the
    /// one original opcode byte rather than a two-byte direct push of the
    /// same logical value.
    Neg1,
}

impl PushForm {
    /// The form that would be chosen by the canonical encoder for `len`
    /// bytes of data. Lengths in `1..=16` are not covered here since those
    /// are [`Op::Small`], not a push form.
    fn canonical_for_len(len: usize) -> Self {
        match len {
            0..=75 => PushForm::Direct,
            76..=0xFF => PushForm::PushData1,
            0x100..=0xFFFF => PushForm::PushData2,
            _ => PushForm::PushData4,
        }
    }
}

/// Selects the canonical encoding for pushing `data` onto the stack, per
/// the minimal-push rule: empty data becomes `OP_0`, a single byte in
/// `1..=16` becomes `OP_1..OP_16`, a single byte `0x81` becomes
/// `OP_1NEGATE`, and everything else uses the shortest applicable push
/// form.
pub fn get_push_op(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![OP_PUSHBYTES_0];
    }
    if data.len() == 1 {
        let b = data[0];
        if (1..=16).contains(&b) {
            return vec![OP_PUSHNUM_1 + (b - 1)];
        }
        if b == 0x81 {
            return vec![OP_PUSHNUM_NEG1];
        }
    }
    let mut out = Vec::with_capacity(data.len() + 5);
    match data.len() {
        n @ 1..=75 => out.push(n as u8),
        n if n < 0x100 => {
            out.push(OP_PUSHDATA1);
            out.push(n as u8);
        }
        n if n < 0x1_0000 => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        n => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// Consumes the minimum bytes required for the next operation starting at
/// `*pos` in `script`, advancing `*pos` past what was consumed. Returns
/// `None` once the cursor is at the end of the buffer.
pub fn read_next(script: &[u8], pos: &mut usize) -> Option<Op> {
    if *pos >= script.len() {
        return None;
    }
    let byte = script[*pos];
    *pos += 1;

    match byte {
        OP_PUSHBYTES_0 => Some(Op::Small(0)),
        1..=OP_PUSHBYTES_75 => read_push(script, pos, byte as usize, PushForm::Direct),
        OP_PUSHDATA1 => read_push_with_len_prefix(script, pos, 1, PushForm::PushData1),
        OP_PUSHDATA2 => read_push_with_len_prefix(script, pos, 2, PushForm::PushData2),
        OP_PUSHDATA4 => read_push_with_len_prefix(script, pos, 4, PushForm::PushData4),
        OP_PUSHNUM_NEG1 => Some(Op::Push { data: vec![0x81], form: PushForm::Neg1 }),
        n @ OP_PUSHNUM_1..=OP_PUSHNUM_16 => Some(Op::Small(n - OP_PUSHNUM_1 + 1)),
        other => Some(Op::Opcode(other)),
    }
}

fn read_push_with_len_prefix(
    script: &[u8],
    pos: &mut usize,
    len_bytes: usize,
    form: PushForm,
) -> Option<Op> {
    if *pos + len_bytes > script.len() {
        *pos = script.len();
        return Some(Op::Invalid);
    }
    let len_slice = &script[*pos..*pos + len_bytes];
    let len = match len_bytes {
        1 => len_slice[0] as usize,
        2 => u16::from_le_bytes([len_slice[0], len_slice[1]]) as usize,
        4 => u32::from_le_bytes([len_slice[0], len_slice[1], len_slice[2], len_slice[3]]) as usize,
        _ => unreachable!(),
    };
    *pos += len_bytes;
    read_push(script, pos, len, form)
}

fn read_push(script: &[u8], pos: &mut usize, len: usize, form: PushForm) -> Option<Op> {
    if *pos + len > script.len() {
        *pos = script.len();
        return Some(Op::Invalid);
    }
    let data = script[*pos..*pos + len].to_vec();
    *pos += len;
    Some(Op::Push { data, form })
}

impl Op {
    /// Re-encodes this operation back into its wire bytes. A push is
    /// re-emitted in the exact `form` it carries, not the canonical form
    /// for its length -- a well-formed but non-canonical script must
    /// re-encode to the same bytes it was parsed from. Callers that want a
    /// fresh canonical push should build it with [`get_push_op`] directly
    /// rather than going through an `Op`.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Op::Push { data, form } => encode_push(data, *form),
            Op::Small(0) => vec![OP_PUSHBYTES_0],
            Op::Small(n) => vec![OP_PUSHNUM_1 + (n - 1)],
            Op::Opcode(code) => vec![*code],
            Op::Invalid => Vec::new(),
        }
    }

    /// True when this push used the shortest encoding for its length (and,
    /// for single bytes in `1..=16` or `0x81`, used `OP_n`/`OP_1NEGATE`
    /// rather than a direct push).
    pub fn is_canonical_push(&self) -> bool {
        match self {
            Op::Push { data, form: PushForm::Neg1 } => data.as_slice() == [0x81],
            Op::Push { data, form } => {
                if data.len() == 1 && ((1..=16).contains(&data[0]) || data[0] == 0x81) {
                    return false;
                }
                *form == PushForm::canonical_for_len(data.len())
            }
            _ => true,
        }
    }
}

/// Re-encodes a push in exactly the wire form named by `form`, regardless
/// of whether that form is the canonical (shortest) one for `data`'s
/// length.
fn encode_push(data: &[u8], form: PushForm) -> Vec<u8> {
    match form {
        PushForm::Neg1 => vec![OP_PUSHNUM_NEG1],
        PushForm::Direct => {
            let mut out = Vec::with_capacity(1 + data.len());
            out.push(data.len() as u8);
            out.extend_from_slice(data);
            out
        }
        PushForm::PushData1 => {
            let mut out = Vec::with_capacity(2 + data.len());
            out.push(OP_PUSHDATA1);
            out.push(data.len() as u8);
            out.extend_from_slice(data);
            out
        }
        PushForm::PushData2 => {
            let mut out = Vec::with_capacity(3 + data.len());
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(data.len() as u16).to_le_bytes());
            out.extend_from_slice(data);
            out
        }
        PushForm::PushData4 => {
            let mut out = Vec::with_capacity(5 + data.len());
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(script: &[u8]) -> Vec<Op> {
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

    #[test]
    fn round_trip_direct_push() {
        let script = get_push_op(b"hello");
        let ops = decode_all(&script);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0], Op::Push { data: b"hello".to_vec(), form: PushForm::Direct });
        assert!(ops[0].is_canonical_push());
    }

    #[test]
    fn round_trip_op_n() {
        for n in 1u8..=16 {
            let ops = decode_all(&[OP_PUSHNUM_1 + (n - 1)]);
            assert_eq!(ops, vec![Op::Small(n)]);
        }
    }

    #[test]
    fn op_0_is_small_zero() {
        assert_eq!(decode_all(&[OP_PUSHBYTES_0]), vec![Op::Small(0)]);
    }

    #[test]
    fn truncated_pushdata2_is_invalid() {
        let script = [OP_PUSHDATA2, 0xFF];
        let ops = decode_all(&script);
        assert_eq!(ops, vec![Op::Invalid]);
    }

    #[test]
    fn truncated_push_body_is_invalid() {
        let script = [0x05, b'a', b'b'];
        let ops = decode_all(&script);
        assert_eq!(ops, vec![Op::Invalid]);
    }

    #[test]
    fn non_canonical_pushdata1_for_short_data() {
        let mut script = vec![OP_PUSHDATA1, 3];
        script.extend_from_slice(b"abc");
        let ops = decode_all(&script);
        assert_eq!(ops.len(), 1);
        assert!(!ops[0].is_canonical_push());
    }

    #[test]
    fn get_push_op_chooses_op_n_for_small_bytes() {
        assert_eq!(get_push_op(&[5]), vec![OP_PUSHNUM_1 + 4]);
        assert_eq!(get_push_op(&[0x81]), vec![OP_PUSHNUM_NEG1]);
        assert_eq!(get_push_op(&[]), vec![OP_PUSHBYTES_0]);
    }

    #[test]
    fn non_canonical_push_re_encodes_to_its_original_bytes() {
        let mut script = vec![OP_PUSHDATA1, 3];
        script.extend_from_slice(b"abc");
        let mut pos = 0;
        let op = read_next(&script, &mut pos).unwrap();
        assert_eq!(op, Op::Push { data: b"abc".to_vec(), form: PushForm::PushData1 });
        assert!(!op.is_canonical_push());
        assert_eq!(op.encode(), script);
    }

    #[test]
    fn op_1negate_re_encodes_to_the_single_opcode_byte() {
        let script = [OP_PUSHNUM_NEG1];
        let mut pos = 0;
        let op = read_next(&script, &mut pos).unwrap();
        assert_eq!(op, Op::Push { data: vec![0x81], form: PushForm::Neg1 });
        assert!(op.is_canonical_push());
        assert_eq!(op.encode(), vec![OP_PUSHNUM_NEG1]);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonical_push_round_trips_for_any_data(data in prop::collection::vec(any::<u8>(), 0..300)) {
            let script = get_push_op(&data);
            let ops = decode_all(&script);
            prop_assert_eq!(ops.len(), 1);
            prop_assert_eq!(ops[0].encode(), script.clone());
            prop_assert!(ops[0].is_canonical_push());
        }

        #[test]
        fn pushdata1_round_trips_even_when_non_canonical(
            data in prop::collection::vec(any::<u8>(), 0..75),
        ) {
            let op = Op::Push { data: data.clone(), form: PushForm::PushData1 };
            let bytes = op.encode();
            let mut pos = 0;
            let decoded = read_next(&bytes, &mut pos).unwrap();
            prop_assert_eq!(decoded.clone(), op);
            prop_assert_eq!(pos, bytes.len());
            if data.len() != 1 || (!(1..=16).contains(&data[0]) && data[0] != 0x81) {
                prop_assert!(!decoded.is_canonical_push());
            }
        }

        #[test]
        fn direct_push_round_trips_for_any_length_in_range(
            // length 0 is excluded: OP_PUSHBYTES_0 (a direct push of zero
            // bytes) always decodes to `Op::Small(0)`, never `Op::Push`.
            data in prop::collection::vec(any::<u8>(), 1..75),
        ) {
            let op = Op::Push { data: data.clone(), form: PushForm::Direct };
            let bytes = op.encode();
            let mut pos = 0;
            let decoded = read_next(&bytes, &mut pos).unwrap();
            prop_assert_eq!(decoded, op);
            prop_assert_eq!(pos, bytes.len());
        }
    }
}
