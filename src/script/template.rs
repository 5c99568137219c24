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

//! Recognition of the standard script shapes and the signer/destination
//! identifiers they imply. A tagged `Template` enum, not a trait-object
//! hierarchy -- each variant carries its own `match_and_extract` style
//! associated function.

use super::canon::decode;
use super::op::Op;
use crate::opcodes::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_RETURN,
};

/// The parameters extracted from a recognized `script_pubkey`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Params {
    Pubkey(Vec<u8>),
    KeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    Multisig { m: u8, pubkeys: Vec<Vec<u8>> },
    Data(Vec<Vec<u8>>),
}

/// A recognized standard output shape.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Template {
    P2pk,
    P2pkh,
    P2sh,
    Multisig,
    NullData,
}

impl Template {
    /// All templates, in the order they are tried by [`recognize`].
    pub const ALL: [Template; 5] =
        [Template::P2pkh, Template::P2pk, Template::P2sh, Template::Multisig, Template::NullData];

    pub fn matches(self, script: &[u8]) -> bool { self.extract(script).is_some() }

    pub fn extract(self, script: &[u8]) -> Option<Params> {
        let ops = decode(script);
        match self {
            Template::P2pkh => extract_p2pkh(&ops),
            Template::P2pk => extract_p2pk(&ops),
            Template::P2sh => extract_p2sh(&ops),
            Template::Multisig => extract_multisig(&ops),
            Template::NullData => extract_null_data(&ops),
        }
    }
}

/// Tries every template in turn and returns the first that matches, along
/// with its extracted parameters.
pub fn recognize(script: &[u8]) -> Option<(Template, Params)> {
    Template::ALL.into_iter().find_map(|t| t.extract(script).map(|p| (t, p)))
}

fn push_bytes(op: &Op) -> Option<&[u8]> {
    match op {
        Op::Push { data, .. } => Some(data),
        _ => None,
    }
}

fn extract_p2pkh(ops: &[Op]) -> Option<Params> {
    let [a, b, c, d, e] = ops else { return None };
    if !matches!(a, Op::Opcode(c) if *c == OP_DUP) {
        return None;
    }
    if !matches!(b, Op::Opcode(c) if *c == OP_HASH160) {
        return None;
    }
    let hash = push_bytes(c)?;
    if hash.len() != 20 {
        return None;
    }
    if !matches!(d, Op::Opcode(c) if *c == OP_EQUALVERIFY) {
        return None;
    }
    if !matches!(e, Op::Opcode(c) if *c == OP_CHECKSIG) {
        return None;
    }
    let mut array = [0u8; 20];
    array.copy_from_slice(hash);
    Some(Params::KeyHash(array))
}

fn extract_p2pk(ops: &[Op]) -> Option<Params> {
    let [a, b] = ops else { return None };
    let pubkey = push_bytes(a)?;
    if pubkey.len() != 33 && pubkey.len() != 65 {
        return None;
    }
    if !matches!(b, Op::Opcode(c) if *c == OP_CHECKSIG) {
        return None;
    }
    Some(Params::Pubkey(pubkey.to_vec()))
}

fn extract_p2sh(ops: &[Op]) -> Option<Params> {
    let [a, b, c] = ops else { return None };
    if !matches!(a, Op::Opcode(c) if *c == OP_HASH160) {
        return None;
    }
    let hash = push_bytes(b)?;
    if hash.len() != 20 {
        return None;
    }
    if !matches!(c, Op::Opcode(c) if *c == OP_EQUAL) {
        return None;
    }
    let mut array = [0u8; 20];
    array.copy_from_slice(hash);
    Some(Params::ScriptHash(array))
}

fn small_value(op: &Op) -> Option<u8> {
    match op {
        Op::Small(n) => Some(*n),
        _ => None,
    }
}

fn extract_multisig(ops: &[Op]) -> Option<Params> {
    let (first, rest) = ops.split_first()?;
    let (last, middle) = rest.split_last()?;
    let (second_last, pubkey_ops) = middle.split_last()?;

    let m = small_value(first)?;
    let n = small_value(second_last)?;
    if !(1..=20).contains(&m) || !(1..=20).contains(&n) || m > n {
        return None;
    }
    if !matches!(last, Op::Opcode(c) if *c == OP_CHECKMULTISIG) {
        return None;
    }
    if pubkey_ops.len() != n as usize {
        return None;
    }
    let mut pubkeys = Vec::with_capacity(n as usize);
    for op in pubkey_ops {
        let data = push_bytes(op)?;
        if data.len() != 33 && data.len() != 65 {
            return None;
        }
        pubkeys.push(data.to_vec());
    }
    Some(Params::Multisig { m, pubkeys })
}

fn extract_null_data(ops: &[Op]) -> Option<Params> {
    let (first, rest) = ops.split_first()?;
    if !matches!(first, Op::Opcode(c) if *c == OP_RETURN) {
        return None;
    }
    let mut data = Vec::with_capacity(rest.len());
    for op in rest {
        data.push(push_bytes(op)?.to_vec());
    }
    Some(Params::Data(data))
}

/// Returns the key-hash (P2PKH) or script-hash (P2SH) implied by a
/// spending script: `<sig> <pubkey>` for P2PKH, `<sig>... <redeem_script>`
/// for P2SH.
pub fn signer(script_sig: &[u8]) -> Option<Params> {
    let ops = decode(script_sig);
    if ops.iter().any(|op| matches!(op, Op::Invalid)) {
        return None;
    }
    if let [sig, pubkey] = ops.as_slice() {
        let sig = push_bytes(sig)?;
        let pubkey = push_bytes(pubkey)?;
        if !sig.is_empty() && (pubkey.len() == 33 || pubkey.len() == 65) {
            use crate::hash::Hash160;
            return Some(Params::KeyHash(Hash160::hash(pubkey).to_byte_array()));
        }
    }
    let redeem = push_bytes(ops.last()?)?;
    if Template::P2sh.matches(redeem)
        || Template::P2pkh.matches(redeem)
        || Template::P2pk.matches(redeem)
        || Template::Multisig.matches(redeem)
    {
        use crate::hash::Hash160;
        return Some(Params::ScriptHash(Hash160::hash(redeem).to_byte_array()));
    }
    None
}

/// Returns the id implied by a locking script: the key-hash for P2PKH, the
/// script-hash for P2SH, `None` for other templates (they carry no single
/// destination id).
pub fn destination(script_pubkey: &[u8]) -> Option<Params> {
    match recognize(script_pubkey)? {
        (Template::P2pkh, params @ Params::KeyHash(_)) => Some(params),
        (Template::P2sh, params @ Params::ScriptHash(_)) => Some(params),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::op::get_push_op;
    use crate::opcodes::*;

    fn p2pkh_script(hash: [u8; 20]) -> Vec<u8> {
        let mut s = vec![OP_DUP, OP_HASH160];
        s.extend(get_push_op(&hash));
        s.push(OP_EQUALVERIFY);
        s.push(OP_CHECKSIG);
        s
    }

    #[test]
    fn recognizes_p2pkh() {
        let script = p2pkh_script([7u8; 20]);
        assert_eq!(Template::P2pkh.extract(&script), Some(Params::KeyHash([7u8; 20])));
        assert_eq!(destination(&script), Some(Params::KeyHash([7u8; 20])));
    }

    #[test]
    fn recognizes_p2pk() {
        let pubkey = vec![2u8; 33];
        let mut script = get_push_op(&pubkey);
        script.push(OP_CHECKSIG);
        assert_eq!(Template::P2pk.extract(&script), Some(Params::Pubkey(pubkey)));
    }

    #[test]
    fn recognizes_p2sh() {
        let mut script = vec![OP_HASH160];
        script.extend(get_push_op(&[9u8; 20]));
        script.push(OP_EQUAL);
        assert_eq!(Template::P2sh.extract(&script), Some(Params::ScriptHash([9u8; 20])));
    }

    #[test]
    fn recognizes_multisig() {
        let mut script = vec![OP_PUSHNUM_1 + 1];
        script.extend(get_push_op(&[1u8; 33]));
        script.extend(get_push_op(&[2u8; 33]));
        script.extend(get_push_op(&[3u8; 33]));
        script.push(OP_PUSHNUM_1 + 2);
        script.push(OP_CHECKMULTISIG);

        let params = Template::Multisig.extract(&script).unwrap();
        assert_eq!(params, Params::Multisig { m: 2, pubkeys: vec![vec![1u8; 33], vec![2u8; 33], vec![3u8; 33]] });
    }

    #[test]
    fn recognizes_null_data() {
        let mut script = vec![OP_RETURN];
        script.extend(get_push_op(b"hello"));
        assert_eq!(Template::NullData.extract(&script), Some(Params::Data(vec![b"hello".to_vec()])));
    }

    #[test]
    fn signer_extracts_p2pkh_key_hash() {
        let mut script_sig = get_push_op(b"sig");
        script_sig.extend(get_push_op(&[4u8; 33]));
        assert!(signer(&script_sig).is_some());
    }

    #[test]
    fn non_matching_script_returns_none() {
        assert_eq!(Template::P2pkh.extract(&[OP_CHECKSIG]), None);
    }
}
