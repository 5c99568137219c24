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

//! The script byte buffer, its builder, and the opaque newtypes
//! distinguishing a spending script from a locking script.

pub mod canon;
pub mod combine;
pub mod delete;
pub mod flags;
pub mod op;
pub mod sigops;
pub mod template;

pub use canon::{has_canonical_pushes, is_push_only, is_valid};
pub use combine::{combine_multisig_required, combine_signatures};
pub use delete::find_and_delete;
pub use op::{get_push_op, Op, PushForm};
pub use sigops::count_sig_ops;
pub use template::Template;

use std::fmt;

use amplify::hex::{FromHex, ToHex};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::opcodes::*;

/// An opaque byte buffer holding a bitcoin script. Immutable after
/// construction except through [`Script::find_and_delete`], which replaces
/// the buffer atomically. Two scripts are equal iff their bytes are equal.
#[derive(Wrapper, WrapperMut, Clone, Eq, PartialEq, Hash, Default, From)]
#[wrapper(Deref, AsSlice)]
#[wrapper_mut(DerefMut, AsSliceMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Script(Vec<u8>);

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script").field(&self.0.to_hex()).finish()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0.to_hex()) }
}

impl Script {
    pub fn new() -> Self { Self::default() }

    /// Adopts `bytes` as a script without re-validating them.
    pub fn from_bytes(bytes: Vec<u8>) -> Self { Self(bytes) }

    /// Encodes `ops` contiguously into a new script.
    pub fn from_ops(ops: &[Op]) -> Self { Self(ops.iter().flat_map(Op::encode).collect()) }

    /// Decodes the script into its operation sequence, stopping at the
    /// first malformed op (inclusive).
    pub fn ops(&self) -> Vec<Op> { canon::decode(&self.0) }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn is_push_only(&self) -> bool { is_push_only(&self.0) }

    pub fn has_canonical_pushes(&self) -> bool { has_canonical_pushes(&self.0) }

    pub fn is_valid(&self) -> bool { is_valid(&self.0) }

    pub fn count_sig_ops(&self, accurate: bool) -> u32 { count_sig_ops(&self.0, accurate) }

    /// Rebuilds this script, dropping every operation matching `predicate`.
    pub fn find_and_delete(&self, predicate: impl Fn(&Op) -> bool) -> (Self, usize) {
        let (bytes, count) = find_and_delete(&self.0, predicate);
        (Self(bytes), count)
    }

    /// Parses a whitespace-separated assembly form (`OP_DUP`, hex literals
    /// for pushes) into a script. The inverse of [`Script::to_asm`].
    pub fn from_asm(asm: &str) -> Option<Self> {
        let mut builder = ScriptBuilder::new();
        for token in asm.split_whitespace() {
            if let Some(opcode) = opcode_by_name(token) {
                builder = builder.push_opcode(opcode);
            } else {
                let data = Vec::<u8>::from_hex(token).ok()?;
                builder = builder.push_slice(&data);
            }
        }
        Some(builder.into_script())
    }

    /// Renders the operation sequence as whitespace-separated assembly:
    /// opcodes by name, pushes as hex of the pushed data.
    pub fn to_asm(&self) -> String {
        self.ops()
            .iter()
            .map(|op| match op {
                Op::Push { data, .. } => data.to_hex(),
                Op::Small(0) => "OP_0".to_string(),
                Op::Small(n) => format!("OP_{n}"),
                Op::Opcode(code) => opcode_name(*code).map(str::to_string).unwrap_or_else(|| format!("OP_UNKNOWN_{code:#04x}")),
                Op::Invalid => "[error]".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Appends operations or raw pushes and materializes into a [`Script`].
/// Replaces operator-overloaded script concatenation.
#[derive(Clone, Default)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.0.push(opcode);
        self
    }

    pub fn push_slice(mut self, data: &[u8]) -> Self {
        self.0.extend(get_push_op(data));
        self
    }

    pub fn push_int(self, n: i64) -> Self {
        match n {
            0 => self.push_opcode(OP_PUSHBYTES_0),
            1..=16 => self.push_opcode(OP_PUSHNUM_1 + (n as u8 - 1)),
            -1 => self.push_opcode(OP_PUSHNUM_NEG1),
            _ => self.push_slice(&script_num_encode(n)),
        }
    }

    pub fn extend_script(mut self, other: &Script) -> Self {
        self.0.extend_from_slice(other.as_bytes());
        self
    }

    pub fn into_script(self) -> Script { Script(self.0) }
}

/// Minimal little-endian, sign-magnitude `CScriptNum` encoding, used only
/// for builder convenience with integers outside the `OP_n` range.
fn script_num_encode(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let neg = n < 0;
    let mut abs = n.unsigned_abs();
    let mut bytes = Vec::new();
    while abs > 0 {
        bytes.push((abs & 0xFF) as u8);
        abs >>= 8;
    }
    if bytes.last().map(|b| b & 0x80 != 0).unwrap_or(false) {
        bytes.push(if neg { 0x80 } else { 0x00 });
    } else if neg {
        *bytes.last_mut().unwrap() |= 0x80;
    }
    bytes
}

fn opcode_by_name(name: &str) -> Option<u8> {
    Some(match name {
        "OP_0" => OP_PUSHBYTES_0,
        "OP_DUP" => OP_DUP,
        "OP_HASH160" => OP_HASH160,
        "OP_HASH256" => OP_HASH256,
        "OP_EQUAL" => OP_EQUAL,
        "OP_EQUALVERIFY" => OP_EQUALVERIFY,
        "OP_CHECKSIG" => OP_CHECKSIG,
        "OP_CHECKSIGVERIFY" => OP_CHECKSIGVERIFY,
        "OP_CHECKMULTISIG" => OP_CHECKMULTISIG,
        "OP_CHECKMULTISIGVERIFY" => OP_CHECKMULTISIGVERIFY,
        "OP_RETURN" => OP_RETURN,
        "OP_VERIFY" => OP_VERIFY,
        "OP_CODESEPARATOR" => OP_CODESEPARATOR,
        "OP_1NEGATE" => OP_PUSHNUM_NEG1,
        _ if name.starts_with("OP_") && name[3..].parse::<u8>().is_ok() => {
            let n: u8 = name[3..].parse().ok()?;
            if (1..=16).contains(&n) {
                OP_PUSHNUM_1 + (n - 1)
            } else {
                return None;
            }
        }
        _ => return None,
    })
}

fn opcode_name(code: u8) -> Option<&'static str> {
    Some(match code {
        OP_DUP => "OP_DUP",
        OP_HASH160 => "OP_HASH160",
        OP_HASH256 => "OP_HASH256",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        OP_CHECKSIG => "OP_CHECKSIG",
        OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "OP_CHECKMULTISIGVERIFY",
        OP_RETURN => "OP_RETURN",
        OP_VERIFY => "OP_VERIFY",
        OP_CODESEPARATOR => "OP_CODESEPARATOR",
        OP_PUSHNUM_NEG1 => "OP_1NEGATE",
        _ => return None,
    })
}

macro_rules! script_newtype {
    ($name:ident) => {
        #[derive(Wrapper, WrapperMut, Clone, Eq, PartialEq, Hash, Default, From, Debug)]
        #[wrapper(Deref, AsSlice)]
        #[wrapper_mut(DerefMut, AsSliceMut)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(Script);

        impl $name {
            pub fn new() -> Self { Self::default() }

            pub fn from_bytes(bytes: Vec<u8>) -> Self { Self(Script::from_bytes(bytes)) }

            pub fn as_script(&self) -> &Script { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self { Self(Script::from_bytes(bytes)) }
        }
    };
}

script_newtype!(ScriptSig);
script_newtype!(ScriptPubkey);
script_newtype!(RedeemScript);

impl ScriptPubkey {
    /// The standard P2PKH locking script for `hash`.
    pub fn p2pkh(hash: [u8; 20]) -> Self {
        ScriptBuilder::new()
            .push_opcode(OP_DUP)
            .push_opcode(OP_HASH160)
            .push_slice(&hash)
            .push_opcode(OP_EQUALVERIFY)
            .push_opcode(OP_CHECKSIG)
            .into_script()
            .into()
    }

    /// The standard P2SH locking script for `hash`.
    pub fn p2sh(hash: [u8; 20]) -> Self {
        ScriptBuilder::new()
            .push_opcode(OP_HASH160)
            .push_slice(&hash)
            .push_opcode(OP_EQUAL)
            .into_script()
            .into()
    }

    /// A provably-unspendable `OP_RETURN` output carrying `data`.
    pub fn op_return(data: &[u8]) -> Self {
        ScriptBuilder::new().push_opcode(OP_RETURN).push_slice(data).into_script().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_roundtrips_through_asm() {
        let script = ScriptPubkey::p2pkh([0x11; 20]);
        let asm = script.as_script().to_asm();
        let parsed = Script::from_asm(&asm).unwrap();
        assert_eq!(parsed, *script.as_script());
    }

    #[test]
    fn p2sh_has_expected_shape() {
        let script = ScriptPubkey::p2sh([0x22; 20]);
        assert_eq!(script.as_script().len(), 23);
    }

    #[test]
    fn find_and_delete_through_script_type() {
        let mut bytes = get_push_op(b"a");
        bytes.push(OP_CODESEPARATOR);
        bytes.extend(get_push_op(b"b"));
        let script = Script::from_bytes(bytes);
        let (cleaned, count) = script.find_and_delete(|op| matches!(op, Op::Opcode(c) if *c == OP_CODESEPARATOR));
        assert_eq!(count, 1);
        let mut expected = get_push_op(b"a");
        expected.extend(get_push_op(b"b"));
        assert_eq!(cleaned.as_bytes(), expected.as_slice());
    }
}
