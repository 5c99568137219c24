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

//! The external transaction view the signature hash engine clones and
//! mutates locally: inputs, outputs, version and lock time, plus the
//! standard bitcoin transaction serialization. No witness/segwit data --
//! this crate's signature hash is the legacy, pre-segwit algorithm only.

use std::io;

use amplify::Bytes32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::script::{ScriptPubkey, ScriptSig};
use crate::varint::{ConsensusDecode, ConsensusEncode};

/// A transaction id: double-SHA256 of the legacy transaction serialization.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref, AsSlice, BorrowSlice, Hex)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Txid(Bytes32);

/// The index of an output within its owning transaction.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref, FromStr)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Vout(pub u32);

/// A reference to a specific output of a specific transaction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outpoint {
    pub txid: Txid,
    pub vout: Vout,
}

impl Outpoint {
    pub fn new(txid: Txid, vout: impl Into<Vout>) -> Self { Self { txid, vout: vout.into() } }
}

impl ConsensusEncode for Outpoint {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        writer.write_all(self.txid.as_slice())?;
        writer.write_all(&self.vout.0.to_le_bytes())?;
        Ok(36)
    }
}

impl ConsensusDecode for Outpoint {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut txid_bytes = [0u8; 32];
        reader.read_exact(&mut txid_bytes)?;
        let mut vout_bytes = [0u8; 4];
        reader.read_exact(&mut vout_bytes)?;
        Ok(Self { txid: Txid(Bytes32::from(txid_bytes)), vout: Vout(u32::from_le_bytes(vout_bytes)) })
    }
}

/// Sequence number of an input; also carries the relative-timelock
/// encoding, which this crate treats as an opaque `u32` since relative
/// timelock interpretation is outside the script/signature-hash surface.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SeqNo(pub u32);

impl SeqNo {
    pub const FINAL: SeqNo = SeqNo(0xFFFF_FFFF);
}

/// A transaction's absolute lock time: a block height below `500_000_000`,
/// or a Unix timestamp at or above it. The core treats it as an opaque
/// `u32` field of the serialization; interpretation is out of scope.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct LockTime(pub u32);

impl LockTime {
    pub const ZERO: LockTime = LockTime(0);
}

/// A satoshi amount. Carried as `i64` in the external transaction view
/// (the signature hash sentinel output uses `-1`, which an unsigned type
/// cannot represent).
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Sats(pub i64);

impl Sats {
    /// The sentinel value the signature hash engine writes into outputs it
    /// nulls out under `SIGHASH_SINGLE`.
    pub const SENTINEL: Sats = Sats(-1);
}

/// Transaction version.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TxVer(pub i32);

impl TxVer {
    pub const V1: TxVer = TxVer(1);
    pub const V2: TxVer = TxVer(2);
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TxIn {
    pub previous_outpoint: Outpoint,
    pub script_sig: ScriptSig,
    pub sequence: SeqNo,
}

impl ConsensusEncode for TxIn {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        let mut len = self.previous_outpoint.consensus_encode(writer)?;
        len += self.script_sig.as_script().as_bytes().to_vec().consensus_encode(writer)?;
        writer.write_all(&self.sequence.0.to_le_bytes())?;
        len += 4;
        Ok(len)
    }
}

impl ConsensusDecode for TxIn {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let previous_outpoint = Outpoint::consensus_decode(reader)?;
        let script_sig = ScriptSig::from_bytes(Vec::<u8>::consensus_decode(reader)?);
        let mut seq_bytes = [0u8; 4];
        reader.read_exact(&mut seq_bytes)?;
        Ok(Self { previous_outpoint, script_sig, sequence: SeqNo(u32::from_le_bytes(seq_bytes)) })
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TxOut {
    pub value: Sats,
    pub script_pubkey: ScriptPubkey,
}

impl ConsensusEncode for TxOut {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        writer.write_all(&self.value.0.to_le_bytes())?;
        let len = 8 + self.script_pubkey.as_script().as_bytes().to_vec().consensus_encode(writer)?;
        Ok(len)
    }
}

impl ConsensusDecode for TxOut {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut value_bytes = [0u8; 8];
        reader.read_exact(&mut value_bytes)?;
        let script_pubkey = ScriptPubkey::from_bytes(Vec::<u8>::consensus_decode(reader)?);
        Ok(Self { value: Sats(i64::from_le_bytes(value_bytes)), script_pubkey })
    }
}

/// The external transaction view the signature hash engine operates on.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tx {
    pub version: TxVer,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: LockTime,
}

impl Tx {
    pub fn txid(&self) -> Txid {
        let mut buf = Vec::new();
        self.consensus_encode(&mut buf).expect("writing to a Vec never fails");
        Txid(Bytes32::from(crate::hash::Hash256::hash(&buf).to_byte_array()))
    }
}

impl ConsensusEncode for Tx {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        let mut len = 4;
        writer.write_all(&self.version.0.to_le_bytes())?;
        len += self.inputs.consensus_encode(writer)?;
        len += self.outputs.consensus_encode(writer)?;
        writer.write_all(&self.lock_time.0.to_le_bytes())?;
        len += 4;
        Ok(len)
    }
}

impl ConsensusDecode for Tx {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut ver_bytes = [0u8; 4];
        reader.read_exact(&mut ver_bytes)?;
        let inputs = Vec::<TxIn>::consensus_decode(reader)?;
        let outputs = Vec::<TxOut>::consensus_decode(reader)?;
        let mut lock_bytes = [0u8; 4];
        reader.read_exact(&mut lock_bytes)?;
        Ok(Self {
            version: TxVer(i32::from_le_bytes(ver_bytes)),
            inputs,
            outputs,
            lock_time: LockTime(u32::from_le_bytes(lock_bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Tx {
        Tx {
            version: TxVer::V1,
            inputs: vec![TxIn {
                previous_outpoint: Outpoint::new(Txid(Bytes32::from([0x11; 32])), 0u32),
                script_sig: ScriptSig::from_bytes(vec![0x01, 0xAA]),
                sequence: SeqNo::FINAL,
            }],
            outputs: vec![TxOut {
                value: Sats(5_000_000_000),
                script_pubkey: ScriptPubkey::p2pkh([0x22; 20]),
            }],
            lock_time: LockTime::ZERO,
        }
    }

    #[test]
    fn consensus_round_trip() {
        let tx = sample_tx();
        let mut buf = Vec::new();
        tx.consensus_encode(&mut buf).unwrap();
        let mut cursor = io::Cursor::new(buf);
        let decoded = Tx::consensus_decode(&mut cursor).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn txid_is_stable_for_identical_transactions() {
        assert_eq!(sample_tx().txid(), sample_tx().txid());
    }

    #[test]
    fn sentinel_sats_is_negative_one() {
        assert_eq!(Sats::SENTINEL.0, -1);
    }
}
