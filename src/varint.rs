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

//! The bitcoin consensus `CompactSize` integer and the consensus
//! encode/decode traits used by the transaction and script types.

use std::io;

/// A variable-length integer using bitcoin's `CompactSize` encoding.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Number of bytes this value serializes to.
    pub fn len(&self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x1_0000..=0xFFFF_FFFF => 5,
            _ => 9,
        }
    }

    pub fn is_empty(&self) -> bool { false }

    pub fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        match self.0 {
            0..=0xFC => {
                writer.write_all(&[self.0 as u8])?;
                Ok(1)
            }
            0xFD..=0xFFFF => {
                writer.write_all(&[0xFD])?;
                writer.write_all(&(self.0 as u16).to_le_bytes())?;
                Ok(3)
            }
            0x1_0000..=0xFFFF_FFFF => {
                writer.write_all(&[0xFE])?;
                writer.write_all(&(self.0 as u32).to_le_bytes())?;
                Ok(5)
            }
            _ => {
                writer.write_all(&[0xFF])?;
                writer.write_all(&self.0.to_le_bytes())?;
                Ok(9)
            }
        }
    }

    pub fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut prefix = [0u8; 1];
        reader.read_exact(&mut prefix)?;
        let value = match prefix[0] {
            0xFF => {
                let mut buf = [0u8; 8];
                reader.read_exact(&mut buf)?;
                u64::from_le_bytes(buf)
            }
            0xFE => {
                let mut buf = [0u8; 4];
                reader.read_exact(&mut buf)?;
                u32::from_le_bytes(buf) as u64
            }
            0xFD => {
                let mut buf = [0u8; 2];
                reader.read_exact(&mut buf)?;
                u16::from_le_bytes(buf) as u64
            }
            n => n as u64,
        };
        Ok(Self(value))
    }
}

/// Types that know how to serialize themselves using the consensus wire
/// format (little-endian integers, `VarInt`-prefixed collections).
pub trait ConsensusEncode {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize>;
}

/// Types that know how to deserialize themselves from the consensus wire
/// format.
pub trait ConsensusDecode: Sized {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self>;
}

impl ConsensusEncode for u8 {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        writer.write_all(&[*self])?;
        Ok(1)
    }
}

impl ConsensusDecode for u8 {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

/// Blanket `Vec<T>` encoding: a `VarInt` length prefix followed by each
/// element in order. `Vec<u8>` goes through this same path via `u8`'s
/// own impls above, rather than a specialized byte-slice fast path, so
/// there is only ever one impl Rust needs to pick between.
impl<T: ConsensusEncode> ConsensusEncode for Vec<T> {
    fn consensus_encode(&self, writer: &mut impl io::Write) -> io::Result<usize> {
        let mut len = VarInt(self.len() as u64).consensus_encode(writer)?;
        for item in self {
            len += item.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl<T: ConsensusDecode> ConsensusDecode for Vec<T> {
    fn consensus_decode(reader: &mut impl io::Read) -> io::Result<Self> {
        let count = VarInt::consensus_decode(reader)?.0;
        let mut items = Vec::with_capacity(count.min(0x1_0000) as usize);
        for _ in 0..count {
            items.push(T::consensus_decode(reader)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case::test_case(0, 1; "single byte")]
    #[test_case::test_case(0xFC, 1; "single byte ceiling")]
    #[test_case::test_case(0xFD, 3; "u16 floor")]
    #[test_case::test_case(0xFFFF, 3; "u16 ceiling")]
    #[test_case::test_case(0x1_0000, 5; "u32 floor")]
    #[test_case::test_case(0xFFFF_FFFF, 5; "u32 ceiling")]
    #[test_case::test_case(0x1_0000_0000, 9; "u64 floor")]
    fn varint_len(value: u64, expected: usize) {
        assert_eq!(VarInt(value).len(), expected);
    }

    #[test]
    fn varint_round_trip() {
        for value in [0u64, 1, 0xFC, 0xFD, 0xFFFF, 0x1_0000, u64::MAX] {
            let mut buf = Vec::new();
            VarInt(value).consensus_encode(&mut buf).unwrap();
            assert_eq!(buf.len(), VarInt(value).len());
            let mut cursor = io::Cursor::new(buf);
            let decoded = VarInt::consensus_decode(&mut cursor).unwrap();
            assert_eq!(decoded.0, value);
        }
    }
}
