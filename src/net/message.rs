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

//! Framing, checksum verification, and payload dispatch for the streaming
//! peer-to-peer wire format.
//!
//! `magic:u32 | command:[12]u8 | length:u32 | checksum:u32? | payload`.

use std::io::Read;

use tracing::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::net::error::NetError;
use crate::net::registry::{CommandTag, DecodedPayload, PayloadRegistry};

/// Payload length above which a message is rejected outright, per the wire
/// format's hard ceiling.
pub const MAX_PAYLOAD_LEN: u32 = 0x0200_0000;

/// The protocol version at and above which a message carries a checksum.
pub const MEMPOOL_GD_VERSION: u32 = 60002;

/// Per-connection parameters the codec needs but does not own: which
/// network's magic to scan for, and the protocol version negotiated with
/// the peer (gating checksum presence).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkParams {
    pub magic: u32,
    pub protocol_version: u32,
}

impl NetworkParams {
    pub fn new(magic: u32, protocol_version: u32) -> Self { Self { magic, protocol_version } }

    fn has_checksum(self) -> bool { self.protocol_version >= MEMPOOL_GD_VERSION }
}

/// The fixed-size portion of a framed message.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MessageHeader {
    pub magic: u32,
    pub command: CommandTag,
    pub length: u32,
    pub checksum: Option<u32>,
}

/// A fully decoded wire message: its header and the dispatched payload.
#[derive(Debug)]
pub struct Message {
    pub header: MessageHeader,
    pub payload: DecodedPayload,
}

fn compute_checksum(payload: &[u8]) -> u32 {
    let digest = Hash256::hash(payload).to_byte_array();
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Serializes `payload_bytes` under `command`, framed per `params`.
pub fn encode_message(
    params: NetworkParams,
    command: CommandTag,
    payload_bytes: &[u8],
) -> Result<Vec<u8>, NetError> {
    if payload_bytes.len() as u64 > MAX_PAYLOAD_LEN as u64 {
        return Err(NetError::PayloadTooLarge(payload_bytes.len() as u32));
    }
    let mut out = Vec::with_capacity(4 + 12 + 4 + 4 + payload_bytes.len());
    out.extend_from_slice(&params.magic.to_le_bytes());
    out.extend_from_slice(command.as_bytes());
    out.extend_from_slice(&(payload_bytes.len() as u32).to_le_bytes());
    if params.has_checksum() {
        out.extend_from_slice(&compute_checksum(payload_bytes).to_le_bytes());
    }
    out.extend_from_slice(payload_bytes);
    Ok(out)
}

/// A single-connection decoder: owns exactly one reusable payload buffer
/// and steps `SEEK_MAGIC -> READ_HEADER -> READ_PAYLOAD -> VERIFY_CHECKSUM
/// -> DECODE -> EMIT` for every message pulled from the byte source.
pub struct Decoder {
    params: NetworkParams,
    buffer: Vec<u8>,
}

impl Decoder {
    pub fn new(params: NetworkParams) -> Self { Self { params, buffer: Vec::new() } }

    /// Decodes the next message from `reader`, polling `cancel` at every
    /// read boundary. A cancellation observed mid-message yields
    /// `NetError::Cancelled` without the partial payload being treated as
    /// valid. Magic-seeking always tolerates leading garbage: a byte that
    /// doesn't extend a match just slides the scan window forward one byte
    /// at a time until the magic is found or the source is exhausted, at
    /// which point `seek_magic` returns `NetError::BadMagic`. A caller that
    /// wants a strict single-attempt connection can layer that check on top
    /// by inspecting the reader before the first call.
    pub fn decode_next(
        &mut self,
        reader: &mut impl Read,
        registry: &PayloadRegistry,
        cancel: &dyn Fn() -> bool,
    ) -> Result<Message, NetError> {
        self.seek_magic(reader, cancel)?;
        let header = self.read_header(reader, cancel)?;
        let payload = self.read_payload(reader, cancel, header.length)?;
        self.verify_checksum(&payload, header.checksum)?;
        let decoded = registry.decode(header.command, &payload);
        trace!(command = %header.command, len = payload.len(), "message decoded");
        Ok(Message { header, payload: decoded })
    }

    fn check_cancel(cancel: &dyn Fn() -> bool) -> Result<(), NetError> {
        if cancel() {
            warn!("cancellation signal observed mid-message");
            return Err(NetError::Cancelled);
        }
        Ok(())
    }

    fn seek_magic(&mut self, reader: &mut impl Read, cancel: &dyn Fn() -> bool) -> Result<(), NetError> {
        let target = self.params.magic.to_le_bytes();
        let mut window = [0u8; 4];
        let mut filled = 0usize;
        loop {
            Self::check_cancel(cancel)?;
            let mut byte = [0u8; 1];
            match reader.read(&mut byte)? {
                0 => return Err(NetError::BadMagic),
                _ => {}
            }
            if filled < 4 {
                window[filled] = byte[0];
                filled += 1;
            } else {
                window.copy_within(1..4, 0);
                window[3] = byte[0];
            }
            if filled == 4 && window == target {
                debug!("network magic found");
                return Ok(());
            }
        }
    }

    fn read_header(&mut self, reader: &mut impl Read, cancel: &dyn Fn() -> bool) -> Result<MessageHeader, NetError> {
        Self::check_cancel(cancel)?;
        let mut command_bytes = [0u8; 12];
        reader.read_exact(&mut command_bytes)?;

        Self::check_cancel(cancel)?;
        let mut length_bytes = [0u8; 4];
        reader.read_exact(&mut length_bytes)?;
        let length = u32::from_le_bytes(length_bytes);
        if length > MAX_PAYLOAD_LEN {
            return Err(NetError::PayloadTooLarge(length));
        }

        let checksum = if self.params.has_checksum() {
            Self::check_cancel(cancel)?;
            let mut checksum_bytes = [0u8; 4];
            reader.read_exact(&mut checksum_bytes)?;
            Some(u32::from_le_bytes(checksum_bytes))
        } else {
            None
        };

        Ok(MessageHeader {
            magic: self.params.magic,
            command: CommandTag::from_bytes(command_bytes),
            length,
            checksum,
        })
    }

    fn read_payload(
        &mut self,
        reader: &mut impl Read,
        cancel: &dyn Fn() -> bool,
        length: u32,
    ) -> Result<Vec<u8>, NetError> {
        Self::check_cancel(cancel)?;
        self.buffer.clear();
        self.buffer.resize(length as usize, 0);
        reader.read_exact(&mut self.buffer)?;
        Ok(std::mem::take(&mut self.buffer))
    }

    fn verify_checksum(&self, payload: &[u8], checksum: Option<u32>) -> Result<(), NetError> {
        if let Some(expected) = checksum {
            if compute_checksum(payload) != expected {
                return Err(NetError::BadChecksum);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const NO_CANCEL: &dyn Fn() -> bool = &|| false;

    fn params() -> NetworkParams { NetworkParams::new(0xD9B4BEF9, MEMPOOL_GD_VERSION) }

    #[test]
    fn round_trips_a_message() {
        let command = CommandTag::new("ping");
        let payload = b"deadbeef".to_vec();
        let framed = encode_message(params(), command, &payload).unwrap();

        let mut decoder = Decoder::new(params());
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let message = decoder.decode_next(&mut cursor, &registry, NO_CANCEL).unwrap();

        assert_eq!(message.header.length, payload.len() as u32);
        assert!(matches!(message.payload, DecodedPayload::Unknown { bytes, .. } if bytes == payload));
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let command = CommandTag::new("ping");
        let mut framed = encode_message(params(), command, b"deadbeef").unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0xFF;

        let mut decoder = Decoder::new(params());
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let result = decoder.decode_next(&mut cursor, &registry, NO_CANCEL);
        assert!(matches!(result, Err(NetError::BadChecksum)));
    }

    #[test]
    fn mismatched_magic_is_bad_magic() {
        let command = CommandTag::new("ping");
        let framed = encode_message(params(), command, b"deadbeef").unwrap();

        let wrong_params = NetworkParams::new(0x0B110907, MEMPOOL_GD_VERSION);
        let mut decoder = Decoder::new(wrong_params);
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let result = decoder.decode_next(&mut cursor, &registry, NO_CANCEL);
        assert!(matches!(result, Err(NetError::BadMagic)));
    }

    #[test]
    fn oversized_length_is_rejected_before_reading_payload() {
        let mut framed = Vec::new();
        framed.extend_from_slice(&params().magic.to_le_bytes());
        framed.extend_from_slice(CommandTag::new("big").as_bytes());
        framed.extend_from_slice(&(MAX_PAYLOAD_LEN + 1).to_le_bytes());

        let mut decoder = Decoder::new(params());
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let result = decoder.decode_next(&mut cursor, &registry, NO_CANCEL);
        assert!(matches!(result, Err(NetError::PayloadTooLarge(n)) if n == MAX_PAYLOAD_LEN + 1));
    }

    #[test]
    fn pre_mempool_gd_version_has_no_checksum() {
        let params = NetworkParams::new(0xD9B4BEF9, MEMPOOL_GD_VERSION - 1);
        let command = CommandTag::new("version");
        let framed = encode_message(params, command, b"hi").unwrap();
        // magic(4) + command(12) + length(4) + payload(2), no checksum field
        assert_eq!(framed.len(), 4 + 12 + 4 + 2);

        let mut decoder = Decoder::new(params);
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let message = decoder.decode_next(&mut cursor, &registry, NO_CANCEL).unwrap();
        assert_eq!(message.header.checksum, None);
    }

    #[test]
    fn cancellation_is_observed_before_reading_header() {
        let command = CommandTag::new("ping");
        let framed = encode_message(params(), command, b"deadbeef").unwrap();
        let mut decoder = Decoder::new(params());
        let registry = PayloadRegistry::new();
        let mut cursor = Cursor::new(framed);
        let cancel: &dyn Fn() -> bool = &|| true;
        let result = decoder.decode_next(&mut cursor, &registry, cancel);
        assert!(matches!(result, Err(NetError::Cancelled)));
    }
}
