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

//! The command-tag-keyed payload codec registry. Populated once at
//! startup with built-in codecs and frozen before any decoding; lookups
//! afterward are read-only and safe for concurrent readers.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 12-byte ASCII command tag, NUL-padded. `command` must contain only
/// printable ASCII before the first NUL.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct CommandTag([u8; 12]);

impl CommandTag {
    /// Builds a tag from a name up to 12 bytes long, right-padded with
    /// NUL. Panics if `name` is longer than 12 bytes or is not printable
    /// ASCII -- this is a programmer error for a built-in codec
    /// registration, not a wire-parsing failure.
    pub fn new(name: &str) -> Self {
        assert!(name.len() <= 12, "command tag longer than 12 bytes");
        assert!(name.bytes().all(|b| (0x20..0x7F).contains(&b)), "command tag must be printable ASCII");
        let mut bytes = [0u8; 12];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; 12] { &self.0 }

    /// The tag's name, taken up to its first NUL. Not guaranteed to be
    /// valid UTF-8 for a tag that didn't come from [`CommandTag::new`] or a
    /// well-formed wire message; returns `None` in that case.
    pub fn name(&self) -> Option<&str> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl fmt::Debug for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CommandTag({:?})", self.name().unwrap_or("<non-utf8>"))
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("<non-utf8>"))
    }
}

/// The result of dispatching a payload through the registry: either a
/// known codec's decoded value, or the raw bytes of a tag the registry has
/// no codec for. An unrecognized command is not a failure.
pub enum DecodedPayload {
    Known(Box<dyn fmt::Debug + Send>),
    Unknown { command: CommandTag, bytes: Vec<u8> },
}

impl fmt::Debug for DecodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodedPayload::Known(value) => fmt::Debug::fmt(value, f),
            DecodedPayload::Unknown { command, bytes } => {
                f.debug_struct("Unknown").field("command", command).field("len", &bytes.len()).finish()
            }
        }
    }
}

/// Decodes the raw payload bytes registered for one command tag.
pub trait PayloadCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Box<dyn fmt::Debug + Send>;
}

/// A command-tag-keyed table of payload codecs.
#[derive(Default)]
pub struct PayloadRegistry {
    codecs: HashMap<CommandTag, Box<dyn PayloadCodec>>,
}

impl PayloadRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registers a codec for `command`. Intended to be called only during
    /// startup, before the registry is shared with any decoder.
    pub fn register(&mut self, command: CommandTag, codec: Box<dyn PayloadCodec>) {
        self.codecs.insert(command, codec);
    }

    /// Looks up a codec for `command` and decodes `bytes`, or returns
    /// [`DecodedPayload::Unknown`] carrying the raw bytes when no codec is
    /// registered.
    pub fn decode(&self, command: CommandTag, bytes: &[u8]) -> DecodedPayload {
        match self.codecs.get(&command) {
            Some(codec) => DecodedPayload::Known(codec.decode(bytes)),
            None => DecodedPayload::Unknown { command, bytes: bytes.to_vec() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCodec;
    impl PayloadCodec for EchoCodec {
        fn decode(&self, bytes: &[u8]) -> Box<dyn fmt::Debug + Send> { Box::new(bytes.to_vec()) }
    }

    #[test]
    fn command_tag_pads_with_nul() {
        let tag = CommandTag::new("ping");
        assert_eq!(tag.as_bytes(), &[b'p', b'i', b'n', b'g', 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(tag.name(), Some("ping"));
    }

    #[test]
    fn unregistered_command_decodes_as_unknown() {
        let registry = PayloadRegistry::new();
        let decoded = registry.decode(CommandTag::new("mystery"), b"raw");
        assert!(matches!(decoded, DecodedPayload::Unknown { .. }));
    }

    #[test]
    fn registered_command_uses_its_codec() {
        let mut registry = PayloadRegistry::new();
        registry.register(CommandTag::new("ping"), Box::new(EchoCodec));
        let decoded = registry.decode(CommandTag::new("ping"), b"abc");
        assert!(matches!(decoded, DecodedPayload::Known(_)));
    }
}
