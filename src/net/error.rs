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

//! Failure modes of the message envelope codec. All are fatal to the
//! connection except a tolerated missed magic, which the decoder itself
//! handles by returning to `SEEK_MAGIC` rather than surfacing an error.

use std::io;

/// Failure surfaced while decoding or encoding a wire message.
#[derive(Debug, Display, Error)]
#[display(doc_comments)]
pub enum NetError {
    /// message length {0} exceeds the payload ceiling of 0x0200_0000 bytes.
    #[display("message length {0} exceeds the payload ceiling of 0x0200_0000 bytes")]
    PayloadTooLarge(u32),

    /// computed checksum disagreed with the value on the wire.
    BadChecksum,

    /// expected network magic was not found before the byte source ended.
    BadMagic,

    /// byte source ended mid-header or mid-payload.
    Truncated,

    /// the externally supplied cancellation signal fired.
    Cancelled,

    /// underlying I/O error.
    #[from]
    Io(IoErrorWrapper),
}

impl From<io::Error> for NetError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => NetError::Truncated,
            _ => NetError::Io(IoErrorWrapper(err.to_string())),
        }
    }
}

/// `io::Error` does not implement `Eq`/`Clone`; this carries just its
/// message so `NetError` can still derive the diagnostics traits the rest
/// of the crate uses.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(inner)]
pub struct IoErrorWrapper(pub String);
