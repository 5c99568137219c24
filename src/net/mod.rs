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

//! The peer-to-peer message envelope: framing, checksumming, and
//! command-tag-keyed payload dispatch, independent of any particular
//! payload's wire format.

pub mod error;
pub mod message;
pub mod registry;

pub use error::NetError;
pub use message::{
    encode_message, Decoder, Message, MessageHeader, NetworkParams, MAX_PAYLOAD_LEN,
    MEMPOOL_GD_VERSION,
};
pub use registry::{CommandTag, DecodedPayload, PayloadCodec, PayloadRegistry};
