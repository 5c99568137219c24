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

//! Bitcoin script primitives (opcodes, canonical pushes, templates, the
//! legacy signature hash, partial-signature combination) and the
//! peer-to-peer message envelope codec, built without a dependency on a
//! full node or the `bitcoin` crate.

#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    dead_code
)]

#[macro_use]
extern crate amplify;

pub mod opcodes;
pub mod varint;
pub mod hash;
pub mod tx;
pub mod sighash;
pub mod error;
pub mod script;
pub mod net;

pub use error::Error;
pub use hash::{Hash160, Hash256};
pub use net::{CommandTag, Decoder, Message, MessageHeader, NetError, NetworkParams, PayloadRegistry};
pub use script::{Op, RedeemScript, Script, ScriptPubkey, ScriptSig, Template};
pub use sighash::{SighashType, SigHashEngine};
pub use tx::{LockTime, Outpoint, Sats, SeqNo, Tx, TxIn, TxOut, TxVer, Txid};
