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

//! Double-SHA256 and HASH160 primitives used throughout consensus hashing
//! and script template recognition.

use amplify::{Bytes20, Bytes32};
use sha2::{Digest, Sha256};
use ripemd::Ripemd160;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 32-byte double-SHA256 digest, as used for txids and the signature hash.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref, AsSlice, BorrowSlice, Hex)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Hash256(Bytes32);

impl Hash256 {
    /// Runs SHA256 twice over `data`.
    pub fn hash(data: &[u8]) -> Self {
        let first = Sha256::digest(data);
        let second: [u8; 32] = Sha256::digest(first).into();
        Self(Bytes32::from(second))
    }

    pub fn to_byte_array(self) -> [u8; 32] { self.0.into_inner() }
}

/// A 20-byte RIPEMD160(SHA256(x)) digest, as used for `OP_HASH160`-style
/// pubkey and script hashes.
#[derive(Wrapper, WrapperMut, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Deref, AsSlice, BorrowSlice, Hex)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Hash160(Bytes20);

impl Hash160 {
    /// Computes RIPEMD160(SHA256(data)).
    pub fn hash(data: &[u8]) -> Self {
        let sha = Sha256::digest(data);
        let ripe: [u8; 20] = Ripemd160::digest(sha).into();
        Self(Bytes20::from(ripe))
    }

    pub fn to_byte_array(self) -> [u8; 20] { self.0.into_inner() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash256_of_empty() {
        // sha256d("") is a well-known constant.
        let h = Hash256::hash(&[]);
        assert_eq!(
            h.to_byte_array(),
            hex_literal::hex!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c944")
        );
    }

    #[test]
    fn hash160_of_empty() {
        let h = Hash160::hash(&[]);
        assert_eq!(h.to_byte_array(), hex_literal::hex!("b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"));
    }
}
