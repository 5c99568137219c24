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

//! The standard script-verification flag bits. The interpreter that
//! consumes these is external to this crate; this is just the
//! consensus-correct bit layout so embedders don't have to re-derive it.

/// A single script-verification policy bit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u32)]
pub enum ScriptVerifyFlag {
    P2sh = 1,
    StrictEnc = 2,
    DerSig = 4,
    LowS = 8,
    NullDummy = 16,
    SigPushOnly = 32,
    MinimalData = 64,
    DiscourageUpgradableNops = 128,
    CleanStack = 256,
}

/// A set of [`ScriptVerifyFlag`] bits.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, From)]
pub struct ScriptVerifyFlags(u32);

impl ScriptVerifyFlags {
    pub const NONE: Self = Self(0);

    pub fn with(mut self, flag: ScriptVerifyFlag) -> Self {
        self.0 |= flag as u32;
        self
    }

    pub fn contains(self, flag: ScriptVerifyFlag) -> bool { self.0 & flag as u32 != 0 }

    pub fn bits(self) -> u32 { self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        let flags = ScriptVerifyFlags::NONE.with(ScriptVerifyFlag::P2sh).with(ScriptVerifyFlag::LowS);
        assert!(flags.contains(ScriptVerifyFlag::P2sh));
        assert!(flags.contains(ScriptVerifyFlag::LowS));
        assert!(!flags.contains(ScriptVerifyFlag::CleanStack));
        assert_eq!(flags.bits(), 1 | 8);
    }
}
