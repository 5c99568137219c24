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

//! The closed set of error kinds surfaced by this crate. Script validity
//! and canonical-push analyses are boolean predicates, not errors, and are
//! not represented here.

/// Top-level error surfaced by script and signature-combination operations.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// script is malformed: truncated push length, truncated push body, or
    /// a push length larger than the remaining buffer.
    MalformedScript,

    /// combine-signatures was asked to operate on a script shape it does
    /// not recognize.
    UnsupportedTemplate,

    /// combine-signatures was asked to merge against a script_pubkey that
    /// does not parse as multisig when a multisig shape was required.
    InvalidMultisigParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_without_panicking() {
        let _ = Error::MalformedScript.to_string();
        let _ = Error::UnsupportedTemplate.to_string();
        let _ = Error::InvalidMultisigParams.to_string();
    }
}
