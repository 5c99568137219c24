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

//! Merging two partial `script_sig` candidates for the same spend into one
//! at least as good as either.

use super::canon::decode;
use super::op::{get_push_op, Op};
use super::template::{recognize, Params, Template};
use crate::error::Error;
use crate::opcodes::OP_PUSHBYTES_0;

/// Checks a candidate signature against a pubkey and subscript. External
/// collaborator: the EC verifier itself is out of scope for this crate.
pub trait SignatureVerifier {
    fn check(&self, sig: &[u8], pubkey: &[u8], subscript: &[u8]) -> bool;
}

/// Reads every operation of `script` as a pushed value. Fails with
/// `MalformedScript` if the script doesn't parse cleanly, or
/// `UnsupportedTemplate` if it parses but contains a non-push operation.
fn pushes(script: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    decode(script)
        .into_iter()
        .map(|op| match op {
            Op::Push { data, .. } => Ok(data),
            Op::Small(0) => Ok(Vec::new()),
            Op::Invalid => Err(Error::MalformedScript),
            _ => Err(Error::UnsupportedTemplate),
        })
        .collect()
}

/// Combines two candidate `script_sig`s spending `script_pubkey`, preferring
/// a fully satisfying script over a partial one. `subscript` is the script
/// bytes signatures were computed over (the redeem script for P2SH, the
/// `script_pubkey` itself otherwise).
pub fn combine_signatures(
    script_pubkey: &[u8],
    subscript: &[u8],
    sig_a: &[u8],
    sig_b: &[u8],
    verifier: &dyn SignatureVerifier,
) -> Result<Vec<u8>, Error> {
    match recognize(script_pubkey) {
        Some((Template::P2sh, _)) => combine_p2sh(script_pubkey, sig_a, sig_b, verifier),
        Some((Template::Multisig, Params::Multisig { m, pubkeys })) => {
            Ok(combine_multisig(subscript, sig_a, sig_b, m, &pubkeys, verifier))
        }
        Some((Template::P2pk, _)) | Some((Template::P2pkh, _)) => {
            Ok(combine_single_sig(sig_a, sig_b))
        }
        Some((Template::NullData, _)) | Some((Template::Multisig, _)) | None => {
            Ok(combine_by_push_count(sig_a, sig_b))
        }
    }
}

/// Merges two candidate `script_sig`s against a `script_pubkey` that must be
/// multisig, failing with `InvalidMultisigParams` instead of falling back to
/// another merge strategy when it isn't.
pub fn combine_multisig_required(
    script_pubkey: &[u8],
    subscript: &[u8],
    sig_a: &[u8],
    sig_b: &[u8],
    verifier: &dyn SignatureVerifier,
) -> Result<Vec<u8>, Error> {
    match recognize(script_pubkey) {
        Some((Template::Multisig, Params::Multisig { m, pubkeys })) => {
            Ok(combine_multisig(subscript, sig_a, sig_b, m, &pubkeys, verifier))
        }
        _ => Err(Error::InvalidMultisigParams),
    }
}

/// Null-data and unrecognized shapes: whichever candidate has more pushed
/// items wins; ties favor the first.
fn combine_by_push_count(sig_a: &[u8], sig_b: &[u8]) -> Vec<u8> {
    let count_a = pushes(sig_a).map(|p| p.len()).unwrap_or(0);
    let count_b = pushes(sig_b).map(|p| p.len()).unwrap_or(0);
    if count_b > count_a { sig_b.to_vec() } else { sig_a.to_vec() }
}

/// P2PK / P2PKH: the first candidate whose first push is non-empty wins.
fn combine_single_sig(sig_a: &[u8], sig_b: &[u8]) -> Vec<u8> {
    let first_push_nonempty = |script: &[u8]| {
        pushes(script).ok().and_then(|p| p.first().cloned()).map(|p| !p.is_empty()).unwrap_or(false)
    };
    if first_push_nonempty(sig_a) { sig_a.to_vec() } else { sig_b.to_vec() }
}

fn combine_p2sh(
    script_pubkey: &[u8],
    sig_a: &[u8],
    sig_b: &[u8],
    verifier: &dyn SignatureVerifier,
) -> Result<Vec<u8>, Error> {
    let pushes_a = pushes(sig_a)?;
    let pushes_b = pushes(sig_b)?;
    let redeem_a = pushes_a.last().ok_or(Error::UnsupportedTemplate)?;
    let redeem_b = pushes_b.last().ok_or(Error::UnsupportedTemplate)?;
    if redeem_a != redeem_b {
        return Err(Error::UnsupportedTemplate);
    }
    let redeem_script = redeem_a;
    let _ = script_pubkey;

    let inner_a: Vec<u8> = pushes_a[..pushes_a.len() - 1].iter().flat_map(|p| get_push_op(p)).collect();
    let inner_b: Vec<u8> = pushes_b[..pushes_b.len() - 1].iter().flat_map(|p| get_push_op(p)).collect();

    let combined_inner = combine_signatures(redeem_script, redeem_script, &inner_a, &inner_b, verifier)?;

    let mut out = combined_inner;
    out.extend(get_push_op(redeem_script));
    Ok(out)
}

/// Multisig: assemble `m` valid signatures in pubkey declaration order from
/// either candidate, pad the remainder with `OP_0`, and prepend the extra
/// `OP_0` required by `CHECKMULTISIG`'s off-by-one stack consumption.
fn combine_multisig(
    subscript: &[u8],
    sig_a: &[u8],
    sig_b: &[u8],
    m: u8,
    pubkeys: &[Vec<u8>],
    verifier: &dyn SignatureVerifier,
) -> Vec<u8> {
    let mut candidates: Vec<Vec<u8>> = Vec::new();
    for script in [sig_a, sig_b] {
        if let Ok(p) = pushes(script) {
            candidates.extend(p.into_iter().filter(|s| !s.is_empty()));
        }
    }

    let mut assembled: Vec<Vec<u8>> = Vec::new();
    for pubkey in pubkeys {
        if assembled.len() >= m as usize {
            break;
        }
        if let Some(sig) = candidates.iter().find(|sig| verifier.check(sig, pubkey, subscript)) {
            assembled.push(sig.clone());
        }
    }

    let mut out = vec![OP_PUSHBYTES_0];
    for sig in &assembled {
        out.extend(get_push_op(sig));
    }
    for _ in assembled.len()..m as usize {
        out.push(OP_PUSHBYTES_0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::{OP_CHECKMULTISIG, OP_PUSHNUM_1};

    struct ExactMatch;
    impl SignatureVerifier for ExactMatch {
        fn check(&self, sig: &[u8], pubkey: &[u8], _subscript: &[u8]) -> bool {
            // test fixture: signature "sig_X" is valid for pubkey "pkX"
            sig == format!("sig_{}", pubkey[0] as char).as_bytes()
        }
    }

    fn multisig_script(pubkeys: &[&[u8]]) -> Vec<u8> {
        let mut script = vec![OP_PUSHNUM_1 + 1];
        for pk in pubkeys {
            script.extend(get_push_op(pk));
        }
        script.push(OP_PUSHNUM_1 + pubkeys.len() as u8 - 1);
        script.push(OP_CHECKMULTISIG);
        script
    }

    /// A compressed-pubkey-shaped (33-byte) fixture tagged by its first
    /// byte, matching the length `extract_multisig` requires.
    fn pubkey(tag: u8) -> Vec<u8> {
        let mut pk = vec![0u8; 33];
        pk[0] = tag;
        pk
    }

    #[test]
    fn combines_partial_multisig_signatures() {
        let pk_a = b"A".as_slice();
        let pk_b = b"B".as_slice();
        let pk_c = b"C".as_slice();
        let script_pubkey = multisig_script(&[pk_a, pk_b, pk_c]);

        let mut sig_script_1 = vec![OP_PUSHBYTES_0];
        sig_script_1.extend(get_push_op(b"sig_A"));
        sig_script_1.push(OP_PUSHBYTES_0);

        let mut sig_script_2 = vec![OP_PUSHBYTES_0, OP_PUSHBYTES_0];
        sig_script_2.extend(get_push_op(b"sig_B"));

        let combined = combine_signatures(
            &script_pubkey,
            &script_pubkey,
            &sig_script_1,
            &sig_script_2,
            &ExactMatch,
        )
        .unwrap();

        let mut expected = vec![OP_PUSHBYTES_0];
        expected.extend(get_push_op(b"sig_A"));
        expected.extend(get_push_op(b"sig_B"));
        assert_eq!(combined, expected);
    }

    #[test]
    fn single_sig_prefers_nonempty_first_push() {
        let sig_a = get_push_op(b"");
        let mut sig_b = get_push_op(b"realsig");
        sig_b.extend(get_push_op(b"pubkey"));
        let combined = combine_single_sig(&sig_a, &sig_b);
        assert_eq!(combined, sig_b);
    }

    #[test]
    fn null_data_prefers_more_pushes() {
        let fewer = get_push_op(b"x");
        let mut more = get_push_op(b"x");
        more.extend(get_push_op(b"y"));
        assert_eq!(combine_by_push_count(&fewer, &more), more);
    }

    #[test]
    fn multisig_required_rejects_a_non_multisig_script_pubkey() {
        use crate::opcodes::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
        let p2pkh = {
            let mut s = vec![OP_DUP, OP_HASH160];
            s.extend(get_push_op(&[0xAB; 20]));
            s.push(OP_EQUALVERIFY);
            s.push(OP_CHECKSIG);
            s
        };
        let result = combine_multisig_required(&p2pkh, &p2pkh, b"", b"", &ExactMatch);
        assert!(matches!(result, Err(Error::InvalidMultisigParams)));
    }

    #[test]
    fn multisig_required_accepts_a_multisig_script_pubkey() {
        let pk_a = pubkey(b'A');
        let pk_b = pubkey(b'B');
        let script_pubkey = multisig_script(&[&pk_a, &pk_b]);

        let mut sig_script_1 = vec![OP_PUSHBYTES_0];
        sig_script_1.extend(get_push_op(b"sig_A"));

        let combined = combine_multisig_required(
            &script_pubkey,
            &script_pubkey,
            &sig_script_1,
            b"",
            &ExactMatch,
        )
        .unwrap();

        // multisig_script hardcodes m=2, so the one missing signature pads
        // with a trailing OP_0.
        let mut expected = vec![OP_PUSHBYTES_0];
        expected.extend(get_push_op(b"sig_A"));
        expected.push(OP_PUSHBYTES_0);
        assert_eq!(combined, expected);
    }

    #[test]
    fn malformed_sig_script_is_reported_distinctly_from_unsupported_template() {
        use crate::opcodes::{OP_EQUAL, OP_HASH160, OP_PUSHDATA2};
        let mut script_pubkey = vec![OP_HASH160];
        script_pubkey.extend(get_push_op(&[0x11; 20]));
        script_pubkey.push(OP_EQUAL);

        let truncated = vec![OP_PUSHDATA2, 0xFF];
        let result = combine_signatures(&script_pubkey, &script_pubkey, &truncated, b"", &ExactMatch);
        assert!(matches!(result, Err(Error::MalformedScript)));
    }
}
