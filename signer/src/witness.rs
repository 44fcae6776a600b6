// Modern, minimalistic & standard-compliant cold wallet library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
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

use bc::{
    Bip340Sig, CompressedPk, ControlBlock, ErrorKind, LeafScript, LegacyPk, LegacySig,
    RedeemScript, ScriptBytes, ScriptError, SigScript, TapScript, Witness, WitnessScript,
};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum WitnessError {
    #[from]
    #[display(inner)]
    Script(ScriptError),

    /// script is not a multisig script of a supported form.
    NotMultisig,

    /// multisig script requires {required} signatures, while {provided} were provided.
    SignatureCount { required: usize, provided: usize },

    /// tapscript multisig has {keys} keys, while {slots} signature slots were provided.
    SlotCount { keys: usize, slots: usize },
}

impl WitnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WitnessError::Script(err) => err.kind(),
            _ => ErrorKind::SpendMismatch,
        }
    }
}

/// Satisfaction data for a single input: its scriptSig and witness stack.
///
/// Either part may be empty: legacy inputs have empty witness, native segwit inputs have empty
/// scriptSig.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SpendWitness {
    pub sig_script: SigScript,
    pub witness: Witness,
}

impl SpendWitness {
    /// Empty satisfaction, used for the inputs which are not signed by us.
    pub fn empty() -> Self { default!() }

    /// `<sig> <pk>` scriptSig.
    pub fn p2pkh(sig: LegacySig, pk: LegacyPk) -> Result<Self, WitnessError> {
        Ok(SpendWitness {
            sig_script: SigScript::with_pushes([sig.to_vec(), pk.to_vec()])?,
            witness: none!(),
        })
    }

    /// `OP_0 <sig_1> ... <sig_m> <redeem_script>` scriptSig for bare multisig redeem script.
    ///
    /// Signatures must follow the order of the keys in the script.
    pub fn p2sh_multisig(
        sigs: &[LegacySig],
        redeem_script: &RedeemScript,
    ) -> Result<Self, WitnessError> {
        let items = multisig_stack(sigs, redeem_script.as_script_bytes())?;
        Ok(SpendWitness {
            sig_script: SigScript::with_pushes(items)?,
            witness: none!(),
        })
    }

    /// `[<sig>, <pk>]` witness.
    pub fn p2wpkh(sig: LegacySig, pk: CompressedPk) -> Self {
        SpendWitness {
            sig_script: none!(),
            witness: Witness::from_consensus_stack([sig.to_vec(), pk.to_byte_array().to_vec()]),
        }
    }

    /// P2WPKH witness together with the scriptSig pushing the nested `OP_0 <hash>` program.
    pub fn p2sh_p2wpkh(sig: LegacySig, pk: CompressedPk) -> Result<Self, WitnessError> {
        let redeem_script = RedeemScript::p2sh_wpkh(pk.wpubkey_hash());
        Ok(SpendWitness {
            sig_script: SigScript::with_pushes([redeem_script.as_slice()])?,
            ..Self::p2wpkh(sig, pk)
        })
    }

    /// `["", <sig_1>, ..., <sig_m>, <witness_script>]` witness.
    pub fn p2wsh_multisig(
        sigs: &[LegacySig],
        witness_script: &WitnessScript,
    ) -> Result<Self, WitnessError> {
        let items = multisig_stack(sigs, witness_script.as_script_bytes())?;
        Ok(SpendWitness {
            sig_script: none!(),
            witness: Witness::from_consensus_stack(items),
        })
    }

    /// P2WSH multisig witness with the scriptSig pushing the nested `OP_0 <hash>` program.
    pub fn p2sh_p2wsh_multisig(
        sigs: &[LegacySig],
        witness_script: &WitnessScript,
    ) -> Result<Self, WitnessError> {
        let redeem_script = witness_script.to_redeem_script();
        Ok(SpendWitness {
            sig_script: SigScript::with_pushes([redeem_script.as_slice()])?,
            ..Self::p2wsh_multisig(sigs, witness_script)?
        })
    }

    /// `[<sig>]` witness; the signature is 64 bytes for the default sighash and 65 otherwise.
    pub fn p2tr_key_path(sig: Bip340Sig) -> Self {
        SpendWitness {
            sig_script: none!(),
            witness: Witness::from_consensus_stack([sig.to_vec()]),
        }
    }

    /// `[<stack items>.., <leaf script>, <control block>]` witness.
    pub fn p2tr_script_path(
        stack: impl IntoIterator<Item = Vec<u8>>,
        leaf_script: &LeafScript,
        control_block: &ControlBlock,
    ) -> Self {
        let witness = stack
            .into_iter()
            .chain([leaf_script.script.to_vec(), control_block.to_vec()]);
        SpendWitness {
            sig_script: none!(),
            witness: Witness::from_consensus_stack(witness),
        }
    }

    /// Script path witness for `OP_CHECKSIGADD` multisig leaf.
    ///
    /// `sigs` contains one slot per key in the script order; absent signatures are encoded as
    /// empty stack items. The number of present signatures must match the script threshold.
    pub fn p2tr_multisig(
        sigs: &[Option<Bip340Sig>],
        tap_script: &TapScript,
        control_block: &ControlBlock,
    ) -> Result<Self, WitnessError> {
        let (threshold, keys) = tap_script.multisig_keys().ok_or(WitnessError::NotMultisig)?;
        if sigs.len() != keys.len() {
            return Err(WitnessError::SlotCount {
                keys: keys.len(),
                slots: sigs.len(),
            });
        }
        let provided = sigs.iter().flatten().count();
        if provided != threshold as usize {
            return Err(WitnessError::SignatureCount {
                required: threshold as usize,
                provided,
            });
        }
        // First key of the script consumes the stack top, so signatures go in reverse
        let stack = sigs.iter().rev().map(|sig| sig.map(Bip340Sig::to_vec).unwrap_or_default());
        let leaf_script = LeafScript::from_tap_script(tap_script.clone());
        Ok(Self::p2tr_script_path(stack, &leaf_script, control_block))
    }

    pub fn into_parts(self) -> (SigScript, Witness) { (self.sig_script, self.witness) }
}

/// Public keys of a bare `OP_CHECKMULTISIG` script, in the script order.
pub(crate) fn multisig_keys(script: &ScriptBytes) -> Result<(u8, Vec<LegacyPk>), WitnessError> {
    script.multisig_keys().ok_or(WitnessError::NotMultisig)
}

fn multisig_stack(sigs: &[LegacySig], script: &ScriptBytes) -> Result<Vec<Vec<u8>>, WitnessError> {
    let (threshold, _) = script.multisig_threshold().ok_or(WitnessError::NotMultisig)?;
    if sigs.len() != threshold as usize {
        return Err(WitnessError::SignatureCount {
            required: threshold as usize,
            provided: sigs.len(),
        });
    }
    // Leading empty item is consumed by the CHECKMULTISIG off-by-one
    let mut items = Vec::with_capacity(sigs.len() + 2);
    items.push(vec![]);
    items.extend(sigs.iter().copied().map(LegacySig::to_vec));
    items.push(script.to_vec());
    Ok(items)
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use bc::secp256k1::{Keypair, Message, SecretKey, SECP256K1};
    use bc::{InternalPk, LeafVer, Parity, ScriptElement, TapMerklePath, XOnlyPk};

    use super::*;

    fn ecdsa_sig(seed: u8) -> LegacySig {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        LegacySig::sighash_all(sk.sign_ecdsa(Message::from_digest([0x11; 32])))
    }

    fn schnorr_sig(seed: u8) -> Bip340Sig {
        let keypair = Keypair::from_seckey_slice(SECP256K1, &[seed; 32]).unwrap();
        Bip340Sig::sighash_default(keypair.sign_schnorr(&[0x22; 32]))
    }

    fn compressed_pk(seed: u8) -> CompressedPk {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        CompressedPk::from(sk.public_key(SECP256K1))
    }

    fn xonly_pk(seed: u8) -> XOnlyPk {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        XOnlyPk::from(sk.public_key(SECP256K1))
    }

    fn control_block() -> ControlBlock {
        let internal_pk =
            InternalPk::from_str("93c7378d96518a75448821c4f7c8f4bae7ce60f804d03d1f0628dd5dd0f5de51")
                .unwrap();
        ControlBlock::with(LeafVer::TapScript, internal_pk, Parity::Even, TapMerklePath::new())
    }

    #[test]
    fn p2pkh() {
        let sig = ecdsa_sig(1);
        let pk = LegacyPk::from(compressed_pk(1));
        let spend = SpendWitness::p2pkh(sig, pk).unwrap();
        assert!(spend.witness.is_empty());
        assert_eq!(
            spend.sig_script.elements().unwrap(),
            vec![ScriptElement::Push(sig.to_vec()), ScriptElement::Push(pk.to_vec())]
        );
    }

    #[test]
    fn p2wpkh() {
        let sig = ecdsa_sig(1);
        let spend = SpendWitness::p2wpkh(sig, compressed_pk(1));
        assert!(spend.sig_script.is_empty());
        assert_eq!(spend.witness.len(), 2);
        assert_eq!(spend.witness[1].len(), 33);

        let nested = SpendWitness::p2sh_p2wpkh(sig, compressed_pk(1)).unwrap();
        assert_eq!(nested.witness, spend.witness);
        assert_eq!(nested.sig_script.len(), 23);
        assert_eq!(&nested.sig_script[..3], &[0x16, 0x00, 0x14]);
    }

    #[test]
    fn p2wsh_multisig() {
        let keys = [compressed_pk(1), compressed_pk(2), compressed_pk(3)];
        let script = WitnessScript::multisig(2, &keys).unwrap();
        let sigs = [ecdsa_sig(1), ecdsa_sig(3)];
        let spend = SpendWitness::p2wsh_multisig(&sigs, &script).unwrap();
        assert!(spend.sig_script.is_empty());
        assert_eq!(spend.witness.len(), 4);
        assert_eq!(spend.witness.iter().filter(|item| item.is_empty()).count(), 1);
        assert!(spend.witness[0].is_empty());
        assert_eq!(spend.witness[3], script.to_vec());

        let err = SpendWitness::p2wsh_multisig(&sigs[..1], &script).unwrap_err();
        assert_eq!(err, WitnessError::SignatureCount { required: 2, provided: 1 });
        assert_eq!(err.kind(), ErrorKind::SpendMismatch);

        let nested = SpendWitness::p2sh_p2wsh_multisig(&sigs, &script).unwrap();
        assert_eq!(nested.witness, spend.witness);
        assert_eq!(nested.sig_script.len(), 35);
    }

    #[test]
    fn p2sh_multisig() {
        let keys = [compressed_pk(1), compressed_pk(2)].map(LegacyPk::from);
        let script = RedeemScript::multisig(1, &keys).unwrap();
        let spend = SpendWitness::p2sh_multisig(&[ecdsa_sig(2)], &script).unwrap();
        let elements = spend.sig_script.elements().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0], ScriptElement::Push(vec![]));
        assert_eq!(elements[2], ScriptElement::Push(script.to_vec()));
        assert_eq!(multisig_keys(script.as_script_bytes()).unwrap(), (1, keys.to_vec()));

        let not_multisig = RedeemScript::p2sh_wpkh(compressed_pk(1).wpubkey_hash());
        assert_eq!(
            SpendWitness::p2sh_multisig(&[ecdsa_sig(2)], &not_multisig).unwrap_err(),
            WitnessError::NotMultisig
        );
    }

    #[test]
    fn p2tr_key_path() {
        let sig = schnorr_sig(1);
        assert_eq!(SpendWitness::p2tr_key_path(sig).witness[0].len(), 64);
        let sig = Bip340Sig {
            sighash_type: Some(bc::SighashType::none()),
            ..sig
        };
        assert_eq!(SpendWitness::p2tr_key_path(sig).witness[0].len(), 65);
    }

    #[test]
    fn p2tr_multisig() {
        let keys = [xonly_pk(1), xonly_pk(2), xonly_pk(3)];
        let script = TapScript::multisig(2, &keys).unwrap();
        let cb = control_block();
        let sigs = [Some(schnorr_sig(1)), None, Some(schnorr_sig(3))];
        let spend = SpendWitness::p2tr_multisig(&sigs, &script, &cb).unwrap();
        let witness = spend.witness.into_vec();
        assert_eq!(witness.len(), 5);
        assert_eq!(witness[0], schnorr_sig(3).to_vec());
        assert!(witness[1].is_empty());
        assert_eq!(witness[2], schnorr_sig(1).to_vec());
        assert_eq!(witness[3], script.to_vec());
        assert_eq!(witness[4], cb.to_vec());

        assert_eq!(
            SpendWitness::p2tr_multisig(&sigs[..2], &script, &cb).unwrap_err(),
            WitnessError::SlotCount { keys: 3, slots: 2 }
        );
        assert_eq!(
            SpendWitness::p2tr_multisig(&[Some(schnorr_sig(1)), None, None], &script, &cb)
                .unwrap_err(),
            WitnessError::SignatureCount { required: 2, provided: 1 }
        );
    }
}
