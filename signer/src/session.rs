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

//! Signing session: drives an external [`Sign`] implementation over the inputs of an unsigned
//! transaction and attaches the assembled satisfactions at the end.
//!
//! Each input goes through `Unsigned -> DigestComputed -> Signed` states; spend declarations
//! which don't match the spent output and signer refusals put the input into the terminal
//! `Invalid` state.

use bc::{
    Bip340Sig, CompressedPk, ControlBlock, ErrorKind, InternalPk, LegacyPk, LegacySig, OutputPk,
    RedeemScript, ScriptBytes, ScriptCode, ScriptPubkey, Sighash, SighashCache, SighashError,
    SighashType, SigningContext, TapNodeHash, TapScript, TapSighash, Tx, WitnessScript,
};

use crate::witness::multisig_keys;
use crate::{Sign, SpendWitness, WitnessError};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum SessionError {
    #[from]
    #[display(inner)]
    Sighash(SighashError),

    #[from]
    #[display(inner)]
    Witness(WitnessError),

    /// {spends} spend declarations were provided for a transaction with {inputs} inputs.
    SpendCount { spends: usize, inputs: usize },

    /// input index {index} is out of bounds for a transaction with {inputs} inputs.
    InvalidInputIndex { index: usize, inputs: usize },

    /// input {0} spend declaration doesn't match the script of the spent output.
    SpendMismatch(usize),

    /// input {index} is in {state} state, which doesn't allow the requested operation.
    InvalidState { index: usize, state: SigningState },

    /// signer refused to sign input {0}.
    SignerRefused(usize),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Sighash(err) => err.kind(),
            SessionError::Witness(err) => err.kind(),
            SessionError::SpendCount { .. } => ErrorKind::SigningContextMismatch,
            SessionError::InvalidInputIndex { .. } => ErrorKind::InvalidInputIndex,
            SessionError::SpendMismatch(_) | SessionError::InvalidState { .. } => {
                ErrorKind::SpendMismatch
            }
            SessionError::SignerRefused(_) => ErrorKind::SignerRefused,
        }
    }
}

/// Signing progress of a single input.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Default)]
#[display(lowercase)]
pub enum SigningState {
    #[default]
    Unsigned,
    DigestComputed,
    Signed,
    Invalid,
}

/// How an input spends its previous output, with all the materials required to sign it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InputSpend {
    /// Input satisfied outside of this session; it gets empty scriptSig and witness.
    External,

    P2pkh {
        pk: LegacyPk,
        sighash_type: SighashType,
    },

    /// P2SH with bare `OP_CHECKMULTISIG` redeem script.
    P2shMultisig {
        redeem_script: RedeemScript,
        sighash_type: SighashType,
    },

    /// P2WPKH, native or nested into P2SH.
    P2wpkh {
        pk: CompressedPk,
        nested: bool,
        sighash_type: SighashType,
    },

    /// P2WSH with multisig witness script, native or nested into P2SH.
    P2wshMultisig {
        witness_script: WitnessScript,
        nested: bool,
        sighash_type: SighashType,
    },

    P2trKeyPath {
        internal_pk: InternalPk,
        merkle_root: Option<TapNodeHash>,
        sighash_type: Option<SighashType>,
    },

    /// Script path spending via `OP_CHECKSIGADD` multisig leaf.
    P2trMultisig {
        tap_script: TapScript,
        control_block: ControlBlock,
        sighash_type: Option<SighashType>,
    },
}

impl InputSpend {
    /// Whether the spend is satisfied with witness data.
    pub fn is_segwit(&self) -> bool {
        !matches!(
            self,
            InputSpend::External | InputSpend::P2pkh { .. } | InputSpend::P2shMultisig { .. }
        )
    }

    /// Checks that the spend can satisfy the output locked with `script_pubkey`.
    pub fn matches(&self, script_pubkey: &ScriptPubkey) -> bool {
        match self {
            InputSpend::External => true,
            InputSpend::P2pkh { pk, .. } => {
                *script_pubkey == ScriptPubkey::p2pkh(pk.pubkey_hash())
            }
            InputSpend::P2shMultisig { redeem_script, .. } => {
                multisig_keys(redeem_script.as_script_bytes()).is_ok()
                    && *script_pubkey == redeem_script.to_script_pubkey()
            }
            InputSpend::P2wpkh { pk, nested: false, .. } => {
                *script_pubkey == ScriptPubkey::p2wpkh(pk.wpubkey_hash())
            }
            InputSpend::P2wpkh { pk, nested: true, .. } => {
                *script_pubkey == RedeemScript::p2sh_wpkh(pk.wpubkey_hash()).to_script_pubkey()
            }
            InputSpend::P2wshMultisig {
                witness_script,
                nested,
                ..
            } => {
                let compressed = multisig_keys(witness_script.as_script_bytes())
                    .map(|(_, keys)| keys.iter().all(|pk| pk.compressed))
                    .unwrap_or_default();
                let expected = match nested {
                    false => witness_script.to_script_pubkey(),
                    true => witness_script.to_redeem_script().to_script_pubkey(),
                };
                compressed && *script_pubkey == expected
            }
            InputSpend::P2trKeyPath {
                internal_pk,
                merkle_root,
                ..
            } => *script_pubkey == ScriptPubkey::p2tr(*internal_pk, *merkle_root),
            InputSpend::P2trMultisig {
                tap_script,
                control_block,
                ..
            } => {
                if !script_pubkey.is_p2tr() {
                    return false;
                }
                let Some(program) = script_pubkey.witness_program() else {
                    return false;
                };
                let Ok(output_pk) = OutputPk::from_bytes(program) else {
                    return false;
                };
                tap_script.multisig_keys().is_some()
                    && control_block.verify(output_pk, tap_script.as_script_bytes())
            }
        }
    }
}

/// Signature digest computed for an input.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, From)]
#[display(inner)]
pub enum InputDigest {
    #[from]
    Ecdsa(Sighash),
    #[from]
    Bip340(TapSighash),
}

/// Signs inputs of a fully specified unsigned transaction one by one, collecting their
/// satisfactions into positionally indexed slots.
#[derive(Debug)]
pub struct SigningSession {
    cache: SighashCache,
    context: SigningContext,
    spends: Vec<InputSpend>,
    states: Vec<SigningState>,
    satisfactions: Vec<Option<SpendWitness>>,
}

impl SigningSession {
    /// Starts session for `tx` spending outputs described by `context`.
    ///
    /// Fails if the context or spend declarations don't cover exactly all transaction inputs.
    /// Inputs whose spend declaration doesn't match the spent output start in the
    /// [`SigningState::Invalid`] state.
    pub fn new(
        tx: Tx,
        context: SigningContext,
        spends: Vec<InputSpend>,
    ) -> Result<Self, SessionError> {
        let inputs = tx.inputs.len();
        if spends.len() != inputs {
            return Err(SessionError::SpendCount {
                spends: spends.len(),
                inputs,
            });
        }
        let cache = SighashCache::with_context(tx, context.clone())?;
        let states = spends
            .iter()
            .zip(context.scripts())
            .enumerate()
            .map(|(index, (spend, script_pubkey))| {
                if spend.matches(script_pubkey) {
                    SigningState::Unsigned
                } else {
                    tracing::warn!("input {index} spend declaration doesn't match {script_pubkey}");
                    SigningState::Invalid
                }
            })
            .collect();
        Ok(SigningSession {
            cache,
            context,
            spends,
            states,
            satisfactions: vec![None; inputs],
        })
    }

    #[inline]
    pub fn tx(&self) -> &Tx { self.cache.tx() }

    #[inline]
    pub fn spends(&self) -> &[InputSpend] { &self.spends }

    pub fn state(&self, index: usize) -> Option<SigningState> { self.states.get(index).copied() }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.states.len() {
            return Err(SessionError::InvalidInputIndex {
                index,
                inputs: self.states.len(),
            });
        }
        Ok(())
    }

    fn set_state(&mut self, index: usize, state: SigningState) {
        tracing::debug!("input {index} transitions from {} to {state}", self.states[index]);
        self.states[index] = state;
    }

    /// Computes signature digest for the input, moving it into
    /// [`SigningState::DigestComputed`] state.
    pub fn digest(&mut self, index: usize) -> Result<InputDigest, SessionError> {
        self.check_index(index)?;
        match self.states[index] {
            SigningState::Unsigned | SigningState::DigestComputed => {}
            state => return Err(SessionError::InvalidState { index, state }),
        }
        let amount = self.context.amounts()[index];
        let digest = match &self.spends[index] {
            InputSpend::External => {
                return Err(SessionError::InvalidState {
                    index,
                    state: self.states[index],
                })
            }
            InputSpend::P2pkh { sighash_type, .. } => {
                let script_code = ScriptCode::from(self.context.scripts()[index].clone());
                self.cache.legacy_sighash(index, &script_code, *sighash_type)?.into()
            }
            InputSpend::P2shMultisig {
                redeem_script,
                sighash_type,
            } => {
                let script_code = ScriptCode::from(redeem_script.clone());
                self.cache.legacy_sighash(index, &script_code, *sighash_type)?.into()
            }
            InputSpend::P2wpkh {
                pk, sighash_type, ..
            } => {
                let script_code = ScriptCode::with_p2wpkh(pk.wpubkey_hash());
                self.cache.segwit_sighash(index, &script_code, amount, *sighash_type)?.into()
            }
            InputSpend::P2wshMultisig {
                witness_script,
                sighash_type,
                ..
            } => {
                let script_code = ScriptCode::with_p2wsh(witness_script);
                self.cache.segwit_sighash(index, &script_code, amount, *sighash_type)?.into()
            }
            InputSpend::P2trKeyPath { sighash_type, .. } => {
                self.cache.tap_sighash_key(index, *sighash_type)?.into()
            }
            InputSpend::P2trMultisig {
                tap_script,
                sighash_type,
                ..
            } => self
                .cache
                .tap_sighash_script(index, tap_script.tap_leaf_hash(), *sighash_type)?
                .into(),
        };
        if self.states[index] == SigningState::Unsigned {
            self.set_state(index, SigningState::DigestComputed);
        }
        Ok(digest)
    }

    /// Signs the input with `signer`, returning number of created signatures.
    ///
    /// On success the input becomes [`SigningState::Signed`]; if the signer refuses, the input
    /// becomes [`SigningState::Invalid`].
    pub fn sign(&mut self, index: usize, signer: &impl Sign) -> Result<usize, SessionError> {
        let digest = self.digest(index)?;
        match self.satisfy(index, digest, signer) {
            Ok((satisfaction, count)) => {
                self.satisfactions[index] = Some(satisfaction);
                self.set_state(index, SigningState::Signed);
                Ok(count)
            }
            Err(err) => {
                if let SessionError::SignerRefused(_) = err {
                    tracing::warn!("signer refused to sign input {index}");
                }
                self.set_state(index, SigningState::Invalid);
                Err(err)
            }
        }
    }

    /// Signs all inputs which are not yet signed and not satisfied externally, returning total
    /// number of created signatures. Stops on the first failure.
    pub fn sign_all(&mut self, signer: &impl Sign) -> Result<usize, SessionError> {
        let mut count = 0usize;
        for index in 0..self.spends.len() {
            if self.spends[index] == InputSpend::External
                || self.states[index] == SigningState::Signed
            {
                continue;
            }
            count += self.sign(index, signer)?;
        }
        Ok(count)
    }

    fn satisfy(
        &self,
        index: usize,
        digest: InputDigest,
        signer: &impl Sign,
    ) -> Result<(SpendWitness, usize), SessionError> {
        let refused = || SessionError::SignerRefused(index);
        let (spend, digest) = (&self.spends[index], digest);
        Ok(match (spend, digest) {
            (InputSpend::P2pkh { pk, sighash_type }, InputDigest::Ecdsa(sighash)) => {
                let sig = signer.sign_ecdsa(sighash, *pk).ok_or_else(refused)?;
                let sig = LegacySig {
                    sig,
                    sighash_type: *sighash_type,
                };
                (SpendWitness::p2pkh(sig, *pk)?, 1)
            }
            (
                InputSpend::P2shMultisig {
                    redeem_script,
                    sighash_type,
                },
                InputDigest::Ecdsa(sighash),
            ) => {
                let script = redeem_script.as_script_bytes();
                let sigs = self.multisig_sigs(index, script, sighash, *sighash_type, signer)?;
                (SpendWitness::p2sh_multisig(&sigs, redeem_script)?, sigs.len())
            }
            (
                InputSpend::P2wpkh {
                    pk,
                    nested,
                    sighash_type,
                },
                InputDigest::Ecdsa(sighash),
            ) => {
                let sig = signer.sign_ecdsa(sighash, LegacyPk::from(*pk)).ok_or_else(refused)?;
                let sig = LegacySig {
                    sig,
                    sighash_type: *sighash_type,
                };
                match nested {
                    false => (SpendWitness::p2wpkh(sig, *pk), 1),
                    true => (SpendWitness::p2sh_p2wpkh(sig, *pk)?, 1),
                }
            }
            (
                InputSpend::P2wshMultisig {
                    witness_script,
                    nested,
                    sighash_type,
                },
                InputDigest::Ecdsa(sighash),
            ) => {
                let script = witness_script.as_script_bytes();
                let sigs = self.multisig_sigs(index, script, sighash, *sighash_type, signer)?;
                let satisfaction = match nested {
                    false => SpendWitness::p2wsh_multisig(&sigs, witness_script)?,
                    true => SpendWitness::p2sh_p2wsh_multisig(&sigs, witness_script)?,
                };
                (satisfaction, sigs.len())
            }
            (
                InputSpend::P2trKeyPath {
                    internal_pk,
                    merkle_root,
                    sighash_type,
                },
                InputDigest::Bip340(sighash),
            ) => {
                if !signer.should_sign_key_path(index) {
                    return Err(refused());
                }
                let sig = signer
                    .sign_bip340_key_only(sighash, *internal_pk, *merkle_root)
                    .ok_or_else(refused)?;
                let sig = Bip340Sig {
                    sig,
                    sighash_type: *sighash_type,
                };
                (SpendWitness::p2tr_key_path(sig), 1)
            }
            (
                InputSpend::P2trMultisig {
                    tap_script,
                    control_block,
                    sighash_type,
                },
                InputDigest::Bip340(sighash),
            ) => {
                if !signer.should_sign_script_path(
                    index,
                    &control_block.merkle_branch,
                    tap_script.tap_leaf_hash(),
                ) {
                    return Err(refused());
                }
                let (threshold, keys) =
                    tap_script.multisig_keys().ok_or(WitnessError::NotMultisig)?;
                let mut count = 0usize;
                let mut sigs = Vec::with_capacity(keys.len());
                for pk in keys {
                    let sig = match count < threshold as usize {
                        true => signer.sign_bip340_script_path(sighash, pk),
                        false => None,
                    };
                    count += sig.is_some() as usize;
                    sigs.push(sig.map(|sig| Bip340Sig {
                        sig,
                        sighash_type: *sighash_type,
                    }));
                }
                if count < threshold as usize {
                    return Err(refused());
                }
                (SpendWitness::p2tr_multisig(&sigs, tap_script, control_block)?, count)
            }
            _ => unreachable!("digest kind always follows the spend type"),
        })
    }

    fn multisig_sigs(
        &self,
        index: usize,
        script: &ScriptBytes,
        sighash: Sighash,
        sighash_type: SighashType,
        signer: &impl Sign,
    ) -> Result<Vec<LegacySig>, SessionError> {
        let (threshold, keys) = multisig_keys(script)?;
        let sigs = keys
            .into_iter()
            .filter_map(|pk| signer.sign_ecdsa(sighash, pk))
            .take(threshold as usize)
            .map(|sig| LegacySig { sig, sighash_type })
            .collect::<Vec<_>>();
        if sigs.len() < threshold as usize {
            return Err(SessionError::SignerRefused(index));
        }
        Ok(sigs)
    }

    /// Consumes the session, returning the transaction with all satisfactions attached.
    ///
    /// The transaction gets the witness flag if any of the inputs is a segwit spend; in this
    /// case inputs without witness data occupy empty witness slots.
    pub fn finalize(self) -> Result<Tx, SessionError> {
        for (index, (spend, state)) in self.spends.iter().zip(&self.states).enumerate() {
            if *spend != InputSpend::External && *state != SigningState::Signed {
                return Err(SessionError::InvalidState {
                    index,
                    state: *state,
                });
            }
        }

        let segwit = self.spends.iter().any(InputSpend::is_segwit);
        let mut tx = self.cache.into_tx();
        let mut witnesses = Vec::with_capacity(tx.inputs.len());
        for (input, satisfaction) in tx.inputs.iter_mut().zip(self.satisfactions) {
            let (sig_script, witness) = satisfaction.unwrap_or_default().into_parts();
            input.sig_script = sig_script;
            witnesses.push(witness);
        }
        tx.segwit = segwit;
        tx.witnesses = if segwit { witnesses } else { empty!() };
        Ok(tx)
    }
}
