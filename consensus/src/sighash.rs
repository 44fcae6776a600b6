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

//! Signature digest algorithms: legacy (pre-segwit), BIP143 (segwit v0) and BIP341 (taproot).

use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;

use amplify::IoError;
use bitcoin_hashes::HashEngine;

use crate::{
    sha256, sha256d, Annex, ConsensusEncode, ErrorKind, Sats, ScriptCode, ScriptPubkey, SeqNo,
    SigScript, Sighash, TapLeafHash, TapSighash, Tx, TxOut, Txid, VarInt,
};

/// Legacy "one" digest returned for `SIGHASH_SINGLE` inputs without a matching output.
const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Code separator position used when no `OP_CODESEPARATOR` was executed.
const NO_CODESEP: u32 = 0xFFFFFFFF;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("invalid signature hash type {0:#04x}.")]
pub struct InvalidSighashType(pub u32);

impl InvalidSighashType {
    pub fn kind(&self) -> ErrorKind { ErrorKind::InvalidSighashType }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SighashError {
    /// input index {index} is out of bounds for transaction {txid} with {inputs} inputs.
    InvalidInputIndex {
        txid: Txid,
        index: usize,
        inputs: usize,
    },

    /// transaction {txid} input {index} uses SIGHASH_SINGLE, but the total
    /// number of outputs is {outputs} and thus no signature can be produced.
    NoSingleOutputMatch {
        txid: Txid,
        index: usize,
        outputs: usize,
    },

    /// signing context provides {scripts} spent scripts and {amounts} amounts, while the
    /// transaction has {inputs} inputs.
    SigningContextMismatch {
        inputs: usize,
        scripts: usize,
        amounts: usize,
    },

    /// taproot signature digest requires signing context with all spent outputs.
    NoSigningContext,
}

impl SighashError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SighashError::InvalidInputIndex { .. } => ErrorKind::InvalidInputIndex,
            SighashError::NoSingleOutputMatch { .. } => ErrorKind::NoSingleOutput,
            SighashError::SigningContextMismatch { .. } | SighashError::NoSigningContext => {
                ErrorKind::SigningContextMismatch
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum SighashFlag {
    /// 0x1: Sign all outputs.
    #[default]
    All = 0x01,
    /// 0x2: Sign no outputs --- anyone can choose the destination.
    None = 0x02,
    /// 0x3: Sign the output whose index matches this input's index. If none exists,
    /// sign the hash
    /// `0000000000000000000000000000000000000000000000000000000000000001`.
    /// (This rule is probably an unintentional C++ism, but it's consensus so we have
    /// to follow it.)
    Single = 0x03,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct SighashType {
    pub flag: SighashFlag,
    pub anyone_can_pay: bool,
}

impl SighashType {
    #[inline]
    pub const fn all() -> Self {
        SighashType {
            flag: SighashFlag::All,
            anyone_can_pay: false,
        }
    }
    #[inline]
    pub const fn none() -> Self {
        SighashType {
            flag: SighashFlag::None,
            anyone_can_pay: false,
        }
    }
    #[inline]
    pub const fn single() -> Self {
        SighashType {
            flag: SighashFlag::Single,
            anyone_can_pay: false,
        }
    }

    #[inline]
    pub const fn all_anyone_can_pay() -> Self {
        SighashType {
            flag: SighashFlag::All,
            anyone_can_pay: true,
        }
    }
    #[inline]
    pub const fn none_anyone_can_pay() -> Self {
        SighashType {
            flag: SighashFlag::None,
            anyone_can_pay: true,
        }
    }
    #[inline]
    pub const fn single_anyone_can_pay() -> Self {
        SighashType {
            flag: SighashFlag::Single,
            anyone_can_pay: true,
        }
    }

    /// Parses sighash type from its 4-byte consensus value. Only the standard
    /// types `0x01-0x03` and `0x81-0x83` are accepted.
    pub const fn from_consensus_u32(n: u32) -> Result<SighashType, InvalidSighashType> {
        let flag = match n & 0x7F {
            0x01 => SighashFlag::All,
            0x02 => SighashFlag::None,
            0x03 => SighashFlag::Single,
            _ => return Err(InvalidSighashType(n)),
        };
        match n & !0x7F {
            0x00 => Ok(SighashType {
                flag,
                anyone_can_pay: false,
            }),
            0x80 => Ok(SighashType {
                flag,
                anyone_can_pay: true,
            }),
            _ => Err(InvalidSighashType(n)),
        }
    }

    #[inline]
    pub const fn from_consensus_u8(n: u8) -> Result<SighashType, InvalidSighashType> {
        Self::from_consensus_u32(n as u32)
    }

    /// Parses taproot sighash byte, where `0x00` stands for the default mode (signing
    /// all inputs and outputs without committing to the type byte itself).
    pub const fn from_taproot_u8(n: u8) -> Result<Option<SighashType>, InvalidSighashType> {
        if n == 0x00 {
            return Ok(None);
        }
        match Self::from_consensus_u8(n) {
            Ok(ty) => Ok(Some(ty)),
            Err(err) => Err(err),
        }
    }

    pub const fn to_consensus_u32(self) -> u32 { self.to_consensus_u8() as u32 }

    pub const fn to_consensus_u8(self) -> u8 {
        let flag = self.flag as u8;
        match self.anyone_can_pay {
            true => flag | 0x80,
            false => flag,
        }
    }
}

impl Display for SighashType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.flag {
            SighashFlag::All => f.write_str("ALL")?,
            SighashFlag::None => f.write_str("NONE")?,
            SighashFlag::Single => f.write_str("SINGLE")?,
        }
        if self.anyone_can_pay {
            f.write_str("|ANYONECANPAY")?;
        }
        Ok(())
    }
}

impl FromStr for SighashType {
    type Err = InvalidSighashType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("SIGHASH_");
        let (flag, anyone_can_pay) = match s.split_once('|') {
            Some((flag, "ANYONECANPAY")) => (flag, true),
            Some(_) => return Err(InvalidSighashType(0xFF)),
            None => (s, false),
        };
        let flag = match flag {
            "ALL" => SighashFlag::All,
            "NONE" => SighashFlag::None,
            "SINGLE" => SighashFlag::Single,
            _ => return Err(InvalidSighashType(0xFF)),
        };
        Ok(SighashType {
            flag,
            anyone_can_pay,
        })
    }
}

/// Scripts and amounts of all outputs spent by a transaction, in input order.
///
/// Taproot digests commit to every spent output, so the context must cover all inputs.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SigningContext {
    scripts: Vec<ScriptPubkey>,
    amounts: Vec<Sats>,
}

impl SigningContext {
    pub fn new(scripts: Vec<ScriptPubkey>, amounts: Vec<Sats>) -> Self {
        SigningContext { scripts, amounts }
    }

    pub fn with_prevouts(prevouts: impl IntoIterator<Item = TxOut>) -> Self {
        let (amounts, scripts) =
            prevouts.into_iter().map(|txout| (txout.value, txout.script_pubkey)).unzip();
        SigningContext { scripts, amounts }
    }

    #[inline]
    pub fn scripts(&self) -> &[ScriptPubkey] { &self.scripts }

    #[inline]
    pub fn amounts(&self) -> &[Sats] { &self.amounts }

    /// Checks that both lists have exactly one entry per transaction input.
    pub fn check(&self, inputs: usize) -> Result<(), SighashError> {
        if self.scripts.len() != inputs || self.amounts.len() != inputs {
            return Err(SighashError::SigningContextMismatch {
                inputs,
                scripts: self.scripts.len(),
                amounts: self.amounts.len(),
            });
        }
        Ok(())
    }
}

/// Single SHA256 hashes shared by BIP143 (which hashes them once more) and BIP341.
#[derive(Clone, Debug)]
struct CommonCache {
    prevouts: [u8; 32],
    sequences: [u8; 32],
    outputs: [u8; 32],
}

#[derive(Clone, Debug)]
struct TaprootCache {
    amounts: [u8; 32],
    script_pubkeys: [u8; 32],
}

/// Computes signature digests for the inputs of a single transaction, caching the hashes
/// shared between inputs.
///
/// The cache never changes the transaction, and all the methods take `&self`, so the same
/// cache can be used to compute digests for different inputs from several threads.
#[derive(Debug)]
pub struct SighashCache {
    tx: Tx,
    context: Option<SigningContext>,
    common: OnceLock<CommonCache>,
    taproot: OnceLock<TaprootCache>,
}

impl SighashCache {
    /// Constructs cache able to compute legacy and BIP143 digests.
    pub fn new(tx: Tx) -> Self {
        SighashCache {
            tx,
            context: None,
            common: OnceLock::new(),
            taproot: OnceLock::new(),
        }
    }

    /// Constructs cache with the spent outputs, as required by the taproot digests.
    ///
    /// # Errors
    ///
    /// If the number of spent scripts or amounts doesn't match the number of inputs.
    pub fn with_context(tx: Tx, context: SigningContext) -> Result<Self, SighashError> {
        context.check(tx.inputs.len())?;
        let mut cache = Self::new(tx);
        cache.context = Some(context);
        Ok(cache)
    }

    #[inline]
    pub fn tx(&self) -> &Tx { &self.tx }

    #[inline]
    pub fn context(&self) -> Option<&SigningContext> { self.context.as_ref() }

    #[inline]
    pub fn into_tx(self) -> Tx { self.tx }

    fn check_index(&self, index: usize) -> Result<(), SighashError> {
        let inputs = self.tx.inputs.len();
        if index >= inputs {
            return Err(SighashError::InvalidInputIndex {
                txid: self.tx.txid(),
                index,
                inputs,
            });
        }
        Ok(())
    }

    fn common_cache(&self) -> &CommonCache {
        self.common.get_or_init(|| {
            let mut prevouts = Vec::with_capacity(self.tx.inputs.len() * 36);
            let mut sequences = Vec::with_capacity(self.tx.inputs.len() * 4);
            let mut outputs = Vec::new();
            for input in &self.tx.inputs {
                prevouts.extend(input.prev_output.consensus_serialize());
                sequences.extend(input.sequence.consensus_serialize());
            }
            for output in &self.tx.outputs {
                outputs.extend(output.consensus_serialize());
            }
            CommonCache {
                prevouts: sha256(prevouts),
                sequences: sha256(sequences),
                outputs: sha256(outputs),
            }
        })
    }

    fn taproot_cache(&self, context: &SigningContext) -> &TaprootCache {
        self.taproot.get_or_init(|| {
            let mut amounts = Vec::with_capacity(context.amounts.len() * 8);
            let mut script_pubkeys = Vec::new();
            for amount in &context.amounts {
                amounts.extend(amount.consensus_serialize());
            }
            for script_pubkey in &context.scripts {
                script_pubkeys.extend(script_pubkey.consensus_serialize());
            }
            TaprootCache {
                amounts: sha256(amounts),
                script_pubkeys: sha256(script_pubkeys),
            }
        })
    }

    /// Computes pre-segwit signature digest for the input `input_index`, where `script_code`
    /// is the spent `scriptPubkey` (or the redeem script for P2SH).
    ///
    /// For `SIGHASH_SINGLE` inputs without a matching output returns the consensus "one"
    /// digest, as bitcoin core does.
    pub fn legacy_sighash(
        &self,
        input_index: usize,
        script_code: &ScriptCode,
        sighash_type: SighashType,
    ) -> Result<Sighash, SighashError> {
        self.check_index(input_index)?;

        if sighash_type.flag == SighashFlag::Single && input_index >= self.tx.outputs.len() {
            tracing::trace!(
                "input {input_index} uses SIGHASH_SINGLE without matching output, using one \
                 digest"
            );
            return Ok(Sighash::from(SIGHASH_SINGLE_BUG));
        }

        let mut preimage = Vec::with_capacity(self.tx.base_size() + script_code.len() + 4);
        self.legacy_preimage(&mut preimage, input_index, script_code, sighash_type)
            .expect("in-memory writing can't fail");
        let sighash = Sighash::from(sha256d(preimage));
        tracing::trace!("legacy sighash for input {input_index} with {sighash_type}: {sighash}");
        Ok(sighash)
    }

    fn legacy_preimage(
        &self,
        writer: &mut impl Write,
        input_index: usize,
        script_code: &ScriptCode,
        sighash_type: SighashType,
    ) -> Result<usize, IoError> {
        let tx = &self.tx;
        let zero_sequences = sighash_type.flag != SighashFlag::All;

        let mut counter = tx.version.consensus_encode(writer)?;

        if sighash_type.anyone_can_pay {
            let input = &tx.inputs[input_index];
            counter += VarInt::new(1).consensus_encode(writer)?;
            counter += input.prev_output.consensus_encode(writer)?;
            counter += script_code.consensus_encode(writer)?;
            counter += input.sequence.consensus_encode(writer)?;
        } else {
            counter += VarInt::with_len(tx.inputs.len()).consensus_encode(writer)?;
            for (index, input) in tx.inputs.iter().enumerate() {
                counter += input.prev_output.consensus_encode(writer)?;
                if index == input_index {
                    counter += script_code.consensus_encode(writer)?;
                    counter += input.sequence.consensus_encode(writer)?;
                } else {
                    counter += SigScript::new().consensus_encode(writer)?;
                    let sequence =
                        if zero_sequences { SeqNo::ZERO } else { input.sequence };
                    counter += sequence.consensus_encode(writer)?;
                }
            }
        }

        match sighash_type.flag {
            SighashFlag::All => {
                counter += VarInt::with_len(tx.outputs.len()).consensus_encode(writer)?;
                for output in &tx.outputs {
                    counter += output.consensus_encode(writer)?;
                }
            }
            SighashFlag::None => {
                counter += VarInt::new(0).consensus_encode(writer)?;
            }
            SighashFlag::Single => {
                counter += VarInt::with_len(input_index + 1).consensus_encode(writer)?;
                for _ in 0..input_index {
                    // blank output: value of -1 and empty script
                    counter += u64::MAX.consensus_encode(writer)?;
                    counter += ScriptPubkey::new().consensus_encode(writer)?;
                }
                counter += tx.outputs[input_index].consensus_encode(writer)?;
            }
        }

        counter += tx.lock_time.consensus_encode(writer)?;
        counter += sighash_type.to_consensus_u32().consensus_encode(writer)?;
        Ok(counter)
    }

    /// Computes BIP143 signature digest for segwit v0 input `input_index` spending output of
    /// `amount` with the given `script_code`.
    pub fn segwit_sighash(
        &self,
        input_index: usize,
        script_code: &ScriptCode,
        amount: Sats,
        sighash_type: SighashType,
    ) -> Result<Sighash, SighashError> {
        self.check_index(input_index)?;

        let mut preimage = Vec::with_capacity(156 + script_code.len());
        self.segwit_preimage(&mut preimage, input_index, script_code, amount, sighash_type)
            .expect("in-memory writing can't fail");
        let sighash = Sighash::from(sha256d(preimage));
        tracing::trace!("BIP143 sighash for input {input_index} with {sighash_type}: {sighash}");
        Ok(sighash)
    }

    fn segwit_preimage(
        &self,
        writer: &mut impl Write,
        input_index: usize,
        script_code: &ScriptCode,
        amount: Sats,
        sighash_type: SighashType,
    ) -> Result<usize, IoError> {
        let tx = &self.tx;
        let input = &tx.inputs[input_index];
        let common = self.common_cache();
        let zero_hash = [0u8; 32];

        let hash_prevouts =
            if sighash_type.anyone_can_pay { zero_hash } else { sha256(common.prevouts) };
        let hash_sequences = if sighash_type.anyone_can_pay || sighash_type.flag != SighashFlag::All
        {
            zero_hash
        } else {
            sha256(common.sequences)
        };
        let hash_outputs = match sighash_type.flag {
            SighashFlag::All => sha256(common.outputs),
            SighashFlag::Single if input_index < tx.outputs.len() => {
                sha256d(tx.outputs[input_index].consensus_serialize())
            }
            SighashFlag::Single | SighashFlag::None => zero_hash,
        };

        let mut counter = tx.version.consensus_encode(writer)?;
        writer.write_all(&hash_prevouts)?;
        writer.write_all(&hash_sequences)?;
        counter += 64;
        counter += input.prev_output.consensus_encode(writer)?;
        counter += script_code.consensus_encode(writer)?;
        counter += amount.consensus_encode(writer)?;
        counter += input.sequence.consensus_encode(writer)?;
        writer.write_all(&hash_outputs)?;
        counter += 32;
        counter += tx.lock_time.consensus_encode(writer)?;
        counter += sighash_type.to_consensus_u32().consensus_encode(writer)?;
        Ok(counter)
    }

    /// Computes BIP341 signature digest with full control over the optional parts: `annex`
    /// and the script path extension `leaf` (leaf hash with an optional position of the last
    /// executed `OP_CODESEPARATOR`). `None` for the `sighash_type` means the taproot default
    /// (`0x00`) mode.
    pub fn tap_sighash_custom(
        &self,
        input_index: usize,
        annex: Option<&Annex>,
        leaf: Option<(TapLeafHash, Option<u32>)>,
        sighash_type: Option<SighashType>,
    ) -> Result<TapSighash, SighashError> {
        self.check_index(input_index)?;
        let context = self.context.as_ref().ok_or(SighashError::NoSigningContext)?;

        let tx = &self.tx;
        let ty = sighash_type.unwrap_or_default();
        if ty.flag == SighashFlag::Single && input_index >= tx.outputs.len() {
            return Err(SighashError::NoSingleOutputMatch {
                txid: tx.txid(),
                index: input_index,
                outputs: tx.outputs.len(),
            });
        }

        let mut preimage = Vec::with_capacity(256);
        self.tap_preimage(&mut preimage, context, input_index, annex, leaf, sighash_type)
            .expect("in-memory writing can't fail");

        let mut engine = TapSighash::engine();
        engine.input(&preimage);
        let sighash = TapSighash::from_engine(engine);
        tracing::trace!(
            "BIP341 sighash for input {input_index} ({}, annex: {}) with {}: {sighash}",
            if leaf.is_some() { "script path" } else { "key path" },
            annex.is_some(),
            sighash_type.map(|ty| ty.to_string()).unwrap_or_else(|| s!("DEFAULT")),
        );
        Ok(sighash)
    }

    fn tap_preimage(
        &self,
        writer: &mut impl Write,
        context: &SigningContext,
        input_index: usize,
        annex: Option<&Annex>,
        leaf: Option<(TapLeafHash, Option<u32>)>,
        sighash_type: Option<SighashType>,
    ) -> Result<usize, IoError> {
        let tx = &self.tx;
        let ty = sighash_type.unwrap_or_default();
        let hash_type = sighash_type.map(SighashType::to_consensus_u8).unwrap_or_default();

        // epoch
        let mut counter = 0u8.consensus_encode(writer)?;

        counter += hash_type.consensus_encode(writer)?;
        counter += tx.version.consensus_encode(writer)?;
        counter += tx.lock_time.consensus_encode(writer)?;

        if !ty.anyone_can_pay {
            let common = self.common_cache();
            let taproot = self.taproot_cache(context);
            writer.write_all(&common.prevouts)?;
            writer.write_all(&taproot.amounts)?;
            writer.write_all(&taproot.script_pubkeys)?;
            writer.write_all(&common.sequences)?;
            counter += 32 * 4;
        }

        if ty.flag == SighashFlag::All {
            writer.write_all(&self.common_cache().outputs)?;
            counter += 32;
        }

        let spend_type = ((leaf.is_some() as u8) << 1) | (annex.is_some() as u8);
        counter += spend_type.consensus_encode(writer)?;

        if ty.anyone_can_pay {
            let input = &tx.inputs[input_index];
            counter += input.prev_output.consensus_encode(writer)?;
            counter += context.amounts[input_index].consensus_encode(writer)?;
            counter += context.scripts[input_index].consensus_encode(writer)?;
            counter += input.sequence.consensus_encode(writer)?;
        } else {
            counter += (input_index as u32).consensus_encode(writer)?;
        }

        if let Some(annex) = annex {
            writer.write_all(&sha256(annex.consensus_serialize()))?;
            counter += 32;
        }

        if ty.flag == SighashFlag::Single {
            writer.write_all(&sha256(tx.outputs[input_index].consensus_serialize()))?;
            counter += 32;
        }

        if let Some((leaf_hash, codesep_pos)) = leaf {
            counter += leaf_hash.0.consensus_encode(writer)?;
            // key version
            counter += 0u8.consensus_encode(writer)?;
            counter += codesep_pos.unwrap_or(NO_CODESEP).consensus_encode(writer)?;
        }

        Ok(counter)
    }

    /// Computes BIP341 signature digest for the key path spending of input `input_index`.
    #[inline]
    pub fn tap_sighash_key(
        &self,
        input_index: usize,
        sighash_type: Option<SighashType>,
    ) -> Result<TapSighash, SighashError> {
        self.tap_sighash_custom(input_index, None, None, sighash_type)
    }

    /// Computes BIP341 signature digest for the script path spending of input `input_index`
    /// via leaf with the hash `leaf_hash`.
    #[inline]
    pub fn tap_sighash_script(
        &self,
        input_index: usize,
        leaf_hash: impl Into<TapLeafHash>,
        sighash_type: Option<SighashType>,
    ) -> Result<TapSighash, SighashError> {
        self.tap_sighash_custom(input_index, None, Some((leaf_hash.into(), None)), sighash_type)
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;

    use super::*;
    use crate::{Outpoint, TxIn};

    #[test]
    fn sighash_type_values() {
        for (n, ty) in [
            (0x01, SighashType::all()),
            (0x02, SighashType::none()),
            (0x03, SighashType::single()),
            (0x81, SighashType::all_anyone_can_pay()),
            (0x82, SighashType::none_anyone_can_pay()),
            (0x83, SighashType::single_anyone_can_pay()),
        ] {
            assert_eq!(SighashType::from_consensus_u32(n), Ok(ty));
            assert_eq!(ty.to_consensus_u32(), n);
            assert_eq!(ty.to_string().parse::<SighashType>(), Ok(ty));
        }
        for n in [0x00, 0x04, 0x80, 0x84, 0x41, 0x101] {
            let err = SighashType::from_consensus_u32(n).unwrap_err();
            assert_eq!(err, InvalidSighashType(n));
            assert_eq!(err.kind(), ErrorKind::InvalidSighashType);
        }
        assert_eq!(SighashType::from_taproot_u8(0x00), Ok(None));
        assert_eq!(SighashType::from_taproot_u8(0x83), Ok(Some(SighashType::single_anyone_can_pay())));
        assert!(SighashType::from_taproot_u8(0x04).is_err());
        assert_eq!(SighashType::single_anyone_can_pay().to_string(), "SINGLE|ANYONECANPAY");
        assert_eq!("SIGHASH_NONE".parse(), Ok(SighashType::none()));
    }

    fn tx(inputs: usize, outputs: usize) -> Tx {
        let inputs = (0..inputs)
            .map(|vout| TxIn::new(Outpoint::new(Txid::from([0x42; 32]), vout as u32), SeqNo::FINAL))
            .collect();
        let outputs = (0..outputs)
            .map(|n| TxOut::new(ScriptPubkey::op_return(&[n as u8]).unwrap(), 1000u32))
            .collect();
        Tx::new(inputs, outputs, true)
    }

    fn script_code() -> ScriptCode {
        ScriptCode::from_unchecked(
            Vec::from_hex("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac").unwrap(),
        )
    }

    #[test]
    fn legacy_single_without_output() {
        let cache = SighashCache::new(tx(3, 1));
        let sighash = cache.legacy_sighash(2, &script_code(), SighashType::single()).unwrap();
        assert_eq!(sighash, Sighash::from(SIGHASH_SINGLE_BUG));
        let sighash = cache.legacy_sighash(0, &script_code(), SighashType::single()).unwrap();
        assert_ne!(sighash, Sighash::from(SIGHASH_SINGLE_BUG));
    }

    #[test]
    fn segwit_single_without_output() {
        let cache = SighashCache::new(tx(2, 1));
        let amount = Sats::from_sats(1000);
        // zero hashOutputs, differs from NONE only by the sighash type
        let first = cache.segwit_sighash(1, &script_code(), amount, SighashType::single()).unwrap();
        let none = cache.segwit_sighash(1, &script_code(), amount, SighashType::none()).unwrap();
        assert_ne!(first, none);
    }

    #[test]
    fn input_index_bounds() {
        let cache = SighashCache::new(tx(2, 2));
        let err = cache.legacy_sighash(2, &script_code(), SighashType::all()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInputIndex);
        let err = cache
            .segwit_sighash(5, &script_code(), Sats::ZERO, SighashType::all())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInputIndex);
    }

    #[test]
    fn context_mismatch() {
        let tx = tx(2, 2);
        let spk = ScriptPubkey::op_return(&[]).unwrap();
        for (scripts, amounts) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            let context = SigningContext::new(vec![spk.clone(); scripts], vec![Sats::ZERO; amounts]);
            let err = SighashCache::with_context(tx.clone(), context).unwrap_err();
            assert_eq!(err, SighashError::SigningContextMismatch {
                inputs: 2,
                scripts,
                amounts
            });
            assert_eq!(err.kind(), ErrorKind::SigningContextMismatch);
        }
        let context = SigningContext::new(vec![spk; 2], vec![Sats::ZERO; 2]);
        let cache = SighashCache::with_context(tx.clone(), context).unwrap();
        assert!(cache.tap_sighash_key(1, None).is_ok());

        let cache = SighashCache::new(tx);
        assert_eq!(cache.tap_sighash_key(0, None), Err(SighashError::NoSigningContext));
    }

    #[test]
    fn taproot_single_without_output() {
        let tx = tx(2, 1);
        let context = SigningContext::with_prevouts(tx.outputs.iter().cloned().cycle().take(2));
        let cache = SighashCache::with_context(tx, context).unwrap();
        let err = cache.tap_sighash_key(1, Some(SighashType::single())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSingleOutput);
        assert!(cache.tap_sighash_key(0, Some(SighashType::single())).is_ok());
    }

    #[test]
    fn key_and_script_paths_differ() {
        let tx = tx(1, 1);
        let context = SigningContext::with_prevouts(tx.outputs.clone());
        let cache = SighashCache::with_context(tx, context).unwrap();
        let leaf = TapLeafHash::from([0x77; 32]);
        let key = cache.tap_sighash_key(0, None).unwrap();
        let script = cache.tap_sighash_script(0, leaf, None).unwrap();
        let all = cache.tap_sighash_key(0, Some(SighashType::all())).unwrap();
        assert_ne!(key, script);
        assert_ne!(key, all);
    }
}
