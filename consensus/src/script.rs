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

use std::fmt::{self, Display, Formatter, LowerHex};
use std::io::{Read, Write};
use std::str::FromStr;

use amplify::hex::{self, FromHex, ToHex};
use amplify::{IoError, Wrapper};

use crate::coding::{decode_bytes, encode_bytes};
use crate::{
    CompressedPk, ConsensusDecode, ConsensusDecodeError, ConsensusEncode, ErrorKind, LegacyPk,
    OpCode, PubkeyHash, ScriptHash, VarInt, WPubkeyHash, WScriptHash, XOnlyPk,
};

/// Maximum number of bytes which may be pushed to the stack by a single push operation.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

const MAX_MULTISIG_KEYS: usize = 16;

#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ScriptError {
    /// unknown opcode name or invalid data token '{0}'.
    UnknownOpcode(String),

    /// byte {0:#04x} doesn't correspond to a defined opcode.
    UndefinedOpcode(u8),

    /// data push of {0} bytes exceeds the limit of 520 bytes.
    OversizedPush(usize),

    /// data push at offset {offset} declares {expected} bytes, while only {remaining} bytes
    /// remain in the script.
    TruncatedPush {
        offset: usize,
        expected: usize,
        remaining: usize,
    },

    /// {0} can't be used as a standalone opcode; use a data push element instead.
    MisplacedPushData(OpCode),

    /// invalid multisig threshold {threshold} for {keys} keys.
    InvalidThreshold { threshold: u8, keys: usize },
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptError::UnknownOpcode(_) | ScriptError::UndefinedOpcode(_) => {
                ErrorKind::UnknownOpcode
            }
            ScriptError::OversizedPush(_) => ErrorKind::OversizedPush,
            ScriptError::TruncatedPush { .. }
            | ScriptError::MisplacedPushData(_)
            | ScriptError::InvalidThreshold { .. } => ErrorKind::MalformedData,
        }
    }
}

/// Single element of a parsed script.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScriptElement {
    Op(OpCode),
    Push(Vec<u8>),
}

impl Display for ScriptElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptElement::Op(op) => Display::fmt(op, f),
            ScriptElement::Push(data) if data.is_empty() => f.write_str("OP_0"),
            ScriptElement::Push(data) => f.write_str(&data.to_hex()),
        }
    }
}

/// Raw script bytes in their consensus serialization (without the length prefix).
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ScriptBytes(#[from] Vec<u8>);

impl AsRef<[u8]> for ScriptBytes {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl LowerHex for ScriptBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0.to_hex()) }
}

impl Display for ScriptBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(self, f) }
}

impl FromHex for ScriptBytes {
    fn from_byte_iter<I>(iter: I) -> Result<Self, hex::Error>
    where I: Iterator<Item = Result<u8, hex::Error>> + ExactSizeIterator + DoubleEndedIterator {
        iter.collect::<Result<Vec<_>, _>>().map(Self)
    }
}

impl ScriptBytes {
    #[inline]
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self { Self(Vec::with_capacity(capacity)) }

    #[inline]
    pub fn as_slice(&self) -> &[u8] { &self.0 }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> { self.0 }

    #[inline]
    pub fn len_var_int(&self) -> VarInt { VarInt::with_len(self.0.len()) }

    #[inline]
    pub fn push_opcode(&mut self, op_code: OpCode) { self.0.push(op_code as u8) }

    /// Adds data push using the shortest push opcode for the data length.
    ///
    /// # Errors
    ///
    /// If the data are longer than [`MAX_SCRIPT_ELEMENT_SIZE`].
    pub fn push_slice(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::OversizedPush(data.len()));
        }
        self.push_unchecked(data);
        Ok(())
    }

    pub(crate) fn push_unchecked(&mut self, data: &[u8]) {
        let len = data.len();
        match len {
            0 => self.0.push(OpCode::PushBytes0 as u8),
            1..=0x4b => self.0.push(len as u8),
            0x4c..=0xff => {
                self.0.push(OpCode::PushData1 as u8);
                self.0.push(len as u8);
            }
            0x100..=0xffff => {
                self.0.push(OpCode::PushData2 as u8);
                self.0.extend((len as u16).to_le_bytes());
            }
            _ => {
                self.0.push(OpCode::PushData4 as u8);
                self.0.extend((len as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
    }

    /// Adds a number using `OP_0`, `OP_1NEGATE` or `OP_1`-`OP_16` when possible, and a minimal
    /// script number push otherwise.
    pub fn push_num(&mut self, num: i64) {
        match OpCode::push_num(num) {
            Some(op) => self.push_opcode(op),
            None => self.push_unchecked(&scriptnum_encode(num)),
        }
    }

    pub fn from_elements(
        elements: impl IntoIterator<Item = ScriptElement>,
    ) -> Result<Self, ScriptError> {
        let mut script = ScriptBytes::new();
        for element in elements {
            match element {
                ScriptElement::Op(
                    op @ (OpCode::PushData1 | OpCode::PushData2 | OpCode::PushData4),
                ) => return Err(ScriptError::MisplacedPushData(op)),
                ScriptElement::Op(op) => script.push_opcode(op),
                ScriptElement::Push(data) => script.push_slice(&data)?,
            }
        }
        Ok(script)
    }

    /// Parses script into its elements.
    pub fn elements(&self) -> Result<Vec<ScriptElement>, ScriptError> {
        let bytes = self.as_slice();
        let mut elements = Vec::new();
        let mut pos = 0usize;
        while pos < bytes.len() {
            let offset = pos;
            let code = bytes[pos];
            pos += 1;
            let len_size = match code {
                0x01..=0x4b => 0,
                0x4c => 1,
                0x4d => 2,
                0x4e => 4,
                _ => {
                    let op = OpCode::from_u8(code).ok_or(ScriptError::UndefinedOpcode(code))?;
                    elements.push(ScriptElement::Op(op));
                    continue;
                }
            };
            let truncated = |expected: usize, pos: usize| ScriptError::TruncatedPush {
                offset,
                expected,
                remaining: bytes.len() - pos,
            };
            let len = if len_size == 0 {
                code as usize
            } else {
                if pos + len_size > bytes.len() {
                    return Err(truncated(len_size, pos));
                }
                let mut buf = [0u8; 4];
                buf[..len_size].copy_from_slice(&bytes[pos..pos + len_size]);
                pos += len_size;
                u32::from_le_bytes(buf) as usize
            };
            if bytes.len() - pos < len {
                return Err(truncated(len, pos));
            }
            elements.push(ScriptElement::Push(bytes[pos..pos + len].to_vec()));
            pos += len;
        }
        Ok(elements)
    }

    /// Parses script assembly: opcode names (with `OP_` prefix) and hex-encoded data pushes,
    /// separated by whitespace.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = ScriptBytes::new();
        for token in asm.split_whitespace() {
            if token.len() > 3 && token.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("OP_")) {
                let op = OpCode::from_str(token)?;
                if matches!(op, OpCode::PushData1 | OpCode::PushData2 | OpCode::PushData4) {
                    return Err(ScriptError::MisplacedPushData(op));
                }
                script.push_opcode(op);
            } else {
                let data = Vec::<u8>::from_hex(token)
                    .map_err(|_| ScriptError::UnknownOpcode(token.to_owned()))?;
                script.push_slice(&data)?;
            }
        }
        Ok(script)
    }

    pub fn to_asm(&self) -> Result<String, ScriptError> {
        let elements = self.elements()?;
        Ok(elements.iter().map(ScriptElement::to_string).collect::<Vec<_>>().join(" "))
    }

    /// Detects bare `m-of-n` `OP_CHECKMULTISIG` script, returning `(m, n)`.
    pub fn multisig_threshold(&self) -> Option<(u8, u8)> {
        let elements = self.elements().ok()?;
        let [ScriptElement::Op(m), keys @ .., ScriptElement::Op(n), ScriptElement::Op(OpCode::CheckMultiSig)] =
            elements.as_slice()
        else {
            return None;
        };
        let m = m.num_value()?;
        let n = n.num_value()?;
        let keys_ok = keys
            .iter()
            .all(|key| matches!(key, ScriptElement::Push(data) if data.len() == 33 || data.len() == 65));
        if !keys_ok || m < 1 || m > n || n as usize != keys.len() {
            return None;
        }
        Some((m as u8, n as u8))
    }

    /// Extracts threshold and public keys, in script order, from a bare `OP_CHECKMULTISIG`
    /// script.
    pub fn multisig_keys(&self) -> Option<(u8, Vec<LegacyPk>)> {
        let (m, _) = self.multisig_threshold()?;
        let keys = self
            .elements()
            .ok()?
            .into_iter()
            .filter_map(|element| match element {
                ScriptElement::Push(data) => Some(data),
                ScriptElement::Op(_) => None,
            })
            .map(LegacyPk::from_bytes)
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some((m, keys))
    }
}

fn scriptnum_encode(num: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(9);
    let mut abs = num.unsigned_abs();
    while abs > 0 {
        buf.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    match buf.last_mut() {
        Some(last) if *last & 0x80 != 0 => buf.push(if num < 0 { 0x80 } else { 0x00 }),
        Some(last) if num < 0 => *last |= 0x80,
        _ => {}
    }
    buf
}

fn scriptnum_decode(data: &[u8]) -> Option<i64> {
    if data.is_empty() || data.len() > 8 {
        return None;
    }
    let mut abs = 0u64;
    for (i, byte) in data.iter().enumerate() {
        let byte = if i == data.len() - 1 { byte & 0x7f } else { *byte };
        abs |= (byte as u64) << (8 * i);
    }
    let num = abs as i64;
    Some(if data[data.len() - 1] & 0x80 != 0 { -num } else { num })
}

macro_rules! script_wrapper {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            pub fn new() -> Self { Self::default() }

            #[inline]
            pub fn from_unchecked(bytes: Vec<u8>) -> Self { Self(ScriptBytes::from(bytes)) }

            #[inline]
            pub fn as_script_bytes(&self) -> &ScriptBytes { &self.0 }

            #[inline]
            pub fn into_script_bytes(self) -> ScriptBytes { self.0 }

            #[inline]
            pub fn to_vec(&self) -> Vec<u8> { self.0.as_slice().to_vec() }

            #[inline]
            pub fn as_slice(&self) -> &[u8] { self.0.as_slice() }

            pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
                ScriptBytes::from_asm(asm).map(Self)
            }
        }

        impl AsRef<[u8]> for $ty {
            fn as_ref(&self) -> &[u8] { self.0.as_slice() }
        }

        impl LowerHex for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(&self.0, f) }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(&self.0, f) }
        }

        impl FromHex for $ty {
            fn from_byte_iter<I>(iter: I) -> Result<Self, hex::Error>
            where I: Iterator<Item = Result<u8, hex::Error>>
                    + ExactSizeIterator
                    + DoubleEndedIterator {
                ScriptBytes::from_byte_iter(iter).map(Self)
            }
        }

        impl ConsensusEncode for $ty {
            fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
                encode_bytes(writer, self.0.as_slice())
            }
        }

        impl ConsensusDecode for $ty {
            fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
                decode_bytes(reader).map(Self::from_unchecked)
            }
        }
    };
}

/// Script locking a transaction output.
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ScriptPubkey(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(ScriptPubkey);

impl ScriptPubkey {
    pub fn p2pkh(hash: impl Into<PubkeyHash>) -> Self {
        let hash: PubkeyHash = hash.into();
        let mut script = ScriptBytes::with_capacity(25);
        script.push_opcode(OpCode::Dup);
        script.push_opcode(OpCode::Hash160);
        script.push_unchecked(hash.0.as_slice());
        script.push_opcode(OpCode::EqualVerify);
        script.push_opcode(OpCode::CheckSig);
        Self(script)
    }

    pub fn p2sh(hash: impl Into<ScriptHash>) -> Self {
        let hash: ScriptHash = hash.into();
        let mut script = ScriptBytes::with_capacity(23);
        script.push_opcode(OpCode::Hash160);
        script.push_unchecked(hash.0.as_slice());
        script.push_opcode(OpCode::Equal);
        Self(script)
    }

    pub fn p2wpkh(hash: impl Into<WPubkeyHash>) -> Self {
        let hash: WPubkeyHash = hash.into();
        Self::with_witness_program_unchecked(0, hash.0.as_slice())
    }

    pub fn p2wsh(hash: impl Into<WScriptHash>) -> Self {
        let hash: WScriptHash = hash.into();
        Self::with_witness_program_unchecked(0, hash.0.as_slice())
    }

    /// Provably unspendable data carrier output.
    pub fn op_return(data: &[u8]) -> Result<Self, ScriptError> {
        let mut script = ScriptBytes::with_capacity(data.len() + 3);
        script.push_opcode(OpCode::Return);
        script.push_slice(data)?;
        Ok(Self(script))
    }

    pub(crate) fn with_witness_program_unchecked(version: u8, program: &[u8]) -> Self {
        let mut script = ScriptBytes::with_capacity(program.len() + 2);
        match version {
            0 => script.push_opcode(OpCode::PushBytes0),
            ver => script.push_num(ver as i64),
        }
        script.push_unchecked(program);
        Self(script)
    }

    pub fn is_p2pkh(&self) -> bool {
        self.len() == 25
            && self[0] == OpCode::Dup as u8
            && self[1] == OpCode::Hash160 as u8
            && self[2] == 20
            && self[23] == OpCode::EqualVerify as u8
            && self[24] == OpCode::CheckSig as u8
    }

    pub fn is_p2sh(&self) -> bool {
        self.len() == 23
            && self[0] == OpCode::Hash160 as u8
            && self[1] == 20
            && self[22] == OpCode::Equal as u8
    }

    pub fn is_p2wpkh(&self) -> bool { self.len() == 22 && self[0] == 0 && self[1] == 20 }

    pub fn is_p2wsh(&self) -> bool { self.len() == 34 && self[0] == 0 && self[1] == 32 }

    pub fn is_op_return(&self) -> bool { self.first() == Some(&(OpCode::Return as u8)) }

    /// Witness version of a segwit output (BIP141).
    pub fn witness_version(&self) -> Option<u8> {
        let len = self.len();
        if !(4..=42).contains(&len) || self[1] as usize + 2 != len {
            return None;
        }
        match self[0] {
            0 => Some(0),
            op @ 0x51..=0x60 => Some(op - 0x50),
            _ => None,
        }
    }

    pub fn witness_program(&self) -> Option<&[u8]> {
        self.witness_version().map(|_| &self.as_slice()[2..])
    }
}

/// Script placed into transaction input (`scriptSig`).
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct SigScript(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(SigScript);

impl SigScript {
    /// Constructs script consisting of data pushes only. Empty items are pushed as `OP_0`.
    pub fn with_pushes<T: AsRef<[u8]>>(
        items: impl IntoIterator<Item = T>,
    ) -> Result<Self, ScriptError> {
        let mut script = ScriptBytes::new();
        for item in items {
            script.push_slice(item.as_ref())?;
        }
        Ok(Self(script))
    }
}

/// Script committed to by a P2SH output.
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct RedeemScript(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(RedeemScript);

impl RedeemScript {
    /// Nested P2WPKH (P2SH-P2WPKH) program.
    pub fn p2sh_wpkh(hash: impl Into<WPubkeyHash>) -> Self {
        Self(ScriptPubkey::p2wpkh(hash).into_script_bytes())
    }

    /// Nested P2WSH (P2SH-P2WSH) program.
    pub fn p2sh_wsh(hash: impl Into<WScriptHash>) -> Self {
        Self(ScriptPubkey::p2wsh(hash).into_script_bytes())
    }

    pub fn multisig(threshold: u8, keys: &[LegacyPk]) -> Result<Self, ScriptError> {
        let keys = keys.iter().map(LegacyPk::to_vec).collect::<Vec<_>>();
        bare_multisig(threshold, &keys).map(Self)
    }

    pub fn script_hash(&self) -> ScriptHash { ScriptHash::with_script_bytes(self.as_slice()) }

    pub fn to_script_pubkey(&self) -> ScriptPubkey { ScriptPubkey::p2sh(self.script_hash()) }

    pub fn is_p2sh_wpkh(&self) -> bool { ScriptPubkey::from(self.0.clone()).is_p2wpkh() }

    pub fn is_p2sh_wsh(&self) -> bool { ScriptPubkey::from(self.0.clone()).is_p2wsh() }
}

/// Script committed to by a P2WSH output.
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct WitnessScript(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(WitnessScript);

impl WitnessScript {
    pub fn multisig(threshold: u8, keys: &[CompressedPk]) -> Result<Self, ScriptError> {
        let keys = keys.iter().map(|pk| pk.to_byte_array().to_vec()).collect::<Vec<_>>();
        bare_multisig(threshold, &keys).map(Self)
    }

    pub fn wscript_hash(&self) -> WScriptHash { WScriptHash::with_script_bytes(self.as_slice()) }

    pub fn to_script_pubkey(&self) -> ScriptPubkey { ScriptPubkey::p2wsh(self.wscript_hash()) }

    /// Redeem script wrapping this witness script into P2SH.
    pub fn to_redeem_script(&self) -> RedeemScript { RedeemScript::p2sh_wsh(self.wscript_hash()) }
}

fn bare_multisig(threshold: u8, keys: &[Vec<u8>]) -> Result<ScriptBytes, ScriptError> {
    if threshold == 0 || threshold as usize > keys.len() || keys.len() > MAX_MULTISIG_KEYS {
        return Err(ScriptError::InvalidThreshold {
            threshold,
            keys: keys.len(),
        });
    }
    let mut script = ScriptBytes::with_capacity(keys.len() * 34 + 3);
    script.push_num(threshold as i64);
    for key in keys {
        script.push_unchecked(key);
    }
    script.push_num(keys.len() as i64);
    script.push_opcode(OpCode::CheckMultiSig);
    Ok(script)
}

/// Leaf script of tapscript version (BIP342).
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapScript(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(TapScript);

impl TapScript {
    /// Constructs `m-of-n` multisig with `OP_CHECKSIGADD`:
    /// `<pk_1> OP_CHECKSIG <pk_2> OP_CHECKSIGADD ... <pk_n> OP_CHECKSIGADD <m> OP_NUMEQUAL`.
    pub fn multisig(threshold: u8, keys: &[XOnlyPk]) -> Result<Self, ScriptError> {
        if threshold == 0 || threshold as usize > keys.len() {
            return Err(ScriptError::InvalidThreshold {
                threshold,
                keys: keys.len(),
            });
        }
        let mut script = ScriptBytes::with_capacity(keys.len() * 34 + 3);
        for (no, key) in keys.iter().enumerate() {
            script.push_unchecked(&key.to_byte_array());
            script.push_opcode(if no == 0 { OpCode::CheckSig } else { OpCode::CheckSigAdd });
        }
        script.push_num(threshold as i64);
        script.push_opcode(OpCode::NumEqual);
        Ok(Self(script))
    }

    /// Detects script produced by [`TapScript::multisig`], returning the threshold and the keys
    /// in the script order.
    pub fn multisig_keys(&self) -> Option<(u8, Vec<XOnlyPk>)> {
        let elements = self.0.elements().ok()?;
        let [body @ .., threshold, ScriptElement::Op(OpCode::NumEqual)] = elements.as_slice()
        else {
            return None;
        };
        let threshold = match threshold {
            ScriptElement::Op(op) => op.num_value()?,
            ScriptElement::Push(data) => scriptnum_decode(data)?,
        };
        if body.is_empty() || body.len() % 2 != 0 {
            return None;
        }
        let mut keys = Vec::with_capacity(body.len() / 2);
        for (no, pair) in body.chunks_exact(2).enumerate() {
            let expected = if no == 0 { OpCode::CheckSig } else { OpCode::CheckSigAdd };
            match pair {
                [ScriptElement::Push(key), ScriptElement::Op(op)] if *op == expected => {
                    keys.push(XOnlyPk::from_bytes(key).ok()?)
                }
                _ => return None,
            }
        }
        if threshold < 1 || threshold as usize > keys.len() || threshold > u8::MAX as i64 {
            return None;
        }
        Some((threshold as u8, keys))
    }
}

/// Script code used in signature digests.
///
/// For legacy inputs this is the script being executed (scriptPubKey or redeem script); for
/// BIP143 digests this is the P2PKH-equivalent script for P2WPKH and the witness script for
/// P2WSH.
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ScriptCode(
    #[from]
    #[from(Vec<u8>)]
    ScriptBytes,
);
script_wrapper!(ScriptCode);

impl ScriptCode {
    pub fn with_p2wpkh(hash: impl Into<WPubkeyHash>) -> Self {
        let hash: WPubkeyHash = hash.into();
        let hash = PubkeyHash::from(hash.into_inner());
        Self(ScriptPubkey::p2pkh(hash).into_script_bytes())
    }

    pub fn with_p2wsh(witness_script: &WitnessScript) -> Self {
        Self(witness_script.as_script_bytes().clone())
    }
}

impl From<ScriptPubkey> for ScriptCode {
    fn from(script: ScriptPubkey) -> Self { Self(script.into_script_bytes()) }
}

impl From<RedeemScript> for ScriptCode {
    fn from(script: RedeemScript) -> Self { Self(script.into_script_bytes()) }
}

impl From<WitnessScript> for ScriptCode {
    fn from(script: WitnessScript) -> Self { Self(script.into_script_bytes()) }
}

#[cfg(test)]
mod test {
    use super::*;

    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_HASH: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    #[test]
    fn push_boundaries() {
        let mut script = ScriptBytes::new();
        script.push_slice(&[0xAA; 75]).unwrap();
        assert_eq!(script[0], 75);
        assert_eq!(script.len(), 76);

        let mut script = ScriptBytes::new();
        script.push_slice(&[0xAA; 76]).unwrap();
        assert_eq!(&script[..2], &[0x4c, 76]);

        let mut script = ScriptBytes::new();
        script.push_slice(&[0xAA; 256]).unwrap();
        assert_eq!(&script[..3], &[0x4d, 0x00, 0x01]);

        let mut script = ScriptBytes::new();
        script.push_slice(&[0xAA; 520]).unwrap();
        assert_eq!(script.len(), 523);
        assert_eq!(script.elements().unwrap(), vec![ScriptElement::Push(vec![0xAA; 520])]);

        let err = ScriptBytes::new().push_slice(&[0xAA; 521]).unwrap_err();
        assert_eq!(err, ScriptError::OversizedPush(521));
        assert_eq!(err.kind(), ErrorKind::OversizedPush);
    }

    #[test]
    fn numbers() {
        for (num, bytes) in [
            (0i64, vec![0x00]),
            (16, vec![0x60]),
            (-1, vec![0x4f]),
            (17, vec![0x01, 0x11]),
            (-5, vec![0x01, 0x85]),
            (128, vec![0x02, 0x80, 0x00]),
            (-128, vec![0x02, 0x80, 0x80]),
            (1000, vec![0x02, 0xe8, 0x03]),
        ] {
            let mut script = ScriptBytes::new();
            script.push_num(num);
            assert_eq!(script.as_slice(), bytes.as_slice(), "{num}");
            if bytes.len() > 1 {
                assert_eq!(scriptnum_decode(&bytes[1..]), Some(num));
            }
        }
    }

    #[test]
    fn asm() {
        let asm = format!("OP_DUP OP_HASH160 {G_HASH} OP_EQUALVERIFY OP_CHECKSIG");
        let script = ScriptPubkey::from_asm(&asm).unwrap();
        assert_eq!(script.to_string(), format!("76a914{G_HASH}88ac"));
        assert!(script.is_p2pkh());
        assert_eq!(script.as_script_bytes().to_asm().unwrap(), asm);

        let err = ScriptBytes::from_asm("OP_DUP OP_FOO").unwrap_err();
        assert_eq!(err, ScriptError::UnknownOpcode(s!("OP_FOO")));
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
        assert_eq!(
            ScriptBytes::from_asm("OP_PUSHDATA1 00"),
            Err(ScriptError::MisplacedPushData(OpCode::PushData1))
        );
        assert_eq!(ScriptBytes::from_asm("xyz").unwrap_err().kind(), ErrorKind::UnknownOpcode);
    }

    #[test]
    fn asm_non_ascii() {
        let err = ScriptBytes::from_asm("OP_DUP éé").unwrap_err();
        assert_eq!(err, ScriptError::UnknownOpcode(s!("éé")));
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
        assert_eq!(ScriptBytes::from_asm("OPé").unwrap_err().kind(), ErrorKind::UnknownOpcode);
        assert_eq!(ScriptBytes::from_asm("OP_é").unwrap_err().kind(), ErrorKind::UnknownOpcode);
    }

    #[test]
    fn elements() {
        let elements = vec![
            ScriptElement::Op(OpCode::PushBytes0),
            ScriptElement::Push(vec![0x01, 0x02]),
            ScriptElement::Op(OpCode::CheckSigAdd),
        ];
        let script = ScriptBytes::from_elements(elements.clone()).unwrap();
        assert_eq!(script.as_slice(), &[0x00, 0x02, 0x01, 0x02, 0xba]);
        assert_eq!(script.elements().unwrap(), elements);

        assert_eq!(
            ScriptBytes::from(vec![0x4c]).elements(),
            Err(ScriptError::TruncatedPush {
                offset: 0,
                expected: 1,
                remaining: 0
            })
        );
        assert_eq!(
            ScriptBytes::from(vec![0x05, 0x01, 0x02]).elements(),
            Err(ScriptError::TruncatedPush {
                offset: 0,
                expected: 5,
                remaining: 2
            })
        );
        assert_eq!(ScriptBytes::from(vec![0xbb]).elements(), Err(ScriptError::UndefinedOpcode(0xbb)));
    }

    #[test]
    fn segwit_programs() {
        let pk = CompressedPk::from_str(G).unwrap();
        let spk = ScriptPubkey::p2wpkh(pk.wpubkey_hash());
        assert_eq!(spk.to_string(), format!("0014{G_HASH}"));
        assert!(spk.is_p2wpkh());
        assert_eq!(spk.witness_version(), Some(0));

        let redeem = RedeemScript::p2sh_wpkh(
            WPubkeyHash::from_str("79091972186c449eb1ded22b78e40d009bdf0089").unwrap(),
        );
        assert_eq!(redeem.to_string(), "001479091972186c449eb1ded22b78e40d009bdf0089");
        assert_eq!(
            redeem.to_script_pubkey().to_string(),
            "a9144733f37cf4db86fbc2efed2500b4f4e49f31202387"
        );
        assert!(redeem.to_script_pubkey().is_p2sh());
        assert!(redeem.is_p2sh_wpkh());

        let code = ScriptCode::with_p2wpkh(pk.wpubkey_hash());
        assert_eq!(code.as_slice(), ScriptPubkey::p2pkh(pk.pubkey_hash()).as_slice());
    }

    #[test]
    fn witness_multisig() {
        let pk = CompressedPk::from_str(G).unwrap();
        let script = WitnessScript::multisig(1, &[pk, pk]).unwrap();
        assert_eq!(script.multisig_threshold(), Some((1, 2)));
        assert_eq!(script[0], OpCode::PushNum1 as u8);
        assert_eq!(script[script.len() - 1], OpCode::CheckMultiSig as u8);

        let spk = script.to_script_pubkey();
        assert!(spk.is_p2wsh());
        assert_eq!(&spk[2..], crate::sha256(script.as_slice()).as_slice());
        assert!(script.to_redeem_script().is_p2sh_wsh());

        assert_eq!(
            WitnessScript::multisig(3, &[pk, pk]),
            Err(ScriptError::InvalidThreshold {
                threshold: 3,
                keys: 2
            })
        );
        assert_eq!(ScriptPubkey::p2pkh(pk.pubkey_hash()).multisig_threshold(), None);
    }

    #[test]
    fn tapscript_multisig() {
        let keys = [
            XOnlyPk::from_str("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap(),
            XOnlyPk::from_str("c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5")
                .unwrap(),
        ];
        let script = TapScript::multisig(2, &keys).unwrap();
        assert_eq!(
            script.as_script_bytes().to_asm().unwrap(),
            format!(
                "{} OP_CHECKSIG {} OP_CHECKSIGADD OP_2 OP_NUMEQUAL",
                keys[0].to_byte_array().to_hex(),
                keys[1].to_byte_array().to_hex()
            )
        );
        assert_eq!(script.multisig_keys(), Some((2, keys.to_vec())));
        assert_eq!(TapScript::from_asm("OP_1").unwrap().multisig_keys(), None);
    }

    #[test]
    fn op_return() {
        let script = ScriptPubkey::op_return(b"hello").unwrap();
        assert_eq!(script.to_string(), "6a0568656c6c6f");
        assert!(script.is_op_return());
        assert_eq!(script.witness_version(), None);
    }
}
