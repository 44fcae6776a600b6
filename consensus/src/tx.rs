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

use std::fmt::{self, Display, Formatter};
use std::io::{Read, Write};
use std::iter::Sum;
use std::str::FromStr;

use amplify::hex::{self, FromHex};
use amplify::IoError;

use crate::coding::{decode_bytes, decode_list, encode_bytes, encode_list};
use crate::{
    ConsensusDataError, ConsensusDecode, ConsensusDecodeError, ConsensusEncode, ErrorKind,
    ScriptPubkey, SigScript, Txid, VarInt, Wtxid,
};

/// Lock time values below this threshold are block heights, above are UNIX timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;
pub const WITNESS_SCALE_FACTOR: usize = 4;

pub const SEQ_NO_MAX_VALUE: u32 = 0xFFFFFFFF;
pub const SEQ_NO_SUBMAX_VALUE: u32 = 0xFFFFFFFE;
pub const SEQ_NO_CSV_DISABLE_MASK: u32 = 0x80000000;
pub const SEQ_NO_CSV_TYPE_MASK: u32 = 0x00400000;
pub const SEQ_NO_CSV_VALUE_MASK: u32 = 0x0000FFFF;

#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum TxError {
    /// transaction has {inputs} inputs but {witnesses} witness stacks.
    WitnessAlignment { inputs: usize, witnesses: usize },

    /// input index {index} is out of range for a transaction with {inputs} inputs.
    InvalidInputIndex { index: usize, inputs: usize },
}

impl TxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TxError::WitnessAlignment { .. } => ErrorKind::WitnessAlignmentError,
            TxError::InvalidInputIndex { .. } => ErrorKind::InvalidInputIndex,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(inner)]
pub enum TxParseError {
    #[from]
    Hex(hex::Error),
    #[from]
    Decode(ConsensusDecodeError),
}

impl TxParseError {
    pub fn kind(&self) -> ErrorKind { ErrorKind::MalformedData }
}

#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From)]
#[wrapper(Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Vout(#[from] u32);

impl Vout {
    pub const fn from_u32(u: u32) -> Self { Vout(u) }
    #[inline]
    pub const fn into_u32(self) -> u32 { self.0 }
    #[inline]
    pub const fn to_usize(self) -> usize { self.0 as usize }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{txid}:{vout}")]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Outpoint {
    pub txid: Txid,
    pub vout: Vout,
}

impl Outpoint {
    #[inline]
    pub fn new(txid: Txid, vout: impl Into<Vout>) -> Self {
        Self {
            txid,
            vout: vout.into(),
        }
    }

    #[inline]
    pub fn coinbase() -> Self {
        Self {
            txid: Txid::coinbase(),
            vout: Vout::from_u32(0xFFFFFFFF),
        }
    }

    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.txid.is_coinbase() && self.vout.into_u32() == 0xFFFFFFFF
    }
}

/// Classes of `nSeq` values.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum SeqNoClass {
    /// No RBF (opt-out) and timelocks.
    ///
    /// Corresponds to `0xFFFFFFFF` and `0xFFFFFFFE` values
    Unencumbered,

    /// RBF opt-in, but no timelock applied.
    ///
    /// Values from `0x80000000` to `0xFFFFFFFD` inclusively
    RbfOnly,

    /// Both RBF and relative time-based lock is applied.
    RelativeTime,

    /// Both RBF and relative height-based lock is applied.
    RelativeHeight,
}

/// Relative time lock encoded in the input sequence number (BIP68).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum RelativeLock {
    #[display("height({0})")]
    Blocks(u16),

    /// Number of 512-second intervals.
    #[display("time({0})")]
    Time(u16),
}

impl RelativeLock {
    /// Lock duration in seconds for time-based locks.
    pub fn seconds(self) -> Option<u32> {
        match self {
            RelativeLock::Blocks(_) => None,
            RelativeLock::Time(intervals) => Some(intervals as u32 * 512),
        }
    }
}

/// Input sequence number (`nSeq`).
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(LowerHex, UpperHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct SeqNo(#[from] u32);

impl Default for SeqNo {
    fn default() -> Self { SeqNo::FINAL }
}

impl SeqNo {
    pub const ZERO: SeqNo = SeqNo(0);
    pub const FINAL: SeqNo = SeqNo(SEQ_NO_MAX_VALUE);
    /// Non-final value which enables absolute lock time, but doesn't signal RBF.
    pub const LOCKTIME_ENABLED: SeqNo = SeqNo(SEQ_NO_SUBMAX_VALUE);

    #[inline]
    pub const fn from_consensus_u32(lock_time: u32) -> Self { SeqNo(lock_time) }

    #[inline]
    pub const fn to_consensus_u32(&self) -> u32 { self.0 }

    /// Creates `nSeq` in replace-by-fee mode with value `0xFFFFFFFD` (BIP125).
    #[inline]
    pub const fn rbf() -> Self { SeqNo(SEQ_NO_SUBMAX_VALUE - 1) }

    /// Creates `nSeq` in replace-by-fee mode with the specified order number.
    #[inline]
    pub const fn from_rbf(order: u16) -> Self { SeqNo(order as u32 | SEQ_NO_CSV_DISABLE_MASK) }

    /// Creates relative time lock measured in number of blocks (implies RBF).
    #[inline]
    pub const fn from_height(blocks: u16) -> Self { SeqNo(blocks as u32) }

    /// Creates relative time lock measured in number of 512-second intervals (implies RBF).
    #[inline]
    pub const fn from_intervals(intervals: u16) -> Self {
        SeqNo(intervals as u32 | SEQ_NO_CSV_TYPE_MASK)
    }

    /// Creates relative time lock from a number of seconds, rounding down to 512-second
    /// intervals. Returns `None` if the duration can't be expressed with 16 bits.
    pub fn from_seconds(seconds: u32) -> Option<Self> {
        u16::try_from(seconds / 512).ok().map(Self::from_intervals)
    }

    /// Classifies type of `nSeq` value (see [`SeqNoClass`]).
    pub const fn classify(self) -> SeqNoClass {
        match self.0 {
            SEQ_NO_MAX_VALUE | SEQ_NO_SUBMAX_VALUE => SeqNoClass::Unencumbered,
            no if no & SEQ_NO_CSV_DISABLE_MASK != 0 => SeqNoClass::RbfOnly,
            no if no & SEQ_NO_CSV_TYPE_MASK != 0 => SeqNoClass::RelativeTime,
            _ => SeqNoClass::RelativeHeight,
        }
    }

    /// Checks if `nSeq` value opts-in for replace-by-fee (also always true for relative time
    /// locks).
    #[inline]
    pub const fn is_rbf(self) -> bool { self.0 < SEQ_NO_SUBMAX_VALUE }

    #[inline]
    pub const fn is_final(self) -> bool { self.0 == SEQ_NO_MAX_VALUE }

    pub const fn relative_lock(self) -> Option<RelativeLock> {
        let value = (self.0 & SEQ_NO_CSV_VALUE_MASK) as u16;
        match self.classify() {
            SeqNoClass::RelativeTime => Some(RelativeLock::Time(value)),
            SeqNoClass::RelativeHeight => Some(RelativeLock::Blocks(value)),
            SeqNoClass::Unencumbered | SeqNoClass::RbfOnly => None,
        }
    }
}

impl Display for SeqNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.classify() {
            SeqNoClass::Unencumbered if self.0 == SEQ_NO_MAX_VALUE => {
                f.write_str("final(0xFFFFFFFF)")
            }
            SeqNoClass::Unencumbered => f.write_str("non-rbf(0xFFFFFFFE)"),
            SeqNoClass::RbfOnly => write!(f, "rbf({})", self.0 ^ SEQ_NO_CSV_DISABLE_MASK),
            _ if self.0 >> 16 & 0xFFBF > 0 => Display::fmt(&self.0, f),
            _ => match self.relative_lock() {
                Some(lock) => Display::fmt(&lock, f),
                None => Display::fmt(&self.0, f),
            },
        }
    }
}

/// Absolute transaction lock time (`nLockTime`).
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From)]
#[wrapper(Display, LowerHex, UpperHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct LockTime(#[from] u32);

impl LockTime {
    pub const ZERO: LockTime = LockTime(0);

    #[inline]
    pub const fn from_consensus_u32(lock_time: u32) -> Self { LockTime(lock_time) }

    #[inline]
    pub const fn to_consensus_u32(&self) -> u32 { self.0 }

    /// Lock by block height; `None` if the height falls into the timestamp range.
    pub const fn from_height(height: u32) -> Option<Self> {
        if height < LOCKTIME_THRESHOLD {
            Some(LockTime(height))
        } else {
            None
        }
    }

    /// Lock by UNIX timestamp; `None` if the value falls into the block height range.
    pub const fn from_unix_timestamp(timestamp: u32) -> Option<Self> {
        if timestamp >= LOCKTIME_THRESHOLD {
            Some(LockTime(timestamp))
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_height_based(self) -> bool { self.0 < LOCKTIME_THRESHOLD }

    #[inline]
    pub const fn is_time_based(self) -> bool { !self.is_height_based() }
}

#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, From)]
#[wrapper(Display, LowerHex, UpperHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TxVer(#[from] i32);

impl Default for TxVer {
    fn default() -> Self { TxVer::V2 }
}

impl TxVer {
    /// Pre-BIP68 version.
    pub const V1: Self = TxVer(1);
    /// Current version since BIP68.
    pub const V2: Self = TxVer(2);

    #[inline]
    pub const fn from_consensus_i32(ver: i32) -> Self { TxVer(ver) }

    #[inline]
    pub const fn to_consensus_i32(&self) -> i32 { self.0 }
}

/// Amount in satoshis.
#[derive(Wrapper, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From)]
#[wrapper(Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Sats(
    #[from]
    #[from(u32)]
    #[from(u16)]
    #[from(u8)]
    pub u64,
);

impl Sats {
    pub const ZERO: Self = Sats(0);
    pub const BTC: Self = Sats(100_000_000);

    #[inline]
    pub const fn from_sats(sats: u64) -> Self { Sats(sats) }

    pub const fn from_btc(btc: u32) -> Self { Sats(btc as u64 * Self::BTC.0) }

    #[inline]
    pub const fn sats(&self) -> u64 { self.0 }

    #[must_use]
    pub fn checked_add(&self, other: impl Into<Self>) -> Option<Self> {
        self.0.checked_add(other.into().0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(&self, other: impl Into<Self>) -> Option<Self> {
        self.0.checked_sub(other.into().0).map(Self)
    }
}

impl Sum for Sats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Sats::ZERO, |sum, value| Sats(sum.0.saturating_add(value.0)))
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct TxIn {
    pub prev_output: Outpoint,
    pub sig_script: SigScript,
    pub sequence: SeqNo,
}

impl TxIn {
    /// Unsigned input spending the given outpoint.
    pub fn new(prev_output: Outpoint, sequence: SeqNo) -> Self {
        TxIn {
            prev_output,
            sig_script: none!(),
            sequence,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct TxOut {
    pub value: Sats,
    pub script_pubkey: ScriptPubkey,
}

impl TxOut {
    pub fn new(script_pubkey: impl Into<ScriptPubkey>, value: impl Into<Sats>) -> Self {
        TxOut {
            script_pubkey: script_pubkey.into(),
            value: value.into(),
        }
    }
}

/// Witness stack of a single input.
#[derive(Wrapper, Clone, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Witness(#[from] Vec<Vec<u8>>);

impl Witness {
    #[inline]
    pub fn new() -> Self { default!() }

    pub fn from_consensus_stack(witness: impl IntoIterator<Item = Vec<u8>>) -> Witness {
        Witness(witness.into_iter().collect())
    }

    #[inline]
    pub fn push(&mut self, item: impl Into<Vec<u8>>) { self.0.push(item.into()) }

    #[inline]
    pub fn into_vec(self) -> Vec<Vec<u8>> { self.0 }

    /// Number of bytes in the consensus serialization of the witness stack.
    pub fn serialized_len(&self) -> usize {
        VarInt::with_len(self.0.len()).encoded_len()
            + self
                .0
                .iter()
                .map(|item| VarInt::with_len(item.len()).encoded_len() + item.len())
                .sum::<usize>()
    }
}

/// Bitcoin transaction.
///
/// When the witness flag is set the transaction is serialized in BIP144 form and must carry
/// exactly one witness stack per input; inputs not spending segwit outputs use an empty stack.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Tx {
    pub version: TxVer,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: LockTime,
    pub segwit: bool,
    pub witnesses: Vec<Witness>,
}

impl Tx {
    /// Constructs version 2 transaction with zero lock time. If `segwit` is set, every input
    /// receives an empty witness slot.
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>, segwit: bool) -> Self {
        let witnesses = if segwit { vec![Witness::new(); inputs.len()] } else { vec![] };
        Tx {
            version: TxVer::V2,
            inputs,
            outputs,
            lock_time: LockTime::ZERO,
            segwit,
            witnesses,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: TxVer) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_lock_time(mut self, lock_time: LockTime) -> Self {
        self.lock_time = lock_time;
        self
    }

    /// Places witness into the slot of the given input, setting the witness flag if it was not
    /// set before.
    pub fn set_witness(&mut self, index: usize, witness: Witness) -> Result<(), TxError> {
        let inputs = self.inputs.len();
        if index >= inputs {
            return Err(TxError::InvalidInputIndex { index, inputs });
        }
        if !self.segwit {
            self.segwit = true;
        }
        self.witnesses.resize(inputs, Witness::new());
        self.witnesses[index] = witness;
        Ok(())
    }

    /// Transaction id, computed from the legacy serialization which excludes witness data.
    pub fn txid(&self) -> Txid { Txid::with_data(self.to_legacy_bytes()) }

    /// Witness transaction id, equal to [`Tx::txid`] when the witness flag is not set.
    pub fn wtxid(&self) -> Result<Wtxid, TxError> { self.to_bytes().map(Wtxid::with_data) }

    pub fn to_legacy_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.base_size());
        self.encode_parts(&mut buf, false).expect("in-memory writing can't fail");
        buf
    }

    pub fn to_witness_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.check_witness_alignment()?;
        let mut buf = Vec::with_capacity(self.total_size());
        self.encode_parts(&mut buf, true).expect("in-memory writing can't fail");
        Ok(buf)
    }

    /// Serializes transaction in witness form if the witness flag is set, and in legacy form
    /// otherwise.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        match self.segwit {
            true => self.to_witness_bytes(),
            false => Ok(self.to_legacy_bytes()),
        }
    }

    pub fn check_witness_alignment(&self) -> Result<(), TxError> {
        if self.segwit && self.witnesses.len() != self.inputs.len() {
            return Err(TxError::WitnessAlignment {
                inputs: self.inputs.len(),
                witnesses: self.witnesses.len(),
            });
        }
        Ok(())
    }

    fn encode_parts(&self, writer: &mut impl Write, segwit: bool) -> Result<usize, IoError> {
        let mut counter = self.version.consensus_encode(writer)?;
        if segwit {
            counter += 0x00u8.consensus_encode(writer)?;
            counter += 0x01u8.consensus_encode(writer)?;
        }
        counter += encode_list(writer, &self.inputs)?;
        counter += encode_list(writer, &self.outputs)?;
        if segwit {
            for witness in &self.witnesses {
                counter += witness.consensus_encode(writer)?;
            }
        }
        counter += self.lock_time.consensus_encode(writer)?;
        Ok(counter)
    }

    /// Size of the transaction without witness data, in bytes.
    pub fn base_size(&self) -> usize {
        let inputs = self
            .inputs
            .iter()
            .map(|input| 36 + input.sig_script.len_var_int().encoded_len() + input.sig_script.len() + 4)
            .sum::<usize>();
        let outputs = self
            .outputs
            .iter()
            .map(|output| {
                8 + output.script_pubkey.len_var_int().encoded_len() + output.script_pubkey.len()
            })
            .sum::<usize>();
        4 + VarInt::with_len(self.inputs.len()).encoded_len()
            + inputs
            + VarInt::with_len(self.outputs.len()).encoded_len()
            + outputs
            + 4
    }

    /// Size of the transaction serialization including witness data, in bytes.
    pub fn total_size(&self) -> usize {
        let mut size = self.base_size();
        if self.segwit {
            size += 2 + self.witnesses.iter().map(Witness::serialized_len).sum::<usize>();
        }
        size
    }

    /// Transaction weight (BIP141).
    pub fn weight_units(&self) -> usize {
        self.base_size() * (WITNESS_SCALE_FACTOR - 1) + self.total_size()
    }

    /// Virtual size: weight divided by four, rounded up.
    pub fn vsize(&self) -> usize { self.weight_units().div_ceil(WITNESS_SCALE_FACTOR) }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prev_output.is_coinbase()
    }
}

impl FromStr for Tx {
    type Err = TxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s)?;
        Ok(Tx::consensus_deserialize(data)?)
    }
}

impl ConsensusEncode for Vout {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl ConsensusDecode for Vout {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        u32::consensus_decode(reader).map(Self)
    }
}

impl ConsensusEncode for Outpoint {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        Ok(self.txid.consensus_encode(writer)? + self.vout.consensus_encode(writer)?)
    }
}

impl ConsensusDecode for Outpoint {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let txid = Txid::consensus_decode(reader)?;
        let vout = Vout::consensus_decode(reader)?;
        Ok(Outpoint { txid, vout })
    }
}

impl ConsensusEncode for SeqNo {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl ConsensusDecode for SeqNo {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        u32::consensus_decode(reader).map(Self)
    }
}

impl ConsensusEncode for LockTime {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl ConsensusDecode for LockTime {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        u32::consensus_decode(reader).map(Self)
    }
}

impl ConsensusEncode for TxVer {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl ConsensusDecode for TxVer {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        i32::consensus_decode(reader).map(Self)
    }
}

impl ConsensusEncode for Sats {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

impl ConsensusDecode for Sats {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        u64::consensus_decode(reader).map(Self)
    }
}

impl ConsensusEncode for TxIn {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        let mut counter = self.prev_output.consensus_encode(writer)?;
        counter += self.sig_script.consensus_encode(writer)?;
        counter += self.sequence.consensus_encode(writer)?;
        Ok(counter)
    }
}

impl ConsensusDecode for TxIn {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let prev_output = Outpoint::consensus_decode(reader)?;
        let sig_script = SigScript::consensus_decode(reader)?;
        let sequence = SeqNo::consensus_decode(reader)?;
        Ok(TxIn {
            prev_output,
            sig_script,
            sequence,
        })
    }
}

impl ConsensusEncode for TxOut {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        let mut counter = self.value.consensus_encode(writer)?;
        counter += self.script_pubkey.consensus_encode(writer)?;
        Ok(counter)
    }
}

impl ConsensusDecode for TxOut {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let value = Sats::consensus_decode(reader)?;
        let script_pubkey = ScriptPubkey::consensus_decode(reader)?;
        Ok(TxOut {
            value,
            script_pubkey,
        })
    }
}

impl ConsensusEncode for Witness {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        let mut counter = VarInt::with_len(self.0.len()).consensus_encode(writer)?;
        for item in &self.0 {
            counter += encode_bytes(writer, item)?;
        }
        Ok(counter)
    }
}

impl ConsensusDecode for Witness {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let len = VarInt::consensus_decode(reader)?.to_u64();
        let mut stack = Vec::new();
        for _ in 0..len {
            stack.push(decode_bytes(reader)?);
        }
        Ok(Witness(stack))
    }
}

impl ConsensusDecode for Tx {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let version = TxVer::consensus_decode(reader)?;
        let mut segwit = false;
        let mut inputs = decode_list::<TxIn>(reader)?;
        if inputs.is_empty() {
            // BIP144 marker in place of the input count
            match u8::consensus_decode(reader)? {
                0x01 => {
                    segwit = true;
                    inputs = decode_list(reader)?;
                }
                flag => return Err(ConsensusDataError::UnsupportedSegwitFlag(flag).into()),
            }
        }
        let outputs = decode_list(reader)?;
        let mut witnesses = Vec::new();
        if segwit {
            witnesses.reserve(inputs.len());
            for _ in 0..inputs.len() {
                witnesses.push(Witness::consensus_decode(reader)?);
            }
        }
        let lock_time = LockTime::consensus_decode(reader)?;
        Ok(Tx {
            version,
            inputs,
            outputs,
            lock_time,
            segwit,
            witnesses,
        })
    }
}
