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

//! Taproot keys, tagged hashes, leaf scripts and control blocks (BIP340, BIP341, BIP342).

use std::fmt::{self, Formatter, LowerHex, UpperHex};
use std::io::Write;
use std::ops::{BitXor, Deref};
use std::str::FromStr;
use std::{slice, vec};

use amplify::hex::{FromHex, ToHex};
use amplify::{Bytes32, IoError, Wrapper};
use bitcoin_hashes::{sha256, Hash, HashEngine};
use secp256k1::{Scalar, XOnlyPublicKey};

use crate::{
    ConsensusEncode, ErrorKind, InvalidPubkey, PubkeyParseError, ScriptBytes, ScriptPubkey,
    TapScript, VarInt,
};

pub const TAPROOT_ANNEX_PREFIX: u8 = 0x50;
pub const TAPROOT_LEAF_TAPSCRIPT: u8 = 0xc0;
pub const TAPROOT_LEAF_MASK: u8 = 0xfe;
/// Maximum depth of a taproot script tree and maximum length of a merkle path.
pub const TAPROOT_MAX_DEPTH: usize = 128;

pub(crate) fn tagged_hash_engine(tag: &[u8]) -> sha256::HashEngine {
    let tag_hash = sha256::Hash::hash(tag);
    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_byte_array());
    engine.input(tag_hash.as_byte_array());
    engine
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, LowerHex, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct XOnlyPk(#[from] XOnlyPublicKey);

impl XOnlyPk {
    pub fn from_byte_array(data: [u8; 32]) -> Result<Self, InvalidPubkey> {
        XOnlyPublicKey::from_slice(data.as_ref())
            .map(Self)
            .map_err(|_| InvalidPubkey::InvalidPoint(data.to_hex()))
    }

    pub fn to_byte_array(&self) -> [u8; 32] { self.0.serialize() }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, InvalidPubkey> {
        let bytes = bytes.as_ref();
        let data = <[u8; 32]>::try_from(bytes).map_err(|_| InvalidPubkey::WrongLength {
            expected: 32,
            found: bytes.len(),
        })?;
        Self::from_byte_array(data)
    }
}

impl From<secp256k1::PublicKey> for XOnlyPk {
    fn from(pubkey: secp256k1::PublicKey) -> Self { XOnlyPk(pubkey.x_only_public_key().0) }
}

impl From<XOnlyPk> for [u8; 32] {
    fn from(pk: XOnlyPk) -> [u8; 32] { pk.to_byte_array() }
}

impl FromStr for XOnlyPk {
    type Err = PubkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = <[u8; 32]>::from_hex(s)?;
        Ok(Self::from_byte_array(data)?)
    }
}

impl ConsensusEncode for XOnlyPk {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        writer.write_all(&self.to_byte_array())?;
        Ok(32)
    }
}

/// Untweaked taproot key.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, LowerHex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct InternalPk(
    #[from]
    #[from(XOnlyPublicKey)]
    XOnlyPk,
);

impl InternalPk {
    #[inline]
    pub fn from_unchecked(pk: XOnlyPk) -> Self { Self(pk) }

    #[inline]
    pub fn from_byte_array(data: [u8; 32]) -> Result<Self, InvalidPubkey> {
        XOnlyPk::from_byte_array(data).map(Self)
    }

    #[inline]
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, InvalidPubkey> {
        XOnlyPk::from_bytes(bytes).map(Self)
    }

    #[inline]
    pub fn to_byte_array(&self) -> [u8; 32] { self.0.to_byte_array() }

    #[inline]
    pub fn to_xonly_pk(&self) -> XOnlyPk { self.0 }

    /// Tweak for the key and an optional script tree root: `TapTweak(pk || merkle_root)`.
    pub fn tap_tweak(&self, merkle_root: Option<TapNodeHash>) -> [u8; 32] {
        let mut engine = tagged_hash_engine(b"TapTweak");
        engine.input(&self.to_byte_array());
        if let Some(merkle_root) = merkle_root {
            engine.input(merkle_root.0.as_slice());
        }
        sha256::Hash::from_engine(engine).to_byte_array()
    }

    /// Computes the tweaked output key and its parity.
    pub fn to_output_pk(&self, merkle_root: Option<TapNodeHash>) -> (OutputPk, Parity) {
        let tweak = Scalar::from_be_bytes(self.tap_tweak(merkle_root))
            .expect("hash value greater than curve order");
        let internal_key: XOnlyPublicKey = self.0.into_inner();
        let (output_key, tweaked_parity) = internal_key
            .add_tweak(secp256k1::SECP256K1, &tweak)
            .expect("hash collision");
        debug_assert!(internal_key.tweak_add_check(
            secp256k1::SECP256K1,
            &output_key,
            tweaked_parity,
            tweak
        ));
        (OutputPk(XOnlyPk(output_key)), tweaked_parity.into())
    }
}

impl From<InternalPk> for [u8; 32] {
    fn from(pk: InternalPk) -> [u8; 32] { pk.to_byte_array() }
}

impl ConsensusEncode for InternalPk {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

/// Tweaked taproot key, as it appears in the P2TR output.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, LowerHex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct OutputPk(#[from] XOnlyPk);

impl OutputPk {
    #[inline]
    pub fn from_unchecked(pk: XOnlyPk) -> Self { Self(pk) }

    #[inline]
    pub fn from_byte_array(data: [u8; 32]) -> Result<Self, InvalidPubkey> {
        XOnlyPk::from_byte_array(data).map(Self)
    }

    #[inline]
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, InvalidPubkey> {
        XOnlyPk::from_bytes(bytes).map(Self)
    }

    #[inline]
    pub fn to_xonly_pk(&self) -> XOnlyPk { self.0 }

    #[inline]
    pub fn to_script_pubkey(&self) -> ScriptPubkey { ScriptPubkey::p2tr_tweaked(*self) }

    #[inline]
    pub fn to_byte_array(&self) -> [u8; 32] { self.0.to_byte_array() }
}

impl From<OutputPk> for [u8; 32] {
    fn from(pk: OutputPk) -> [u8; 32] { pk.to_byte_array() }
}

pub trait IntoTapHash {
    fn into_tap_hash(self) -> TapNodeHash;
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapSighash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl From<TapSighash> for [u8; 32] {
    fn from(value: TapSighash) -> Self { value.0.into_inner() }
}

impl From<TapSighash> for secp256k1::Message {
    fn from(sighash: TapSighash) -> Self {
        secp256k1::Message::from_digest(sighash.0.into_inner())
    }
}

impl TapSighash {
    pub fn engine() -> sha256::HashEngine { tagged_hash_engine(b"TapSighash") }

    pub fn from_engine(engine: sha256::HashEngine) -> Self {
        Self(sha256::Hash::from_engine(engine).to_byte_array().into())
    }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapLeafHash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl TapLeafHash {
    pub fn with_leaf_script(leaf_script: &LeafScript) -> Self {
        Self::with_raw_script(leaf_script.version, leaf_script.script.as_slice())
    }

    pub fn with_tap_script(tap_script: &TapScript) -> Self {
        Self::with_raw_script(LeafVer::TapScript, tap_script.as_slice())
    }

    fn with_raw_script(version: LeafVer, script: &[u8]) -> Self {
        let mut engine = tagged_hash_engine(b"TapLeaf");
        engine.input(&[version.to_consensus_u8()]);
        engine.input(&VarInt::with_len(script.len()).consensus_serialize());
        engine.input(script);
        Self(sha256::Hash::from_engine(engine).to_byte_array().into())
    }
}

impl IntoTapHash for TapLeafHash {
    fn into_tap_hash(self) -> TapNodeHash { TapNodeHash(self.0) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapBranchHash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl TapBranchHash {
    /// Branch commitment; children are ordered lexicographically before hashing.
    pub fn with_nodes(node1: TapNodeHash, node2: TapNodeHash) -> Self {
        let mut engine = tagged_hash_engine(b"TapBranch");
        if node1.0.into_inner() < node2.0.into_inner() {
            engine.input(node1.0.as_slice());
            engine.input(node2.0.as_slice());
        } else {
            engine.input(node2.0.as_slice());
            engine.input(node1.0.as_slice());
        }
        Self(sha256::Hash::from_engine(engine).to_byte_array().into())
    }
}

impl IntoTapHash for TapBranchHash {
    fn into_tap_hash(self) -> TapNodeHash { TapNodeHash(self.0) }
}

/// Hash of either leaf or branch node of a taproot script tree.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapNodeHash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl From<TapLeafHash> for TapNodeHash {
    fn from(hash: TapLeafHash) -> Self { hash.into_tap_hash() }
}

impl From<TapBranchHash> for TapNodeHash {
    fn from(hash: TapBranchHash) -> Self { hash.into_tap_hash() }
}

impl IntoTapHash for TapNodeHash {
    fn into_tap_hash(self) -> TapNodeHash { self }
}

impl ConsensusEncode for TapNodeHash {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        self.0.consensus_encode(writer)
    }
}

/// Sibling hashes from a leaf up to the tree root, at most [`TAPROOT_MAX_DEPTH`] long.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct TapMerklePath(Vec<TapNodeHash>);

impl Deref for TapMerklePath {
    type Target = [TapNodeHash];
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl IntoIterator for TapMerklePath {
    type Item = TapNodeHash;
    type IntoIter = vec::IntoIter<TapNodeHash>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a TapMerklePath {
    type Item = &'a TapNodeHash;
    type IntoIter = slice::Iter<'a, TapNodeHash>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl TapMerklePath {
    #[inline]
    pub fn new() -> Self { Self::default() }

    pub fn try_from(path: Vec<TapNodeHash>) -> Result<Self, ControlBlockError> {
        if path.len() > TAPROOT_MAX_DEPTH {
            return Err(ControlBlockError::PathTooLong(path.len()));
        }
        Ok(Self(path))
    }

    #[inline]
    pub fn try_from_iter<I: IntoIterator<Item = TapNodeHash>>(
        iter: I,
    ) -> Result<Self, ControlBlockError> {
        Self::try_from(iter.into_iter().collect())
    }

    pub fn into_vec(self) -> Vec<TapNodeHash> { self.0 }
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
/// invalid taproot leaf version {0:#04x}.
pub struct InvalidLeafVer(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum LeafVer {
    #[default]
    TapScript,
    Future(FutureLeafVer),
}

impl LeafVer {
    pub fn from_consensus_u8(version: u8) -> Result<Self, InvalidLeafVer> {
        match version {
            TAPROOT_LEAF_TAPSCRIPT => Ok(LeafVer::TapScript),
            future => FutureLeafVer::from_consensus(future).map(LeafVer::Future),
        }
    }

    pub fn to_consensus_u8(self) -> u8 {
        match self {
            LeafVer::TapScript => TAPROOT_LEAF_TAPSCRIPT,
            LeafVer::Future(version) => version.to_consensus(),
        }
    }
}

impl LowerHex for LeafVer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result { LowerHex::fmt(&self.to_consensus_u8(), f) }
}

impl UpperHex for LeafVer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result { UpperHex::fmt(&self.to_consensus_u8(), f) }
}

/// Leaf version not yet given semantics by a soft fork.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct FutureLeafVer(u8);

impl FutureLeafVer {
    fn from_consensus(version: u8) -> Result<FutureLeafVer, InvalidLeafVer> {
        match version {
            TAPROOT_LEAF_TAPSCRIPT | TAPROOT_ANNEX_PREFIX => Err(InvalidLeafVer(version)),
            odd if odd & TAPROOT_LEAF_MASK != odd => Err(InvalidLeafVer(odd)),
            even => Ok(FutureLeafVer(even)),
        }
    }

    #[inline]
    pub fn to_consensus(self) -> u8 { self.0 }
}

/// Script together with its leaf version.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display("{version:02x} {script:x}")]
pub struct LeafScript {
    pub version: LeafVer,
    pub script: ScriptBytes,
}

impl From<TapScript> for LeafScript {
    fn from(tap_script: TapScript) -> Self {
        LeafScript {
            version: LeafVer::TapScript,
            script: tap_script.into_script_bytes(),
        }
    }
}

impl LeafScript {
    #[inline]
    pub fn new(version: LeafVer, script: ScriptBytes) -> Self { LeafScript { version, script } }

    #[inline]
    pub fn from_tap_script(tap_script: TapScript) -> Self { Self::from(tap_script) }

    #[inline]
    pub fn as_script_bytes(&self) -> &ScriptBytes { &self.script }

    #[inline]
    pub fn tap_leaf_hash(&self) -> TapLeafHash { TapLeafHash::with_leaf_script(self) }
}

impl TapScript {
    #[inline]
    pub fn tap_leaf_hash(&self) -> TapLeafHash { TapLeafHash::with_tap_script(self) }
}

impl ScriptPubkey {
    pub fn p2tr(internal_key: InternalPk, merkle_root: Option<TapNodeHash>) -> Self {
        let (output_key, _) = internal_key.to_output_pk(merkle_root);
        Self::p2tr_tweaked(output_key)
    }

    pub fn p2tr_key_only(internal_key: InternalPk) -> Self { Self::p2tr(internal_key, None) }

    pub fn p2tr_scripted(internal_key: InternalPk, merkle_root: impl IntoTapHash) -> Self {
        Self::p2tr(internal_key, Some(merkle_root.into_tap_hash()))
    }

    pub fn p2tr_tweaked(output_key: OutputPk) -> Self {
        Self::with_witness_program_unchecked(1, &output_key.to_byte_array())
    }

    pub fn is_p2tr(&self) -> bool {
        self.len() == 34 && self[0] == 0x51 && self[1] == 32
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Error)]
#[display(doc_comments)]
/// invalid parity value {0}; only 0 and 1 are allowed.
pub struct InvalidParityValue(pub u8);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[display(lowercase)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum Parity {
    Even = 0,
    Odd = 1,
}

impl From<secp256k1::Parity> for Parity {
    fn from(parity: secp256k1::Parity) -> Self {
        match parity {
            secp256k1::Parity::Even => Parity::Even,
            secp256k1::Parity::Odd => Parity::Odd,
        }
    }
}

impl Parity {
    pub fn to_consensus_u8(self) -> u8 { self as u8 }

    pub fn from_consensus_u8(parity: u8) -> Result<Parity, InvalidParityValue> {
        match parity {
            0 => Ok(Parity::Even),
            1 => Ok(Parity::Odd),
            invalid => Err(InvalidParityValue(invalid)),
        }
    }
}

impl BitXor for Parity {
    type Output = Parity;

    fn bitxor(self, rhs: Parity) -> Self::Output {
        if self == rhs {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ControlBlockError {
    /// control block length {0} is not 33 plus a multiple of 32 bytes.
    InvalidLength(usize),

    /// control block merkle path has {0} elements, exceeding the maximum tree depth of 128.
    PathTooLong(usize),

    /// control block uses {0}
    #[from]
    InvalidLeafVer(InvalidLeafVer),

    /// control block contains internal key which is not a valid x-only public key.
    InvalidInternalKey,
}

impl ControlBlockError {
    pub fn kind(&self) -> ErrorKind { ErrorKind::MalformedControlBlock }
}

/// Witness element proving that a leaf script is committed into a taproot output key.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct ControlBlock {
    pub leaf_version: LeafVer,
    pub output_key_parity: Parity,
    pub internal_pk: InternalPk,
    pub merkle_branch: TapMerklePath,
}

impl ControlBlock {
    #[inline]
    pub fn with(
        leaf_version: LeafVer,
        internal_pk: InternalPk,
        output_key_parity: Parity,
        merkle_branch: TapMerklePath,
    ) -> Self {
        ControlBlock {
            leaf_version,
            output_key_parity,
            internal_pk,
            merkle_branch,
        }
    }

    /// Parses control block from its witness serialization.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, ControlBlockError> {
        let bytes = bytes.as_ref();
        if bytes.len() < 33 || (bytes.len() - 33) % 32 != 0 {
            return Err(ControlBlockError::InvalidLength(bytes.len()));
        }
        let depth = (bytes.len() - 33) / 32;
        if depth > TAPROOT_MAX_DEPTH {
            return Err(ControlBlockError::PathTooLong(depth));
        }
        let leaf_version = LeafVer::from_consensus_u8(bytes[0] & TAPROOT_LEAF_MASK)?;
        let output_key_parity = if bytes[0] & 0x01 == 0x01 { Parity::Odd } else { Parity::Even };
        let internal_pk = InternalPk::from_bytes(&bytes[1..33])
            .map_err(|_| ControlBlockError::InvalidInternalKey)?;
        let merkle_branch = bytes[33..]
            .chunks_exact(32)
            .map(|chunk| {
                let mut buf = [0u8; 32];
                buf.copy_from_slice(chunk);
                TapNodeHash::from(buf)
            })
            .collect();
        Ok(ControlBlock {
            leaf_version,
            output_key_parity,
            internal_pk,
            merkle_branch: TapMerklePath(merkle_branch),
        })
    }

    #[inline]
    pub fn to_vec(&self) -> Vec<u8> { self.consensus_serialize() }

    /// Computes merkle root from the leaf hash and the merkle path of the control block.
    pub fn merkle_root(&self, leaf_hash: TapLeafHash) -> TapNodeHash {
        self.merkle_branch.iter().fold(leaf_hash.into_tap_hash(), |node, sibling| {
            TapBranchHash::with_nodes(node, *sibling).into_tap_hash()
        })
    }

    /// Checks that the script under the leaf version of the control block is committed into
    /// the given output key.
    pub fn verify(&self, output_pk: OutputPk, script: &ScriptBytes) -> bool {
        let leaf_hash = TapLeafHash::with_raw_script(self.leaf_version, script.as_slice());
        let merkle_root = self.merkle_root(leaf_hash);
        let (expected_pk, parity) = self.internal_pk.to_output_pk(Some(merkle_root));
        expected_pk == output_pk && parity == self.output_key_parity
    }
}

impl ConsensusEncode for ControlBlock {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        let mut counter = 1;

        let first_byte =
            self.leaf_version.to_consensus_u8() | self.output_key_parity.to_consensus_u8();
        first_byte.consensus_encode(writer)?;

        counter += self.internal_pk.consensus_encode(writer)?;
        for step in &self.merkle_branch {
            counter += step.consensus_encode(writer)?;
        }

        Ok(counter)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum AnnexError {
    /// taproot annex can't be empty.
    Empty,

    /// taproot annex must start with 0x50 byte, while {0:#04x} was found.
    WrongFirstByte(u8),
}

impl AnnexError {
    pub fn kind(&self) -> ErrorKind { ErrorKind::MalformedData }
}

/// Last witness element of a taproot input starting with `0x50` (BIP341).
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Annex(Vec<u8>);

impl Annex {
    pub fn new(annex_bytes: Vec<u8>) -> Result<Self, AnnexError> {
        match annex_bytes.first() {
            None => Err(AnnexError::Empty),
            Some(&TAPROOT_ANNEX_PREFIX) => Ok(Self(annex_bytes)),
            Some(byte) => Err(AnnexError::WrongFirstByte(*byte)),
        }
    }

    pub fn len_var_int(&self) -> VarInt { VarInt::with_len(self.0.len()) }

    pub fn as_slice(&self) -> &[u8] { &self.0 }

    pub fn into_vec(self) -> Vec<u8> { self.0 }
}

impl ConsensusEncode for Annex {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        crate::coding::encode_bytes(writer, &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tap_sighash_engine() {
        let bytes = Vec::<u8>::from_hex(
            "00011b96877db45ffa23b307e9f0ac87b80ef9a80b4c5f0db3fbe734422453e83cc5576f3d542c5d4898fb\
             2b696c15d43332534a7c1d1255fda38993545882df92c3e353ff6d36fbfadc4d168452afd8467f02fe53d71\
             714fcea5dfe2ea759bd00185c4cb02bc76d42620393ca358a1a713f4997f9fc222911890afb3fe56c6a19b2\
             02df7bffdcfad08003821294279043746631b00e2dc5e52a111e213bbfe6ef09a19428d418dab0d50000000\
             000",
        )
        .unwrap();
        let mut engine = TapSighash::engine();
        engine.input(&bytes);
        assert_eq!(
            TapSighash::from_engine(engine).to_string(),
            "04e808aad07a40b3767a1442fead79af6ef7e7c9316d82dec409bb31e77699b0"
        );
    }

    #[test]
    fn key_only_tweak() {
        let internal_pk = InternalPk::from_str(
            "d6889cb081036e0faefa3a35157ad71086b123b2b144b649798b494c300a961d",
        )
        .unwrap();
        let (output_pk, parity) = internal_pk.to_output_pk(None);
        assert_eq!(
            output_pk.to_string(),
            "53a1f6e454df1aa2776a2814a721372d6258050de330b3c6d10ee8f4e0dda343"
        );
        assert_eq!(parity, Parity::Odd);
        assert_eq!(
            ScriptPubkey::p2tr_key_only(internal_pk).to_string(),
            "512053a1f6e454df1aa2776a2814a721372d6258050de330b3c6d10ee8f4e0dda343"
        );
        assert!(output_pk.to_script_pubkey().is_p2tr());
    }

    #[test]
    fn control_block_vectors() {
        let vectors = [
            (
                "5120567666e7df90e0450bb608e17c01ed3fbcfa5355a5f8273e34e583bfaa70ce09",
                "203455139bf238a3067bd72ed77e0ab8db590330f55ed58dba7366b53bf4734279ac",
                "c1a0eb12e60a52614986c623cbb6621dcdba3a47e3be6b37e032b7a11c7b98f400",
            ),
            (
                "5120b0a79103c31fe51eea61d2873bad8a25a310da319d7e7a85f825fa7a00ea3f85",
                "203455139bf238a3067bd72ed77e0ab8db590330f55ed58dba7366b53bf4734279ad51",
                "c1a0eb12e60a52614986c623cbb6621dcdba3a47e3be6b37e032b7a11c7b98f400",
            ),
            (
                "5120228b94a4806254a38d6efa8a134c28ebc89546209559dfe40b2b0493bafacc5b",
                "6a50",
                "c0a0eb12e60a52614986c623cbb6621dcdba3a47e3be6b37e032b7a11c7b98f4009c9aed3dfd11ab0e78bf\
                 87ef3bf296269dc4b0f7712140386d6980992bab4b45",
            ),
            (
                "5120ee9aecb28f5f35ce1f8b5ec80275ac0f81bca4a21b29b4632fb4bcbef8823e6a",
                "2021a5981b13be29c9d4ea179ea44a8b773ea8c02d68f6f6eefd98de20d4bd055fac",
                "c13359c284c196b6e80f0cf1d93b6a397cf7ee722f0427b705bd954b88ada8838bd2622fd0e104fc50aa\
                 763b43c6a792d7d117029983abd687223b4344a9402c618bba7f5fc3fa8a57491f6842acde88c1e675ca\
                 35caea3b1a69ee2c2d9b10f615",
            ),
        ];
        for (spk, script, cb) in vectors {
            let spk = ScriptPubkey::from_hex(spk).unwrap();
            let script = ScriptBytes::from_hex(script).unwrap();
            let cb_bytes = Vec::<u8>::from_hex(cb).unwrap();
            let control_block = ControlBlock::from_bytes(&cb_bytes).unwrap();
            assert_eq!(control_block.to_vec(), cb_bytes);
            assert_eq!(control_block.leaf_version, LeafVer::TapScript);
            let output_pk = OutputPk::from_bytes(&spk[2..]).unwrap();
            assert!(control_block.verify(output_pk, &script));

            let mut tampered = script.to_vec();
            tampered.push(0x51);
            assert!(!control_block.verify(output_pk, &ScriptBytes::from(tampered)));
        }
    }

    #[test]
    fn control_block_errors() {
        let internal = Vec::<u8>::from_hex(
            "a0eb12e60a52614986c623cbb6621dcdba3a47e3be6b37e032b7a11c7b98f400",
        )
        .unwrap();

        let mut bytes = vec![0xc0];
        bytes.extend(&internal);
        bytes.push(0x00);
        let err = ControlBlock::from_bytes(&bytes).unwrap_err();
        assert_eq!(err, ControlBlockError::InvalidLength(34));
        assert_eq!(err.kind(), ErrorKind::MalformedControlBlock);

        assert_eq!(ControlBlock::from_bytes([0xc0; 32]), Err(ControlBlockError::InvalidLength(32)));

        let mut bytes = vec![0x50];
        bytes.extend(&internal);
        assert_eq!(
            ControlBlock::from_bytes(&bytes),
            Err(ControlBlockError::InvalidLeafVer(InvalidLeafVer(0x50)))
        );

        let mut bytes = vec![0xc0];
        bytes.extend(&internal);
        bytes.extend([0u8; 32 * 129]);
        assert_eq!(ControlBlock::from_bytes(&bytes), Err(ControlBlockError::PathTooLong(129)));

        let mut bytes = vec![0xc0];
        bytes.extend([0xff; 32]);
        assert_eq!(ControlBlock::from_bytes(&bytes), Err(ControlBlockError::InvalidInternalKey));
    }

    #[test]
    fn leaf_versions() {
        assert_eq!(LeafVer::from_consensus_u8(0xc0), Ok(LeafVer::TapScript));
        assert_eq!(LeafVer::from_consensus_u8(0x50), Err(InvalidLeafVer(0x50)));
        assert_eq!(LeafVer::from_consensus_u8(0xc1), Err(InvalidLeafVer(0xc1)));
        let future = LeafVer::from_consensus_u8(0xbc).unwrap();
        assert_eq!(future.to_consensus_u8(), 0xbc);
        assert_eq!(format!("{future:x}"), "bc");
    }

    #[test]
    fn control_block_leaf_version() {
        let mut bytes = vec![0x50];
        bytes.extend(
            Vec::<u8>::from_hex("93c7378d96518a75448821c4f7c8f4bae7ce60f804d03d1f0628dd5dd0f5de51")
                .unwrap(),
        );
        let err = ControlBlock::from_bytes(&bytes).unwrap_err();
        assert_eq!(err, ControlBlockError::InvalidLeafVer(InvalidLeafVer(0x50)));
        assert_eq!(err.kind(), ErrorKind::MalformedControlBlock);

        let errors = [err, ControlBlockError::InvalidLength(34), err]
            .into_iter()
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn annex() {
        assert_eq!(Annex::new(vec![]), Err(AnnexError::Empty));
        assert_eq!(Annex::new(vec![0x51]), Err(AnnexError::WrongFirstByte(0x51)));
        assert_eq!(Annex::new(vec![0x51, 0x50]), Err(AnnexError::WrongFirstByte(0x51)));
        let annex = Annex::new(vec![0x50, 0x01]).unwrap();
        assert_eq!(annex.consensus_serialize(), vec![0x02, 0x50, 0x01]);
    }

    #[test]
    fn branch_ordering() {
        let a = TapNodeHash::from([0x01; 32]);
        let b = TapNodeHash::from([0x02; 32]);
        assert_eq!(TapBranchHash::with_nodes(a, b), TapBranchHash::with_nodes(b, a));
        assert_ne!(TapBranchHash::with_nodes(a, a), TapBranchHash::with_nodes(a, b));
    }
}
