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

use std::io::{Read, Write};

use amplify::{Bytes20, Bytes32, Bytes32StrRev, IoError, Wrapper};
use bitcoin_hashes::Hash;

use crate::{ConsensusDecode, ConsensusDecodeError, ConsensusEncode};

/// Single SHA256 of the data.
pub fn sha256(data: impl AsRef<[u8]>) -> [u8; 32] {
    bitcoin_hashes::sha256::Hash::hash(data.as_ref()).to_byte_array()
}

/// Double SHA256 of the data.
pub fn sha256d(data: impl AsRef<[u8]>) -> [u8; 32] {
    bitcoin_hashes::sha256d::Hash::hash(data.as_ref()).to_byte_array()
}

/// RIPEMD160 over SHA256 of the data.
pub fn hash160(data: impl AsRef<[u8]>) -> [u8; 20] {
    bitcoin_hashes::hash160::Hash::hash(data.as_ref()).to_byte_array()
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct PubkeyHash(
    #[from]
    #[from([u8; 20])]
    pub Bytes20,
);

impl PubkeyHash {
    pub fn with_pubkey_bytes(data: impl AsRef<[u8]>) -> Self { Self(hash160(data).into()) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ScriptHash(
    #[from]
    #[from([u8; 20])]
    pub Bytes20,
);

impl ScriptHash {
    pub fn with_script_bytes(script: impl AsRef<[u8]>) -> Self { Self(hash160(script).into()) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct WPubkeyHash(
    #[from]
    #[from([u8; 20])]
    pub Bytes20,
);

impl WPubkeyHash {
    pub fn with_pubkey_bytes(data: impl AsRef<[u8]>) -> Self { Self(hash160(data).into()) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct WScriptHash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl WScriptHash {
    pub fn with_script_bytes(script: impl AsRef<[u8]>) -> Self { Self(sha256(script).into()) }
}

/// Signature digest for legacy and segwit v0 inputs.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Sighash(
    #[from]
    #[from([u8; 32])]
    pub Bytes32,
);

impl From<Sighash> for [u8; 32] {
    fn from(value: Sighash) -> Self { value.0.into_inner() }
}

impl From<Sighash> for secp256k1::Message {
    fn from(sighash: Sighash) -> Self { secp256k1::Message::from_digest(sighash.0.into_inner()) }
}

/// Transaction identifier: double SHA256 of the transaction serialized without witness data.
///
/// Displayed in reversed byte order, the way block explorers and bitcoin core show it.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Txid(
    #[from]
    #[from([u8; 32])]
    Bytes32StrRev,
);

impl Txid {
    /// Txid of the "null" outpoint used by coinbase inputs.
    pub fn coinbase() -> Self { Self::from([0x00; 32]) }

    pub fn is_coinbase(&self) -> bool { self.0.into_inner() == [0x00; 32] }

    pub(crate) fn with_data(data: impl AsRef<[u8]>) -> Self { Self(sha256d(data).into()) }
}

/// Witness transaction identifier (BIP141).
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Index, RangeOps, AsSlice, BorrowSlice, Hex, Display, FromStr)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Wtxid(
    #[from]
    #[from([u8; 32])]
    Bytes32StrRev,
);

impl Wtxid {
    pub(crate) fn with_data(data: impl AsRef<[u8]>) -> Self { Self(sha256d(data).into()) }
}

impl ConsensusEncode for Txid {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        writer.write_all(&self.0.into_inner())?;
        Ok(32)
    }
}

impl ConsensusDecode for Txid {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Self::from(buf))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use amplify::hex::FromHex;

    use super::*;

    #[test]
    fn txid_display_reversed() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xAB;
        bytes[31] = 0x01;
        let txid = Txid::from(bytes);
        let s = txid.to_string();
        assert!(s.starts_with("01"));
        assert!(s.ends_with("ab"));
        assert_eq!(Txid::from_str(&s).unwrap(), txid);
        assert!(Txid::coinbase().is_coinbase());
    }

    #[test]
    fn hash_functions() {
        assert_eq!(
            sha256(b""),
            <[u8; 32]>::from_hex(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            )
            .unwrap()
        );
        assert_eq!(
            sha256d(b""),
            <[u8; 32]>::from_hex(
                "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
            )
            .unwrap()
        );
        assert_eq!(
            hash160(b""),
            <[u8; 20]>::from_hex("b472a266d0bd89c13706a4132ccfb16f7c3b9fcb").unwrap()
        );
    }
}
