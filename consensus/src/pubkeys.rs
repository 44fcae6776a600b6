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
use std::str::FromStr;

use amplify::hex::{self, FromHex, ToHex};
use amplify::Wrapper;
use secp256k1::PublicKey;

use crate::{ErrorKind, PubkeyHash, WPubkeyHash};

#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum InvalidPubkey {
    /// public key must be {expected} bytes long, while {found} bytes were provided.
    WrongLength { expected: usize, found: usize },

    /// public key data {0} do not represent a valid curve point.
    InvalidPoint(String),
}

impl InvalidPubkey {
    pub fn kind(&self) -> ErrorKind { ErrorKind::InvalidKey }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(inner)]
pub enum PubkeyParseError {
    #[from]
    Hex(hex::Error),
    #[from]
    InvalidPubkey(InvalidPubkey),
}

impl PubkeyParseError {
    pub fn kind(&self) -> ErrorKind { ErrorKind::InvalidKey }
}

fn parse_point(bytes: &[u8]) -> Result<PublicKey, InvalidPubkey> {
    PublicKey::from_slice(bytes).map_err(|_| InvalidPubkey::InvalidPoint(bytes.to_hex()))
}

/// Public key in compressed 33-byte serialization, the only form allowed by segwit.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, LowerHex, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct CompressedPk(#[from] PublicKey);

impl CompressedPk {
    pub fn from_byte_array(data: [u8; 33]) -> Result<Self, InvalidPubkey> {
        parse_point(&data).map(Self)
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, InvalidPubkey> {
        let bytes = bytes.as_ref();
        if bytes.len() != 33 {
            return Err(InvalidPubkey::WrongLength {
                expected: 33,
                found: bytes.len(),
            });
        }
        parse_point(bytes).map(Self)
    }

    pub fn to_byte_array(&self) -> [u8; 33] { self.0.serialize() }

    pub fn pubkey_hash(&self) -> PubkeyHash { PubkeyHash::with_pubkey_bytes(self.to_byte_array()) }

    pub fn wpubkey_hash(&self) -> WPubkeyHash {
        WPubkeyHash::with_pubkey_bytes(self.to_byte_array())
    }
}

impl FromStr for CompressedPk {
    type Err = PubkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = <[u8; 33]>::from_hex(s)?;
        Ok(Self::from_byte_array(data)?)
    }
}

/// Public key which may be serialized either in compressed or uncompressed form, as allowed in
/// pre-segwit scripts.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct LegacyPk {
    pub compressed: bool,
    pub pubkey: PublicKey,
}

impl From<PublicKey> for LegacyPk {
    fn from(pk: PublicKey) -> Self { LegacyPk::compressed(pk) }
}

impl From<CompressedPk> for LegacyPk {
    fn from(pk: CompressedPk) -> Self { LegacyPk::compressed(pk.into_inner()) }
}

impl LegacyPk {
    pub const fn compressed(pubkey: PublicKey) -> Self {
        LegacyPk {
            compressed: true,
            pubkey,
        }
    }

    pub const fn uncompressed(pubkey: PublicKey) -> Self {
        LegacyPk {
            compressed: false,
            pubkey,
        }
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, InvalidPubkey> {
        let bytes = bytes.as_ref();
        let pubkey = match bytes.len() {
            33 | 65 => parse_point(bytes)?,
            found => return Err(InvalidPubkey::WrongLength { expected: 33, found }),
        };
        Ok(LegacyPk {
            compressed: bytes.len() == 33,
            pubkey,
        })
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self.compressed {
            true => self.pubkey.serialize().to_vec(),
            false => self.pubkey.serialize_uncompressed().to_vec(),
        }
    }

    pub fn pubkey_hash(&self) -> PubkeyHash { PubkeyHash::with_pubkey_bytes(self.to_vec()) }

    /// Returns compressed key if the key is serialized in compressed form.
    pub fn to_compressed_pk(&self) -> Option<CompressedPk> {
        self.compressed.then_some(CompressedPk(self.pubkey))
    }
}

impl LowerHex for LegacyPk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_vec().to_hex()) }
}

impl Display for LegacyPk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(self, f) }
}

impl FromStr for LegacyPk {
    type Err = PubkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s)?;
        Ok(Self::from_bytes(data)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
                                  483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn generator_hashes() {
        let pk = CompressedPk::from_str(G_COMPRESSED).unwrap();
        assert_eq!(pk.to_string(), G_COMPRESSED);
        assert_eq!(pk.pubkey_hash().to_string(), "751e76e8199196d454941c45d1b3a323f1433bd6");
        assert_eq!(pk.wpubkey_hash().to_string(), "751e76e8199196d454941c45d1b3a323f1433bd6");

        let legacy = LegacyPk::from_str(G_UNCOMPRESSED).unwrap();
        assert!(!legacy.compressed);
        assert_eq!(legacy.to_string(), G_UNCOMPRESSED);
        assert_eq!(legacy.pubkey_hash().to_string(), "91b24bf9f5288532960ac687abb035127b1d28a5");
        assert_eq!(legacy.to_compressed_pk(), None);
        assert_eq!(LegacyPk::from(pk).to_compressed_pk(), Some(pk));
    }

    #[test]
    fn invalid_keys() {
        assert_eq!(
            CompressedPk::from_bytes([0x02; 32]),
            Err(InvalidPubkey::WrongLength {
                expected: 33,
                found: 32
            })
        );
        let err = CompressedPk::from_byte_array([0x05; 33]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert!(matches!(err, InvalidPubkey::InvalidPoint(_)));
        assert!(LegacyPk::from_bytes([0x04; 64]).is_err());
    }
}
