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

//! Address-related types for detailed payload analysis and memory-efficient
//! processing.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bc::{
    CompressedPk, ErrorKind, InternalPk, InvalidPubkey, LegacyPk, OutputPk, PubkeyHash,
    RedeemScript, ScriptHash, ScriptPubkey, TapNodeHash, WPubkeyHash, WScriptHash, WitnessScript,
};
use bech32::u5;

use crate::{
    AddressNetwork, PUBKEY_ADDRESS_PREFIX_MAIN, PUBKEY_ADDRESS_PREFIX_TEST,
    SCRIPT_ADDRESS_PREFIX_MAIN, SCRIPT_ADDRESS_PREFIX_TEST,
};

/// Errors creating address from scriptPubkey.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum AddressError {
    /// scriptPubkey contains invalid BIP340 output pubkey.
    InvalidTaprootKey,
    /// scriptPubkey can't be represented with any known address standard.
    UnsupportedScriptPubkey,
}

impl AddressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AddressError::InvalidTaprootKey => ErrorKind::InvalidKey,
            AddressError::UnsupportedScriptPubkey => ErrorKind::MalformedData,
        }
    }
}

/// Errors parsing address strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AddressParseError {
    /// wrong Base58 encoding of address data - {0}
    #[from]
    Base58(bs58::decode::Error),

    /// wrong Bech32 encoding of address data - {0}
    #[from]
    Bech32(bech32::Error),

    /// base58 address payload has invalid length {0}.
    InvalidLength(usize),

    /// proprietary address has an invalid version code {0:#04x}.
    InvalidAddressVersion(u8),

    /// segwit address has an invalid witness version {0:#04x}.
    InvalidWitnessVersion(u8),

    /// unsupported future taproot version in address `{1}` detected by a length of {0}.
    FutureTaprootVersion(usize, String),

    /// address has an unsupported future witness version {0}.
    FutureWitnessVersion(u8),

    /// witness v0 address has a program of invalid length {0}.
    InvalidProgramLength(usize),

    /// address has an invalid Bech32 variant {0:?}.
    InvalidBech32Variant(bech32::Variant),

    /// unrecognized address format in '{0}'.
    UnrecognizableFormat(String),

    /// wrong BIP340 public key
    #[from(InvalidPubkey)]
    WrongPublicKeyData,

    /// unrecognized address format string; must be one of `P2PKH`, `P2SH`,
    /// `P2WPKH`, `P2WSH`, `P2TR`
    UnrecognizedAddressType,
}

impl AddressParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AddressParseError::WrongPublicKeyData => ErrorKind::InvalidKey,
            _ => ErrorKind::MalformedData,
        }
    }
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
pub struct Address {
    /// Address payload (see [`AddressPayload`]).
    pub payload: AddressPayload,

    /// A type of the network used by the address
    pub network: AddressNetwork,
}

impl Address {
    pub fn new(payload: AddressPayload, network: impl Into<AddressNetwork>) -> Self {
        Address {
            payload,
            network: network.into(),
        }
    }

    /// Constructs compatible address for a given `scriptPubkey`.
    pub fn with(
        script: &ScriptPubkey,
        network: impl Into<AddressNetwork>,
    ) -> Result<Self, AddressError> {
        let payload = AddressPayload::from_script(script)?;
        Ok(Address::new(payload, network))
    }

    /// P2PKH address; the hash commits to the key in its own (compressed or uncompressed)
    /// serialization.
    pub fn p2pkh(pk: impl Into<LegacyPk>, network: impl Into<AddressNetwork>) -> Self {
        Address::new(AddressPayload::Pkh(pk.into().pubkey_hash()), network)
    }

    pub fn p2sh(redeem_script: &RedeemScript, network: impl Into<AddressNetwork>) -> Self {
        Address::new(AddressPayload::Sh(redeem_script.script_hash()), network)
    }

    pub fn p2wpkh(pk: CompressedPk, network: impl Into<AddressNetwork>) -> Self {
        Address::new(AddressPayload::Wpkh(pk.wpubkey_hash()), network)
    }

    pub fn p2wsh(witness_script: &WitnessScript, network: impl Into<AddressNetwork>) -> Self {
        Address::new(AddressPayload::Wsh(witness_script.wscript_hash()), network)
    }

    /// P2WPKH nested into P2SH.
    pub fn p2sh_wpkh(pk: CompressedPk, network: impl Into<AddressNetwork>) -> Self {
        Self::p2sh(&RedeemScript::p2sh_wpkh(pk.wpubkey_hash()), network)
    }

    /// P2WSH nested into P2SH.
    pub fn p2sh_wsh(witness_script: &WitnessScript, network: impl Into<AddressNetwork>) -> Self {
        Self::p2sh(&RedeemScript::p2sh_wsh(witness_script.wscript_hash()), network)
    }

    /// Taproot address with the output key tweaked by the optional script tree root.
    pub fn p2tr(
        internal_pk: InternalPk,
        merkle_root: Option<TapNodeHash>,
        network: impl Into<AddressNetwork>,
    ) -> Self {
        let (output_pk, _) = internal_pk.to_output_pk(merkle_root);
        Address::new(AddressPayload::Tr(output_pk), network)
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> ScriptPubkey { self.payload.script_pubkey() }

    /// Returns if the address is testnet-, signet- or regtest-specific.
    pub fn is_testnet(self) -> bool { self.network.is_testnet() }

    /// Detects address type.
    pub fn address_type(self) -> AddressType { self.payload.address_type() }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (version, variant, prog) = match self.payload {
            AddressPayload::Pkh(PubkeyHash(hash)) | AddressPayload::Sh(ScriptHash(hash)) => {
                let mut prefixed = [0; 21];
                prefixed[0] = match self.payload {
                    AddressPayload::Pkh(_) => self.network.pubkey_prefix(),
                    _ => self.network.script_prefix(),
                };
                prefixed[1..].copy_from_slice(hash.as_slice());
                return f.write_str(&bs58::encode(prefixed).with_check().into_string());
            }
            AddressPayload::Wpkh(WPubkeyHash(hash)) => {
                (0, bech32::Variant::Bech32, hash.as_slice().to_vec())
            }
            AddressPayload::Wsh(WScriptHash(hash)) => {
                (0, bech32::Variant::Bech32, hash.as_slice().to_vec())
            }
            AddressPayload::Tr(pk) => (1, bech32::Variant::Bech32m, pk.to_byte_array().to_vec()),
        };

        struct UpperWriter<W: fmt::Write>(W);
        impl<W: fmt::Write> fmt::Write for UpperWriter<W> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                for c in s.chars() {
                    self.0.write_char(c.to_ascii_uppercase())?;
                }
                Ok(())
            }
        }

        let mut upper_writer;
        let writer = if f.alternate() {
            upper_writer = UpperWriter(f);
            &mut upper_writer as &mut dyn fmt::Write
        } else {
            f as &mut dyn fmt::Write
        };
        let mut bech32_writer =
            bech32::Bech32Writer::new(self.network.bech32_hrp(), variant, writer)?;
        let ver_u5 = u5::try_from_u8(version).map_err(|_| fmt::Error)?;
        bech32::WriteBase32::write_u5(&mut bech32_writer, ver_u5)?;
        bech32::ToBase32::write_base32(&prog, &mut bech32_writer)?;
        bech32_writer.finalize()
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_base58 = || -> Result<Self, Self::Err> {
            if s.len() > 50 {
                return Err(AddressParseError::InvalidLength(s.len() * 11 / 15));
            }
            let data = bs58::decode(s).with_check(None).into_vec()?;
            if data.len() != 21 {
                return Err(AddressParseError::InvalidLength(data.len()));
            }

            let mut hash = [0u8; 20];
            hash.copy_from_slice(&data[1..]);
            let network = match data[0] {
                PUBKEY_ADDRESS_PREFIX_MAIN | SCRIPT_ADDRESS_PREFIX_MAIN => AddressNetwork::Mainnet,
                PUBKEY_ADDRESS_PREFIX_TEST | SCRIPT_ADDRESS_PREFIX_TEST => AddressNetwork::Testnet,
                x => return Err(AddressParseError::InvalidAddressVersion(x)),
            };
            let payload = match data[0] {
                PUBKEY_ADDRESS_PREFIX_MAIN | PUBKEY_ADDRESS_PREFIX_TEST => {
                    AddressPayload::Pkh(PubkeyHash::from(hash))
                }
                _ => AddressPayload::Sh(ScriptHash::from(hash)),
            };

            Ok(Address::new(payload, network))
        };

        let parse_bech32 = |network: AddressNetwork,
                            payload: Vec<u5>,
                            variant: bech32::Variant|
         -> Result<Self, Self::Err> {
            let Some((version, p5)) = payload.split_first() else {
                return Err(AddressParseError::UnrecognizableFormat(s.to_owned()));
            };
            let version = version.to_u8();
            if version > 16 {
                return Err(AddressParseError::InvalidWitnessVersion(version));
            }
            let program: Vec<u8> = bech32::FromBase32::from_base32(p5)?;
            let payload = match (version, variant) {
                (0, bech32::Variant::Bech32) if program.len() == 20 => {
                    let mut hash = [0u8; 20];
                    hash.copy_from_slice(&program);
                    AddressPayload::Wpkh(hash.into())
                }
                (0, bech32::Variant::Bech32) if program.len() == 32 => {
                    let mut hash = [0u8; 32];
                    hash.copy_from_slice(&program);
                    AddressPayload::Wsh(hash.into())
                }
                (0, bech32::Variant::Bech32) => {
                    return Err(AddressParseError::InvalidProgramLength(program.len()));
                }
                (1, bech32::Variant::Bech32m) if program.len() == 32 => {
                    let mut key = [0u8; 32];
                    key.copy_from_slice(&program);
                    let pk = OutputPk::from_byte_array(key)?;
                    AddressPayload::Tr(pk)
                }

                (1, bech32::Variant::Bech32m) => {
                    return Err(AddressParseError::FutureTaprootVersion(
                        program.len(),
                        s.to_owned(),
                    ));
                }

                (0 | 1, wrong) => {
                    return Err(AddressParseError::InvalidBech32Variant(wrong));
                }

                (future, _) => return Err(AddressParseError::FutureWitnessVersion(future)),
            };
            Ok(Address::new(payload, network))
        };

        match bech32::decode(s) {
            Ok((hrp, payload, variant)) => match AddressNetwork::from_bech32_hrp(&hrp) {
                Some(network) => parse_bech32(network, payload, variant),
                None => Err(AddressParseError::UnrecognizableFormat(s.to_owned())),
            },
            Err(_) => parse_base58(),
        }
    }
}

/// Internal address content. Consists of serialized hashes or x-only key value.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum AddressPayload {
    /// P2PKH payload.
    #[from]
    Pkh(PubkeyHash),

    /// P2SH and SegWit nested (proprietary) P2WPKH/WSH-in-P2SH payloads.
    #[from]
    Sh(ScriptHash),

    /// P2WPKH payload.
    #[from]
    Wpkh(WPubkeyHash),

    /// P2WSH payload.
    #[from]
    Wsh(WScriptHash),

    /// P2TR payload.
    #[from]
    Tr(OutputPk),
}

impl AddressPayload {
    /// Constructs [`Address`] from the payload.
    pub fn into_address(self, network: AddressNetwork) -> Address { Address::new(self, network) }

    /// Constructs payload from a given `scriptPubkey`. Fails on future
    /// (post-taproot) witness types, bare and data carrier scripts.
    pub fn from_script(script: &ScriptPubkey) -> Result<Self, AddressError> {
        Ok(if script.is_p2pkh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[3..23]);
            AddressPayload::Pkh(PubkeyHash::from(bytes))
        } else if script.is_p2sh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[2..22]);
            AddressPayload::Sh(ScriptHash::from(bytes))
        } else if script.is_p2wpkh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Wpkh(WPubkeyHash::from(bytes))
        } else if script.is_p2wsh() {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Wsh(WScriptHash::from(bytes))
        } else if script.is_p2tr() {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Tr(
                OutputPk::from_byte_array(bytes).map_err(|_| AddressError::InvalidTaprootKey)?,
            )
        } else {
            return Err(AddressError::UnsupportedScriptPubkey);
        })
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> ScriptPubkey {
        match self {
            AddressPayload::Pkh(hash) => ScriptPubkey::p2pkh(hash),
            AddressPayload::Sh(hash) => ScriptPubkey::p2sh(hash),
            AddressPayload::Wpkh(hash) => ScriptPubkey::p2wpkh(hash),
            AddressPayload::Wsh(hash) => ScriptPubkey::p2wsh(hash),
            AddressPayload::Tr(output_key) => ScriptPubkey::p2tr_tweaked(output_key),
        }
    }

    /// Detects address type.
    pub fn address_type(self) -> AddressType {
        match self {
            AddressPayload::Pkh(_) => AddressType::P2pkh,
            AddressPayload::Sh(_) => AddressType::P2sh,
            AddressPayload::Wpkh(_) => AddressType::P2wpkh,
            AddressPayload::Wsh(_) => AddressType::P2wsh,
            AddressPayload::Tr(_) => AddressType::P2tr,
        }
    }
}

impl From<AddressPayload> for ScriptPubkey {
    fn from(ap: AddressPayload) -> Self { ap.script_pubkey() }
}

/// Address type
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum AddressType {
    /// Pay-to-public key hash
    #[display("P2PKH")]
    P2pkh,

    /// Pay-to-script hash
    #[display("P2SH")]
    P2sh,

    /// Pay-to-witness public key hash
    #[display("P2WPKH")]
    P2wpkh,

    /// Pay-to-witness script hash
    #[display("P2WSH")]
    P2wsh,

    /// Pay-to-taproot
    #[display("P2TR")]
    P2tr,
}

impl AddressType {
    /// Returns witness version used by the address format.
    /// Returns `None` for pre-SegWit address formats.
    pub fn witness_version(self) -> Option<u8> {
        match self {
            AddressType::P2pkh | AddressType::P2sh => None,
            AddressType::P2wpkh | AddressType::P2wsh => Some(0),
            AddressType::P2tr => Some(1),
        }
    }
}

impl FromStr for AddressType {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[allow(clippy::match_str_case_mismatch)]
        Ok(match s.to_uppercase().as_str() {
            "P2PKH" => AddressType::P2pkh,
            "P2SH" => AddressType::P2sh,
            "P2WPKH" => AddressType::P2wpkh,
            "P2WSH" => AddressType::P2wsh,
            "P2TR" => AddressType::P2tr,
            _ => return Err(AddressParseError::UnrecognizedAddressType),
        })
    }
}

#[cfg(feature = "serde")]
mod _serde {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    impl Serialize for Address {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s).map_err(|err| {
                de::Error::custom(format!("invalid bitcoin address string representation; {err}"))
            })
        }
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;
    use bc::secp256k1::PublicKey;

    use super::*;
    use crate::Network;

    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn g() -> CompressedPk { CompressedPk::from_str(G).unwrap() }

    #[test]
    fn display_from_str() {
        for addr in [
            "tb1p5kgdjdf99vfa2xwufd2cx2qru468z79s2arn3jf5feg95d9m62gqzpnjjk",
            "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
            "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r",
            "38BW8nqpHSWpkf5sXrQd2xYwvnPJwP59ic",
            "2MyjiCXmqtu2AxSiRCz2VeuYD98bUhXRzNR",
        ] {
            assert_eq!(Address::from_str(addr).unwrap().to_string(), addr);
        }
    }

    #[test]
    fn key_addresses() {
        let addr = Address::p2pkh(g(), Network::Mainnet);
        assert_eq!(addr.to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(addr.address_type(), AddressType::P2pkh);
        let addr = Address::p2pkh(g(), Network::Testnet3);
        assert_eq!(addr.to_string(), "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r");
        let addr = Address::p2wpkh(g(), Network::Mainnet);
        assert_eq!(addr.to_string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(format!("{addr:#}"), "BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4");
        let addr = Address::p2wpkh(g(), Network::Signet);
        assert_eq!(addr.to_string(), "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx");
        assert_eq!(
            Address::from_str("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4").unwrap().payload,
            AddressPayload::Wpkh(g().wpubkey_hash())
        );
    }

    #[test]
    fn uncompressed_p2pkh() {
        let pk = PublicKey::from_str(G).unwrap();
        let addr = Address::p2pkh(LegacyPk::uncompressed(pk), AddressNetwork::Mainnet);
        assert_eq!(addr.to_string(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn nested_segwit() {
        let redeem = RedeemScript::from_unchecked(
            Vec::from_hex("001479091972186c449eb1ded22b78e40d009bdf0089").unwrap(),
        );
        let addr = Address::p2sh(&redeem, AddressNetwork::Mainnet);
        assert_eq!(addr.to_string(), "38BW8nqpHSWpkf5sXrQd2xYwvnPJwP59ic");
        assert_eq!(
            addr.script_pubkey().to_vec(),
            Vec::from_hex("a9144733f37cf4db86fbc2efed2500b4f4e49f31202387").unwrap()
        );
        assert!(Address::p2sh_wpkh(g(), AddressNetwork::Testnet).to_string().starts_with('2'));
    }

    #[test]
    fn taproot() {
        // BIP86 first receiving address
        let internal_pk = InternalPk::from_str(
            "cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115",
        )
        .unwrap();
        let addr = Address::p2tr(internal_pk, None, Network::Mainnet);
        assert_eq!(addr.to_string(), "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr");
        assert_eq!(
            addr.script_pubkey().to_vec(),
            Vec::from_hex("5120a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c")
                .unwrap()
        );
        assert_eq!(Address::with(&addr.script_pubkey(), Network::Mainnet), Ok(addr));
    }

    #[test]
    fn invalid() {
        // v0 program with bech32m checksum
        assert!(Address::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kemeawh").is_err());
        // broken base58 checksum
        assert!(matches!(
            Address::from_str("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ"),
            Err(AddressParseError::Base58(_))
        ));
        assert_eq!(
            AddressPayload::from_script(&ScriptPubkey::op_return(b"data").unwrap()),
            Err(AddressError::UnsupportedScriptPubkey)
        );
        assert_eq!("p2tr".parse(), Ok(AddressType::P2tr));
        assert_eq!(AddressType::P2wsh.witness_version(), Some(0));
    }
}
