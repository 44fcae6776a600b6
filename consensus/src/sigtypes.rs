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

use secp256k1::{ecdsa, schnorr};

use crate::{ErrorKind, InvalidSighashType, SighashType};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum SigError {
    /// empty signature.
    EmptySignature,

    /// invalid length of BIP340 signature {0}; expected 64 or 65 bytes.
    Bip340Encoding(usize),

    /// invalid DER encoding of ECDSA signature.
    DerEncoding,

    /// BIP340 signature with explicit SIGHASH_DEFAULT byte.
    DefaultSighashByte,

    /// invalid signature data.
    InvalidSignature,

    #[from]
    #[display(inner)]
    SighashType(InvalidSighashType),
}

impl SigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SigError::SighashType(_) => ErrorKind::InvalidSighashType,
            _ => ErrorKind::MalformedData,
        }
    }
}

/// ECDSA signature with the sighash type byte, as used in scriptSig and segwit v0 witnesses.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct LegacySig {
    /// The underlying ECDSA Signature
    pub sig: ecdsa::Signature,
    /// The corresponding hash type
    pub sighash_type: SighashType,
}

impl LegacySig {
    /// Constructs an ECDSA bitcoin signature for [`SighashType::all()`].
    pub fn sighash_all(sig: ecdsa::Signature) -> LegacySig {
        LegacySig {
            sig,
            sighash_type: SighashType::all(),
        }
    }

    /// Deserializes from slice following the standardness rules for [`SighashType`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigError> {
        let (hash_ty, sig) = bytes.split_last().ok_or(SigError::EmptySignature)?;
        let sighash_type = SighashType::from_consensus_u8(*hash_ty)?;
        let sig = ecdsa::Signature::from_der(sig).map_err(|_| SigError::DerEncoding)?;
        Ok(LegacySig { sig, sighash_type })
    }

    /// Serializes signature in DER with the sighash type byte appended.
    pub fn to_vec(self) -> Vec<u8> {
        let mut ser = self.sig.serialize_der().to_vec();
        ser.push(self.sighash_type.to_consensus_u8());
        ser
    }
}

/// BIP340 signature with an optional sighash type byte.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Bip340Sig {
    /// The underlying schnorr signature
    pub sig: schnorr::Signature,
    /// The corresponding hash type; `None` means the default (`0x00`) mode.
    pub sighash_type: Option<SighashType>,
}

impl Bip340Sig {
    /// Constructs a signature for the default sighash mode.
    pub fn sighash_default(sig: schnorr::Signature) -> Self {
        Bip340Sig {
            sig,
            sighash_type: None,
        }
    }

    /// Deserializes from 64-byte (default mode) or 65-byte (explicit sighash) slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigError> {
        let (sig, sighash_type) = match bytes.len() {
            0 => return Err(SigError::EmptySignature),
            64 => (bytes, None),
            65 => match SighashType::from_taproot_u8(bytes[64])? {
                Some(ty) => (&bytes[..64], Some(ty)),
                None => return Err(SigError::DefaultSighashByte),
            },
            invalid => return Err(SigError::Bip340Encoding(invalid)),
        };
        let sig = schnorr::Signature::from_slice(sig).map_err(|_| SigError::InvalidSignature)?;
        Ok(Bip340Sig { sig, sighash_type })
    }

    /// Serializes signature, appending sighash byte only for non-default modes.
    pub fn to_vec(self) -> Vec<u8> {
        let mut ser = self.sig.serialize().to_vec();
        if let Some(sighash_type) = self.sighash_type {
            ser.push(sighash_type.to_consensus_u8())
        }
        ser
    }
}

#[cfg(test)]
mod test {
    use secp256k1::{Keypair, Message, SecretKey, SECP256K1};

    use super::*;

    #[test]
    fn legacy_sig() {
        let sk = SecretKey::from_slice(&[0x01; 32]).unwrap();
        let sig = sk.sign_ecdsa(Message::from_digest([0xAB; 32]));
        let legacy = LegacySig {
            sig,
            sighash_type: SighashType::single_anyone_can_pay(),
        };
        let bytes = legacy.to_vec();
        assert_eq!(bytes.last(), Some(&0x83));
        assert_eq!(LegacySig::from_bytes(&bytes), Ok(legacy));
        assert_eq!(LegacySig::from_bytes(&[]), Err(SigError::EmptySignature));
        assert_eq!(LegacySig::from_bytes(&[0x30, 0x01]), Err(SigError::DerEncoding));
        let mut bad_ty = bytes.clone();
        *bad_ty.last_mut().unwrap() = 0x00;
        assert_eq!(LegacySig::from_bytes(&bad_ty).unwrap_err().kind(), ErrorKind::InvalidSighashType);
    }

    #[test]
    fn bip340_sig() {
        let keypair = Keypair::from_seckey_slice(SECP256K1, &[0x02; 32]).unwrap();
        let sig = keypair.sign_schnorr(&[0xCD; 32]);

        let default = Bip340Sig::sighash_default(sig);
        assert_eq!(default.to_vec().len(), 64);
        assert_eq!(Bip340Sig::from_bytes(&default.to_vec()), Ok(default));

        let all = Bip340Sig {
            sig,
            sighash_type: Some(SighashType::all()),
        };
        let bytes = all.to_vec();
        assert_eq!(bytes.len(), 65);
        assert_eq!(Bip340Sig::from_bytes(&bytes), Ok(all));

        let mut explicit_default = bytes.clone();
        explicit_default[64] = 0x00;
        assert_eq!(Bip340Sig::from_bytes(&explicit_default), Err(SigError::DefaultSighashByte));
        assert_eq!(Bip340Sig::from_bytes(&bytes[..63]), Err(SigError::Bip340Encoding(63)));
    }
}
