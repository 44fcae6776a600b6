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

use amplify::Wrapper;
use bc::secp256k1::{ecdsa, schnorr as bip340, Keypair, Scalar, SecretKey, SECP256K1};
use bc::{
    InternalPk, LegacyPk, Sighash, TapLeafHash, TapMerklePath, TapNodeHash, TapSighash, XOnlyPk,
};
use signer::Sign;

/// Reference signer holding raw secret keys.
///
/// Signs ECDSA inputs for any of its keys, taproot key path spends when `key_path` is set, and
/// script path spends only for the leaf given in `script_path`.
#[derive(Clone)]
pub struct KeySigner {
    pub keys: Vec<SecretKey>,
    pub key_path: bool,
    pub script_path: Option<TapLeafHash>,
}

impl KeySigner {
    pub fn new(keys: impl IntoIterator<Item = SecretKey>) -> Self { Self::with(true, None, keys) }

    pub fn new_legacy(keys: impl IntoIterator<Item = SecretKey>) -> Self {
        Self::with(false, None, keys)
    }

    pub fn new_script_spent(
        leaf: impl Into<TapLeafHash>,
        keys: impl IntoIterator<Item = SecretKey>,
    ) -> Self {
        Self::with(false, Some(leaf.into()), keys)
    }

    pub fn with(
        key_path: bool,
        script_path: Option<TapLeafHash>,
        keys: impl IntoIterator<Item = SecretKey>,
    ) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            key_path,
            script_path,
        }
    }

    fn keypair(&self, pk: XOnlyPk) -> Option<Keypair> {
        self.keys
            .iter()
            .map(|sk| Keypair::from_secret_key(SECP256K1, sk))
            .find(|keypair| keypair.x_only_public_key().0 == pk.into_inner())
    }
}

impl Sign for KeySigner {
    fn sign_ecdsa(&self, message: Sighash, pk: LegacyPk) -> Option<ecdsa::Signature> {
        let sk = self.keys.iter().find(|sk| sk.public_key(SECP256K1) == pk.pubkey)?;
        Some(sk.sign_ecdsa(message.into()))
    }

    fn sign_bip340_key_only(
        &self,
        message: TapSighash,
        pk: InternalPk,
        merkle_root: Option<TapNodeHash>,
    ) -> Option<bip340::Signature> {
        let keypair = self.keypair(pk.to_xonly_pk())?;
        let tweak = Scalar::from_be_bytes(pk.tap_tweak(merkle_root)).ok()?;
        let output_pair = keypair.add_xonly_tweak(SECP256K1, &tweak).ok()?;
        if output_pair.x_only_public_key().0.serialize()
            != pk.to_output_pk(merkle_root).0.to_byte_array()
        {
            return None;
        }
        Some(output_pair.sign_schnorr(&<[u8; 32]>::from(message)))
    }

    fn sign_bip340_script_path(
        &self,
        message: TapSighash,
        pk: XOnlyPk,
    ) -> Option<bip340::Signature> {
        Some(self.keypair(pk)?.sign_schnorr(&<[u8; 32]>::from(message)))
    }

    fn should_sign_script_path(
        &self,
        _index: usize,
        _merkle_path: &TapMerklePath,
        leaf: TapLeafHash,
    ) -> bool {
        self.script_path == Some(leaf)
    }

    fn should_sign_key_path(&self, _index: usize) -> bool { self.key_path }
}
