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

use std::str::FromStr;

use txsign::{Sats, ScriptCode, SighashCache, SighashType, Tx, WPubkeyHash};

const NATIVE_P2WPKH_TX: &str = "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4\
                                e4ad969f0000000000eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309f\
                                e287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a91482\
                                80b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143b\
                                de42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000";

fn p2wpkh_digest(amount: u64) -> String {
    let tx = Tx::from_str(NATIVE_P2WPKH_TX).unwrap();
    let cache = SighashCache::new(tx);
    let hash = WPubkeyHash::from_str("1d0f172a0ecb48aee1be1f2687d2963ae33f71a1").unwrap();
    let script_code = ScriptCode::with_p2wpkh(hash);
    cache
        .segwit_sighash(1, &script_code, Sats::from_sats(amount), SighashType::all())
        .unwrap()
        .to_string()
}

/// Case: native P2WPKH example from BIP143, second input spending 6 BTC
#[test]
fn native_p2wpkh() {
    assert_eq!(
        p2wpkh_digest(600_000_000),
        "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
    );
}

/// Case: the digest commits to the spent amount; a single satoshi changes it
#[test]
fn amount_commitment() {
    let digest = p2wpkh_digest(600_000_000);
    assert_eq!(digest, p2wpkh_digest(600_000_000));
    assert_ne!(digest, p2wpkh_digest(600_000_001));
    assert_ne!(digest, p2wpkh_digest(599_999_999));
}

/// Case: script code for P2WPKH is the P2PKH script of the same key hash
#[test]
fn p2wpkh_script_code() {
    let hash = WPubkeyHash::from_str("1d0f172a0ecb48aee1be1f2687d2963ae33f71a1").unwrap();
    assert_eq!(
        ScriptCode::with_p2wpkh(hash).to_string(),
        "76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac"
    );
}
