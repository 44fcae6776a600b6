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

use amplify::hex::{FromHex, ToHex};
use txsign::{
    Address, AddressNetwork, ControlBlock, ErrorKind, InternalPk, LeafScript, Parity, TapOutput,
    TapScript, TapTree,
};

fn tap_script(hex: &str) -> TapScript { TapScript::from_hex(hex).unwrap() }

/// Case: key-only output without script tree
#[test]
fn key_only_output() {
    let internal_pk =
        InternalPk::from_str("d6889cb081036e0faefa3a35157ad71086b123b2b144b649798b494c300a961d")
            .unwrap();
    let output = TapOutput::key_only(internal_pk);
    assert!(output.tree().is_none());
    assert_eq!(output.merkle_root(), None);
    assert_eq!(
        output.output_pk().to_string(),
        "53a1f6e454df1aa2776a2814a721372d6258050de330b3c6d10ee8f4e0dda343"
    );
    assert_eq!(
        output.script_pubkey().to_string(),
        "512053a1f6e454df1aa2776a2814a721372d6258050de330b3c6d10ee8f4e0dda343"
    );
    assert_eq!(output.control_blocks().count(), 0);

    let script = LeafScript::from_tap_script(tap_script("51"));
    let err = output.control_block(&script).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LeafNotFound);

    let address = Address::p2tr(internal_pk, None, AddressNetwork::Mainnet);
    assert_eq!(
        address.to_string(),
        "bc1p2wsldez5mud2yam29q22wgfh9439spgduvct83k3pm50fcxa5dps59h4z5"
    );
    assert_eq!(address.script_pubkey(), output.script_pubkey());
}

/// Case: output committing to a single leaf
#[test]
fn single_leaf_output() {
    let internal_pk =
        InternalPk::from_str("187791b6f712a8ea41c8ecdd0ee77fab3e85263b37e1ec18a3651926b3a6cf27")
            .unwrap();
    let script =
        tap_script("20d85a959b0290bf19bb89ed43c916be835475d013da4b362117393e25a48229b8ac");
    let tree = TapTree::with_single_leaf(script.clone());
    let output = TapOutput::with_tree(internal_pk, tree);

    let merkle_root = output.merkle_root().unwrap();
    assert_eq!(
        merkle_root.to_string(),
        "5b75adecf53548f3ec6ad7d78383bf84cc57b55a3127c72b9a2481752dd88b21"
    );
    assert_eq!(
        output.output_pk().to_string(),
        "147c9c57132f6e7ecddba9800bb0c4449251c92a1e60371ee77557b6620f3ea3"
    );
    assert_eq!(output.parity(), Parity::Odd);

    let leaf = LeafScript::from_tap_script(script);
    let cb = output.control_block(&leaf).unwrap();
    assert_eq!(
        cb.to_vec().to_hex(),
        "c1187791b6f712a8ea41c8ecdd0ee77fab3e85263b37e1ec18a3651926b3a6cf27"
    );
    assert!(cb.verify(output.output_pk(), &leaf.script));

    let address = Address::p2tr(internal_pk, Some(merkle_root), AddressNetwork::Mainnet);
    assert_eq!(
        address.to_string(),
        "bc1pz37fc4cn9ah8anwm4xqqhvxygjf9rjf2resrw8h8w4tmvcs0863sa2e586"
    );
    assert_eq!(Address::from_str(&address.to_string()).unwrap(), address);
}

/// Case: output committing to two leaves at depth one
#[test]
fn two_leaves_output() {
    let internal_pk =
        InternalPk::from_str("93478e9488f956df2396be2ce6c5cced75f900dfa18e7dabd2428aae78451820")
            .unwrap();
    let scripts = [
        tap_script("20b617298552a72ade070667e86ca63b8f5789a9fe8731ef91202a91c9f3459007ac"),
        tap_script("2044b178d64c32c4a05cc4f4d1407268f764c940d20ce97abfd44db5c3592b72fdac"),
    ];
    let tree = TapTree::with_leaves(scripts.clone()).unwrap();
    assert_eq!(tree.iter().map(|leaf| leaf.depth).collect::<Vec<_>>(), vec![1, 1]);
    let output = TapOutput::with_tree(internal_pk, tree);

    assert_eq!(
        output.merkle_root().unwrap().to_string(),
        "866bab2d78498a1e4bfa5f7463fdcecb5909ed10b38589de9266171e08e7210b"
    );
    assert_eq!(
        output.output_pk().to_string(),
        "60ffd21d193773b20dfd94373ed445204f02ccb06318e62f4229b1f1eddc6437"
    );
    assert_eq!(output.parity(), Parity::Odd);
    assert_eq!(
        Address::p2tr(internal_pk, output.merkle_root(), AddressNetwork::Mainnet).to_string(),
        "bc1pvrlay8gexaemyr0ajsmna4z9yp8s9n9svvvwvt6z9xclrmwuvsmsd2lmcr"
    );

    let blocks = output.control_blocks().collect::<Vec<_>>();
    assert_eq!(blocks.len(), 2);
    // each leaf proves itself with the hash of its sibling
    assert_eq!(
        blocks[0].0.to_vec().to_hex(),
        "c193478e9488f956df2396be2ce6c5cced75f900dfa18e7dabd2428aae78451820\
         64512fecdb5afa04f98839b50e6f0cb7b1e539bf6f205f67934083cdcc3c8d89"
    );
    assert_eq!(
        blocks[1].0.to_vec().to_hex(),
        "c193478e9488f956df2396be2ce6c5cced75f900dfa18e7dabd2428aae78451820\
         c525714a7f49c28aedbbba78c005931a81c234b2f6c99a73e4d06082adc8bf2b"
    );
    for ((cb, leaf), script) in blocks.iter().zip(scripts) {
        assert_eq!(leaf, &LeafScript::from_tap_script(script));
        assert!(cb.verify(output.output_pk(), &leaf.script));
        assert_eq!(&ControlBlock::from_bytes(cb.to_vec()).unwrap(), cb);
    }
    assert!(!blocks[0].0.verify(output.output_pk(), &blocks[1].1.script));
}

/// Case: control block parsing rejects malformed data
#[test]
fn malformed_control_block() {
    let mut bytes = Vec::<u8>::from_hex(
        "c1187791b6f712a8ea41c8ecdd0ee77fab3e85263b37e1ec18a3651926b3a6cf27",
    )
    .unwrap();
    assert!(ControlBlock::from_bytes(&bytes).is_ok());

    bytes.push(0x00);
    let err = ControlBlock::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedControlBlock);

    bytes.truncate(20);
    assert!(ControlBlock::from_bytes(&bytes).is_err());

    let mut path = vec![0xc0];
    path.extend([0x11; 32]);
    path.extend([0x22; 32 * 129]);
    let err = ControlBlock::from_bytes(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedControlBlock);
}
