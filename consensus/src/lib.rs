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

//! Consensus-level bitcoin data structures: scripts, transactions, their consensus encoding and
//! the signature digest algorithms (legacy, BIP143 and BIP341).

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub extern crate secp256k1;

mod error;
pub mod opcodes;
mod coding;
mod hashes;
mod pubkeys;
mod script;
mod tx;
mod sigtypes;
mod taproot;
mod sighash;

pub use coding::{
    ConsensusDataError, ConsensusDecode, ConsensusDecodeError, ConsensusEncode, VarInt,
};
pub use error::ErrorKind;
pub use hashes::{
    hash160, sha256, sha256d, PubkeyHash, ScriptHash, Sighash, Txid, WPubkeyHash, WScriptHash,
    Wtxid,
};
pub use opcodes::OpCode;
pub use pubkeys::{CompressedPk, InvalidPubkey, LegacyPk, PubkeyParseError};
pub use script::{
    RedeemScript, ScriptBytes, ScriptCode, ScriptElement, ScriptError, ScriptPubkey, SigScript,
    TapScript, WitnessScript, MAX_SCRIPT_ELEMENT_SIZE,
};
pub use sighash::{
    InvalidSighashType, SighashCache, SighashError, SighashFlag, SighashType, SigningContext,
};
pub use sigtypes::{Bip340Sig, LegacySig, SigError};
pub use taproot::{
    Annex, AnnexError, ControlBlock, ControlBlockError, FutureLeafVer, InternalPk, IntoTapHash,
    InvalidLeafVer, InvalidParityValue, LeafScript, LeafVer, OutputPk, Parity, TapBranchHash, TapLeafHash,
    TapMerklePath, TapNodeHash, TapSighash, XOnlyPk, TAPROOT_ANNEX_PREFIX, TAPROOT_LEAF_MASK,
    TAPROOT_LEAF_TAPSCRIPT, TAPROOT_MAX_DEPTH,
};
pub use tx::{
    LockTime, Outpoint, RelativeLock, Sats, SeqNo, SeqNoClass, Tx, TxError, TxIn, TxOut,
    TxParseError, TxVer, Vout, Witness, LOCKTIME_THRESHOLD, SEQ_NO_CSV_DISABLE_MASK,
    SEQ_NO_CSV_TYPE_MASK, WITNESS_SCALE_FACTOR,
};
