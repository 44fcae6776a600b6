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

use bc::{
    AnnexError, ConsensusDecodeError, ControlBlockError, ErrorKind, InvalidPubkey,
    InvalidSighashType, PubkeyParseError, ScriptError, SigError, SighashError, TxError,
    TxParseError,
};
use invoice::{AddressError, AddressParseError};
use signer::{InvalidTree, LeafNotFound, SessionError, WitnessError};

/// Any error produced by the workspace crates.
///
/// Use [`Error::kind`] to react on the failure class without matching on the concrete error.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(inner)]
pub enum Error {
    #[from]
    Script(ScriptError),

    #[from]
    Tx(TxError),

    #[from]
    TxParse(TxParseError),

    #[from]
    Decode(ConsensusDecodeError),

    #[from]
    Sighash(SighashError),

    #[from]
    SighashType(InvalidSighashType),

    #[from]
    Signature(SigError),

    #[from]
    Pubkey(InvalidPubkey),

    #[from]
    PubkeyParse(PubkeyParseError),

    #[from]
    ControlBlock(ControlBlockError),

    #[from]
    Annex(AnnexError),

    #[from]
    Address(AddressError),

    #[from]
    AddressParse(AddressParseError),

    #[from]
    Tree(InvalidTree),

    #[from]
    LeafNotFound(LeafNotFound),

    #[from]
    Witness(WitnessError),

    #[from]
    Session(SessionError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Script(err) => err.kind(),
            Error::Tx(err) => err.kind(),
            Error::TxParse(err) => err.kind(),
            Error::Decode(err) => err.kind(),
            Error::Sighash(err) => err.kind(),
            Error::SighashType(err) => err.kind(),
            Error::Signature(err) => err.kind(),
            Error::Pubkey(err) => err.kind(),
            Error::PubkeyParse(err) => err.kind(),
            Error::ControlBlock(err) => err.kind(),
            Error::Annex(err) => err.kind(),
            Error::Address(err) => err.kind(),
            Error::AddressParse(err) => err.kind(),
            Error::Tree(err) => err.kind(),
            Error::LeafNotFound(err) => err.kind(),
            Error::Witness(err) => err.kind(),
            Error::Session(err) => err.kind(),
        }
    }
}
