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

//! Bitcoin transaction signing core: transaction model and serialization, legacy, BIP143 and
//! BIP341 signature digests, addresses, taproot trees and witness assembly.
//!
//! The crate re-exports all the workspace crates under a single namespace and provides
//! [`Error`] type unifying their errors.

#[macro_use]
extern crate amplify;

mod error;
#[cfg(feature = "signers")]
mod signers;

pub use bc::{secp256k1, *};
pub use error::Error;
pub use invoice::*;
pub use signer::{
    taptree, ControlBlockFactory, FinalizedTree, InputDigest, InputSpend, InvalidTree, LeafInfo,
    LeafNotFound, SessionError, Sign, SigningSession, SigningState, SpendWitness, TapOutput,
    TapTree, TapTreeBuilder, UnfinalizedTree, WitnessError,
};
#[cfg(feature = "signers")]
pub use signers::KeySigner;
