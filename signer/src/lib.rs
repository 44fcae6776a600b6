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

//! Signing layer on top of the consensus primitives: taproot script trees with control block
//! construction, witness assembly for each supported spend type and a per-input signing session
//! driving an external [`Sign`] implementation.

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod taptree;
mod sign;
mod witness;
mod session;

pub use session::{InputDigest, InputSpend, SessionError, SigningSession, SigningState};
pub use sign::Sign;
pub use taptree::{
    ControlBlockFactory, FinalizedTree, InvalidTree, LeafInfo, LeafNotFound, TapOutput, TapTree,
    TapTreeBuilder, UnfinalizedTree,
};
pub use witness::{SpendWitness, WitnessError};
