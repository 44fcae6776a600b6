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

/// Classification of failures shared by all error types of the workspace.
///
/// Each concrete error type exposes its kind with a `kind()` method, so callers may react on the
/// failure class without matching on the concrete error variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(Debug)]
pub enum ErrorKind {
    /// Script assembly refers to an opcode name which does not exist.
    UnknownOpcode,
    /// Data push exceeds 520 bytes.
    OversizedPush,
    /// Number of prevout scripts or amounts doesn't match number of transaction inputs.
    SigningContextMismatch,
    /// Requested leaf is not part of the taproot tree.
    LeafNotFound,
    /// Sighash type byte is not one of the defined values.
    InvalidSighashType,
    /// Witness-flagged transaction has a number of witnesses different from number of inputs.
    WitnessAlignmentError,
    /// Control block length, leaf version or internal key is invalid.
    MalformedControlBlock,
    /// Input index lies outside of the transaction inputs.
    InvalidInputIndex,
    /// `SIGHASH_SINGLE` taproot digest requested for an input without matching output.
    NoSingleOutput,
    /// Consensus-encoded data can't be decoded.
    MalformedData,
    /// Public key or signature data are invalid.
    InvalidKey,
    /// Taproot tree construction error.
    InvalidTree,
    /// Materials provided for witness assembly don't match the declared spend type.
    SpendMismatch,
    /// External signer declined to produce a signature.
    SignerRefused,
}
