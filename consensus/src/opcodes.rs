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

//! Closed set of script opcodes.
//!
//! Data pushes of 1 to 75 bytes use the length itself as the opcode byte and are not part of
//! [`OpCode`]; see [`crate::ScriptElement`] for the element-level view of a script.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::ScriptError;

macro_rules! opcodes {
    ($($(#[$attr:meta])* $variant:ident = $code:literal => $asm:literal),+ $(,)?) => {
        /// Script opcodes, including the disabled ones which may still appear inside of script
        /// bytes.
        #[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
        #[cfg_attr(
            feature = "serde",
            derive(Serialize, Deserialize),
            serde(crate = "serde_crate")
        )]
        #[repr(u8)]
        pub enum OpCode {
            $($(#[$attr])* $variant = $code,)+
        }

        impl OpCode {
            /// All known opcodes in the order of their byte values.
            pub const ALL: &'static [OpCode] = &[$(OpCode::$variant),+];

            /// Constructs opcode from its byte value. Returns `None` for direct push lengths
            /// (`0x01..=0x4b`) and for undefined byte values (`0xbb..`).
            pub fn from_u8(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(OpCode::$variant),)+
                    _ => None,
                }
            }

            /// Canonical assembly name of the opcode.
            pub const fn name(self) -> &'static str {
                match self {
                    $(OpCode::$variant => $asm,)+
                }
            }
        }
    };
}

opcodes! {
    /// Push an empty byte string.
    PushBytes0 = 0x00 => "OP_0",
    PushData1 = 0x4c => "OP_PUSHDATA1",
    PushData2 = 0x4d => "OP_PUSHDATA2",
    PushData4 = 0x4e => "OP_PUSHDATA4",
    PushNumNeg1 = 0x4f => "OP_1NEGATE",
    Reserved = 0x50 => "OP_RESERVED",
    PushNum1 = 0x51 => "OP_1",
    PushNum2 = 0x52 => "OP_2",
    PushNum3 = 0x53 => "OP_3",
    PushNum4 = 0x54 => "OP_4",
    PushNum5 = 0x55 => "OP_5",
    PushNum6 = 0x56 => "OP_6",
    PushNum7 = 0x57 => "OP_7",
    PushNum8 = 0x58 => "OP_8",
    PushNum9 = 0x59 => "OP_9",
    PushNum10 = 0x5a => "OP_10",
    PushNum11 = 0x5b => "OP_11",
    PushNum12 = 0x5c => "OP_12",
    PushNum13 = 0x5d => "OP_13",
    PushNum14 = 0x5e => "OP_14",
    PushNum15 = 0x5f => "OP_15",
    PushNum16 = 0x60 => "OP_16",
    Nop = 0x61 => "OP_NOP",
    Ver = 0x62 => "OP_VER",
    If = 0x63 => "OP_IF",
    NotIf = 0x64 => "OP_NOTIF",
    VerIf = 0x65 => "OP_VERIF",
    VerNotIf = 0x66 => "OP_VERNOTIF",
    Else = 0x67 => "OP_ELSE",
    EndIf = 0x68 => "OP_ENDIF",
    Verify = 0x69 => "OP_VERIFY",
    /// Marks output as unspendable data carrier.
    Return = 0x6a => "OP_RETURN",
    ToAltStack = 0x6b => "OP_TOALTSTACK",
    FromAltStack = 0x6c => "OP_FROMALTSTACK",
    Drop2 = 0x6d => "OP_2DROP",
    Dup2 = 0x6e => "OP_2DUP",
    Dup3 = 0x6f => "OP_3DUP",
    Over2 = 0x70 => "OP_2OVER",
    Rot2 = 0x71 => "OP_2ROT",
    Swap2 = 0x72 => "OP_2SWAP",
    IfDup = 0x73 => "OP_IFDUP",
    Depth = 0x74 => "OP_DEPTH",
    Drop = 0x75 => "OP_DROP",
    Dup = 0x76 => "OP_DUP",
    Nip = 0x77 => "OP_NIP",
    Over = 0x78 => "OP_OVER",
    Pick = 0x79 => "OP_PICK",
    Roll = 0x7a => "OP_ROLL",
    Rot = 0x7b => "OP_ROT",
    Swap = 0x7c => "OP_SWAP",
    Tuck = 0x7d => "OP_TUCK",
    Cat = 0x7e => "OP_CAT",
    Substr = 0x7f => "OP_SUBSTR",
    Left = 0x80 => "OP_LEFT",
    Right = 0x81 => "OP_RIGHT",
    Size = 0x82 => "OP_SIZE",
    Invert = 0x83 => "OP_INVERT",
    And = 0x84 => "OP_AND",
    Or = 0x85 => "OP_OR",
    Xor = 0x86 => "OP_XOR",
    Equal = 0x87 => "OP_EQUAL",
    EqualVerify = 0x88 => "OP_EQUALVERIFY",
    Reserved1 = 0x89 => "OP_RESERVED1",
    Reserved2 = 0x8a => "OP_RESERVED2",
    Add1 = 0x8b => "OP_1ADD",
    Sub1 = 0x8c => "OP_1SUB",
    Mul2 = 0x8d => "OP_2MUL",
    Div2 = 0x8e => "OP_2DIV",
    Negate = 0x8f => "OP_NEGATE",
    Abs = 0x90 => "OP_ABS",
    Not = 0x91 => "OP_NOT",
    NotEqual0 = 0x92 => "OP_0NOTEQUAL",
    Add = 0x93 => "OP_ADD",
    Sub = 0x94 => "OP_SUB",
    Mul = 0x95 => "OP_MUL",
    Div = 0x96 => "OP_DIV",
    Mod = 0x97 => "OP_MOD",
    LShift = 0x98 => "OP_LSHIFT",
    RShift = 0x99 => "OP_RSHIFT",
    BoolAnd = 0x9a => "OP_BOOLAND",
    BoolOr = 0x9b => "OP_BOOLOR",
    NumEqual = 0x9c => "OP_NUMEQUAL",
    NumEqualVerify = 0x9d => "OP_NUMEQUALVERIFY",
    NumNotEqual = 0x9e => "OP_NUMNOTEQUAL",
    LessThan = 0x9f => "OP_LESSTHAN",
    GreaterThan = 0xa0 => "OP_GREATERTHAN",
    LessThanOrEqual = 0xa1 => "OP_LESSTHANOREQUAL",
    GreaterThanOrEqual = 0xa2 => "OP_GREATERTHANOREQUAL",
    Min = 0xa3 => "OP_MIN",
    Max = 0xa4 => "OP_MAX",
    Within = 0xa5 => "OP_WITHIN",
    Ripemd160 = 0xa6 => "OP_RIPEMD160",
    Sha1 = 0xa7 => "OP_SHA1",
    Sha256 = 0xa8 => "OP_SHA256",
    Hash160 = 0xa9 => "OP_HASH160",
    Hash256 = 0xaa => "OP_HASH256",
    CodeSeparator = 0xab => "OP_CODESEPARATOR",
    CheckSig = 0xac => "OP_CHECKSIG",
    CheckSigVerify = 0xad => "OP_CHECKSIGVERIFY",
    /// Legacy multisig check; consumes one extra stack element.
    CheckMultiSig = 0xae => "OP_CHECKMULTISIG",
    CheckMultiSigVerify = 0xaf => "OP_CHECKMULTISIGVERIFY",
    Nop1 = 0xb0 => "OP_NOP1",
    CheckLockTimeVerify = 0xb1 => "OP_CHECKLOCKTIMEVERIFY",
    CheckSequenceVerify = 0xb2 => "OP_CHECKSEQUENCEVERIFY",
    Nop4 = 0xb3 => "OP_NOP4",
    Nop5 = 0xb4 => "OP_NOP5",
    Nop6 = 0xb5 => "OP_NOP6",
    Nop7 = 0xb6 => "OP_NOP7",
    Nop8 = 0xb7 => "OP_NOP8",
    Nop9 = 0xb8 => "OP_NOP9",
    Nop10 = 0xb9 => "OP_NOP10",
    /// Tapscript-only signature counter (BIP342).
    CheckSigAdd = 0xba => "OP_CHECKSIGADD",
}

impl OpCode {
    /// Returns opcode pushing small integer `n` to the stack, if such opcode exists
    /// (`OP_0`, `OP_1NEGATE` and `OP_1`..`OP_16`).
    pub fn push_num(n: i64) -> Option<Self> {
        match n {
            0 => Some(OpCode::PushBytes0),
            -1 => Some(OpCode::PushNumNeg1),
            1..=16 => OpCode::from_u8(OpCode::PushNum1 as u8 + n as u8 - 1),
            _ => None,
        }
    }

    /// Returns small integer value pushed by this opcode, if it is a numeric push opcode.
    pub fn num_value(self) -> Option<i64> {
        match self {
            OpCode::PushBytes0 => Some(0),
            OpCode::PushNumNeg1 => Some(-1),
            op if (OpCode::PushNum1..=OpCode::PushNum16).contains(&op) => {
                Some((op as u8 - OpCode::PushNum1 as u8 + 1) as i64)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn to_u8(self) -> u8 { self as u8 }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for OpCode {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_uppercase();
        let op = match name.as_str() {
            "OP_FALSE" => OpCode::PushBytes0,
            "OP_TRUE" => OpCode::PushNum1,
            "OP_NOP2" => OpCode::CheckLockTimeVerify,
            "OP_NOP3" => OpCode::CheckSequenceVerify,
            name => OpCode::ALL
                .iter()
                .copied()
                .find(|op| op.name() == name)
                .ok_or_else(|| ScriptError::UnknownOpcode(s.to_owned()))?,
        };
        Ok(op)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::from_str(op.name()).unwrap(), *op);
            assert_eq!(OpCode::from_u8(*op as u8), Some(*op));
        }
    }

    #[test]
    fn aliases() {
        assert_eq!(OpCode::from_str("OP_TRUE").unwrap(), OpCode::PushNum1);
        assert_eq!(OpCode::from_str("op_false").unwrap(), OpCode::PushBytes0);
        assert_eq!(OpCode::from_str("OP_NOP3").unwrap(), OpCode::CheckSequenceVerify);
        assert_eq!(OpCode::CheckSigAdd as u8, 0xba);
    }

    #[test]
    fn unknown_name() {
        assert_eq!(
            OpCode::from_str("OP_FOO"),
            Err(ScriptError::UnknownOpcode(s!("OP_FOO")))
        );
        assert_eq!(OpCode::from_u8(0x14), None);
        assert_eq!(OpCode::from_u8(0xbb), None);
    }

    #[test]
    fn small_numbers() {
        assert_eq!(OpCode::push_num(0), Some(OpCode::PushBytes0));
        assert_eq!(OpCode::push_num(16), Some(OpCode::PushNum16));
        assert_eq!(OpCode::push_num(-1), Some(OpCode::PushNumNeg1));
        assert_eq!(OpCode::push_num(17), None);
        assert_eq!(OpCode::PushNum5.num_value(), Some(5));
        assert_eq!(OpCode::Dup.num_value(), None);
    }
}
