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

use std::io::{self, Cursor, Read, Write};

use amplify::{Bytes32, IoError, Wrapper};

use crate::ErrorKind;

/// Upper bound for the number of elements or bytes a consensus-encoded collection may declare.
/// Matches the maximum block weight, so no valid transaction may exceed it.
pub const MAX_COLLECTION_LEN: u64 = 4_000_000;

const MAX_PREALLOC: usize = 0x10000;

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ConsensusDataError {
    /// consensus data are followed by some excessive bytes.
    DataNotConsumed,

    /// not a minimally-encoded variable integer.
    NonMinimalVarInt,

    /// collection declares {0} elements, which exceeds the maximum block size.
    OversizedCollection(u64),

    /// unsupported segwit serialization flag {0:#04x}.
    UnsupportedSegwitFlag(u8),
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(inner)]
pub enum ConsensusDecodeError {
    #[from]
    #[from(io::Error)]
    Io(IoError),

    #[from]
    Data(ConsensusDataError),
}

impl ConsensusDecodeError {
    pub fn kind(&self) -> ErrorKind { ErrorKind::MalformedData }
}

/// Variable-length integer used for collection lengths (`CompactSize` in bitcoin core).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display, From)]
#[display(inner)]
pub struct VarInt(#[from] pub u64);

impl VarInt {
    pub const fn new(u: u64) -> Self { VarInt(u) }

    pub const fn with_len(len: usize) -> Self { VarInt(len as u64) }

    pub const fn to_u64(&self) -> u64 { self.0 }

    /// Number of bytes taken by the consensus encoding of the value.
    pub const fn encoded_len(&self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x10000..=0xFFFF_FFFF => 5,
            _ => 9,
        }
    }

    fn to_collection_len(self) -> Result<usize, ConsensusDecodeError> {
        if self.0 > MAX_COLLECTION_LEN {
            return Err(ConsensusDataError::OversizedCollection(self.0).into());
        }
        Ok(self.0 as usize)
    }
}

pub trait ConsensusEncode {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError>;

    fn consensus_serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.consensus_encode(&mut buf).expect("in-memory writing can't fail");
        buf
    }
}

pub trait ConsensusDecode
where Self: Sized
{
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError>;

    fn consensus_deserialize(bytes: impl AsRef<[u8]>) -> Result<Self, ConsensusDecodeError> {
        let bytes = bytes.as_ref();
        let mut cursor = Cursor::new(bytes);
        let me = Self::consensus_decode(&mut cursor)?;
        if cursor.position() as usize != bytes.len() {
            return Err(ConsensusDataError::DataNotConsumed.into());
        }
        Ok(me)
    }
}

macro_rules! impl_le_int {
    ($($ty:ty),+ $(,)?) => {$(
        impl ConsensusEncode for $ty {
            fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
                writer.write_all(&self.to_le_bytes())?;
                Ok(core::mem::size_of::<$ty>())
            }
        }

        impl ConsensusDecode for $ty {
            fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                reader.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    )+};
}

impl_le_int!(u8, u16, u32, u64, i32);

impl ConsensusEncode for VarInt {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        match self.0 {
            0..=0xFC => (self.0 as u8).consensus_encode(writer),
            0xFD..=0xFFFF => {
                0xFDu8.consensus_encode(writer)?;
                (self.0 as u16).consensus_encode(writer).map(|len| len + 1)
            }
            0x10000..=0xFFFF_FFFF => {
                0xFEu8.consensus_encode(writer)?;
                (self.0 as u32).consensus_encode(writer).map(|len| len + 1)
            }
            _ => {
                0xFFu8.consensus_encode(writer)?;
                self.0.consensus_encode(writer).map(|len| len + 1)
            }
        }
    }
}

impl ConsensusDecode for VarInt {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let (val, min) = match u8::consensus_decode(reader)? {
            0xFF => (u64::consensus_decode(reader)?, 0x1_0000_0000),
            0xFE => (u32::consensus_decode(reader)? as u64, 0x10000),
            0xFD => (u16::consensus_decode(reader)? as u64, 0xFD),
            n => return Ok(VarInt(n as u64)),
        };
        if val < min {
            return Err(ConsensusDataError::NonMinimalVarInt.into());
        }
        Ok(VarInt(val))
    }
}

impl ConsensusEncode for Bytes32 {
    fn consensus_encode(&self, writer: &mut impl Write) -> Result<usize, IoError> {
        writer.write_all(&self.into_inner())?;
        Ok(32)
    }
}

impl ConsensusDecode for Bytes32 {
    fn consensus_decode(reader: &mut impl Read) -> Result<Self, ConsensusDecodeError> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Bytes32::from_inner(buf))
    }
}

/// Writes byte string prefixed with its length.
pub(crate) fn encode_bytes(writer: &mut impl Write, bytes: &[u8]) -> Result<usize, IoError> {
    let counter = VarInt::with_len(bytes.len()).consensus_encode(writer)?;
    writer.write_all(bytes)?;
    Ok(counter + bytes.len())
}

pub(crate) fn decode_bytes(reader: &mut impl Read) -> Result<Vec<u8>, ConsensusDecodeError> {
    let len = VarInt::consensus_decode(reader)?.to_collection_len()?;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(buf)
}

pub(crate) fn encode_list<T: ConsensusEncode>(
    writer: &mut impl Write,
    items: &[T],
) -> Result<usize, IoError> {
    let mut counter = VarInt::with_len(items.len()).consensus_encode(writer)?;
    for item in items {
        counter += item.consensus_encode(writer)?;
    }
    Ok(counter)
}

pub(crate) fn decode_list<T: ConsensusDecode>(
    reader: &mut impl Read,
) -> Result<Vec<T>, ConsensusDecodeError> {
    let len = VarInt::consensus_decode(reader)?.to_collection_len()?;
    let mut items = Vec::with_capacity(len.min(MAX_PREALLOC / core::mem::size_of::<T>().max(1)));
    for _ in 0..len {
        items.push(T::consensus_decode(reader)?);
    }
    Ok(items)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn var_int_sizes() {
        for (val, len) in [(0u64, 1), (0xFC, 1), (0xFD, 3), (0xFFFF, 3), (0x10000, 5), (1 << 32, 9)]
        {
            let var_int = VarInt::new(val);
            assert_eq!(var_int.encoded_len(), len);
            let bytes = var_int.consensus_serialize();
            assert_eq!(bytes.len(), len);
            assert_eq!(VarInt::consensus_deserialize(&bytes).unwrap(), var_int);
        }
        assert_eq!(VarInt::new(0xFD).consensus_serialize(), vec![0xFD, 0xFD, 0x00]);
    }

    #[test]
    fn var_int_non_minimal() {
        assert_eq!(
            VarInt::consensus_deserialize([0xFD, 0x10, 0x00]),
            Err(ConsensusDataError::NonMinimalVarInt.into())
        );
        assert_eq!(
            VarInt::consensus_deserialize([0xFE, 0xFF, 0xFF, 0x00, 0x00]),
            Err(ConsensusDataError::NonMinimalVarInt.into())
        );
    }

    #[test]
    fn excessive_data() {
        assert_eq!(
            u32::consensus_deserialize([1, 0, 0, 0, 0]),
            Err(ConsensusDataError::DataNotConsumed.into())
        );
        assert_eq!(u32::consensus_deserialize([1, 0, 0, 0]).unwrap(), 1);
    }

    #[test]
    fn truncated_bytes() {
        let mut cursor = Cursor::new([0x03u8, 0xAA, 0xBB]);
        let err = decode_bytes(&mut cursor).unwrap_err();
        assert!(matches!(err, ConsensusDecodeError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedData);
    }

    #[test]
    fn oversized_collection() {
        let mut cursor = Cursor::new([0xFEu8, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            decode_bytes(&mut cursor),
            Err(ConsensusDataError::OversizedCollection(0xFFFF_FFFF).into())
        );
    }
}
