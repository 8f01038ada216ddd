// Copyright 2025 Muvon Un Limited
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

//! Fixed 16-byte header preceding every chunk

use crate::error::{ProtocolError, Result};
use crate::stream::schema::LogicalType;
use crate::stream::source::{ByteSource, Fill};
use std::io::Read;

pub const HEADER_LEN: usize = 16;

const DATA_TYPE: usize = 0;
const TYPE_SIZE: usize = 4;
const DATA_LEN: usize = 8;
const COMPRESSED_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Raw logical type code of the payload
    pub logical_type: u32,
    /// Element width for fixed-length strings, otherwise unused
    pub type_size: u32,
    /// Payload length once decompressed
    pub uncompressed_len: u32,
    /// Payload length on the wire in compressed mode
    pub compressed_len: u32,
}

impl ChunkHeader {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let field = |at: usize| {
            u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Self {
            logical_type: field(DATA_TYPE),
            type_size: field(TYPE_SIZE),
            uncompressed_len: field(DATA_LEN),
            compressed_len: field(COMPRESSED_LEN),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[DATA_TYPE..DATA_TYPE + 4].copy_from_slice(&self.logical_type.to_be_bytes());
        bytes[TYPE_SIZE..TYPE_SIZE + 4].copy_from_slice(&self.type_size.to_be_bytes());
        bytes[DATA_LEN..DATA_LEN + 4].copy_from_slice(&self.uncompressed_len.to_be_bytes());
        bytes[COMPRESSED_LEN..COMPRESSED_LEN + 4]
            .copy_from_slice(&self.compressed_len.to_be_bytes());
        bytes
    }

    pub fn kind(&self) -> std::result::Result<LogicalType, ProtocolError> {
        LogicalType::from_code(self.logical_type as u64)
    }

    /// Read a header that must be present
    pub fn read<R: Read>(source: &mut ByteSource<R>) -> Result<Self> {
        let mut bytes = [0u8; HEADER_LEN];
        source.read_exact(&mut bytes, "chunk header")?;
        Ok(Self::parse(&bytes))
    }

    /// Read a header at a point where the stream may legitimately end
    pub fn read_or_eof<R: Read>(source: &mut ByteSource<R>) -> Result<Option<Self>> {
        let mut bytes = [0u8; HEADER_LEN];
        match source.read_exact_or_eof(&mut bytes, "chunk header")? {
            Fill::Complete => Ok(Some(Self::parse(&bytes))),
            Fill::EndOfStream => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_field_order_is_big_endian() {
        let bytes: [u8; HEADER_LEN] = [
            0, 0, 0, 7, // data type
            0, 0, 0, 15, // type size
            0, 0, 1, 0, // data len
            0, 1, 0, 0, // compressed len
        ];
        let header = ChunkHeader::parse(&bytes);
        assert_eq!(header.logical_type, 7);
        assert_eq!(header.type_size, 15);
        assert_eq!(header.uncompressed_len, 256);
        assert_eq!(header.compressed_len, 65536);
        assert_eq!(header.kind().unwrap(), LogicalType::FixedLenByteArray);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn test_read_or_eof() {
        let header = ChunkHeader {
            logical_type: 2,
            type_size: 0,
            uncompressed_len: 24,
            compressed_len: 24,
        };
        let mut source = ByteSource::new(Cursor::new(header.to_bytes().to_vec()));

        assert_eq!(ChunkHeader::read_or_eof(&mut source).unwrap(), Some(header));
        assert_eq!(ChunkHeader::read_or_eof(&mut source).unwrap(), None);
        assert!(ChunkHeader::read(&mut source).is_err());
    }

    #[test]
    fn test_unknown_chunk_type() {
        let header = ChunkHeader {
            logical_type: 42,
            type_size: 0,
            uncompressed_len: 0,
            compressed_len: 0,
        };
        assert_eq!(header.kind(), Err(ProtocolError::UnknownType(42)));
    }
}
