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

//! Result stream schema
//!
//! The prologue of every stream is a big-endian u64 column count followed by
//! one u64 logical type code per column.

use crate::error::{ProtocolError, Result};
use crate::stream::source::ByteSource;
use std::fmt;
use std::io::Read;
use tracing::debug;

/// Column value kinds carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// 64-bit signed integer
    Int64,
    /// IEEE-754 double
    Double,
    /// Variable-length byte string (at most 255 bytes per value)
    ByteArray,
    /// Fixed-length byte string; the width travels in each chunk header
    FixedLenByteArray,
}

impl LogicalType {
    pub const INT64_CODE: u64 = 2;
    pub const DOUBLE_CODE: u64 = 5;
    pub const BYTE_ARRAY_CODE: u64 = 6;
    pub const FIXED_LEN_BYTE_ARRAY_CODE: u64 = 7;

    pub fn from_code(code: u64) -> std::result::Result<Self, ProtocolError> {
        match code {
            Self::INT64_CODE => Ok(LogicalType::Int64),
            Self::DOUBLE_CODE => Ok(LogicalType::Double),
            Self::BYTE_ARRAY_CODE => Ok(LogicalType::ByteArray),
            Self::FIXED_LEN_BYTE_ARRAY_CODE => Ok(LogicalType::FixedLenByteArray),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }

    pub fn code(self) -> u64 {
        match self {
            LogicalType::Int64 => Self::INT64_CODE,
            LogicalType::Double => Self::DOUBLE_CODE,
            LogicalType::ByteArray => Self::BYTE_ARRAY_CODE,
            LogicalType::FixedLenByteArray => Self::FIXED_LEN_BYTE_ARRAY_CODE,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, LogicalType::Int64 | LogicalType::Double)
    }

    /// Whether a chunk of type `chunk` may feed a column declared as `self`.
    /// String columns may switch to a fixed width on a per-chunk basis.
    pub fn accepts_chunk(self, chunk: LogicalType) -> bool {
        self == chunk
            || (self == LogicalType::ByteArray && chunk == LogicalType::FixedLenByteArray)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::Int64 => "INT64",
            LogicalType::Double => "DOUBLE",
            LogicalType::ByteArray => "BYTE_ARRAY",
            LogicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        };
        f.write_str(name)
    }
}

/// Position and type of one column in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub index: u32,
    pub logical_type: LogicalType,
}

/// Ordered column descriptors, fixed for the lifetime of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    pub fn new(types: impl IntoIterator<Item = LogicalType>) -> Self {
        let columns = types
            .into_iter()
            .enumerate()
            .map(|(index, logical_type)| ColumnDescriptor {
                index: index as u32,
                logical_type,
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Bytes the prologue for this schema occupies on the wire
    pub fn wire_size(&self) -> u64 {
        8 + 8 * self.columns.len() as u64
    }
}

/// Parses the stream prologue
pub struct SchemaReader<'a, R> {
    source: &'a mut ByteSource<R>,
}

impl<'a, R: Read> SchemaReader<'a, R> {
    pub fn new(source: &'a mut ByteSource<R>) -> Self {
        Self { source }
    }

    /// Consume exactly `8 + 8 * column_count` bytes and build the schema.
    pub fn read_schema(self) -> Result<Schema> {
        let mut word = [0u8; 8];
        self.source.read_exact(&mut word, "column count")?;
        let column_count = u64::from_be_bytes(word);

        // The count is untrusted; let truncation stop a bogus value instead of
        // reserving for it up front.
        let mut types = Vec::with_capacity(column_count.min(1024) as usize);
        for _ in 0..column_count {
            self.source.read_exact(&mut word, "column type")?;
            types.push(LogicalType::from_code(u64::from_be_bytes(word))?);
        }

        debug!("Read schema with {} columns: {:?}", types.len(), types);
        Ok(Schema::new(types))
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;
