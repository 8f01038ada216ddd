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

//! Row-oriented stream encoder shared by the integration tests

#![allow(dead_code)]

use colstream::stream::{ChunkHeader, CodecKind, LogicalType};
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

pub fn compress(codec: CodecKind, data: &[u8]) -> Vec<u8> {
    match codec {
        CodecKind::None => data.to_vec(),
        CodecKind::Deflate => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        CodecKind::Lz4 => lz4_flex::block::compress(data),
        CodecKind::Zstd => zstd::bulk::compress(data, 3).unwrap(),
    }
}

/// Writes a stream the way the producing service does: prologue first, then
/// every batch column by column.
pub struct Encoder {
    codec: CodecKind,
    types: Vec<LogicalType>,
    out: Vec<u8>,
}

impl Encoder {
    pub fn new(codec: CodecKind, types: &[LogicalType]) -> Self {
        let mut out = Vec::new();
        out.extend_from_slice(&(types.len() as u64).to_be_bytes());
        for ty in types {
            out.extend_from_slice(&ty.code().to_be_bytes());
        }
        Self {
            codec,
            types: types.to_vec(),
            out,
        }
    }

    /// Append one batch given as rows
    pub fn batch(&mut self, rows: &[Vec<Value>]) -> &mut Self {
        for (position, ty) in self.types.clone().into_iter().enumerate() {
            let cells = rows.iter().map(|row| &row[position]);
            match ty {
                LogicalType::Int64 => {
                    let payload: Vec<u8> = cells
                        .flat_map(|v| match v {
                            Value::Int(i) => i.to_be_bytes(),
                            other => panic!("expected int, got {:?}", other),
                        })
                        .collect();
                    self.chunk(ty, 8, &payload);
                }
                LogicalType::Double => {
                    let payload: Vec<u8> = cells
                        .flat_map(|v| match v {
                            Value::Double(d) => d.to_bits().to_be_bytes(),
                            other => panic!("expected double, got {:?}", other),
                        })
                        .collect();
                    self.chunk(ty, 8, &payload);
                }
                LogicalType::ByteArray | LogicalType::FixedLenByteArray => {
                    let texts: Vec<&str> = cells
                        .map(|v| match v {
                            Value::Text(s) => s.as_str(),
                            other => panic!("expected text, got {:?}", other),
                        })
                        .collect();
                    let lengths: Vec<u8> = texts.iter().map(|s| s.len() as u8).collect();
                    self.chunk(LogicalType::ByteArray, 0, &lengths);
                    self.chunk(LogicalType::ByteArray, 0, texts.concat().as_bytes());
                }
            }
        }
        self
    }

    /// Append one raw chunk, for framing the batch helper cannot express
    pub fn chunk(&mut self, ty: LogicalType, type_size: u32, payload: &[u8]) -> &mut Self {
        let body = compress(self.codec, payload);
        let header = ChunkHeader {
            logical_type: ty.code() as u32,
            type_size,
            uncompressed_len: payload.len() as u32,
            compressed_len: body.len() as u32,
        };
        self.out.extend_from_slice(&header.to_bytes());
        self.out.extend_from_slice(&body);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn finish(&self) -> Vec<u8> {
        self.out.clone()
    }
}

/// Rows `(i, i * 0.5, "row-i")` for `i` in `range`
pub fn sample_rows(range: std::ops::Range<i64>) -> Vec<Vec<Value>> {
    range
        .map(|i| {
            vec![
                Value::Int(i),
                Value::Double(i as f64 * 0.5),
                Value::Text(format!("row-{}", i)),
            ]
        })
        .collect()
}

pub const SAMPLE_TYPES: [LogicalType; 3] = [
    LogicalType::Int64,
    LogicalType::Double,
    LogicalType::ByteArray,
];

/// Write a captured stream to a temporary file
pub fn capture(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
