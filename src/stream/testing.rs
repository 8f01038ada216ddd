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

//! Stream framing helpers for unit tests

use crate::stream::codec::CodecKind;
use crate::stream::header::ChunkHeader;
use crate::stream::schema::LogicalType;
use std::io::Write;

pub(crate) fn compress(kind: CodecKind, data: &[u8]) -> Vec<u8> {
    match kind {
        CodecKind::None => data.to_vec(),
        CodecKind::Deflate => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        CodecKind::Lz4 => lz4_flex::block::compress(data),
        CodecKind::Zstd => zstd::bulk::compress(data, 1).unwrap(),
    }
}

pub(crate) struct StreamBuilder {
    codec: CodecKind,
    bytes: Vec<u8>,
}

impl StreamBuilder {
    pub fn new(codec: CodecKind) -> Self {
        Self {
            codec,
            bytes: Vec::new(),
        }
    }

    pub fn prologue(mut self, types: &[LogicalType]) -> Self {
        self.bytes.extend_from_slice(&(types.len() as u64).to_be_bytes());
        for ty in types {
            self.bytes.extend_from_slice(&ty.code().to_be_bytes());
        }
        self
    }

    pub fn chunk(mut self, ty: LogicalType, type_size: u32, payload: &[u8]) -> Self {
        let body = compress(self.codec, payload);
        let header = ChunkHeader {
            logical_type: ty.code() as u32,
            type_size,
            uncompressed_len: payload.len() as u32,
            compressed_len: body.len() as u32,
        };
        self.bytes.extend_from_slice(&header.to_bytes());
        self.bytes.extend_from_slice(&body);
        self
    }

    pub fn int64(self, values: &[i64]) -> Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.chunk(LogicalType::Int64, 8, &payload)
    }

    pub fn double(self, values: &[f64]) -> Self {
        let payload: Vec<u8> = values
            .iter()
            .flat_map(|v| v.to_bits().to_be_bytes())
            .collect();
        self.chunk(LogicalType::Double, 8, &payload)
    }

    pub fn strings(self, values: &[&str]) -> Self {
        let lengths: Vec<u8> = values.iter().map(|s| s.len() as u8).collect();
        let content = values.concat();
        self.chunk(LogicalType::ByteArray, 0, &lengths)
            .chunk(LogicalType::ByteArray, 0, content.as_bytes())
    }

    pub fn fixed(self, width: u32, values: &[&str]) -> Self {
        let content = values.concat();
        self.chunk(LogicalType::FixedLenByteArray, width, content.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
