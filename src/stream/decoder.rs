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

//! Column chunk decoding
//!
//! Reads the chunk(s) of one column for one batch and rebuilds its values:
//!
//! - INT64 / DOUBLE: one chunk of 8-byte big-endian values
//! - FIXED_LEN_BYTE_ARRAY: one chunk of `type_size`-wide strings
//! - BYTE_ARRAY: a chunk of one-byte lengths, then a second chunk holding the
//!   concatenated content, always in that order
//!
//! With the passthrough codec the payload is read raw and its size comes from
//! the header's uncompressed length; otherwise the compressed length bounds
//! the read and the codec inflates into the column buffer.

use crate::error::{ProtocolError, Result};
use crate::stream::codec::{Codec, CodecKind};
use crate::stream::column::{grow, ColumnBuffer};
use crate::stream::header::ChunkHeader;
use crate::stream::schema::LogicalType;
use crate::stream::source::ByteSource;
use std::io::Read;
use tracing::debug;

/// Result of decoding one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    /// The column holds a fresh batch of `record_count` values
    Decoded,
    /// The stream ended cleanly where this column's header was expected
    EndOfStream,
}

pub struct BatchDecoder {
    codec: Box<dyn Codec>,
    /// Staging area for compressed payloads, shared by all columns
    scratch: Vec<u8>,
    max_chunk_bytes: usize,
}

impl BatchDecoder {
    pub fn new(codec: Box<dyn Codec>, scratch_capacity: usize, max_chunk_bytes: usize) -> Self {
        Self {
            codec,
            scratch: vec![0; scratch_capacity],
            max_chunk_bytes,
        }
    }

    pub fn codec_kind(&self) -> CodecKind {
        self.codec.kind()
    }

    /// Decode the next batch of `column` from `source`.
    ///
    /// The previous batch held by the column is invalidated first, so a
    /// failure never leaves stale values looking current.
    pub fn decode_column<R: Read>(
        &mut self,
        column: &mut ColumnBuffer,
        source: &mut ByteSource<R>,
    ) -> Result<ColumnStatus> {
        column.reset();

        let header = match ChunkHeader::read_or_eof(source)? {
            Some(header) => header,
            None => return Ok(ColumnStatus::EndOfStream),
        };

        let chunk_type = header.kind()?;
        if !column.logical_type().accepts_chunk(chunk_type) {
            return Err(ProtocolError::TypeMismatch {
                column: column.index(),
                declared: column.logical_type(),
                received: chunk_type,
            }
            .into());
        }

        match chunk_type {
            LogicalType::Int64 | LogicalType::Double => {
                self.decode_numeric(column, &header, source)?
            }
            LogicalType::FixedLenByteArray => self.decode_fixed(column, &header, source)?,
            LogicalType::ByteArray => self.decode_variable(column, &header, source)?,
        }

        Ok(ColumnStatus::Decoded)
    }

    fn decode_numeric<R: Read>(
        &mut self,
        column: &mut ColumnBuffer,
        header: &ChunkHeader,
        source: &mut ByteSource<R>,
    ) -> Result<()> {
        let len = self.declared_len(header)?;
        if len % 8 != 0 {
            return Err(ProtocolError::Misaligned {
                column: column.index(),
                len,
                width: 8,
            }
            .into());
        }

        self.fill(header, source, column.values_mut(len), "numeric payload")?;
        column.set_numeric(len / 8);
        Ok(())
    }

    fn decode_fixed<R: Read>(
        &mut self,
        column: &mut ColumnBuffer,
        header: &ChunkHeader,
        source: &mut ByteSource<R>,
    ) -> Result<()> {
        let len = self.declared_len(header)?;
        let width = header.type_size as usize;
        if width == 0 {
            return Err(ProtocolError::InvalidWidth {
                column: column.index(),
            }
            .into());
        }
        if len % width != 0 {
            return Err(ProtocolError::Misaligned {
                column: column.index(),
                len,
                width,
            }
            .into());
        }

        self.fill(header, source, column.text_mut(len), "fixed-length payload")?;
        column.set_fixed(width, len / width);
        Ok(())
    }

    fn decode_variable<R: Read>(
        &mut self,
        column: &mut ColumnBuffer,
        header: &ChunkHeader,
        source: &mut ByteSource<R>,
    ) -> Result<()> {
        // Offset pass: one length byte per record
        let record_count = self.declared_len(header)?;
        self.fill(header, source, column.values_mut(record_count), "string lengths")?;
        let text_size = column.build_offsets(record_count);

        // Content pass. The content header's type code is not inspected; only
        // its declared length has to agree with the offset pass.
        let content_header = ChunkHeader::read(source)?;
        let content_len = self.declared_len(&content_header)?;
        if content_len != text_size {
            return Err(ProtocolError::SizeMismatch {
                what: "string content",
                expected: text_size,
                actual: content_len,
            }
            .into());
        }

        self.fill(&content_header, source, column.text_mut(text_size), "string content")?;
        column.set_variable(record_count, text_size);
        Ok(())
    }

    fn declared_len(&self, header: &ChunkHeader) -> Result<usize> {
        let len = header.uncompressed_len as usize;
        self.check_limit(len)?;
        Ok(len)
    }

    fn check_limit(&self, len: usize) -> Result<()> {
        if len > self.max_chunk_bytes {
            return Err(ProtocolError::ChunkTooLarge {
                len,
                limit: self.max_chunk_bytes,
            }
            .into());
        }
        Ok(())
    }

    /// Read one chunk payload and leave its uncompressed bytes in `dst`,
    /// which is exactly the header's uncompressed length.
    fn fill<R: Read>(
        &mut self,
        header: &ChunkHeader,
        source: &mut ByteSource<R>,
        dst: &mut [u8],
        what: &'static str,
    ) -> Result<()> {
        if self.codec.is_passthrough() {
            return source.read_exact(dst, what);
        }

        let compressed_len = header.compressed_len as usize;
        self.check_limit(compressed_len)?;
        if grow(&mut self.scratch, compressed_len) {
            debug!("Compressed staging buffer grown to {} bytes", compressed_len);
        }
        let staged = &mut self.scratch[..compressed_len];
        source.read_exact(staged, what)?;

        if dst.is_empty() {
            return Ok(());
        }

        let written = self.codec.decompress(staged, dst.len(), dst)?;
        if written != dst.len() {
            return Err(ProtocolError::SizeMismatch {
                what,
                expected: dst.len(),
                actual: written,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "decoder_test.rs"]
mod decoder_test;
