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

//! Chunk decompression backends
//!
//! One codec is chosen per stream before it opens. Every backend decompresses
//! straight into a caller-provided buffer sized to the header's declared
//! length, and reports how many bytes it produced so the decoder can check
//! the count against the header.

use crate::error::CodecError;
use flate2::{Decompress, FlushDecompress, Status};
use lz4_flex::block::DecompressError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecKind {
    /// Uncompressed passthrough
    #[default]
    None,
    /// zlib-wrapped DEFLATE
    Deflate,
    /// Raw LZ4 block
    Lz4,
    /// Zstandard frame
    Zstd,
}

impl CodecKind {
    pub const ALL: [CodecKind; 4] = [
        CodecKind::None,
        CodecKind::Deflate,
        CodecKind::Lz4,
        CodecKind::Zstd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CodecKind::None => "none",
            CodecKind::Deflate => "deflate",
            CodecKind::Lz4 => "lz4",
            CodecKind::Zstd => "zstd",
        }
    }

    /// Name the remote service expects in the processing plan
    pub fn wire_name(self) -> &'static str {
        match self {
            CodecKind::None => "None",
            CodecKind::Deflate => "DEFLATE",
            CodecKind::Lz4 => "LZ4",
            CodecKind::Zstd => "ZSTD",
        }
    }

    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            CodecKind::None => Box::new(IdentityCodec),
            CodecKind::Deflate => Box::new(DeflateCodec::new()),
            CodecKind::Lz4 => Box::new(Lz4Codec),
            CodecKind::Zstd => Box::new(ZstdCodec),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "identity" => Ok(CodecKind::None),
            "deflate" | "zlib" => Ok(CodecKind::Deflate),
            "lz4" => Ok(CodecKind::Lz4),
            "zstd" => Ok(CodecKind::Zstd),
            _ => Err(format!(
                "Invalid codec '{}'. Valid options: {:?}",
                s,
                CodecKind::ALL.map(CodecKind::as_str)
            )),
        }
    }
}

impl Serialize for CodecKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CodecKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

pub trait Codec: Send {
    fn kind(&self) -> CodecKind;

    /// Passthrough codecs have their payload read raw, bounded by the header's
    /// uncompressed length, and are never asked to decompress.
    fn is_passthrough(&self) -> bool {
        false
    }

    /// Decompress `src` into `dst`, which is exactly `expected_len` bytes.
    ///
    /// Returns the size the payload decodes to. A count above `expected_len`
    /// means the payload is larger than declared and `dst` holds a prefix.
    fn decompress(
        &mut self,
        src: &[u8],
        expected_len: usize,
        dst: &mut [u8],
    ) -> std::result::Result<usize, CodecError>;
}

fn corrupt(codec: CodecKind, reason: impl ToString) -> CodecError {
    CodecError::Corrupt {
        codec,
        reason: reason.to_string(),
    }
}

pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::None
    }

    fn is_passthrough(&self) -> bool {
        true
    }

    fn decompress(
        &mut self,
        src: &[u8],
        _expected_len: usize,
        dst: &mut [u8],
    ) -> std::result::Result<usize, CodecError> {
        let len = src.len().min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        Ok(src.len())
    }
}

/// zlib inflater, reset and reused for every chunk of the stream
pub struct DeflateCodec {
    inflater: Decompress,
}

impl DeflateCodec {
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
        }
    }

    /// Keep inflating into a throwaway buffer to find the payload's real size
    /// once `dst` is full.
    fn count_overflow(&mut self, src: &[u8]) -> std::result::Result<usize, CodecError> {
        let mut sink = [0u8; 4096];
        loop {
            let consumed = self.inflater.total_in() as usize;
            let produced = self.inflater.total_out();
            let status = self
                .inflater
                .decompress(&src[consumed..], &mut sink, FlushDecompress::Finish)
                .map_err(|e| corrupt(CodecKind::Deflate, e))?;

            if status == Status::StreamEnd {
                return Ok(self.inflater.total_out() as usize);
            }
            if self.inflater.total_out() == produced
                && self.inflater.total_in() as usize == consumed
            {
                return Err(corrupt(CodecKind::Deflate, "stream ended early"));
            }
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for DeflateCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Deflate
    }

    fn decompress(
        &mut self,
        src: &[u8],
        expected_len: usize,
        dst: &mut [u8],
    ) -> std::result::Result<usize, CodecError> {
        self.inflater.reset(true);
        let status = self
            .inflater
            .decompress(src, dst, FlushDecompress::Finish)
            .map_err(|e| corrupt(CodecKind::Deflate, e))?;

        let produced = self.inflater.total_out() as usize;
        match status {
            Status::StreamEnd => Ok(produced),
            Status::Ok | Status::BufError if produced == dst.len() => self.count_overflow(src),
            Status::Ok | Status::BufError => Err(corrupt(
                CodecKind::Deflate,
                format!(
                    "stream ended after {} of {} bytes",
                    produced, expected_len
                ),
            )),
        }
    }
}

pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn kind(&self) -> CodecKind {
        CodecKind::Lz4
    }

    fn decompress(
        &mut self,
        src: &[u8],
        _expected_len: usize,
        dst: &mut [u8],
    ) -> std::result::Result<usize, CodecError> {
        match lz4_flex::block::decompress_into(src, dst) {
            Ok(written) => Ok(written),
            // Blocks carry no length: the size is known only up to the
            // sequence that no longer fit.
            Err(DecompressError::OutputTooSmall { expected, .. }) => {
                Ok(expected.max(dst.len() + 1))
            }
            Err(e) => Err(corrupt(CodecKind::Lz4, e)),
        }
    }
}

pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Zstd
    }

    fn decompress(
        &mut self,
        src: &[u8],
        _expected_len: usize,
        dst: &mut [u8],
    ) -> std::result::Result<usize, CodecError> {
        if let Ok(Some(size)) = zstd::zstd_safe::get_frame_content_size(src) {
            if size > dst.len() as u64 {
                return Ok(usize::try_from(size).unwrap_or(usize::MAX));
            }
        }
        zstd::bulk::decompress_to_buffer(src, dst).map_err(|e| corrupt(CodecKind::Zstd, e))
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
