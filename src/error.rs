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

use crate::stream::codec::CodecKind;
use crate::stream::schema::LogicalType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ColstreamError>;

#[derive(Error, Debug)]
pub enum ColstreamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Violations of the wire framing. None of these are recoverable: the stream
/// carries no resynchronisation markers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("truncated {what}: expected {expected} bytes, {available} available")]
    Truncated {
        what: &'static str,
        expected: usize,
        available: usize,
    },

    #[error("unknown logical type code {0}")]
    UnknownType(u64),

    #[error("{what} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("row count mismatch in column {column}: expected {expected}, got {actual}")]
    RowCountMismatch {
        column: usize,
        expected: usize,
        actual: usize,
    },

    #[error("column {column} declared as {declared:?} but received a {received:?} chunk")]
    TypeMismatch {
        column: usize,
        declared: LogicalType,
        received: LogicalType,
    },

    #[error("column {column} fixed-length chunk has zero width")]
    InvalidWidth { column: usize },

    #[error("column {column} payload of {len} bytes is not a multiple of {width}")]
    Misaligned {
        column: usize,
        len: usize,
        width: usize,
    },

    #[error("chunk of {len} bytes exceeds the {limit} byte limit")]
    ChunkTooLarge { len: usize, limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{codec} stream is corrupt: {reason}")]
    Corrupt { codec: CodecKind, reason: String },
}

impl From<serde_json::Error> for ColstreamError {
    fn from(err: serde_json::Error) -> Self {
        ColstreamError::Serialization(err.to_string())
    }
}

impl ColstreamError {
    /// The protocol violation behind this error, if any.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            ColstreamError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}
