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

//! Per-column decode buffers
//!
//! Each column owns its buffers for the whole stream. Every batch overwrites
//! them in place; they only ever grow.

use crate::stream::schema::{ColumnDescriptor, LogicalType};
use tracing::debug;

/// Average string width assumed when pre-sizing text buffers
/// String bytes presized per record of batch capacity
pub const TEXT_BYTES_PER_RECORD: usize = 64;

/// How the current batch is laid out in the column's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Nothing decoded yet
    Empty,
    /// `record_count` big-endian 8-byte values
    Numeric,
    /// `record_count * width` bytes of text
    Fixed { width: usize },
    /// One length byte per record plus `text_size` bytes of content
    Variable { text_size: usize },
}

#[derive(Debug)]
pub struct ColumnBuffer {
    index: usize,
    logical_type: LogicalType,
    layout: Layout,
    record_count: usize,
    /// Numeric values, or the length prefixes of a variable-length batch
    values: Vec<u8>,
    /// Fixed-length or variable-length string content
    text: Vec<u8>,
    offsets: Vec<u32>,
}

impl ColumnBuffer {
    pub fn new(descriptor: &ColumnDescriptor, batch_capacity: usize) -> Self {
        let (values, text, offsets) = match descriptor.logical_type {
            LogicalType::Int64 | LogicalType::Double => (batch_capacity.saturating_mul(8), 0, 0),
            LogicalType::ByteArray => (
                batch_capacity,
                batch_capacity.saturating_mul(TEXT_BYTES_PER_RECORD),
                batch_capacity,
            ),
            LogicalType::FixedLenByteArray => {
                (0, batch_capacity.saturating_mul(TEXT_BYTES_PER_RECORD), 0)
            }
        };

        Self {
            index: descriptor.index as usize,
            logical_type: descriptor.logical_type,
            layout: Layout::Empty,
            record_count: 0,
            values: vec![0; values],
            text: vec![0; text],
            offsets: Vec::with_capacity(offsets),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Type declared for this column by the schema
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn get_int64(&self, index: usize) -> Option<i64> {
        if self.logical_type != LogicalType::Int64 {
            return None;
        }
        self.word(index).map(i64::from_be_bytes)
    }

    pub fn get_double(&self, index: usize) -> Option<f64> {
        if self.logical_type != LogicalType::Double {
            return None;
        }
        self.word(index).map(|w| f64::from_bits(u64::from_be_bytes(w)))
    }

    /// Raw bytes of a string value, borrowed from the column buffers
    pub fn get_string(&self, index: usize) -> Option<&[u8]> {
        if index >= self.record_count {
            return None;
        }
        match self.layout {
            Layout::Fixed { width } => self.text.get(index * width..(index + 1) * width),
            Layout::Variable { .. } => {
                let start = self.offsets[index] as usize;
                let len = self.values[index] as usize;
                self.text.get(start..start + len)
            }
            Layout::Empty | Layout::Numeric => None,
        }
    }

    /// Start offset of every record of a variable-length batch
    pub fn offsets(&self) -> &[u32] {
        match self.layout {
            Layout::Variable { .. } => &self.offsets[..self.record_count],
            _ => &[],
        }
    }

    /// Decoded string content of the current batch
    pub fn content(&self) -> &[u8] {
        match self.layout {
            Layout::Fixed { width } => &self.text[..self.record_count * width],
            Layout::Variable { text_size } => &self.text[..text_size],
            Layout::Empty | Layout::Numeric => &[],
        }
    }

    /// Render one value as text
    pub fn format_value(&self, index: usize) -> Option<String> {
        match self.logical_type {
            LogicalType::Int64 => self.get_int64(index).map(|v| v.to_string()),
            LogicalType::Double => self.get_double(index).map(|v| v.to_string()),
            LogicalType::ByteArray | LogicalType::FixedLenByteArray => self
                .get_string(index)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    fn word(&self, index: usize) -> Option<[u8; 8]> {
        if self.layout != Layout::Numeric || index >= self.record_count {
            return None;
        }
        let start = index * 8;
        self.values
            .get(start..start + 8)
            .and_then(|bytes| bytes.try_into().ok())
    }

    pub(crate) fn values_mut(&mut self, len: usize) -> &mut [u8] {
        if grow(&mut self.values, len) {
            debug!("Column {} value buffer grown to {} bytes", self.index, len);
        }
        &mut self.values[..len]
    }

    pub(crate) fn text_mut(&mut self, len: usize) -> &mut [u8] {
        if grow(&mut self.text, len) {
            debug!("Column {} text buffer grown to {} bytes", self.index, len);
        }
        &mut self.text[..len]
    }

    /// Invalidate the previous batch before its buffers get overwritten
    pub(crate) fn reset(&mut self) {
        self.layout = Layout::Empty;
        self.record_count = 0;
    }

    pub(crate) fn set_numeric(&mut self, record_count: usize) {
        self.layout = Layout::Numeric;
        self.record_count = record_count;
    }

    pub(crate) fn set_fixed(&mut self, width: usize, record_count: usize) {
        self.layout = Layout::Fixed { width };
        self.record_count = record_count;
    }

    /// Turn the first `record_count` length prefixes into start offsets and
    /// return the total content size they describe.
    pub(crate) fn build_offsets(&mut self, record_count: usize) -> usize {
        self.offsets.clear();
        let mut offset = 0usize;
        for &len in &self.values[..record_count] {
            // An overflowing total can never match a u32 content header, so
            // the batch is rejected before these offsets are used.
            self.offsets.push(u32::try_from(offset).unwrap_or(u32::MAX));
            offset += len as usize;
        }
        offset
    }

    pub(crate) fn set_variable(&mut self, record_count: usize, text_size: usize) {
        self.layout = Layout::Variable { text_size };
        self.record_count = record_count;
    }
}

/// Grow-and-retain: buffers are resized when a chunk outgrows them and are
/// never shrunk afterwards. Returns whether the buffer had to grow.
pub(crate) fn grow(buffer: &mut Vec<u8>, len: usize) -> bool {
    if buffer.len() >= len {
        return false;
    }
    buffer.resize(len, 0);
    true
}

#[cfg(test)]
#[path = "column_test.rs"]
mod column_test;
