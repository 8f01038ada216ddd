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

//! Streaming reader for columnar result streams
//!
//! A stream is a schema prologue followed by row-aligned batches, each batch
//! carrying one chunk (two for variable-length strings) per column in schema
//! order. [`StreamCursor`] pulls one batch at a time on the calling thread.

pub mod codec;
pub mod column;
pub mod decoder;
pub mod header;
pub mod schema;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{Codec, CodecKind};
pub use column::{ColumnBuffer, Layout, TEXT_BYTES_PER_RECORD};
pub use decoder::{BatchDecoder, ColumnStatus};
pub use header::{ChunkHeader, HEADER_LEN};
pub use schema::{ColumnDescriptor, LogicalType, Schema, SchemaReader};
pub use source::ByteSource;

use crate::error::{ColstreamError, ProtocolError, Result};
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Decode-time settings, fixed before the stream opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub codec: CodecKind,
    /// Rows each column buffer is sized for up front
    pub batch_capacity: usize,
    /// Initial size of the compressed staging buffer
    pub scratch_capacity: usize,
    /// Largest chunk length a header may declare
    pub max_chunk_bytes: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            codec: CodecKind::None,
            batch_capacity: 8192,
            scratch_capacity: 8192 * 128,
            max_chunk_bytes: 256 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    AwaitingSchema,
    Streaming,
    /// Clean end-of-stream at a batch boundary
    Drained,
    /// A decode error ended the stream
    Failed,
}

/// Counters over everything successfully delivered so far.
///
/// `bytes_read` covers the prologue plus every yielded batch; bytes of a batch
/// that failed half-way are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub records: u64,
    pub batches: u64,
    pub bytes_read: u64,
}

/// One decoded batch, borrowed from the cursor until the next pull
#[derive(Debug)]
pub struct Batch<'a> {
    schema: &'a Schema,
    columns: &'a [ColumnBuffer],
    record_count: usize,
}

impl<'a> Batch<'a> {
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&'a ColumnBuffer> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &'a [ColumnBuffer] {
        self.columns
    }

    /// Render one row as comma-separated values
    pub fn format_row(&self, row: usize) -> Option<String> {
        if row >= self.record_count {
            return None;
        }
        let values: Option<Vec<String>> =
            self.columns.iter().map(|c| c.format_value(row)).collect();
        values.map(|v| v.join(","))
    }
}

/// Outcome of draining a stream: the terminal error, if any, always travels
/// with the counters gathered before it.
#[derive(Debug)]
pub struct StreamReport {
    pub state: CursorState,
    pub stats: StreamStats,
    pub error: Option<ColstreamError>,
    pub elapsed: Duration,
}

impl StreamReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// One-line transfer summary, printed whether or not the stream failed
    pub fn summary(&self) -> String {
        format!(
            "Received {} records ({} bytes) in {:.3} sec",
            self.stats.records,
            self.stats.bytes_read,
            self.elapsed.as_secs_f64()
        )
    }
}

pub struct StreamCursor<R> {
    source: ByteSource<R>,
    decoder: BatchDecoder,
    batch_capacity: usize,
    state: CursorState,
    schema: Option<Schema>,
    columns: Vec<ColumnBuffer>,
    stats: StreamStats,
}

impl<R: Read> StreamCursor<R> {
    pub fn new(reader: R, options: StreamOptions) -> Self {
        // Presizing never goes beyond what one chunk may declare; buffers
        // still grow on demand.
        let batch_capacity = options
            .batch_capacity
            .min(options.max_chunk_bytes / TEXT_BYTES_PER_RECORD);
        let scratch_capacity = options.scratch_capacity.min(options.max_chunk_bytes);

        Self {
            source: ByteSource::new(reader),
            decoder: BatchDecoder::new(
                options.codec.codec(),
                scratch_capacity,
                options.max_chunk_bytes,
            ),
            batch_capacity,
            state: CursorState::AwaitingSchema,
            schema: None,
            columns: Vec::new(),
            stats: StreamStats::default(),
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn codec(&self) -> CodecKind {
        self.decoder.codec_kind()
    }

    /// Give back the transport; any undrained remainder is the caller's.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// Report for a cursor stopped by `error` outside of `drain_with`
    pub fn report(&self, error: Option<ColstreamError>, started: Instant) -> StreamReport {
        StreamReport {
            state: self.state,
            stats: self.stats,
            error,
            elapsed: started.elapsed(),
        }
    }

    /// Read the prologue and allocate one buffer per column.
    pub fn read_schema(&mut self) -> Result<&Schema> {
        if self.state != CursorState::AwaitingSchema {
            return Err(ColstreamError::InvalidState(format!(
                "schema already read (cursor is {:?})",
                self.state
            )));
        }

        let schema = match SchemaReader::new(&mut self.source).read_schema() {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Failed to read stream schema: {}", e);
                self.state = CursorState::Failed;
                return Err(e);
            }
        };

        info!(
            "Stream schema: {} columns, codec {}",
            schema.len(),
            self.decoder.codec_kind()
        );
        self.columns = schema
            .columns()
            .iter()
            .map(|descriptor| ColumnBuffer::new(descriptor, self.batch_capacity))
            .collect();
        self.stats.bytes_read = schema.wire_size();
        self.state = CursorState::Streaming;

        if schema.is_empty() {
            // No column can ever carry a chunk
            warn!("Stream schema has no columns");
            self.state = CursorState::Drained;
        }

        Ok(self.schema.insert(schema))
    }

    /// Pull the next batch. `Ok(None)` once the stream has drained.
    ///
    /// Any error is terminal: the cursor moves to `Failed` and later calls
    /// return `InvalidState`.
    pub fn next_batch(&mut self) -> Result<Option<Batch<'_>>> {
        match self.state {
            CursorState::AwaitingSchema => {
                self.read_schema()?;
                if self.state == CursorState::Drained {
                    return Ok(None);
                }
            }
            CursorState::Streaming => {}
            CursorState::Drained => return Ok(None),
            CursorState::Failed => {
                return Err(ColstreamError::InvalidState(
                    "stream has already failed".to_string(),
                ))
            }
        }

        match self.decode_batch() {
            Ok(Some(record_count)) => Ok(Some(Batch {
                schema: self.schema.as_ref().ok_or_else(|| {
                    ColstreamError::InvalidState("streaming without a schema".to_string())
                })?,
                columns: &self.columns,
                record_count,
            })),
            Ok(None) => {
                info!(
                    "Stream drained: {} records in {} batches ({} bytes)",
                    self.stats.records, self.stats.batches, self.stats.bytes_read
                );
                self.state = CursorState::Drained;
                Ok(None)
            }
            Err(e) => {
                warn!(
                    "Stream failed after {} records ({} bytes): {}",
                    self.stats.records, self.stats.bytes_read, e
                );
                self.state = CursorState::Failed;
                Err(e)
            }
        }
    }

    /// Pull batches into `consume` until the stream ends, fails, or `consume`
    /// returns `false`. Stopping early leaves the cursor `Streaming`.
    pub fn drain_with<F>(&mut self, mut consume: F) -> StreamReport
    where
        F: FnMut(&Batch<'_>) -> bool,
    {
        let started = Instant::now();
        let error = loop {
            match self.next_batch() {
                Ok(Some(batch)) => {
                    if !consume(&batch) {
                        break None;
                    }
                }
                Ok(None) => break None,
                Err(e) => break Some(e),
            }
        };

        self.report(error, started)
    }

    /// Decode every column of one batch. Counters only move once the whole
    /// batch decoded and all columns agree on the row count.
    fn decode_batch(&mut self) -> Result<Option<usize>> {
        let start = self.source.position();
        let mut record_count: Option<usize> = None;

        for (position, column) in self.columns.iter_mut().enumerate() {
            match self.decoder.decode_column(column, &mut self.source)? {
                ColumnStatus::Decoded => {}
                ColumnStatus::EndOfStream if position == 0 => return Ok(None),
                ColumnStatus::EndOfStream => {
                    return Err(ProtocolError::Truncated {
                        what: "chunk header",
                        expected: HEADER_LEN,
                        available: 0,
                    }
                    .into())
                }
            }

            match record_count {
                None => record_count = Some(column.record_count()),
                Some(expected) if expected != column.record_count() => {
                    return Err(ProtocolError::RowCountMismatch {
                        column: column.index(),
                        expected,
                        actual: column.record_count(),
                    }
                    .into())
                }
                Some(_) => {}
            }
        }

        let record_count = record_count.unwrap_or(0);
        self.stats.records += record_count as u64;
        self.stats.batches += 1;
        self.stats.bytes_read += self.source.position() - start;
        debug!(
            "Decoded batch {} with {} records",
            self.stats.batches, record_count
        );
        Ok(Some(record_count))
    }
}
