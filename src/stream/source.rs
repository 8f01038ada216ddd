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

//! Blocking byte source over the transport stream
//!
//! Adds "read exactly N bytes" semantics on top of any `Read`, keeping a clean
//! end-of-stream (nothing left at all) apart from a short read.

use crate::error::{ProtocolError, Result};
use std::io::{ErrorKind, Read};

/// Outcome of a read that is allowed to hit end-of-stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// The whole buffer was filled
    Complete,
    /// The stream ended before a single byte was read
    EndOfStream,
}

#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Total bytes consumed from the transport so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely. Any shortfall, including an immediate
    /// end-of-stream, is a truncation.
    pub fn read_exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        let filled = self.fill(buf)?;
        if filled < buf.len() {
            return Err(ProtocolError::Truncated {
                what,
                expected: buf.len(),
                available: filled,
            }
            .into());
        }
        Ok(())
    }

    /// Fill `buf` completely, or report a clean end-of-stream when no byte at
    /// all was available. A partial fill is a truncation.
    pub fn read_exact_or_eof(&mut self, buf: &mut [u8], what: &'static str) -> Result<Fill> {
        let filled = self.fill(buf)?;
        if filled == 0 && !buf.is_empty() {
            return Ok(Fill::EndOfStream);
        }
        if filled < buf.len() {
            return Err(ProtocolError::Truncated {
                what,
                expected: buf.len(),
                available: filled,
            }
            .into());
        }
        Ok(Fill::Complete)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}
