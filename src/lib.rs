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

//! Colstream - reader for columnar result streams
//!
//! Decodes the batch-oriented columnar format produced by near-data
//! processing services: a schema prologue followed by per-column chunks,
//! optionally compressed with deflate, lz4 or zstd.

pub mod config;
pub mod error;
pub mod plan;
pub mod stream;

pub use config::Config;
pub use error::{ColstreamError, Result};
pub use plan::{PlanBuilder, ProcessingPlan};
pub use stream::{Batch, CodecKind, CursorState, StreamCursor, StreamOptions, StreamStats};
