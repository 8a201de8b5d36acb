// Dweve RECMAP - Declarative Record Mapping
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Format-level record readers and writers for RECMAP.
//!
//! Implementations of the `recmap-core` [`RecordReader`] and
//! [`RecordWriter`] contracts for the three supported stream formats:
//!
//! - [`csv`]: comma-separated values with quote handling,
//! - [`delimited`]: plain character-delimited fields, no quoting,
//! - [`fixed`]: fixed-width lines sliced by the field definitions.
//!
//! All readers are built on the buffered [`LineReader`], which tracks line
//! numbers, strips LF/CRLF endings, and guards against unbounded line
//! lengths.
//!
//! [`RecordReader`]: recmap_core::RecordReader
//! [`RecordWriter`]: recmap_core::RecordWriter

pub mod csv;
pub mod delimited;
pub mod fixed;
mod reader;

pub use csv::{CsvConfig, CsvRecordReader, CsvRecordWriter};
pub use delimited::{DelimitedConfig, DelimitedRecordReader, DelimitedRecordWriter};
pub use fixed::{FixedLengthConfig, FixedLengthRecordReader, FixedLengthRecordWriter};
pub use reader::LineReader;
