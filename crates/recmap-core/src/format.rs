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

//! Format-level reader and writer contracts.
//!
//! A format reader turns the character stream into logical records: an
//! ordered token sequence for delimited formats, the raw line for
//! fixed-length streams. The engine is written against these traits; the
//! concrete CSV, delimited, and fixed-length implementations live in the
//! `recmap-stream` crate.

use crate::error::StreamError;

/// One logical record as produced by a format reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// Ordered field tokens (delimited and CSV formats).
    Tokens(Vec<String>),
    /// The raw record line (fixed-length format).
    Line(String),
}

impl RecordValue {
    /// The token at the given index, for tokenised records.
    pub fn token(&self, index: usize) -> Option<&str> {
        match self {
            Self::Tokens(tokens) => tokens.get(index).map(String::as_str),
            Self::Line(_) => None,
        }
    }

    /// Number of tokens, or the character length of the raw line.
    pub fn len(&self) -> usize {
        match self {
            Self::Tokens(tokens) => tokens.len(),
            Self::Line(line) => line.chars().count(),
        }
    }

    /// Returns true for an empty record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordValue {
    fn default() -> Self {
        Self::Tokens(Vec::new())
    }
}

/// Produces logical records from a character stream.
///
/// `read` returns `Ok(None)` at end of stream. A malformed record is
/// recoverable: the reader has advanced past it and the next `read`
/// continues at the following record. I/O failures are fatal.
pub trait RecordReader {
    /// Read the next logical record, or `None` at end of stream.
    fn read(&mut self) -> Result<Option<RecordValue>, StreamError>;

    /// Raw text of the record most recently returned by `read`.
    fn record_text(&self) -> &str;

    /// Line number of the record most recently returned by `read` (1-based).
    fn line_number(&self) -> usize;

    /// Release the underlying stream. Idempotent.
    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Consumes logical records and emits them to a character stream.
pub trait RecordWriter {
    /// Emit one logical record.
    fn write(&mut self, record: &RecordValue) -> std::io::Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> std::io::Result<()>;

    /// Flush and release the underlying stream. Idempotent.
    fn close(&mut self) -> std::io::Result<()>;
}

impl<T: RecordReader + ?Sized> RecordReader for Box<T> {
    fn read(&mut self) -> Result<Option<RecordValue>, StreamError> {
        (**self).read()
    }

    fn record_text(&self) -> &str {
        (**self).record_text()
    }

    fn line_number(&self) -> usize {
        (**self).line_number()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        (**self).close()
    }
}

impl<T: RecordWriter + ?Sized> RecordWriter for Box<T> {
    fn write(&mut self, record: &RecordValue) -> std::io::Result<()> {
        (**self).write(record)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }
}
