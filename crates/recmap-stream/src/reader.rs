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

//! Buffered line reader shared by the format readers.

use recmap_core::StreamError;
use std::io::{BufRead, BufReader, Read};

const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Buffered line reader with line number tracking.
///
/// Handles LF and CRLF endings and enforces a maximum line length; an
/// over-length line surfaces as a malformed record rather than exhausting
/// memory on unbounded input.
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    max_line_length: usize,
}

impl<R: Read> LineReader<R> {
    /// Create a new line reader with the default 1 MiB line length limit.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::new(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Create a line reader with a custom maximum line length in bytes.
    pub fn with_max_line_length(reader: R, max_line_length: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::new(),
            max_line_length,
        }
    }

    /// The line number of the most recently read line (1-based).
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next line, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<(usize, String)>, StreamError> {
        self.buffer.clear();

        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.line_number += 1;

                if self.buffer.len() > self.max_line_length {
                    return Err(StreamError::malformed(
                        self.line_number,
                        String::new(),
                        format!(
                            "line exceeds maximum length of {} bytes",
                            self.max_line_length
                        ),
                    ));
                }

                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }

                Ok(Some((self.line_number, self.buffer.clone())))
            }
            Err(e) => Err(StreamError::Io(e)),
        }
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = Result<(usize, String), StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
