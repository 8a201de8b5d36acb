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

//! Plain delimited record reader and writer.
//!
//! Fields are split on a single delimiter character with no quoting or
//! escaping; a field value containing the delimiter cannot be represented
//! in this format (use the CSV pair for that).

use crate::reader::LineReader;
use recmap_core::{RecordReader, RecordValue, RecordWriter, StreamError};
use std::io::{Read, Write};

/// Delimited format configuration.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Skip lines that are entirely empty.
    pub skip_blank_lines: bool,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            skip_blank_lines: false,
        }
    }
}

/// Reads delimited records from a character stream.
pub struct DelimitedRecordReader<R: Read> {
    lines: LineReader<R>,
    config: DelimitedConfig,
    text: String,
    line: usize,
}

impl<R: Read> DelimitedRecordReader<R> {
    /// Create a reader with the default (tab-delimited) configuration.
    pub fn new(input: R) -> Self {
        Self::with_config(input, DelimitedConfig::default())
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(input: R, config: DelimitedConfig) -> Self {
        Self {
            lines: LineReader::new(input),
            config,
            text: String::new(),
            line: 0,
        }
    }
}

impl<R: Read> RecordReader for DelimitedRecordReader<R> {
    fn read(&mut self) -> Result<Option<RecordValue>, StreamError> {
        loop {
            let Some((line_number, line)) = self.lines.next_line()? else {
                return Ok(None);
            };
            if self.config.skip_blank_lines && line.is_empty() {
                continue;
            }
            self.line = line_number;
            self.text = line;
            let tokens = self
                .text
                .split(self.config.delimiter)
                .map(str::to_string)
                .collect();
            return Ok(Some(RecordValue::Tokens(tokens)));
        }
    }

    fn record_text(&self) -> &str {
        &self.text
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

/// Writes delimited records to a character stream.
pub struct DelimitedRecordWriter<W: Write> {
    output: W,
    config: DelimitedConfig,
    closed: bool,
}

impl<W: Write> DelimitedRecordWriter<W> {
    /// Create a writer with the default (tab-delimited) configuration.
    pub fn new(output: W) -> Self {
        Self::with_config(output, DelimitedConfig::default())
    }

    /// Create a writer with a custom configuration.
    pub fn with_config(output: W, config: DelimitedConfig) -> Self {
        Self {
            output,
            config,
            closed: false,
        }
    }
}

impl<W: Write> RecordWriter for DelimitedRecordWriter<W> {
    fn write(&mut self, record: &RecordValue) -> std::io::Result<()> {
        let line = match record {
            RecordValue::Tokens(tokens) => {
                tokens.join(&self.config.delimiter.to_string())
            }
            RecordValue::Line(line) => line.clone(),
        };
        writeln!(self.output, "{}", line)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.output.flush()
    }

    fn close(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.output.flush()
    }
}
