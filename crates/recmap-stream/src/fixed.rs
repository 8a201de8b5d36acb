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

//! Fixed-length record reader and writer.
//!
//! Each line is one record. Slicing into fields happens in the engine,
//! driven by the field definitions' positions and widths, so the reader
//! hands the raw line through unchanged.

use crate::reader::LineReader;
use recmap_core::{RecordReader, RecordValue, RecordWriter, StreamError};
use std::io::{Read, Write};

/// Fixed-length format configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLengthConfig {
    /// Skip lines that are entirely empty.
    pub skip_blank_lines: bool,
}

/// Reads fixed-length records from a character stream.
pub struct FixedLengthRecordReader<R: Read> {
    lines: LineReader<R>,
    config: FixedLengthConfig,
    text: String,
    line: usize,
}

impl<R: Read> FixedLengthRecordReader<R> {
    /// Create a reader with the default configuration.
    pub fn new(input: R) -> Self {
        Self::with_config(input, FixedLengthConfig::default())
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(input: R, config: FixedLengthConfig) -> Self {
        Self {
            lines: LineReader::new(input),
            config,
            text: String::new(),
            line: 0,
        }
    }
}

impl<R: Read> RecordReader for FixedLengthRecordReader<R> {
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
            return Ok(Some(RecordValue::Line(self.text.clone())));
        }
    }

    fn record_text(&self) -> &str {
        &self.text
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

/// Writes fixed-length records to a character stream.
pub struct FixedLengthRecordWriter<W: Write> {
    output: W,
    closed: bool,
}

impl<W: Write> FixedLengthRecordWriter<W> {
    /// Create a new fixed-length writer.
    pub fn new(output: W) -> Self {
        Self {
            output,
            closed: false,
        }
    }
}

impl<W: Write> RecordWriter for FixedLengthRecordWriter<W> {
    fn write(&mut self, record: &RecordValue) -> std::io::Result<()> {
        let line = match record {
            RecordValue::Line(line) => line.clone(),
            RecordValue::Tokens(tokens) => tokens.concat(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_whole_lines() {
        let mut reader = FixedLengthRecordReader::new(Cursor::new("00042 Alice\n00043 Bob\n"));
        assert_eq!(
            reader.read().unwrap(),
            Some(RecordValue::Line("00042 Alice".to_string()))
        );
        assert_eq!(reader.record_text(), "00042 Alice");
        assert_eq!(reader.line_number(), 1);
        assert!(reader.read().unwrap().is_some());
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_skip_blank_lines() {
        let config = FixedLengthConfig {
            skip_blank_lines: true,
        };
        let mut reader =
            FixedLengthRecordReader::with_config(Cursor::new("aaa\n\nbbb\n"), config);
        reader.read().unwrap();
        assert_eq!(
            reader.read().unwrap(),
            Some(RecordValue::Line("bbb".to_string()))
        );
        assert_eq!(reader.line_number(), 3);
    }

    #[test]
    fn test_writer_concatenates_tokens() {
        let mut out = Vec::new();
        {
            let mut writer = FixedLengthRecordWriter::new(&mut out);
            writer
                .write(&RecordValue::Tokens(vec![
                    "00042".to_string(),
                    "Alice     ".to_string(),
                ]))
                .unwrap();
            writer.close().unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "00042Alice     \n");
    }

    #[test]
    fn test_writer_passes_lines_through() {
        let mut out = Vec::new();
        {
            let mut writer = FixedLengthRecordWriter::new(&mut out);
            writer
                .write(&RecordValue::Line("raw line".to_string()))
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "raw line\n");
    }
}
