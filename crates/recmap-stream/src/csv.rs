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

//! CSV record reader and writer.
//!
//! One logical record per line. Fields are separated by the configured
//! delimiter; a field starting with the quote character runs to the next
//! unescaped quote, with doubled quotes escaping a literal quote. An
//! unterminated quote or trailing text after a closing quote makes the
//! record malformed — the reader reports it and continues at the next line.

use crate::reader::LineReader;
use recmap_core::{RecordReader, RecordValue, RecordWriter, StreamError};
use std::io::{Read, Write};

/// CSV tokenizer configuration.
#[derive(Debug, Clone, Copy)]
pub struct CsvConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Quote character.
    pub quote: char,
    /// Skip lines that are entirely empty.
    pub skip_blank_lines: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            skip_blank_lines: false,
        }
    }
}

/// Split one CSV line into field tokens.
pub fn parse_csv_record(line: &str, config: &CsvConfig) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();

    loop {
        field.clear();
        match chars.peek() {
            Some(&c) if c == config.quote => {
                chars.next();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == config.quote {
                        if chars.peek() == Some(&config.quote) {
                            chars.next();
                            field.push(config.quote);
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        field.push(c);
                    }
                }
                if !closed {
                    return Err("unterminated quoted field".to_string());
                }
                match chars.next() {
                    None => {
                        tokens.push(field.clone());
                        break;
                    }
                    Some(c) if c == config.delimiter => {
                        tokens.push(field.clone());
                    }
                    Some(c) => {
                        return Err(format!(
                            "unexpected character '{}' after quoted field",
                            c
                        ));
                    }
                }
            }
            _ => {
                let mut ended = false;
                for c in chars.by_ref() {
                    if c == config.delimiter {
                        ended = true;
                        break;
                    }
                    field.push(c);
                }
                tokens.push(field.clone());
                if !ended {
                    break;
                }
            }
        }
    }

    Ok(tokens)
}

/// Join field tokens into one CSV line, quoting on demand.
pub fn format_csv_record(tokens: &[String], config: &CsvConfig) -> String {
    let mut line = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            line.push(config.delimiter);
        }
        let needs_quoting = token.contains(config.delimiter)
            || token.contains(config.quote)
            || token.contains('\n')
            || token.contains('\r');
        if needs_quoting {
            line.push(config.quote);
            for c in token.chars() {
                if c == config.quote {
                    line.push(config.quote);
                }
                line.push(c);
            }
            line.push(config.quote);
        } else {
            line.push_str(token);
        }
    }
    line
}

/// Reads CSV records from a character stream.
pub struct CsvRecordReader<R: Read> {
    lines: LineReader<R>,
    config: CsvConfig,
    text: String,
    line: usize,
}

impl<R: Read> CsvRecordReader<R> {
    /// Create a reader with the default configuration.
    pub fn new(input: R) -> Self {
        Self::with_config(input, CsvConfig::default())
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(input: R, config: CsvConfig) -> Self {
        Self {
            lines: LineReader::new(input),
            config,
            text: String::new(),
            line: 0,
        }
    }
}

impl<R: Read> RecordReader for CsvRecordReader<R> {
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
            return match parse_csv_record(&self.text, &self.config) {
                Ok(tokens) => Ok(Some(RecordValue::Tokens(tokens))),
                Err(message) => Err(StreamError::malformed(
                    self.line,
                    self.text.clone(),
                    message,
                )),
            };
        }
    }

    fn record_text(&self) -> &str {
        &self.text
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

/// Writes CSV records to a character stream.
pub struct CsvRecordWriter<W: Write> {
    output: W,
    config: CsvConfig,
    closed: bool,
}

impl<W: Write> CsvRecordWriter<W> {
    /// Create a writer with the default configuration.
    pub fn new(output: W) -> Self {
        Self::with_config(output, CsvConfig::default())
    }

    /// Create a writer with a custom configuration.
    pub fn with_config(output: W, config: CsvConfig) -> Self {
        Self {
            output,
            config,
            closed: false,
        }
    }
}

impl<W: Write> RecordWriter for CsvRecordWriter<W> {
    fn write(&mut self, record: &RecordValue) -> std::io::Result<()> {
        let line = match record {
            RecordValue::Tokens(tokens) => format_csv_record(tokens, &self.config),
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
