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

//! The reader driver: pulls records from a format reader, walks the layout
//! to locate the matching record definition, and parses entities.

use crate::context::RecordContext;
use crate::error::{ReadError, RuleCode, StreamError};
use crate::format::{RecordReader, RecordValue};
use crate::layout::LayoutTree;
use crate::mapping::StreamDef;
use std::sync::Arc;

/// Reads a stream of entities against a mapping.
///
/// `read` blocks until the next entity is produced, end of stream is
/// reached (`Ok(None)`), or an error is raised. Errors are recoverable at
/// the record level: the underlying reader has advanced past the offending
/// record, so calling `read` again continues with the next one.
///
/// One instance serves one logical caller; the mapping behind it is shared
/// and immutable.
pub struct EntityReader<R: RecordReader> {
    input: R,
    mapping: Arc<StreamDef>,
    layout: LayoutTree,
    ctx: RecordContext,
    record_name: String,
    done: bool,
}

impl<R: RecordReader> EntityReader<R> {
    /// Create a reader over a format-level record reader.
    pub fn new(mapping: Arc<StreamDef>, input: R) -> Self {
        let layout = LayoutTree::new(Arc::clone(&mapping));
        Self {
            input,
            mapping,
            layout,
            ctx: RecordContext::new(),
            record_name: String::new(),
            done: false,
        }
    }

    /// Read the next entity, or `Ok(None)` at end of stream.
    pub fn read(&mut self) -> Result<Option<crate::Entity>, ReadError> {
        if self.done {
            return Ok(None);
        }

        loop {
            self.ctx.clear();

            let value = match self.input.read() {
                Ok(value) => value,
                Err(StreamError::Malformed {
                    line,
                    text,
                    message,
                }) => {
                    self.ctx.set_record(RecordValue::default(), text, line);
                    self.ctx.add_record_error(RuleCode::Malformed, message);
                    return Err(ReadError::Malformed {
                        report: self.ctx.report(),
                    });
                }
                Err(StreamError::Io(err)) => return Err(ReadError::Io(err)),
            };

            let Some(value) = value else {
                self.done = true;
                if let Some(unsatisfied) = self.layout.check_close() {
                    let expected = self.mapping.node(unsatisfied).name().to_string();
                    self.ctx.set_record(
                        RecordValue::default(),
                        self.input.record_text().to_string(),
                        self.input.line_number(),
                    );
                    self.ctx.add_record_error(
                        RuleCode::Sequence,
                        format!("end of stream, expected record '{}'", expected),
                    );
                    return Err(ReadError::Sequence {
                        expected,
                        report: self.ctx.report(),
                    });
                }
                return Ok(None);
            };

            self.ctx.set_record(
                value,
                self.input.record_text().to_string(),
                self.input.line_number(),
            );

            match self.layout.match_next(&self.ctx) {
                Ok(Some(id)) => {
                    let Some(record) = self.mapping.record(id) else {
                        continue;
                    };
                    self.record_name.clear();
                    self.record_name.push_str(record.name());
                    self.ctx.set_record_name(record.name());
                    match record.parse(&mut self.ctx) {
                        Some(entity) => return Ok(Some(entity)),
                        None if self.ctx.has_errors() => {
                            return Err(ReadError::Invalid {
                                report: self.ctx.report(),
                            })
                        }
                        // records without an entity binding are validated
                        // and skipped
                        None => continue,
                    }
                }
                Ok(None) => {
                    return match self.layout.match_any(&self.ctx) {
                        Some(id) => {
                            let record = self.mapping.node(id).name().to_string();
                            self.ctx.add_record_error(
                                RuleCode::Unexpected,
                                format!("record '{}' is out of sequence or past its limit", record),
                            );
                            Err(ReadError::Unexpected {
                                record,
                                report: self.ctx.report(),
                            })
                        }
                        None => {
                            self.ctx.add_record_error(
                                RuleCode::Unidentified,
                                "no record mapping matches this input",
                            );
                            Err(ReadError::Unidentified {
                                report: self.ctx.report(),
                            })
                        }
                    };
                }
                Err(violation) => {
                    if self.layout.match_any(&self.ctx).is_none() {
                        self.ctx.add_record_error(
                            RuleCode::Unidentified,
                            "no record mapping matches this input",
                        );
                        return Err(ReadError::Unidentified {
                            report: self.ctx.report(),
                        });
                    }
                    let expected = self.mapping.node(violation.expected).name().to_string();
                    self.ctx.add_record_error(
                        RuleCode::Sequence,
                        format!("expected record '{}'", expected),
                    );
                    return Err(ReadError::Sequence {
                        expected,
                        report: self.ctx.report(),
                    });
                }
            }
        }
    }

    /// Name of the record definition matched by the last successful read.
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Line number of the record most recently read from the input.
    pub fn line_number(&self) -> usize {
        self.input.line_number()
    }

    /// Release the underlying stream. Idempotent; further reads return
    /// `Ok(None)`.
    pub fn close(&mut self) -> Result<(), ReadError> {
        self.done = true;
        self.input.close().map_err(|err| match err {
            StreamError::Io(io) => ReadError::Io(io),
            other => ReadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                other.to_string(),
            )),
        })
    }
}
