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

//! Error types for mapping configuration, reading, and writing.
//!
//! Errors fall into three taxa:
//!
//! - **Configuration faults** ([`ConfigError`]): invalid mapping detected at
//!   build time. Fatal, no recovery.
//! - **Stream faults** ([`StreamError::Io`]): I/O failures from the
//!   underlying reader or writer. Fatal for the stream, cause preserved.
//! - **Record faults** ([`ReadError`]): per-record issues. Structural errors
//!   are distinct variants; field validation errors are accumulated into a
//!   [`RecordReport`] and raised as one [`ReadError::Invalid`].

use thiserror::Error;

/// Rule codes attached to structured record and field errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleCode {
    /// The record could not be tokenised.
    Malformed,
    /// No record definition matches the input.
    Unidentified,
    /// A record definition matches but is not allowed at this point.
    Unexpected,
    /// An expected record never arrived.
    Sequence,
    /// A required field was absent or empty.
    Required,
    /// Field text did not equal the configured literal.
    Literal,
    /// Field text shorter than the configured minimum length.
    MinLength,
    /// Field text longer than the configured maximum length.
    MaxLength,
    /// Field text did not match the configured pattern.
    Regex,
    /// A collection field produced fewer values than its minimum.
    MinOccurs,
    /// Type conversion failed, or null reached a primitive property.
    Type,
}

impl RuleCode {
    /// The stable wire name of this rule code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Unidentified => "unidentified",
            Self::Unexpected => "unexpected",
            Self::Sequence => "sequence",
            Self::Required => "required",
            Self::Literal => "literal",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Regex => "regex",
            Self::MinOccurs => "minOccurs",
            Self::Type => "type",
        }
    }
}

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field validation error, in field declaration order on the report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldError {
    /// The field name.
    pub field: String,
    /// The offending raw field text, if any was extracted.
    pub text: Option<String>,
    /// The violated rule.
    pub rule: RuleCode,
    /// Rule parameters (e.g. the expected literal, the length bounds).
    pub params: Vec<String>,
}

/// One record-level structural error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordError {
    /// The violated rule.
    pub rule: RuleCode,
    /// Human-readable detail.
    pub message: String,
}

/// Everything known about a failed record: identity, raw text, and the
/// accumulated errors. Record errors precede field errors; field errors are
/// in field declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordReport {
    /// Name of the matched record definition, or empty if unmatched.
    pub record_name: String,
    /// Line number of the record in the input (1-based).
    pub line: usize,
    /// Raw record text.
    pub text: String,
    /// Record-level errors.
    pub record_errors: Vec<RecordError>,
    /// Field-level validation errors.
    pub field_errors: Vec<FieldError>,
}

impl RecordReport {
    /// Total number of errors on this report.
    pub fn error_count(&self) -> usize {
        self.record_errors.len() + self.field_errors.len()
    }

    /// Returns true if any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

impl std::fmt::Display for RecordReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "record '{}' at line {}: {} error(s)",
            self.record_name,
            self.line,
            self.error_count()
        )
    }
}

/// Invalid mapping configuration, detected when a mapping is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two sibling records share a name.
    #[error("duplicate record '{name}' in group '{group}'")]
    DuplicateRecord { name: String, group: String },

    /// A field's occupied positions collide with a sibling's.
    #[error("field '{field}' in record '{record}' overlaps position {position}")]
    FieldOverlap {
        record: String,
        field: String,
        position: usize,
    },

    /// An unbounded collection field admits no higher-positioned sibling.
    #[error("field '{field}' in record '{record}' follows an unbounded collection")]
    FieldAfterUnbounded { record: String, field: String },

    /// Minimum occurrences exceed the maximum.
    #[error("invalid occurrence range {min}..{max} on '{name}'")]
    OccursRange {
        name: String,
        min: usize,
        max: usize,
    },

    /// Sibling order indices must weakly increase in declaration order.
    #[error("sibling order decreases at '{name}'")]
    OrderNotIncreasing { name: String },

    /// A record sharing its cohort with siblings needs an identifier field.
    #[error("record '{record}' requires a record-identifier field")]
    MissingIdentifier { record: String },

    /// A named type handler was referenced but never registered.
    #[error("unknown type handler '{name}'")]
    UnknownHandler { name: String },

    /// A field's regex rule failed to compile.
    #[error("invalid regex on field '{field}'")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Fixed-length streams require a width on every field.
    #[error("fixed-length field '{field}' in record '{record}' has no width")]
    MissingWidth { record: String, field: String },

    /// No mapping is registered under the requested name.
    #[error("unknown mapping '{name}'")]
    UnknownMapping { name: String },
}

/// A failure surfaced by a format-level record reader.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The record could not be tokenised (recoverable: the reader has
    /// advanced past the offending record).
    #[error("malformed record at line {line}: {message}")]
    Malformed {
        line: usize,
        text: String,
        message: String,
    },

    /// I/O failure (fatal for the stream).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Create a malformed-record error.
    #[inline]
    pub fn malformed(line: usize, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            text: text.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while reading entities from a stream.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The record could not be tokenised by the format reader.
    #[error("malformed record at line {}", .report.line)]
    Malformed { report: RecordReport },

    /// No record definition in the entire mapping matches the input.
    #[error("unidentified record at line {}", .report.line)]
    Unidentified { report: RecordReport },

    /// A record definition matches, but not at this point in the layout.
    #[error("unexpected record '{record}' at line {}", .report.line)]
    Unexpected { record: String, report: RecordReport },

    /// An expected record never arrived, mid-stream or at end of input.
    #[error("expected record '{expected}' at line {}", .report.line)]
    Sequence {
        expected: String,
        report: RecordReport,
    },

    /// The record matched but one or more fields failed validation.
    #[error("invalid record '{}' at line {}: {} field error(s)",
        .report.record_name, .report.line, .report.field_errors.len())]
    Invalid { report: RecordReport },

    /// I/O failure from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// The per-record report, for every variant that carries one.
    pub fn report(&self) -> Option<&RecordReport> {
        match self {
            Self::Malformed { report }
            | Self::Unidentified { report }
            | Self::Unexpected { report, .. }
            | Self::Sequence { report, .. }
            | Self::Invalid { report } => Some(report),
            Self::Io(_) => None,
        }
    }

    /// The input line number, if known.
    pub fn line(&self) -> Option<usize> {
        self.report().map(|r| r.line)
    }
}

/// Errors raised while writing entities to a stream.
#[derive(Error, Debug)]
pub enum WriteError {
    /// No record definition matches the outgoing entity.
    #[error("no record mapping matches entity '{entity}'")]
    NoMatchingRecord { entity: String },

    /// More than one record definition matches the outgoing entity.
    #[error("entity '{entity}' matches both record '{first}' and record '{second}'")]
    AmbiguousRecord {
        entity: String,
        first: String,
        second: String,
    },

    /// A field value could not be formatted.
    #[error("cannot format field '{field}': {message}")]
    Conversion { field: String, message: String },

    /// I/O failure from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type conversion failure reported by a type handler.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TypeError {
    /// What went wrong.
    pub message: String,
}

impl TypeError {
    /// Create a new type conversion error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for writing operations.
pub type WriteResult<T> = Result<T, WriteError>;
