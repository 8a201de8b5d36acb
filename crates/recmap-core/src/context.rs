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

//! Per-record runtime state for the reader.

use crate::error::{FieldError, RecordError, RecordReport, RuleCode};
use crate::format::RecordValue;

/// Mutable state describing the record currently being parsed: its raw text,
/// tokenised value, position in the input, and every error accumulated while
/// parsing it. Cleared and refilled for each input record; one instance
/// lives for the whole stream.
#[derive(Debug, Default)]
pub struct RecordContext {
    line: usize,
    text: String,
    value: RecordValue,
    record_name: String,
    record_errors: Vec<RecordError>,
    field_errors: Vec<FieldError>,
}

impl RecordContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the context for the next input record.
    pub fn clear(&mut self) {
        self.line = 0;
        self.text.clear();
        self.value = RecordValue::default();
        self.record_name.clear();
        self.record_errors.clear();
        self.field_errors.clear();
    }

    /// Install the next record's value, raw text, and line number.
    pub fn set_record(&mut self, value: RecordValue, text: String, line: usize) {
        self.value = value;
        self.text = text;
        self.line = line;
    }

    /// Record the name of the matched record definition.
    pub fn set_record_name(&mut self, name: &str) {
        self.record_name.clear();
        self.record_name.push_str(name);
    }

    /// The current record value.
    pub fn value(&self) -> &RecordValue {
        &self.value
    }

    /// The current record's raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current record's line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Append a field validation error.
    pub fn add_field_error(
        &mut self,
        field: &str,
        text: Option<&str>,
        rule: RuleCode,
        params: Vec<String>,
    ) {
        self.field_errors.push(FieldError {
            field: field.to_string(),
            text: text.map(str::to_string),
            rule,
            params,
        });
    }

    /// Append a record-level error.
    pub fn add_record_error(&mut self, rule: RuleCode, message: impl Into<String>) {
        self.record_errors.push(RecordError {
            rule,
            message: message.into(),
        });
    }

    /// Returns true if any field error was accumulated.
    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Returns true if any error was accumulated.
    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.record_errors.is_empty()
    }

    /// Snapshot the context into an immutable report.
    pub fn report(&self) -> RecordReport {
        RecordReport {
            record_name: self.record_name.clone(),
            line: self.line,
            text: self.text.clone(),
            record_errors: self.record_errors.clone(),
            field_errors: self.field_errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_clean() {
        let ctx = RecordContext::new();
        assert!(!ctx.has_errors());
        assert_eq!(ctx.line(), 0);
        assert_eq!(ctx.text(), "");
    }

    #[test]
    fn test_set_record() {
        let mut ctx = RecordContext::new();
        ctx.set_record(
            RecordValue::Tokens(vec!["a".to_string()]),
            "a".to_string(),
            3,
        );
        assert_eq!(ctx.line(), 3);
        assert_eq!(ctx.text(), "a");
        assert_eq!(ctx.value().token(0), Some("a"));
    }

    #[test]
    fn test_errors_accumulate_in_order() {
        let mut ctx = RecordContext::new();
        ctx.add_field_error("id", Some("x"), RuleCode::Type, vec![]);
        ctx.add_field_error("name", None, RuleCode::Required, vec![]);
        let report = ctx.report();
        assert_eq!(report.field_errors.len(), 2);
        assert_eq!(report.field_errors[0].field, "id");
        assert_eq!(report.field_errors[1].field, "name");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ctx = RecordContext::new();
        ctx.set_record(RecordValue::Line("x".to_string()), "x".to_string(), 9);
        ctx.set_record_name("person");
        ctx.add_record_error(RuleCode::Malformed, "bad");
        ctx.add_field_error("id", None, RuleCode::Required, vec![]);
        ctx.clear();
        assert!(!ctx.has_errors());
        assert_eq!(ctx.line(), 0);
        assert_eq!(ctx.report().record_name, "");
    }

    #[test]
    fn test_report_snapshot() {
        let mut ctx = RecordContext::new();
        ctx.set_record(RecordValue::default(), "raw".to_string(), 5);
        ctx.set_record_name("person");
        ctx.add_record_error(RuleCode::Unexpected, "out of place");
        let report = ctx.report();
        assert_eq!(report.record_name, "person");
        assert_eq!(report.line, 5);
        assert_eq!(report.text, "raw");
        assert_eq!(report.record_errors[0].rule, RuleCode::Unexpected);
    }

    #[test]
    fn test_has_field_errors_distinct_from_record_errors() {
        let mut ctx = RecordContext::new();
        ctx.add_record_error(RuleCode::Malformed, "bad");
        assert!(ctx.has_errors());
        assert!(!ctx.has_field_errors());
    }
}
