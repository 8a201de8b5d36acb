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

//! Field parsing and formatting.
//!
//! Parsing runs extraction, trimming, validation, and type conversion in a
//! fixed order. Validation rules do not short-circuit: a field text that
//! violates both a length bound and a regex reports both errors. The
//! outcome is the three-variant [`FieldValue`], keeping "absent" and
//! "invalid" distinct from every legal value.

use crate::context::RecordContext;
use crate::error::{RuleCode, WriteError};
use crate::format::RecordValue;
use crate::mapping::{FieldDef, Justify};
use crate::value::Value;

/// Outcome of parsing one field from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// The parsed value (possibly null, possibly the configured default).
    Parsed(Value),
    /// The field text was absent and the occurrence minimum was already met.
    Missing,
    /// One or more validation errors were appended to the context.
    Invalid,
}

enum Extraction {
    Text(String),
    Absent,
    /// Fixed-length only: the line covers the field start but not its width.
    Underflow,
}

impl FieldDef {
    fn extract(&self, ctx: &RecordContext, occurrence: usize) -> Extraction {
        match ctx.value() {
            RecordValue::Tokens(tokens) => match tokens.get(self.position + occurrence) {
                Some(text) => Extraction::Text(text.clone()),
                None => Extraction::Absent,
            },
            RecordValue::Line(line) => {
                let width = self.width.unwrap_or(0);
                let start = self.position + occurrence * width;
                let chars: Vec<char> = line.chars().collect();
                if width == 0 || start >= chars.len() {
                    Extraction::Absent
                } else if start + width > chars.len() {
                    Extraction::Underflow
                } else {
                    Extraction::Text(chars[start..start + width].iter().collect())
                }
            }
        }
    }

    /// Parse this field from the current record, appending any validation
    /// errors to the context.
    pub(crate) fn parse(&self, ctx: &mut RecordContext) -> FieldValue {
        if !self.collection {
            return self.parse_occurrence(ctx, 0);
        }

        let mut items = Vec::new();
        let mut invalid = false;
        let mut index = 0;
        loop {
            if let Some(max) = self.max_occurs {
                if index >= max {
                    break;
                }
            }
            match self.parse_occurrence(ctx, index) {
                FieldValue::Missing => break,
                FieldValue::Invalid => invalid = true,
                FieldValue::Parsed(value) => items.push(value),
            }
            index += 1;
        }

        if invalid {
            FieldValue::Invalid
        } else {
            FieldValue::Parsed(Value::List(items))
        }
    }

    fn parse_occurrence(&self, ctx: &mut RecordContext, index: usize) -> FieldValue {
        let raw = match self.extract(ctx, index) {
            Extraction::Underflow => {
                ctx.add_record_error(
                    RuleCode::Malformed,
                    format!("field '{}' extends past the end of the record", self.name),
                );
                return FieldValue::Invalid;
            }
            Extraction::Absent => None,
            Extraction::Text(text) => Some(text),
        };

        // a missing collection occurrence terminates the loop once the
        // minimum is met; below the minimum it is an error
        if raw.is_none() && self.collection {
            if index < self.min_occurs {
                ctx.add_field_error(
                    &self.name,
                    None,
                    RuleCode::MinOccurs,
                    vec![
                        self.min_occurs.to_string(),
                        bound_param(self.max_occurs),
                    ],
                );
                return FieldValue::Invalid;
            }
            return FieldValue::Missing;
        }

        let trimmed = raw.as_deref().map(|t| if self.trim { t.trim() } else { t });

        let mut valid = true;
        match trimmed {
            None | Some("") => {
                if self.required {
                    ctx.add_field_error(&self.name, raw.as_deref(), RuleCode::Required, vec![]);
                    valid = false;
                } else if let Some(default) = &self.default {
                    return FieldValue::Parsed(default.clone());
                }
            }
            Some(text) => {
                if let Some(literal) = &self.literal {
                    if literal != text {
                        ctx.add_field_error(
                            &self.name,
                            raw.as_deref(),
                            RuleCode::Literal,
                            vec![literal.clone()],
                        );
                        valid = false;
                    }
                }
                let length = text.chars().count();
                if length < self.min_length {
                    ctx.add_field_error(
                        &self.name,
                        raw.as_deref(),
                        RuleCode::MinLength,
                        vec![
                            self.min_length.to_string(),
                            bound_param(self.max_length),
                        ],
                    );
                    valid = false;
                }
                if let Some(max_length) = self.max_length {
                    if length > max_length {
                        ctx.add_field_error(
                            &self.name,
                            raw.as_deref(),
                            RuleCode::MaxLength,
                            vec![self.min_length.to_string(), max_length.to_string()],
                        );
                        valid = false;
                    }
                }
                if let Some(regex) = &self.regex {
                    if !regex.is_match(text) {
                        ctx.add_field_error(
                            &self.name,
                            raw.as_deref(),
                            RuleCode::Regex,
                            vec![regex.as_str().to_string()],
                        );
                        valid = false;
                    }
                }
            }
        }

        // type conversion is skipped when validation already failed
        if !valid {
            return FieldValue::Invalid;
        }

        let value = match trimmed {
            None | Some("") => Value::Null,
            Some(text) => match self.handler.parse(text) {
                Ok(value) => value,
                Err(err) => {
                    ctx.add_field_error(
                        &self.name,
                        raw.as_deref(),
                        RuleCode::Type,
                        vec![err.to_string()],
                    );
                    return FieldValue::Invalid;
                }
            },
        };

        if value.is_null() {
            if let Some(binding) = &self.binding {
                if binding.primitive {
                    ctx.add_field_error(
                        &self.name,
                        raw.as_deref(),
                        RuleCode::Type,
                        vec![format!("property '{}' cannot be null", binding.name)],
                    );
                    return FieldValue::Invalid;
                }
            }
        }

        FieldValue::Parsed(value)
    }

    /// Format a value to field text. A configured literal always wins; a
    /// null value formats to the empty string. Fixed-length text is padded
    /// to the field width.
    pub(crate) fn format_value(&self, value: Option<&Value>) -> Result<String, WriteError> {
        let text = match &self.literal {
            Some(literal) => literal.clone(),
            None => {
                let value = value.unwrap_or(&Value::Null);
                self.handler
                    .format(value)
                    .map_err(|err| WriteError::Conversion {
                        field: self.name.clone(),
                        message: err.to_string(),
                    })?
            }
        };
        self.pad(text)
    }

    fn pad(&self, text: String) -> Result<String, WriteError> {
        let Some(width) = self.width else {
            return Ok(text);
        };
        let length = text.chars().count();
        if length > width {
            return Err(WriteError::Conversion {
                field: self.name.clone(),
                message: format!("text '{}' exceeds field width {}", text, width),
            });
        }
        let fill: String = std::iter::repeat(self.padding).take(width - length).collect();
        Ok(match self.justify {
            Justify::Left => format!("{}{}", text, fill),
            Justify::Right => format!("{}{}", fill, text),
        })
    }

    /// Identifier test against field text: the literal and the regex must
    /// both hold when configured.
    pub(crate) fn matches_text(&self, text: &str) -> bool {
        let text = if self.trim { text.trim() } else { text };
        if let Some(literal) = &self.literal {
            if literal != text {
                return false;
            }
        }
        if let Some(regex) = &self.regex {
            if !regex.is_match(text) {
                return false;
            }
        }
        true
    }

    /// Identifier test against the current record.
    pub(crate) fn matches_record(&self, ctx: &RecordContext) -> bool {
        match self.extract(ctx, 0) {
            Extraction::Text(text) => self.matches_text(&text),
            _ => false,
        }
    }

    /// Identifier test against an entity property value, used on the write
    /// path: the value must be assignable to the declared type and format
    /// to text passing the literal/regex rules.
    pub(crate) fn matches_value(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        if !self.handler.value_type().is_assignable(value) {
            return false;
        }
        match self.handler.format(value) {
            Ok(text) => self.matches_text(&text),
            Err(_) => false,
        }
    }
}

fn bound_param(bound: Option<usize>) -> String {
    match bound {
        Some(n) => n.to_string(),
        None => "unbounded".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDefBuilder, RecordDefBuilder, StreamDef, StreamFormat};
    use crate::value::ValueType;

    fn csv_field(builder: FieldDefBuilder) -> StreamDef {
        StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("r").field(builder))
            .build()
            .unwrap()
    }

    fn the_field(def: &StreamDef) -> &FieldDef {
        &def.record_by_name("r").unwrap().fields()[0]
    }

    fn ctx_with_tokens(tokens: &[&str]) -> RecordContext {
        let mut ctx = RecordContext::new();
        ctx.set_record(
            RecordValue::Tokens(tokens.iter().map(|t| t.to_string()).collect()),
            tokens.join(","),
            1,
        );
        ctx
    }

    fn ctx_with_line(line: &str) -> RecordContext {
        let mut ctx = RecordContext::new();
        ctx.set_record(RecordValue::Line(line.to_string()), line.to_string(), 1);
        ctx
    }

    // ==================== Extraction tests ====================

    #[test]
    fn test_parse_token_at_position() {
        let def = csv_field(FieldDefBuilder::new("b").at(1));
        let mut ctx = ctx_with_tokens(&["x", "y"]);
        assert_eq!(
            the_field(&def).parse(&mut ctx),
            FieldValue::Parsed(Value::String("y".to_string()))
        );
    }

    #[test]
    fn test_absent_optional_field_parses_to_null() {
        let def = csv_field(FieldDefBuilder::new("b").at(5));
        let mut ctx = ctx_with_tokens(&["x"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Parsed(Value::Null));
        assert!(!ctx.has_field_errors());
    }

    #[test]
    fn test_fixed_length_slice() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(
                RecordDefBuilder::new("r")
                    .field(FieldDefBuilder::new("id").width(5).trim(false)),
            )
            .build()
            .unwrap();
        let mut ctx = ctx_with_line("00042 Alice");
        assert_eq!(
            the_field(&def).parse(&mut ctx),
            FieldValue::Parsed(Value::String("00042".to_string()))
        );
    }

    #[test]
    fn test_fixed_length_underflow_is_malformed() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(RecordDefBuilder::new("r").field(FieldDefBuilder::new("id").width(5)))
            .build()
            .unwrap();
        let mut ctx = ctx_with_line("007");
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        let report = ctx.report();
        assert_eq!(report.record_errors[0].rule, RuleCode::Malformed);
    }

    #[test]
    fn test_fixed_length_past_end_is_absent() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(
                RecordDefBuilder::new("r")
                    .field(FieldDefBuilder::new("x").at(10).width(5)),
            )
            .build()
            .unwrap();
        let mut ctx = ctx_with_line("short");
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Parsed(Value::Null));
    }

    // ==================== Required / default tests ====================

    #[test]
    fn test_required_field_absent() {
        let def = csv_field(FieldDefBuilder::new("a").required());
        let mut ctx = ctx_with_tokens(&[]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::Required);
    }

    #[test]
    fn test_required_field_empty_after_trim() {
        let def = csv_field(FieldDefBuilder::new("a").required());
        let mut ctx = ctx_with_tokens(&["   "]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::Required);
    }

    #[test]
    fn test_default_applies_when_absent() {
        let def = csv_field(FieldDefBuilder::new("a").default_value("fallback"));
        let mut ctx = ctx_with_tokens(&[]);
        assert_eq!(
            the_field(&def).parse(&mut ctx),
            FieldValue::Parsed(Value::String("fallback".to_string()))
        );
    }

    #[test]
    fn test_default_applies_when_empty() {
        let def = csv_field(FieldDefBuilder::new("a").default_value(7i64));
        let mut ctx = ctx_with_tokens(&[""]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Parsed(Value::Int(7)));
    }

    // ==================== Validation rule tests ====================

    #[test]
    fn test_literal_mismatch() {
        let def = csv_field(FieldDefBuilder::new("a").literal("H"));
        let mut ctx = ctx_with_tokens(&["D"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        let err = &ctx.report().field_errors[0];
        assert_eq!(err.rule, RuleCode::Literal);
        assert_eq!(err.params, vec!["H".to_string()]);
    }

    #[test]
    fn test_length_bounds() {
        let def = csv_field(FieldDefBuilder::new("a").min_length(2).max_length(4));
        let mut ctx = ctx_with_tokens(&["x"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::MinLength);

        let mut ctx = ctx_with_tokens(&["abcde"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::MaxLength);
    }

    #[test]
    fn test_regex_mismatch() {
        let def = csv_field(FieldDefBuilder::new("a").regex(r"^\d+$"));
        let mut ctx = ctx_with_tokens(&["12a"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::Regex);
    }

    #[test]
    fn test_validations_do_not_short_circuit() {
        // violates minLength and regex at once: both errors surface
        let def = csv_field(FieldDefBuilder::new("a").min_length(5).regex(r"^\d+$"));
        let mut ctx = ctx_with_tokens(&["abc"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        let rules: Vec<_> = ctx.report().field_errors.iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec![RuleCode::MinLength, RuleCode::Regex]);
    }

    #[test]
    fn test_literal_and_regex_both_apply() {
        let def = csv_field(FieldDefBuilder::new("a").literal("abc").regex(r"^\d+$"));
        let mut ctx = ctx_with_tokens(&["abc"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        let rules: Vec<_> = ctx.report().field_errors.iter().map(|e| e.rule).collect();
        assert_eq!(rules, vec![RuleCode::Regex]);
    }

    // ==================== Type conversion tests ====================

    #[test]
    fn test_type_conversion() {
        let def = csv_field(FieldDefBuilder::new("a").typed(ValueType::Int));
        let mut ctx = ctx_with_tokens(&["42"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Parsed(Value::Int(42)));
    }

    #[test]
    fn test_type_conversion_failure() {
        let def = csv_field(FieldDefBuilder::new("a").typed(ValueType::Int));
        let mut ctx = ctx_with_tokens(&["x"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::Type);
    }

    #[test]
    fn test_conversion_skipped_after_validation_failure() {
        let def = csv_field(
            FieldDefBuilder::new("a")
                .typed(ValueType::Int)
                .max_length(1),
        );
        let mut ctx = ctx_with_tokens(&["abc"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        // only the length error: no type error for the unparseable text
        assert_eq!(ctx.report().field_errors.len(), 1);
    }

    #[test]
    fn test_primitive_binding_rejects_null() {
        let def = csv_field(FieldDefBuilder::new("a").typed(ValueType::Int).bind_primitive("n"));
        let mut ctx = ctx_with_tokens(&[""]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        assert_eq!(ctx.report().field_errors[0].rule, RuleCode::Type);
    }

    #[test]
    fn test_nullable_binding_accepts_null() {
        let def = csv_field(FieldDefBuilder::new("a").bind("n"));
        let mut ctx = ctx_with_tokens(&[""]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Parsed(Value::Null));
    }

    // ==================== Collection tests ====================

    #[test]
    fn test_collection_accumulates_consecutive_positions() {
        let def = csv_field(FieldDefBuilder::new("tags").at(1).collection(1, Some(3)));
        let mut ctx = ctx_with_tokens(&["id", "red", "green", "blue"]);
        assert_eq!(
            the_field(&def).parse(&mut ctx),
            FieldValue::Parsed(Value::List(vec![
                Value::String("red".to_string()),
                Value::String("green".to_string()),
                Value::String("blue".to_string()),
            ]))
        );
    }

    #[test]
    fn test_collection_stops_at_max_occurs() {
        let def = csv_field(FieldDefBuilder::new("tags").collection(0, Some(2)));
        let mut ctx = ctx_with_tokens(&["a", "b", "c"]);
        let parsed = the_field(&def).parse(&mut ctx);
        assert_eq!(
            parsed,
            FieldValue::Parsed(Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]))
        );
    }

    #[test]
    fn test_collection_below_min_occurs() {
        let def = csv_field(FieldDefBuilder::new("tags").at(2).collection(1, Some(3)));
        let mut ctx = ctx_with_tokens(&["id", "name"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        let err = &ctx.report().field_errors[0];
        assert_eq!(err.rule, RuleCode::MinOccurs);
        assert_eq!(err.params, vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_collection_with_invalid_member() {
        let def = csv_field(
            FieldDefBuilder::new("nums")
                .typed(ValueType::Int)
                .collection(0, Some(3)),
        );
        let mut ctx = ctx_with_tokens(&["1", "x", "3"]);
        assert_eq!(the_field(&def).parse(&mut ctx), FieldValue::Invalid);
        // the bad member surfaced but parsing continued past it
        assert_eq!(ctx.report().field_errors.len(), 1);
    }

    #[test]
    fn test_unbounded_collection_reads_to_end() {
        let def = csv_field(FieldDefBuilder::new("tags").collection(0, None));
        let mut ctx = ctx_with_tokens(&["a", "b", "c", "d"]);
        match the_field(&def).parse(&mut ctx) {
            FieldValue::Parsed(Value::List(items)) => assert_eq!(items.len(), 4),
            other => panic!("expected list, got {:?}", other),
        }
    }

    // ==================== Formatting tests ====================

    #[test]
    fn test_format_literal_wins() {
        let def = csv_field(FieldDefBuilder::new("a").literal("H"));
        assert_eq!(
            the_field(&def)
                .format_value(Some(&Value::String("x".to_string())))
                .unwrap(),
            "H"
        );
    }

    #[test]
    fn test_format_null_is_empty() {
        let def = csv_field(FieldDefBuilder::new("a"));
        assert_eq!(the_field(&def).format_value(None).unwrap(), "");
        assert_eq!(the_field(&def).format_value(Some(&Value::Null)).unwrap(), "");
    }

    #[test]
    fn test_format_pads_fixed_length() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(RecordDefBuilder::new("r").field(FieldDefBuilder::new("name").width(8)))
            .build()
            .unwrap();
        assert_eq!(
            the_field(&def)
                .format_value(Some(&Value::String("Alice".to_string())))
                .unwrap(),
            "Alice   "
        );
    }

    #[test]
    fn test_format_right_justified_zero_padding() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(
                RecordDefBuilder::new("r").field(
                    FieldDefBuilder::new("id")
                        .width(5)
                        .padding('0')
                        .justify_right()
                        .typed(ValueType::Int),
                ),
            )
            .build()
            .unwrap();
        assert_eq!(
            the_field(&def).format_value(Some(&Value::Int(42))).unwrap(),
            "00042"
        );
    }

    #[test]
    fn test_format_rejects_over_wide_text() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(RecordDefBuilder::new("r").field(FieldDefBuilder::new("a").width(3)))
            .build()
            .unwrap();
        let err = the_field(&def)
            .format_value(Some(&Value::String("toolong".to_string())))
            .unwrap_err();
        assert!(matches!(err, WriteError::Conversion { .. }));
    }

    // ==================== Identifier matching tests ====================

    #[test]
    fn test_matches_text_trims_by_default() {
        let def = csv_field(FieldDefBuilder::new("a").literal("H"));
        assert!(the_field(&def).matches_text(" H "));
        assert!(!the_field(&def).matches_text("D"));
    }

    #[test]
    fn test_matches_record_absent_field() {
        let def = csv_field(FieldDefBuilder::new("a").at(3).literal("H"));
        let ctx = ctx_with_tokens(&["H"]);
        assert!(!the_field(&def).matches_record(&ctx));
    }

    #[test]
    fn test_matches_value_requires_assignable_type() {
        let def = csv_field(FieldDefBuilder::new("a").typed(ValueType::Int).literal("7"));
        assert!(the_field(&def).matches_value(&Value::Int(7)));
        assert!(!the_field(&def).matches_value(&Value::String("7".to_string())));
        assert!(!the_field(&def).matches_value(&Value::Null));
    }

    // ==================== Property tests ====================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Padded output always has the exact field width, whatever the
            /// input length within bounds.
            #[test]
            fn prop_padded_output_has_exact_width(text in "[a-zA-Z0-9]{0,8}") {
                let def = StreamDef::builder("s", StreamFormat::FixedLength)
                    .record(
                        RecordDefBuilder::new("r")
                            .field(FieldDefBuilder::new("a").width(8)),
                    )
                    .build()
                    .unwrap();
                let padded = the_field(&def)
                    .format_value(Some(&Value::String(text)))
                    .unwrap();
                prop_assert_eq!(padded.chars().count(), 8);
            }

            /// Parsing the formatted text of a valid value reproduces it.
            #[test]
            fn prop_int_field_round_trips(n in -99_999i64..99_999) {
                let def = csv_field(FieldDefBuilder::new("a").typed(ValueType::Int));
                let text = the_field(&def).format_value(Some(&Value::Int(n))).unwrap();
                let mut ctx = ctx_with_tokens(&[&text]);
                prop_assert_eq!(
                    the_field(&def).parse(&mut ctx),
                    FieldValue::Parsed(Value::Int(n))
                );
            }
        }
    }
}
