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

//! Fluent builders for stream mappings.
//!
//! Builders collect the declarative grammar and `build()` validates it:
//! unique record names per group, non-overlapping field positions, sane
//! occurrence ranges, weakly increasing sibling orders, and the
//! record-identifier requirement for records sharing a cohort. Type
//! handlers are resolved here, once, so the hot path never consults the
//! registry.

use crate::error::ConfigError;
use crate::mapping::{
    FieldDef, GroupDef, Justify, NodeDef, PropertyBinding, RecordDef, StreamDef, StreamFormat,
};
use crate::types::{TypeHandler, TypeHandlerRegistry};
use crate::value::{Value, ValueType};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for one field definition.
#[derive(Debug, Clone)]
pub struct FieldDefBuilder {
    name: String,
    position: Option<usize>,
    width: Option<usize>,
    padding: char,
    justify: Justify,
    trim: bool,
    required: bool,
    identifier: bool,
    literal: Option<String>,
    regex: Option<String>,
    default: Option<Value>,
    min_length: usize,
    max_length: Option<usize>,
    collection: bool,
    min_occurs: usize,
    max_occurs: Option<usize>,
    value_type: ValueType,
    handler_name: Option<String>,
    property: Option<String>,
    primitive: bool,
}

impl FieldDefBuilder {
    /// Start a field with the given name. Position defaults to the next
    /// free slot after the preceding field; type defaults to string; text
    /// is trimmed before validation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            width: None,
            padding: ' ',
            justify: Justify::Left,
            trim: true,
            required: false,
            identifier: false,
            literal: None,
            regex: None,
            default: None,
            min_length: 0,
            max_length: None,
            collection: false,
            min_occurs: 1,
            max_occurs: Some(1),
            value_type: ValueType::String,
            handler_name: None,
            property: None,
            primitive: false,
        }
    }

    /// Set an explicit position (token index, or character offset for
    /// fixed-length streams).
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the character width (fixed-length streams).
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the padding character for fixed-length formatting.
    pub fn padding(mut self, padding: char) -> Self {
        self.padding = padding;
        self
    }

    /// Right-justify fixed-length field text.
    pub fn justify_right(mut self) -> Self {
        self.justify = Justify::Right;
        self
    }

    /// Enable or disable trimming before validation and conversion.
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Reject absent or empty field text.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Use this field to identify the record type.
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Require the field text to equal a literal.
    pub fn literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    /// Require the field text to match a regular expression.
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Value used when the field text is absent or empty.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Minimum text length after trimming.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    /// Maximum text length after trimming.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Declare the field's target type.
    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Use a named type handler instead of the declared type's default.
    pub fn handler(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    /// Bind the parsed value to an entity property.
    pub fn bind(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Bind to a primitive entity property: null values become type errors.
    pub fn bind_primitive(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self.primitive = true;
        self
    }

    /// Make this field a collection with the given occurrence bounds.
    /// `None` for an unbounded maximum.
    pub fn collection(mut self, min_occurs: usize, max_occurs: Option<usize>) -> Self {
        self.collection = true;
        self.min_occurs = min_occurs;
        self.max_occurs = max_occurs;
        self
    }

    fn build(
        self,
        record: &str,
        format: StreamFormat,
        registry: &TypeHandlerRegistry,
        cursor: &mut Option<usize>,
    ) -> Result<FieldDef, ConfigError> {
        if matches!(format, StreamFormat::FixedLength) && self.width.is_none() {
            return Err(ConfigError::MissingWidth {
                record: record.to_string(),
                field: self.name,
            });
        }

        if let Some(max) = self.max_occurs {
            if self.min_occurs > max {
                return Err(ConfigError::OccursRange {
                    name: self.name,
                    min: self.min_occurs,
                    max,
                });
            }
        }

        let position = match self.position {
            Some(p) => p,
            None => match *cursor {
                Some(p) => p,
                None => {
                    return Err(ConfigError::FieldAfterUnbounded {
                        record: record.to_string(),
                        field: self.name,
                    })
                }
            },
        };

        let regex = match self.regex {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|source| {
                ConfigError::InvalidRegex {
                    field: self.name.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let handler = match &self.handler_name {
            Some(name) => registry
                .named(name)
                .ok_or_else(|| ConfigError::UnknownHandler { name: name.clone() })?,
            None => registry.for_type(self.value_type),
        };

        let field = FieldDef {
            name: self.name,
            position,
            width: self.width,
            padding: self.padding,
            justify: self.justify,
            trim: self.trim,
            required: self.required,
            identifier: self.identifier,
            literal: self.literal,
            regex,
            default: self.default,
            min_length: self.min_length,
            max_length: self.max_length,
            collection: self.collection,
            min_occurs: self.min_occurs,
            max_occurs: self.max_occurs,
            handler,
            binding: self.property.map(|name| PropertyBinding {
                name,
                primitive: self.primitive,
            }),
        };

        *cursor = field.span().map(|span| field.position + span);
        Ok(field)
    }
}

/// Builder for one record definition.
#[derive(Debug, Clone)]
pub struct RecordDefBuilder {
    name: String,
    entity: Option<String>,
    order: Option<usize>,
    min_occurs: usize,
    max_occurs: Option<usize>,
    fields: Vec<FieldDefBuilder>,
}

impl RecordDefBuilder {
    /// Start a record with the given name. Occurrences default to
    /// `(0, unbounded)`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: None,
            order: None,
            min_occurs: 0,
            max_occurs: None,
            fields: Vec::new(),
        }
    }

    /// Bind matched records to entities of the given type name. Records
    /// without an entity binding are validated and skipped by the reader.
    pub fn entity(mut self, name: impl Into<String>) -> Self {
        self.entity = Some(name.into());
        self
    }

    /// Set an explicit sibling order. Siblings sharing an order form a
    /// cohort and may interleave.
    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the occurrence bounds. `None` for an unbounded maximum.
    pub fn occurs(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    /// Append a field.
    pub fn field(mut self, field: FieldDefBuilder) -> Self {
        self.fields.push(field);
        self
    }

    fn build(
        self,
        format: StreamFormat,
        registry: &TypeHandlerRegistry,
        order: usize,
    ) -> Result<RecordDef, ConfigError> {
        if let Some(max) = self.max_occurs {
            if self.min_occurs > max {
                return Err(ConfigError::OccursRange {
                    name: self.name,
                    min: self.min_occurs,
                    max,
                });
            }
        }

        let name = self.name;
        let mut cursor = Some(0usize);
        let mut fields = Vec::with_capacity(self.fields.len());
        for builder in self.fields {
            fields.push(builder.build(&name, format, registry, &mut cursor)?);
        }
        fields.sort_by_key(|f| f.position);

        // overlap scan over the sorted layout
        for pair in fields.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match a.span() {
                None => {
                    return Err(ConfigError::FieldAfterUnbounded {
                        record: name,
                        field: b.name.clone(),
                    })
                }
                Some(span) if a.position + span > b.position => {
                    return Err(ConfigError::FieldOverlap {
                        record: name,
                        field: b.name.clone(),
                        position: b.position,
                    })
                }
                Some(_) => {}
            }
        }

        Ok(RecordDef {
            name,
            order,
            min_occurs: self.min_occurs,
            max_occurs: self.max_occurs,
            fields,
            entity: self.entity,
        })
    }
}

/// Builder for one group definition.
#[derive(Debug, Clone)]
pub struct GroupDefBuilder {
    name: String,
    order: Option<usize>,
    min_occurs: usize,
    max_occurs: Option<usize>,
    children: Vec<ChildBuilder>,
}

impl GroupDefBuilder {
    /// Start a group with the given name. Occurrences default to `(1, 1)`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            min_occurs: 1,
            max_occurs: Some(1),
            children: Vec::new(),
        }
    }

    /// Set an explicit sibling order.
    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the occurrence bounds. `None` for an unbounded maximum.
    pub fn occurs(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    /// Append a child record.
    pub fn record(mut self, record: RecordDefBuilder) -> Self {
        self.children.push(ChildBuilder::Record(record));
        self
    }

    /// Append a child group.
    pub fn group(mut self, group: GroupDefBuilder) -> Self {
        self.children.push(ChildBuilder::Group(group));
        self
    }
}

#[derive(Debug, Clone)]
enum ChildBuilder {
    Record(RecordDefBuilder),
    Group(GroupDefBuilder),
}

impl ChildBuilder {
    fn explicit_order(&self) -> Option<usize> {
        match self {
            Self::Record(r) => r.order,
            Self::Group(g) => g.order,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Record(r) => &r.name,
            Self::Group(g) => &g.name,
        }
    }
}

/// Builder for a complete stream definition.
#[derive(Debug)]
pub struct StreamDefBuilder {
    name: String,
    format: StreamFormat,
    min_occurs: usize,
    max_occurs: Option<usize>,
    children: Vec<ChildBuilder>,
    handlers: TypeHandlerRegistry,
}

impl StreamDefBuilder {
    pub(crate) fn new(name: impl Into<String>, format: StreamFormat) -> Self {
        Self {
            name: name.into(),
            format,
            min_occurs: 0,
            max_occurs: Some(1),
            children: Vec::new(),
            handlers: TypeHandlerRegistry::new(),
        }
    }

    /// Occurrence bounds for the layout as a whole; raising the maximum
    /// lets the entire layout repeat within one stream.
    pub fn occurs(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    /// Replace the type handler registry.
    pub fn type_handlers(mut self, handlers: TypeHandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Register a named type handler on the default registry.
    pub fn named_handler(mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) -> Self {
        self.handlers.register_named(name, handler);
        self
    }

    /// Append a top-level record.
    pub fn record(mut self, record: RecordDefBuilder) -> Self {
        self.children.push(ChildBuilder::Record(record));
        self
    }

    /// Append a top-level group.
    pub fn group(mut self, group: GroupDefBuilder) -> Self {
        self.children.push(ChildBuilder::Group(group));
        self
    }

    /// Validate the configuration and build the immutable definition.
    pub fn build(self) -> Result<StreamDef, ConfigError> {
        if let Some(max) = self.max_occurs {
            if self.min_occurs > max {
                return Err(ConfigError::OccursRange {
                    name: self.name,
                    min: self.min_occurs,
                    max,
                });
            }
        }

        let mut nodes = vec![NodeDef::Group(GroupDef {
            name: self.name.clone(),
            order: 1,
            min_occurs: self.min_occurs,
            max_occurs: self.max_occurs,
            children: Vec::new(),
        })];

        let child_ids = build_children(
            &mut nodes,
            self.children,
            &self.name,
            self.format,
            &self.handlers,
        )?;
        if let NodeDef::Group(root) = &mut nodes[0] {
            root.children = child_ids;
        }

        Ok(StreamDef {
            name: self.name,
            format: self.format,
            nodes,
        })
    }
}

fn build_children(
    nodes: &mut Vec<NodeDef>,
    children: Vec<ChildBuilder>,
    group_name: &str,
    format: StreamFormat,
    registry: &TypeHandlerRegistry,
) -> Result<Vec<usize>, ConfigError> {
    // assign sibling orders: weakly increasing, auto-incrementing by default
    let mut orders = Vec::with_capacity(children.len());
    let mut last_order = 0usize;
    for child in &children {
        let order = match child.explicit_order() {
            Some(o) => {
                if o < last_order {
                    return Err(ConfigError::OrderNotIncreasing {
                        name: child.name().to_string(),
                    });
                }
                o
            }
            None => last_order + 1,
        };
        orders.push(order);
        last_order = order;
    }

    // a record sharing its cohort with siblings needs identifier fields;
    // one anonymous catch-all per cohort is tolerated because the walker
    // always tries identified siblings first
    for (i, child) in children.iter().enumerate() {
        if let ChildBuilder::Record(record) = child {
            let anonymous = !record.fields.iter().any(|f| f.identifier);
            if !anonymous {
                continue;
            }
            let cohort_size = orders.iter().filter(|&&o| o == orders[i]).count();
            let anonymous_peers = children
                .iter()
                .zip(orders.iter())
                .filter(|(_, &o)| o == orders[i])
                .filter(|(c, _)| {
                    matches!(c, ChildBuilder::Record(r) if !r.fields.iter().any(|f| f.identifier))
                })
                .count();
            if cohort_size > 1 && anonymous_peers > 1 {
                return Err(ConfigError::MissingIdentifier {
                    record: record.name.clone(),
                });
            }
        }
    }

    let mut record_names = HashSet::new();
    let mut ids = Vec::with_capacity(children.len());
    for (child, order) in children.into_iter().zip(orders.iter().copied()) {
        match child {
            ChildBuilder::Record(builder) => {
                if !record_names.insert(builder.name.clone()) {
                    return Err(ConfigError::DuplicateRecord {
                        name: builder.name,
                        group: group_name.to_string(),
                    });
                }
                let record = builder.build(format, registry, order)?;
                ids.push(nodes.len());
                nodes.push(NodeDef::Record(record));
            }
            ChildBuilder::Group(builder) => {
                if let Some(max) = builder.max_occurs {
                    if builder.min_occurs > max {
                        return Err(ConfigError::OccursRange {
                            name: builder.name,
                            min: builder.min_occurs,
                            max,
                        });
                    }
                }
                let id = nodes.len();
                ids.push(id);
                nodes.push(NodeDef::Group(GroupDef {
                    name: builder.name.clone(),
                    order,
                    min_occurs: builder.min_occurs,
                    max_occurs: builder.max_occurs,
                    children: Vec::new(),
                }));
                let grandchildren =
                    build_children(nodes, builder.children, &builder.name, format, registry)?;
                if let NodeDef::Group(group) = &mut nodes[id] {
                    group.children = grandchildren;
                }
            }
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateHandler;

    fn field(name: &str) -> FieldDefBuilder {
        FieldDefBuilder::new(name)
    }

    // ==================== Position assignment tests ====================

    #[test]
    fn test_positions_auto_assigned() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("r")
                    .field(field("a"))
                    .field(field("b"))
                    .field(field("c")),
            )
            .build()
            .unwrap();
        let record = def.record_by_name("r").unwrap();
        let positions: Vec<_> = record.fields().iter().map(|f| f.position()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_collection_advances_cursor_by_max_occurs() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("r")
                    .field(field("a"))
                    .field(field("tags").collection(1, Some(3)))
                    .field(field("z")),
            )
            .build()
            .unwrap();
        let record = def.record_by_name("r").unwrap();
        assert_eq!(record.fields()[2].position(), 4);
    }

    #[test]
    fn test_fixed_length_cursor_uses_width() {
        let def = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(
                RecordDefBuilder::new("r")
                    .field(field("a").width(5))
                    .field(field("b").width(20)),
            )
            .build()
            .unwrap();
        let record = def.record_by_name("r").unwrap();
        assert_eq!(record.fields()[1].position(), 5);
    }

    // ==================== Validation failure tests ====================

    #[test]
    fn test_fixed_length_requires_width() {
        let err = StreamDef::builder("s", StreamFormat::FixedLength)
            .record(RecordDefBuilder::new("r").field(field("a")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingWidth { .. }));
    }

    #[test]
    fn test_overlapping_positions_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("r")
                    .field(field("a").at(0).collection(1, Some(3)))
                    .field(field("b").at(2)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FieldOverlap { .. }));
    }

    #[test]
    fn test_field_after_unbounded_collection_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("r")
                    .field(field("tags").collection(0, None))
                    .field(field("z").at(9)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FieldAfterUnbounded { .. }));
    }

    #[test]
    fn test_occurs_range_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("r").occurs(3, Some(1)).field(field("a")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OccursRange { .. }));
    }

    #[test]
    fn test_duplicate_record_names_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("r").field(field("a").identifier().literal("A")))
            .record(RecordDefBuilder::new("r").field(field("b").identifier().literal("B")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRecord { .. }));
    }

    #[test]
    fn test_decreasing_order_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("a").order(2).field(field("x")))
            .record(RecordDefBuilder::new("b").order(1).field(field("x")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OrderNotIncreasing { .. }));
    }

    #[test]
    fn test_cohort_rejects_two_anonymous_records() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("a").order(1).field(field("x")))
            .record(RecordDefBuilder::new("b").order(1).field(field("x")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingIdentifier { record } if record == "a"));
    }

    #[test]
    fn test_cohort_allows_one_anonymous_catch_all() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("a")
                    .order(1)
                    .field(field("x").identifier().literal("A")),
            )
            .record(RecordDefBuilder::new("b").order(1).field(field("x")))
            .build();
        assert!(def.is_ok());
    }

    #[test]
    fn test_sole_cohort_member_may_be_anonymous() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("a").field(field("x")))
            .record(RecordDefBuilder::new("b").field(field("x")))
            .build();
        // default orders are strictly increasing: each record is alone in
        // its cohort, so anonymous records are permitted
        assert!(def.is_ok());
    }

    #[test]
    fn test_unknown_handler_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("r").field(field("a").handler("nope")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownHandler { .. }));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .record(RecordDefBuilder::new("r").field(field("a").regex("[")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    // ==================== Handler resolution tests ====================

    #[test]
    fn test_named_handler_resolution() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .named_handler("euroDate", Arc::new(DateHandler::new("%d.%m.%Y")))
            .record(RecordDefBuilder::new("r").field(field("when").handler("euroDate")))
            .build()
            .unwrap();
        let record = def.record_by_name("r").unwrap();
        assert_eq!(
            record.fields()[0].handler.value_type(),
            crate::ValueType::Date
        );
    }

    // ==================== Group nesting tests ====================

    #[test]
    fn test_nested_groups_flatten_preorder() {
        let def = StreamDef::builder("s", StreamFormat::csv())
            .group(
                GroupDefBuilder::new("batch")
                    .record(RecordDefBuilder::new("header").field(field("x")))
                    .record(RecordDefBuilder::new("detail").field(field("x"))),
            )
            .build()
            .unwrap();
        assert_eq!(def.node_count(), 4);
        assert!(matches!(def.node(1), NodeDef::Group(_)));
        assert_eq!(def.node(2).name(), "header");
        assert_eq!(def.node(3).name(), "detail");
    }

    #[test]
    fn test_group_occurs_validation() {
        let err = StreamDef::builder("s", StreamFormat::csv())
            .group(
                GroupDefBuilder::new("g")
                    .occurs(2, Some(1))
                    .record(RecordDefBuilder::new("r").field(field("x"))),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OccursRange { .. }));
    }
}
