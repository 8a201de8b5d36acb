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

//! The mapping model: a stream's declarative grammar.
//!
//! A [`StreamDef`] holds an immutable tree of group and record definitions,
//! flattened into an arena indexed by node id. Group nodes carry child ids;
//! record nodes carry ordered [`FieldDef`]s. The tree is built once through
//! [`StreamDef::builder`], validated, and then shared read-only across any
//! number of readers and writers.

mod builder;

pub use builder::{
    FieldDefBuilder, GroupDefBuilder, RecordDefBuilder, StreamDefBuilder,
};

use crate::types::TypeHandler;
use crate::value::Value;
use regex::Regex;
use std::sync::Arc;

/// The concrete format of a stream, selecting the token reader/writer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Fixed-width character fields sliced from each line.
    FixedLength,
    /// Fields split on a delimiter character, no quoting.
    Delimited { delimiter: char },
    /// Comma-separated values with quote handling.
    Csv { delimiter: char, quote: char },
}

impl StreamFormat {
    /// Standard CSV: comma-delimited, double-quoted.
    pub fn csv() -> Self {
        Self::Csv {
            delimiter: ',',
            quote: '"',
        }
    }

    /// Tab-delimited without quoting.
    pub fn delimited(delimiter: char) -> Self {
        Self::Delimited { delimiter }
    }
}

/// Horizontal alignment of fixed-length field text within its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    /// Pad on the right (text flush left).
    #[default]
    Left,
    /// Pad on the left (text flush right).
    Right,
}

/// Binding of a field to an entity property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    /// The property name on the entity.
    pub name: String,
    /// Primitive properties reject null values with a type error.
    pub primitive: bool,
}

/// One field of a record: position, validation rules, type conversion, and
/// an optional property binding.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) position: usize,
    pub(crate) width: Option<usize>,
    pub(crate) padding: char,
    pub(crate) justify: Justify,
    pub(crate) trim: bool,
    pub(crate) required: bool,
    pub(crate) identifier: bool,
    pub(crate) literal: Option<String>,
    pub(crate) regex: Option<Regex>,
    pub(crate) default: Option<Value>,
    pub(crate) min_length: usize,
    pub(crate) max_length: Option<usize>,
    pub(crate) collection: bool,
    pub(crate) min_occurs: usize,
    pub(crate) max_occurs: Option<usize>,
    pub(crate) handler: Arc<dyn TypeHandler>,
    pub(crate) binding: Option<PropertyBinding>,
}

impl FieldDef {
    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's declared position (token index, or character offset for
    /// fixed-length streams).
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true if this field identifies its record type.
    pub fn is_identifier(&self) -> bool {
        self.identifier
    }

    /// Returns true if this field accumulates a collection of values.
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// The bound property, if any.
    pub fn binding(&self) -> Option<&PropertyBinding> {
        self.binding.as_ref()
    }

    /// Number of positions this field occupies, or `None` when unbounded.
    pub(crate) fn span(&self) -> Option<usize> {
        let slot = self.width.unwrap_or(1);
        self.max_occurs.map(|max| slot * max.max(1))
    }
}

/// An ordered collection of fields shaping one record type.
#[derive(Debug, Clone)]
pub struct RecordDef {
    pub(crate) name: String,
    pub(crate) order: usize,
    pub(crate) min_occurs: usize,
    pub(crate) max_occurs: Option<usize>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) entity: Option<String>,
}

impl RecordDef {
    /// The record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound entity type name, if this record produces entities.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// The record's fields in position order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns true if any field identifies this record type.
    pub fn has_identifier(&self) -> bool {
        self.fields.iter().any(|f| f.identifier)
    }
}

/// A group of records and subgroups with shared ordering and cardinality.
#[derive(Debug, Clone)]
pub struct GroupDef {
    pub(crate) name: String,
    pub(crate) order: usize,
    pub(crate) min_occurs: usize,
    pub(crate) max_occurs: Option<usize>,
    pub(crate) children: Vec<usize>,
}

impl GroupDef {
    /// The group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child node ids in declaration order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// A node of the mapping tree: a branch (group) or a leaf (record).
#[derive(Debug, Clone)]
pub enum NodeDef {
    /// A branch with child nodes.
    Group(GroupDef),
    /// A leaf carrying field definitions.
    Record(RecordDef),
}

impl NodeDef {
    /// The node name.
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Record(r) => &r.name,
        }
    }

    /// The node's order index among its siblings.
    pub fn order(&self) -> usize {
        match self {
            Self::Group(g) => g.order,
            Self::Record(r) => r.order,
        }
    }

    /// Minimum occurrences.
    pub fn min_occurs(&self) -> usize {
        match self {
            Self::Group(g) => g.min_occurs,
            Self::Record(r) => r.min_occurs,
        }
    }

    /// Maximum occurrences, or `None` when unbounded.
    pub fn max_occurs(&self) -> Option<usize> {
        match self {
            Self::Group(g) => g.max_occurs,
            Self::Record(r) => r.max_occurs,
        }
    }
}

/// The complete, immutable grammar of one stream.
///
/// Nodes are stored in preorder; id `0` is the root group. The definition is
/// shared across reader and writer instances via `Arc`; all per-stream
/// mutable state lives in the layout tree.
#[derive(Debug, Clone)]
pub struct StreamDef {
    pub(crate) name: String,
    pub(crate) format: StreamFormat,
    pub(crate) nodes: Vec<NodeDef>,
}

impl StreamDef {
    /// Start building a stream definition.
    pub fn builder(name: impl Into<String>, format: StreamFormat) -> StreamDefBuilder {
        StreamDefBuilder::new(name, format)
    }

    /// The stream name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stream format.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// The root group id.
    pub fn root(&self) -> usize {
        0
    }

    /// The node with the given id.
    pub fn node(&self, id: usize) -> &NodeDef {
        &self.nodes[id]
    }

    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The record definition with the given id, if the id names a record.
    pub fn record(&self, id: usize) -> Option<&RecordDef> {
        match self.nodes.get(id) {
            Some(NodeDef::Record(r)) => Some(r),
            _ => None,
        }
    }

    /// All record definitions with their node ids, in preorder.
    pub fn records(&self) -> impl Iterator<Item = (usize, &RecordDef)> {
        self.nodes.iter().enumerate().filter_map(|(id, node)| match node {
            NodeDef::Record(r) => Some((id, r)),
            _ => None,
        })
    }

    /// Find a record definition by name.
    pub fn record_by_name(&self, name: &str) -> Option<&RecordDef> {
        self.records().map(|(_, r)| r).find(|r| r.name == name)
    }
}
