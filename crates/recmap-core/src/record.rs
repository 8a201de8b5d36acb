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

//! Record-level parsing and formatting: shaping a tokenised record into an
//! entity and an entity into ordered field tokens.

use crate::context::RecordContext;
use crate::entity::Entity;
use crate::error::WriteError;
use crate::field::FieldValue;
use crate::mapping::RecordDef;
use crate::value::Value;

impl RecordDef {
    /// Returns true if every record-identifier field matches the current
    /// record. A record without identifier fields matches anonymously.
    pub(crate) fn matches(&self, ctx: &RecordContext) -> bool {
        self.fields
            .iter()
            .filter(|f| f.identifier)
            .all(|f| f.matches_record(ctx))
    }

    /// Parse the current record into an entity.
    ///
    /// Every field is parsed even after the first failure so that all
    /// validation errors surface on the context. Returns `None` when any
    /// field reported an error, and also for records without an entity
    /// binding (which validate and are then skipped by the reader).
    pub(crate) fn parse(&self, ctx: &mut RecordContext) -> Option<Entity> {
        let mut values = Vec::new();
        for field in &self.fields {
            match field.parse(ctx) {
                FieldValue::Parsed(value) => {
                    if let Some(binding) = field.binding() {
                        values.push((binding.name.clone(), value));
                    }
                }
                FieldValue::Missing | FieldValue::Invalid => {}
            }
        }

        if ctx.has_errors() {
            return None;
        }

        let entity_name = self.entity.as_deref()?;
        let mut entity = Entity::new(entity_name);
        for (property, value) in values {
            entity.set(property, value);
        }
        Some(entity)
    }

    /// Format an entity into ordered field tokens.
    ///
    /// Fields are emitted in position order. Collection fields emit up to
    /// their maximum occurrences and pad with empty values to the minimum.
    /// Gaps in a fixed-length layout are filled with spaces so the
    /// concatenated line keeps every field at its declared offset.
    pub(crate) fn format(&self, entity: &Entity) -> Result<Vec<String>, WriteError> {
        let mut tokens = Vec::with_capacity(self.fields.len());
        let mut cursor = 0usize;
        for field in &self.fields {
            if field.position > cursor {
                let gap = field.position - cursor;
                if field.width.is_some() {
                    tokens.push(" ".repeat(gap));
                } else {
                    tokens.extend(std::iter::repeat(String::new()).take(gap));
                }
            }

            let value = field.binding().and_then(|b| entity.get(&b.name));
            let emitted = if field.collection {
                let items: Vec<&Value> = match value {
                    Some(Value::List(items)) => items.iter().collect(),
                    Some(single) => vec![single],
                    None => Vec::new(),
                };
                let mut count = 0;
                for item in items {
                    if let Some(max) = field.max_occurs {
                        if count >= max {
                            break;
                        }
                    }
                    tokens.push(field.format_value(Some(item))?);
                    count += 1;
                }
                while count < field.min_occurs {
                    tokens.push(field.format_value(Some(&Value::Null))?);
                    count += 1;
                }
                count
            } else {
                tokens.push(field.format_value(value)?);
                1
            };

            cursor = field.position + emitted * field.width.unwrap_or(1).max(1);
        }
        Ok(tokens)
    }

    /// Returns true if this record definition formats the given entity:
    /// the entity name matches the record's binding and every bound
    /// identifier value agrees with its literal/regex rules.
    pub(crate) fn matches_entity(&self, entity: &Entity) -> bool {
        match self.entity.as_deref() {
            Some(name) if name == entity.name() => {}
            _ => return false,
        }
        for field in self.fields.iter().filter(|f| f.identifier) {
            if let Some(binding) = field.binding() {
                if let Some(value) = entity.get(&binding.name) {
                    if !field.matches_value(value) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
