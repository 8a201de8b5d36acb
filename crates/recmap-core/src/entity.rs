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

//! In-memory objects bound to stream records.

use crate::Value;
use std::collections::BTreeMap;

/// A named object with typed properties, the in-memory form of one record.
///
/// Entities are produced by the reader from matched records and consumed by
/// the writer to emit records. The entity name selects which record
/// definition an outgoing entity is formatted by.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// The entity type name (from the record definition's binding).
    pub name: String,
    /// Property values keyed by property name.
    pub properties: BTreeMap<String, Value>,
}

impl Entity {
    /// Create a new empty entity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set a property value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Get a property value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of properties set on this entity.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if no properties are set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
