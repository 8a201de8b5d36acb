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

//! The writer driver: formats entities through their unique matching
//! record definition and hands the tokens to a format writer.
//!
//! The writer enforces no ordering or cardinality; the caller is
//! responsible for emitting an entity stream consistent with the grammar.

use crate::entity::Entity;
use crate::error::WriteError;
use crate::format::{RecordValue, RecordWriter};
use crate::mapping::{StreamDef, StreamFormat};
use std::sync::Arc;

/// Writes entities as stream records against a mapping.
pub struct EntityWriter<W: RecordWriter> {
    output: W,
    mapping: Arc<StreamDef>,
}

impl<W: RecordWriter> EntityWriter<W> {
    /// Create a writer over a format-level record writer.
    pub fn new(mapping: Arc<StreamDef>, output: W) -> Self {
        Self { output, mapping }
    }

    /// Format and emit one entity.
    ///
    /// Exactly one record definition in the mapping must match the entity;
    /// zero or several matches are writer faults.
    pub fn write(&mut self, entity: &Entity) -> Result<(), WriteError> {
        let mut matched: Option<&crate::mapping::RecordDef> = None;
        for (_, record) in self.mapping.records() {
            if record.matches_entity(entity) {
                if let Some(first) = matched {
                    return Err(WriteError::AmbiguousRecord {
                        entity: entity.name().to_string(),
                        first: first.name().to_string(),
                        second: record.name().to_string(),
                    });
                }
                matched = Some(record);
            }
        }
        let Some(record) = matched else {
            return Err(WriteError::NoMatchingRecord {
                entity: entity.name().to_string(),
            });
        };

        let tokens = record.format(entity)?;
        let value = match self.mapping.format() {
            StreamFormat::FixedLength => RecordValue::Line(tokens.concat()),
            _ => RecordValue::Tokens(tokens),
        };
        self.output.write(&value)?;
        Ok(())
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.output.flush()?;
        Ok(())
    }

    /// Flush and release the underlying stream. Idempotent.
    pub fn close(&mut self) -> Result<(), WriteError> {
        self.output.close()?;
        Ok(())
    }
}
