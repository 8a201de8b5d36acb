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

//! Rendering of structured error codes into user-facing messages.
//!
//! The engine emits error codes with parameters; this module turns them
//! into text. Templates are resolved through a fallback chain, from the
//! most specific key to the built-in default for the rule:
//!
//! ```text
//! fielderror.<record>.<field>.<rule>
//! fielderror.<record>.<rule>
//! fielderror.<rule>
//! ```
//!
//! Record-level errors use the `recorderror.` prefix with the same scheme.
//! Resolved templates are cached; misses are cached too so an absent key is
//! never queried twice.

use crate::error::{FieldError, RecordError, RuleCode};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// A source of message templates, keyed like a flat properties file.
pub trait MessageSource: Send + Sync {
    /// The template for a key, or `None` if the source has no entry.
    fn message(&self, key: &str) -> Option<String>;
}

/// A message source backed by an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct MapMessageSource {
    entries: BTreeMap<String, String>,
}

impl MapMessageSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template under a key.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(key.into(), template.into());
    }
}

impl MessageSource for MapMessageSource {
    fn message(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapMessageSource {
    fn from(entries: [(&str, &str); N]) -> Self {
        let mut source = Self::new();
        for (key, template) in entries {
            source.insert(key, template);
        }
        source
    }
}

/// Resolves error codes to message templates and renders them.
///
/// Read-mostly: lookups hit a cache guarded by an `RwLock`, storing `None`
/// as a negative sentinel for keys the source does not provide.
pub struct MessageResolver {
    source: Option<Box<dyn MessageSource>>,
    cache: RwLock<HashMap<String, Option<String>>>,
}

impl Default for MessageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageResolver {
    /// A resolver using only the built-in default templates.
    pub fn new() -> Self {
        Self {
            source: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver backed by a custom template source.
    pub fn with_source(source: Box<dyn MessageSource>) -> Self {
        Self {
            source: Some(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Render one field error for a record.
    pub fn render_field_error(&self, record: &str, error: &FieldError) -> String {
        let keys = [
            format!("fielderror.{}.{}.{}", record, error.field, error.rule),
            format!("fielderror.{}.{}", record, error.rule),
            format!("fielderror.{}", error.rule),
        ];
        let template = self
            .resolve(&keys)
            .unwrap_or_else(|| default_field_template(error.rule).to_string());
        let mut message = template
            .replace("{field}", &error.field)
            .replace("{text}", error.text.as_deref().unwrap_or(""));
        for (i, param) in error.params.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), param);
        }
        message
    }

    /// Render one record-level error.
    pub fn render_record_error(&self, record: &str, error: &RecordError) -> String {
        let keys = [
            format!("recorderror.{}.{}", record, error.rule),
            format!("recorderror.{}", error.rule),
        ];
        let template = self
            .resolve(&keys)
            .unwrap_or_else(|| default_record_template(error.rule).to_string());
        template
            .replace("{record}", record)
            .replace("{message}", &error.message)
    }

    /// A display label for a record, if one is configured.
    pub fn record_label(&self, record: &str) -> Option<String> {
        self.resolve(&[format!("label.{}", record)])
    }

    /// A display label for a field, if one is configured.
    pub fn field_label(&self, record: &str, field: &str) -> Option<String> {
        self.resolve(&[format!("label.{}.{}", record, field)])
    }

    fn resolve(&self, keys: &[String]) -> Option<String> {
        let cache_key = &keys[0];
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(cache_key) {
                return cached.clone();
            }
        }

        let resolved = self.source.as_ref().and_then(|source| {
            keys.iter().find_map(|key| source.message(key))
        });

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(cache_key.clone())
            .or_insert_with(|| resolved.clone());
        resolved
    }
}

fn default_field_template(rule: RuleCode) -> &'static str {
    match rule {
        RuleCode::Required => "field '{field}' is required",
        RuleCode::Literal => "field '{field}' must equal '{0}'",
        RuleCode::MinLength => "field '{field}' must be at least {0} characters",
        RuleCode::MaxLength => "field '{field}' must be at most {1} characters",
        RuleCode::Regex => "field '{field}' must match pattern '{0}'",
        RuleCode::MinOccurs => "field '{field}' expects at least {0} occurrences",
        RuleCode::Type => "field '{field}' has an invalid value: {0}",
        // structural codes never surface as field errors, but render sanely
        _ => "field '{field}' is invalid",
    }
}

fn default_record_template(rule: RuleCode) -> &'static str {
    match rule {
        RuleCode::Malformed => "malformed record: {message}",
        RuleCode::Unidentified => "unidentified record",
        RuleCode::Unexpected => "unexpected record: {message}",
        RuleCode::Sequence => "record out of sequence: {message}",
        _ => "invalid record: {message}",
    }
}
