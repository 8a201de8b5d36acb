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

//! Reversible text-to-value converters and their registry.
//!
//! A [`TypeHandler`] converts between the external text form of a field and
//! its internal [`Value`]. Handlers are pure and stateless; they are shared
//! across all readers and writers as `Arc<dyn TypeHandler>`. The
//! [`TypeHandlerRegistry`] resolves handlers at mapping build time, by
//! declared type with an overlay of named handlers.

use crate::error::TypeError;
use crate::value::{Value, ValueType};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// A reversible converter between field text and a typed value.
///
/// Implementations must be pure: `parse` and `format` may not retain state
/// between calls. Formatting a null value yields the empty string.
pub trait TypeHandler: Send + Sync + std::fmt::Debug {
    /// The declared type this handler produces.
    fn value_type(&self) -> ValueType;

    /// Convert field text to a value.
    fn parse(&self, text: &str) -> Result<Value, TypeError>;

    /// Convert a value back to field text.
    fn format(&self, value: &Value) -> Result<String, TypeError>;
}

/// The identity handler: text in, text out.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringHandler;

impl TypeHandler for StringHandler {
    fn value_type(&self) -> ValueType {
        ValueType::String
    }

    fn parse(&self, text: &str) -> Result<Value, TypeError> {
        Ok(Value::String(text.to_string()))
    }

    fn format(&self, value: &Value) -> Result<String, TypeError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

/// Handler for 64-bit signed integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntHandler;

impl TypeHandler for IntHandler {
    fn value_type(&self) -> ValueType {
        ValueType::Int
    }

    fn parse(&self, text: &str) -> Result<Value, TypeError> {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| TypeError::new(format!("invalid integer '{}'", text)))
    }

    fn format(&self, value: &Value) -> Result<String, TypeError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Int(n) => Ok(n.to_string()),
            other => Err(TypeError::new(format!("expected an integer, got '{}'", other))),
        }
    }
}

/// Handler for 64-bit floating-point numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatHandler;

impl TypeHandler for FloatHandler {
    fn value_type(&self) -> ValueType {
        ValueType::Float
    }

    fn parse(&self, text: &str) -> Result<Value, TypeError> {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| TypeError::new(format!("invalid number '{}'", text)))
    }

    fn format(&self, value: &Value) -> Result<String, TypeError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Float(n) => Ok(n.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            other => Err(TypeError::new(format!("expected a number, got '{}'", other))),
        }
    }
}

/// Handler for booleans, accepting exactly `true` and `false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolHandler;

impl TypeHandler for BoolHandler {
    fn value_type(&self) -> ValueType {
        ValueType::Bool
    }

    fn parse(&self, text: &str) -> Result<Value, TypeError> {
        match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(TypeError::new(format!("invalid boolean '{}'", text))),
        }
    }

    fn format(&self, value: &Value) -> Result<String, TypeError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(TypeError::new(format!("expected a boolean, got '{}'", other))),
        }
    }
}

/// Handler for calendar dates with a configurable strftime-style format.
#[derive(Debug, Clone)]
pub struct DateHandler {
    format: String,
}

impl DateHandler {
    /// Create a date handler with a custom format string.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateHandler {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl TypeHandler for DateHandler {
    fn value_type(&self) -> ValueType {
        ValueType::Date
    }

    fn parse(&self, text: &str) -> Result<Value, TypeError> {
        NaiveDate::parse_from_str(text, &self.format)
            .map(Value::Date)
            .map_err(|_| {
                TypeError::new(format!("invalid date '{}' for format '{}'", text, self.format))
            })
    }

    fn format(&self, value: &Value) -> Result<String, TypeError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Date(d) => Ok(d.format(&self.format).to_string()),
            other => Err(TypeError::new(format!("expected a date, got '{}'", other))),
        }
    }
}

/// Registry of type handlers, consulted at mapping build time.
///
/// Lookup is two-level: an optional handler name takes precedence, falling
/// back to the handler registered for the field's declared type. Every
/// [`ValueType`] has a built-in default; a field with no declared type uses
/// the identity [`StringHandler`].
#[derive(Debug, Clone)]
pub struct TypeHandlerRegistry {
    by_type: HashMap<ValueType, Arc<dyn TypeHandler>>,
    named: HashMap<String, Arc<dyn TypeHandler>>,
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        let mut by_type: HashMap<ValueType, Arc<dyn TypeHandler>> = HashMap::new();
        by_type.insert(ValueType::String, Arc::new(StringHandler));
        by_type.insert(ValueType::Int, Arc::new(IntHandler));
        by_type.insert(ValueType::Float, Arc::new(FloatHandler));
        by_type.insert(ValueType::Bool, Arc::new(BoolHandler));
        by_type.insert(ValueType::Date, Arc::new(DateHandler::default()));
        Self {
            by_type,
            named: HashMap::new(),
        }
    }
}

impl TypeHandlerRegistry {
    /// Create a registry with the built-in handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the handler for a declared type.
    pub fn register(&mut self, handler: Arc<dyn TypeHandler>) {
        self.by_type.insert(handler.value_type(), handler);
    }

    /// Register a handler under an explicit name.
    pub fn register_named(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        self.named.insert(name.into(), handler);
    }

    /// Resolve the handler for a declared type.
    pub fn for_type(&self, value_type: ValueType) -> Arc<dyn TypeHandler> {
        match self.by_type.get(&value_type) {
            Some(handler) => Arc::clone(handler),
            None => Arc::new(StringHandler),
        }
    }

    /// Resolve a handler by name.
    pub fn named(&self, name: &str) -> Option<Arc<dyn TypeHandler>> {
        self.named.get(name).map(Arc::clone)
    }
}
