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

//! Core mapping model and traversal engines for RECMAP.
//!
//! RECMAP binds flat textual record streams — fixed-length, delimited, and
//! CSV — to in-memory [`Entity`] objects through a declarative mapping: an
//! ordered tree of groups and records, where each record is an ordered list
//! of fields with positions, validation rules, and type conversions.
//!
//! This crate holds the format-independent engine:
//!
//! - the mapping model and its builders ([`mapping`]),
//! - type handlers and their registry ([`types`]),
//! - the field and record parser-formatters,
//! - the layout state machine deciding which record definition each input
//!   belongs to,
//! - the [`EntityReader`] and [`EntityWriter`] drivers,
//! - structured errors and the message resolver ([`messages`]).
//!
//! Concrete format readers and writers live in `recmap-stream`; the
//! user-facing factory lives in the `recmap` facade crate.
//!
//! # Example
//!
//! ```rust
//! use recmap_core::mapping::{FieldDefBuilder, RecordDefBuilder, StreamFormat};
//! use recmap_core::{StreamDef, ValueType};
//!
//! let mapping = StreamDef::builder("orders", StreamFormat::csv())
//!     .record(
//!         RecordDefBuilder::new("order")
//!             .entity("order")
//!             .field(FieldDefBuilder::new("kind").identifier().literal("O"))
//!             .field(FieldDefBuilder::new("qty").typed(ValueType::Int).bind("qty")),
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(mapping.name(), "orders");
//! ```

mod context;
mod entity;
mod error;
mod field;
mod format;
mod layout;
pub mod mapping;
pub mod messages;
mod reader;
mod record;
pub mod types;
mod value;
mod writer;

pub use context::RecordContext;
pub use entity::Entity;
pub use error::{
    ConfigError, FieldError, ReadError, ReadResult, RecordError, RecordReport, RuleCode,
    StreamError, TypeError, WriteError, WriteResult,
};
pub use field::FieldValue;
pub use format::{RecordReader, RecordValue, RecordWriter};
pub use mapping::{StreamDef, StreamFormat};
pub use reader::EntityReader;
pub use types::{TypeHandler, TypeHandlerRegistry};
pub use value::{Value, ValueType};
pub use writer::EntityWriter;
