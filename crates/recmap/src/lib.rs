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

//! # RECMAP - Declarative Record Mapping
//!
//! RECMAP binds flat textual record streams — fixed-length, delimited, and
//! CSV — bidirectionally to in-memory entities. A mapping describes the
//! grammar of a stream as an ordered tree of groups and records; the engine
//! reads records into entities and writes entities as records, enforcing
//! ordering, cardinality, and per-field validation along the way.
//!
//! ## Quick Start
//!
//! ```rust
//! use recmap::mapping::{FieldDefBuilder, RecordDefBuilder};
//! use recmap::{StreamDef, StreamFactory, StreamFormat, ValueType};
//! use std::io::Cursor;
//!
//! let factory = StreamFactory::new();
//! factory.register(
//!     StreamDef::builder("orders", StreamFormat::csv())
//!         .record(
//!             RecordDefBuilder::new("order")
//!                 .entity("order")
//!                 .field(FieldDefBuilder::new("kind").identifier().literal("O"))
//!                 .field(FieldDefBuilder::new("item").required().bind("item"))
//!                 .field(FieldDefBuilder::new("qty").typed(ValueType::Int).bind("qty")),
//!         )
//!         .build()
//!         .expect("valid mapping"),
//! );
//!
//! let mut reader = factory
//!     .create_reader("orders", Cursor::new("O,widget,7\n"))
//!     .expect("registered mapping");
//! let order = reader.read().expect("clean record").expect("one record");
//! assert_eq!(order.get("qty").and_then(|v| v.as_int()), Some(7));
//! ```
//!
//! ## Error Handling
//!
//! Structural problems (malformed, unidentified, unexpected, out of
//! sequence) surface as distinct [`ReadError`] variants; field validation
//! problems are accumulated per record and raised as one
//! [`ReadError::Invalid`] carrying the full [`RecordReport`]. Every record
//! error is recoverable: the next `read` continues at the following record.
//!
//! ## Crates
//!
//! - `recmap-core`: mapping model, traversal engines, drivers
//! - `recmap-stream`: CSV, delimited, and fixed-length token readers/writers
//! - `recmap` (this crate): the [`StreamFactory`] and re-exports

mod factory;

pub use factory::{FactoryError, StreamFactory};

// Re-export the core model and drivers
pub use recmap_core::{
    ConfigError, Entity, EntityReader, EntityWriter, FieldError, FieldValue, ReadError,
    ReadResult, RecordError, RecordReader, RecordReport, RecordValue, RecordWriter, RuleCode,
    StreamDef, StreamError, StreamFormat, TypeError, TypeHandler, TypeHandlerRegistry, Value,
    ValueType, WriteError, WriteResult,
};

/// Mapping builders.
pub mod mapping {
    //! Builders and definition types for stream mappings.
    pub use recmap_core::mapping::{
        FieldDef, FieldDefBuilder, GroupDef, GroupDefBuilder, Justify, NodeDef, PropertyBinding,
        RecordDef, RecordDefBuilder, StreamDefBuilder,
    };
}

/// Message rendering for structured error codes.
pub mod messages {
    //! Error-code to message rendering with template fallback chains.
    pub use recmap_core::messages::{MapMessageSource, MessageResolver, MessageSource};
}

/// Built-in type handlers.
pub mod types {
    //! Reversible text-to-value converters.
    pub use recmap_core::types::{
        BoolHandler, DateHandler, FloatHandler, IntHandler, StringHandler,
    };
}

/// Format-level readers and writers.
pub mod stream {
    //! Token readers and writers for each stream format.
    pub use recmap_stream::{
        CsvConfig, CsvRecordReader, CsvRecordWriter, DelimitedConfig, DelimitedRecordReader,
        DelimitedRecordWriter, FixedLengthConfig, FixedLengthRecordReader,
        FixedLengthRecordWriter, LineReader,
    };
}
