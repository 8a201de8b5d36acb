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

//! The stream factory: named mappings and reader/writer construction.

use recmap_core::{ConfigError, EntityReader, EntityWriter, RecordReader, RecordWriter, StreamDef, StreamFormat};
use recmap_stream::{
    CsvConfig, CsvRecordReader, CsvRecordWriter, DelimitedConfig, DelimitedRecordReader,
    DelimitedRecordWriter, FixedLengthRecordReader, FixedLengthRecordWriter,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// Errors raised when constructing readers and writers.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Invalid or unknown mapping.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing file could not be opened.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A registry of named stream mappings that hands out entity readers and
/// writers bound to the mapping's format.
///
/// The factory is shareable across threads; every reader or writer it
/// creates owns its own per-stream state over the shared mapping.
#[derive(Default)]
pub struct StreamFactory {
    mappings: RwLock<HashMap<String, Arc<StreamDef>>>,
}

impl StreamFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping under its stream name, replacing any previous
    /// mapping with the same name.
    pub fn register(&self, mapping: StreamDef) -> Arc<StreamDef> {
        let mapping = Arc::new(mapping);
        debug!(stream = %mapping.name(), "registered mapping");
        self.mappings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(mapping.name().to_string(), Arc::clone(&mapping));
        mapping
    }

    /// Look up a registered mapping by name.
    pub fn mapping(&self, name: &str) -> Option<Arc<StreamDef>> {
        self.mappings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    fn require(&self, name: &str) -> Result<Arc<StreamDef>, FactoryError> {
        self.mapping(name)
            .ok_or_else(|| ConfigError::UnknownMapping {
                name: name.to_string(),
            })
            .map_err(FactoryError::from)
    }

    /// Create an entity reader for the named mapping over any input.
    pub fn create_reader<R: Read + 'static>(
        &self,
        name: &str,
        input: R,
    ) -> Result<EntityReader<Box<dyn RecordReader>>, FactoryError> {
        let mapping = self.require(name)?;
        let reader: Box<dyn RecordReader> = match mapping.format() {
            StreamFormat::Csv { delimiter, quote } => Box::new(CsvRecordReader::with_config(
                input,
                CsvConfig {
                    delimiter,
                    quote,
                    ..Default::default()
                },
            )),
            StreamFormat::Delimited { delimiter } => {
                Box::new(DelimitedRecordReader::with_config(
                    input,
                    DelimitedConfig {
                        delimiter,
                        ..Default::default()
                    },
                ))
            }
            StreamFormat::FixedLength => Box::new(FixedLengthRecordReader::new(input)),
        };
        debug!(stream = %name, "created entity reader");
        Ok(EntityReader::new(mapping, reader))
    }

    /// Create an entity reader over a file.
    pub fn open_reader(
        &self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<EntityReader<Box<dyn RecordReader>>, FactoryError> {
        let file = File::open(path)?;
        self.create_reader(name, file)
    }

    /// Create an entity writer for the named mapping over any output.
    pub fn create_writer<W: Write + 'static>(
        &self,
        name: &str,
        output: W,
    ) -> Result<EntityWriter<Box<dyn RecordWriter>>, FactoryError> {
        let mapping = self.require(name)?;
        let writer: Box<dyn RecordWriter> = match mapping.format() {
            StreamFormat::Csv { delimiter, quote } => Box::new(CsvRecordWriter::with_config(
                output,
                CsvConfig {
                    delimiter,
                    quote,
                    ..Default::default()
                },
            )),
            StreamFormat::Delimited { delimiter } => {
                Box::new(DelimitedRecordWriter::with_config(
                    output,
                    DelimitedConfig {
                        delimiter,
                        ..Default::default()
                    },
                ))
            }
            StreamFormat::FixedLength => Box::new(FixedLengthRecordWriter::new(output)),
        };
        debug!(stream = %name, "created entity writer");
        Ok(EntityWriter::new(mapping, writer))
    }

    /// Create an entity writer over a file, truncating it.
    pub fn create_file_writer(
        &self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<EntityWriter<Box<dyn RecordWriter>>, FactoryError> {
        let file = File::create(path)?;
        self.create_writer(name, file)
    }
}
