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

//! End-to-end tests over the factory, drivers, and format readers.

use recmap::mapping::{FieldDefBuilder, RecordDefBuilder};
use recmap::{
    Entity, ReadError, RuleCode, StreamDef, StreamFactory, StreamFormat, Value, ValueType,
};
use std::io::Cursor;

fn person_fixed_mapping() -> StreamDef {
    StreamDef::builder("people", StreamFormat::FixedLength)
        .record(
            RecordDefBuilder::new("person")
                .entity("person")
                .field(FieldDefBuilder::new("id").width(5).required().bind("id"))
                .field(FieldDefBuilder::new("name").at(5).width(20).bind("name")),
        )
        .build()
        .unwrap()
}

#[test]
fn test_fixed_length_happy_path() {
    let factory = StreamFactory::new();
    factory.register(person_fixed_mapping());

    let input = "00042Alice               \n";
    let mut reader = factory.create_reader("people", Cursor::new(input)).unwrap();

    let person = reader.read().unwrap().unwrap();
    assert_eq!(person.name(), "person");
    assert_eq!(person.get("id"), Some(&Value::String("00042".to_string())));
    assert_eq!(person.get("name"), Some(&Value::String("Alice".to_string())));
    assert_eq!(reader.record_name(), "person");
    assert_eq!(reader.line_number(), 1);
    assert!(reader.read().unwrap().is_none());
}

fn header_detail_mapping() -> StreamDef {
    StreamDef::builder("report", StreamFormat::csv())
        .record(
            RecordDefBuilder::new("header")
                .entity("header")
                .occurs(1, Some(1))
                .order(1)
                .field(FieldDefBuilder::new("kind").identifier().literal("H"))
                .field(FieldDefBuilder::new("title").bind("title"))
                .field(FieldDefBuilder::new("year").typed(ValueType::Int).bind("year")),
        )
        .record(
            RecordDefBuilder::new("detail")
                .entity("detail")
                .occurs(0, None)
                .order(2)
                .field(FieldDefBuilder::new("kind").identifier().literal("D"))
                .field(FieldDefBuilder::new("item").bind("item"))
                .field(FieldDefBuilder::new("qty").typed(ValueType::Int).bind("qty")),
        )
        .build()
        .unwrap()
}

#[test]
fn test_csv_with_record_identifiers() {
    let factory = StreamFactory::new();
    factory.register(header_detail_mapping());

    let input = "H,report,2024\nD,foo,7\nD,bar,x\n";
    let mut reader = factory.create_reader("report", Cursor::new(input)).unwrap();

    let header = reader.read().unwrap().unwrap();
    assert_eq!(header.name(), "header");
    assert_eq!(header.get("title"), Some(&Value::String("report".to_string())));
    assert_eq!(header.get("year"), Some(&Value::Int(2024)));

    let detail = reader.read().unwrap().unwrap();
    assert_eq!(detail.get("item"), Some(&Value::String("foo".to_string())));
    assert_eq!(detail.get("qty"), Some(&Value::Int(7)));

    // the third line carries an unparseable quantity
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Invalid { report } => {
            assert_eq!(report.record_name, "detail");
            assert_eq!(report.line, 3);
            assert_eq!(report.field_errors.len(), 1);
            assert_eq!(report.field_errors[0].field, "qty");
            assert_eq!(report.field_errors[0].rule, RuleCode::Type);
            assert_eq!(report.field_errors[0].text.as_deref(), Some("x"));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }

    assert!(reader.read().unwrap().is_none());
}

fn sequenced_mapping() -> StreamDef {
    StreamDef::builder("seq", StreamFormat::csv())
        .record(
            RecordDefBuilder::new("a")
                .entity("a")
                .occurs(1, Some(1))
                .order(1)
                .field(FieldDefBuilder::new("kind").identifier().literal("a")),
        )
        .record(
            RecordDefBuilder::new("b")
                .entity("b")
                .occurs(0, None)
                .order(2)
                .field(FieldDefBuilder::new("kind").identifier().literal("b")),
        )
        .build()
        .unwrap()
}

#[test]
fn test_sequence_violation_is_unexpected_when_identifiable() {
    let factory = StreamFactory::new();
    factory.register(sequenced_mapping());

    let mut reader = factory.create_reader("seq", Cursor::new("b\n")).unwrap();
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Unexpected { record, report } => {
            assert_eq!(record, "b");
            assert_eq!(report.line, 1);
            assert_eq!(report.text, "b");
            assert_eq!(report.record_errors[0].rule, RuleCode::Unexpected);
        }
        other => panic!("expected Unexpected, got {:?}", other),
    }
}

#[test]
fn test_sequence_violation_is_unidentified_when_unknown() {
    let factory = StreamFactory::new();
    factory.register(sequenced_mapping());

    let mut reader = factory.create_reader("seq", Cursor::new("z\n")).unwrap();
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Unidentified { report } => {
            assert_eq!(report.record_errors[0].rule, RuleCode::Unidentified);
        }
        other => panic!("expected Unidentified, got {:?}", other),
    }
}

#[test]
fn test_close_names_unsatisfied_record() {
    let factory = StreamFactory::new();
    factory.register(sequenced_mapping());

    // a stream holding only a "b" after a valid "a" closes cleanly; a
    // stream that never produced the mandatory "a" does not
    let mut reader = factory.create_reader("seq", Cursor::new("a\nb\n")).unwrap();
    let first = reader.read().unwrap().unwrap();
    assert_eq!(first.name(), "a");
    let second = reader.read().unwrap().unwrap();
    assert_eq!(second.name(), "b");
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_collection_field() {
    let factory = StreamFactory::new();
    factory.register(
        StreamDef::builder("tagged", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("row")
                    .entity("row")
                    .field(FieldDefBuilder::new("id").bind("id"))
                    .field(FieldDefBuilder::new("name").bind("name"))
                    .field(
                        FieldDefBuilder::new("tags")
                            .at(2)
                            .collection(1, Some(3))
                            .bind("tags"),
                    ),
            )
            .build()
            .unwrap(),
    );

    let mut reader = factory
        .create_reader("tagged", Cursor::new("id,name,red,green,blue\n"))
        .unwrap();
    let row = reader.read().unwrap().unwrap();
    assert_eq!(
        row.get("tags"),
        Some(&Value::List(vec![
            Value::String("red".to_string()),
            Value::String("green".to_string()),
            Value::String("blue".to_string()),
        ]))
    );

    let mut reader = factory
        .create_reader("tagged", Cursor::new("id,name\n"))
        .unwrap();
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Invalid { report } => {
            assert_eq!(report.field_errors.len(), 1);
            assert_eq!(report.field_errors[0].field, "tags");
            assert_eq!(report.field_errors[0].rule, RuleCode::MinOccurs);
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_max_occurs_overflow() {
    let factory = StreamFactory::new();
    factory.register(
        StreamDef::builder("lines", StreamFormat::csv())
            .record(
                RecordDefBuilder::new("line")
                    .entity("line")
                    .occurs(0, Some(2))
                    .field(FieldDefBuilder::new("v").bind("v")),
            )
            .build()
            .unwrap(),
    );

    let mut reader = factory
        .create_reader("lines", Cursor::new("one\ntwo\nthree\n"))
        .unwrap();
    assert!(reader.read().unwrap().is_some());
    assert!(reader.read().unwrap().is_some());
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Unexpected { record, .. } => assert_eq!(record, "line"),
        other => panic!("expected Unexpected, got {:?}", other),
    }
}

#[test]
fn test_fixed_length_round_trip() {
    let factory = StreamFactory::new();
    factory.register(person_fixed_mapping());

    let original = Entity::new("person")
        .with_property("id", "00042")
        .with_property("name", "Alice");

    let mut buffer = SharedBuf::default();
    let mut writer = factory.create_writer("people", buffer.clone()).unwrap();
    writer.write(&original).unwrap();
    writer.close().unwrap();

    let written = buffer.take();
    assert_eq!(written, "00042Alice               \n");

    let mut reader = factory
        .create_reader("people", Cursor::new(written))
        .unwrap();
    let reparsed = reader.read().unwrap().unwrap();
    assert_eq!(reparsed, original);
}

#[test]
fn test_csv_round_trip_through_files() {
    let factory = StreamFactory::new();
    factory.register(header_detail_mapping());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");

    let mut writer = factory.create_file_writer("report", &path).unwrap();
    writer
        .write(
            &Entity::new("header")
                .with_property("title", "report")
                .with_property("year", 2024i64),
        )
        .unwrap();
    writer
        .write(
            &Entity::new("detail")
                .with_property("item", "foo")
                .with_property("qty", 7i64),
        )
        .unwrap();
    writer.close().unwrap();

    let mut reader = factory.open_reader("report", &path).unwrap();
    let header = reader.read().unwrap().unwrap();
    assert_eq!(header.get("year"), Some(&Value::Int(2024)));
    let detail = reader.read().unwrap().unwrap();
    assert_eq!(detail.get("qty"), Some(&Value::Int(7)));
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_reader_recovers_after_invalid_record() {
    let factory = StreamFactory::new();
    factory.register(header_detail_mapping());

    let input = "H,report,2024\nD,bad,x\nD,good,1\n";
    let mut reader = factory.create_reader("report", Cursor::new(input)).unwrap();
    reader.read().unwrap();
    assert!(reader.read().is_err());
    let recovered = reader.read().unwrap().unwrap();
    assert_eq!(recovered.get("item"), Some(&Value::String("good".to_string())));
}

#[test]
fn test_malformed_csv_is_reported_and_skipped() {
    let factory = StreamFactory::new();
    factory.register(header_detail_mapping());

    let input = "H,report,2024\n\"D,unterminated\nD,good,1\n";
    let mut reader = factory.create_reader("report", Cursor::new(input)).unwrap();
    reader.read().unwrap();
    let err = reader.read().unwrap_err();
    match err {
        ReadError::Malformed { report } => {
            assert_eq!(report.line, 2);
            assert_eq!(report.record_errors[0].rule, RuleCode::Malformed);
        }
        other => panic!("expected Malformed, got {:?}", other),
    }
    let recovered = reader.read().unwrap().unwrap();
    assert_eq!(recovered.get("item"), Some(&Value::String("good".to_string())));
}

/// An owned buffer handle that satisfies the writer's `'static` bound and
/// stays readable after the writer is dropped.
#[derive(Clone, Default)]
struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl SharedBuf {
    fn take(&mut self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
