//! NDJSON reading and writing
//!
//! One JSON value per line. Blank lines are ignored; a line that is not
//! valid JSON fails the read with its 1-based line number.

use crate::domain::{DependentRecord, DependentsCollection};
use crate::error::NdjsonError;
use serde_json::{Map, Value};
use std::io::{BufRead, Lines, Write};

const LOG_TARGET: &str = "list_dependents::ndjson";

/// Lazy iterator over the JSON values of an NDJSON stream
pub struct NdjsonReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> NdjsonReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Only the values that are dependent records.
    ///
    /// Values that are not objects with a non-empty string `name` are
    /// skipped. Known fields of the wrong type are carried through as
    /// unknown fields so the record itself is never lost.
    pub fn records(self) -> impl Iterator<Item = Result<DependentRecord, NdjsonError>> {
        self.filter_map(|value| match value {
            Ok(value) => to_record(value).map(Ok),
            Err(e) => Some(Err(e)),
        })
    }
}

impl<R: BufRead> Iterator for NdjsonReader<R> {
    type Item = Result<Value, NdjsonError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(NdjsonError::Io(e))),
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|source| NdjsonError::Parse {
                line: self.line,
                source,
            }));
        }
    }
}

fn to_record(value: Value) -> Option<DependentRecord> {
    let name = match value.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            log::debug!(target: LOG_TARGET, "Skipping value without a name");
            return None;
        }
    };

    let Value::Object(fields) = value else {
        return None;
    };
    match serde_json::from_value::<DependentRecord>(Value::Object(fields.clone())) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Keeping mistyped fields of {} as-is: {}", name, e);
            Some(salvage(name, fields))
        }
    }
}

/// A record of the well-typed fields, with the rest kept in `extra`
fn salvage(name: String, fields: Map<String, Value>) -> DependentRecord {
    let mut typed = Map::new();
    let mut raw = Map::new();
    for (key, value) in fields {
        if key == "name" {
            continue;
        }
        let mut single = Map::new();
        single.insert("name".to_string(), Value::String(name.clone()));
        single.insert(key.clone(), value.clone());
        if serde_json::from_value::<DependentRecord>(Value::Object(single)).is_ok() {
            typed.insert(key, value);
        } else {
            raw.insert(key, value);
        }
    }

    typed.insert("name".to_string(), Value::String(name.clone()));
    let mut record = serde_json::from_value::<DependentRecord>(Value::Object(typed))
        .unwrap_or_else(|_| DependentRecord {
            downloads: None,
            ..DependentRecord::new(name, 0)
        });
    record.extra.extend(raw);
    record
}

/// Read a whole collection; later lines win over earlier ones with the same name
pub fn read_collection<R: BufRead>(reader: R) -> Result<DependentsCollection, NdjsonError> {
    NdjsonReader::new(reader).records().collect()
}

/// Write one record as a line
pub fn write_record<W: Write>(writer: &mut W, record: &DependentRecord) -> Result<(), NdjsonError> {
    serde_json::to_writer(&mut *writer, record).map_err(|source| NdjsonError::Serialize {
        name: record.name.clone(),
        source,
    })?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write records one per line, returning how many were written
pub fn write_records<'a, W: Write>(
    writer: &mut W,
    records: impl IntoIterator<Item = &'a DependentRecord>,
) -> Result<usize, NdjsonError> {
    let mut count = 0;
    for record in records {
        write_record(writer, record)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_values_and_skips_blank_lines() {
        let input = "{\"name\":\"a\"}\n\n  \n{\"name\":\"b\"}\n";
        let values: Vec<Value> = NdjsonReader::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_last_line_without_newline() {
        let values: Vec<Value> = NdjsonReader::new(Cursor::new("{\"name\":\"a\"}"))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"name\":\"a\"}\n\n{oops\n";
        let err = NdjsonReader::new(Cursor::new(input))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();

        match err {
            NdjsonError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_records_skip_non_records() {
        let input = "{\"name\":\"a\",\"downloads\":1}\n42\n{\"downloads\":3}\n{\"name\":\"\"}\n";
        let records: Vec<DependentRecord> = NdjsonReader::new(Cursor::new(input))
            .records()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }

    #[test]
    fn test_mistyped_fields_keep_the_record() {
        let input = concat!(
            "{\"name\":\"a\",\"downloads\":1}\n",
            "{\"name\":\"b\",\"downloads\":7,\"dependentCount\":2.5,\"note\":\"x\"}\n",
        );
        let collection = read_collection(Cursor::new(input)).unwrap();
        let records = collection.into_records();

        assert_eq!(records.len(), 2);
        let b = &records[1];
        assert_eq!(b.name, "b");
        assert_eq!(b.downloads, Some(7));
        assert_eq!(b.dependent_count, None);
        assert_eq!(
            serde_json::to_value(b).unwrap(),
            serde_json::json!({"name": "b", "downloads": 7, "dependentCount": 2.5, "note": "x"})
        );
    }

    #[test]
    fn test_write_then_read_collection() {
        let records = vec![
            DependentRecord::new("a", 1).with_dependent_count(2),
            DependentRecord::new("b", 3),
        ];
        let mut buffer = Vec::new();
        let written = write_records(&mut buffer, &records).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(
            text,
            "{\"name\":\"a\",\"downloads\":1,\"dependentCount\":2}\n{\"name\":\"b\",\"downloads\":3}\n"
        );

        let collection = read_collection(Cursor::new(buffer)).unwrap();
        assert_eq!(collection.into_records(), records);
    }
}
