//! Output of collections
//!
//! This module provides:
//! - Record formatting (manifest field projection, download rounding)
//! - NDJSON sinks writing to stdout or atomically replacing a file

mod fields;

pub use fields::{pick, round_to_precision, FormatOptions};

use crate::domain::DependentRecord;
use crate::error::{IoError, NdjsonError};
use crate::ndjson;
use std::io::{BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where a collection is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn is_stdout(&self) -> bool {
        matches!(self, OutputTarget::Stdout)
    }
}

enum Destination {
    Stdout(BufWriter<Stdout>),
    File {
        temp: BufWriter<NamedTempFile>,
        path: PathBuf,
    },
}

/// NDJSON sink for one output target.
///
/// File output goes to a temporary file next to the target and only
/// replaces it on `commit`; dropping an uncommitted sink leaves the target
/// untouched.
pub struct NdjsonSink {
    destination: Destination,
    written: usize,
}

impl NdjsonSink {
    pub fn open(target: &OutputTarget) -> Result<Self, IoError> {
        let destination = match target {
            OutputTarget::Stdout => Destination::Stdout(BufWriter::new(std::io::stdout())),
            OutputTarget::File(path) => {
                let temp = NamedTempFile::new_in(parent_dir(path))
                    .map_err(|e| IoError::write(path, e))?;
                Destination::File {
                    temp: BufWriter::new(temp),
                    path: path.clone(),
                }
            }
        };

        Ok(Self {
            destination,
            written: 0,
        })
    }

    pub fn write(&mut self, record: &DependentRecord) -> Result<(), NdjsonError> {
        match &mut self.destination {
            Destination::Stdout(out) => ndjson::write_record(out, record)?,
            Destination::File { temp, .. } => ndjson::write_record(temp, record)?,
        }
        self.written += 1;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a DependentRecord>,
    ) -> Result<(), NdjsonError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush, and for file targets move the temporary file into place
    pub fn commit(self) -> Result<usize, IoError> {
        let written = self.written;

        match self.destination {
            Destination::Stdout(mut out) => {
                out.flush().map_err(|e| IoError::write("<stdout>", e))?;
            }
            Destination::File { temp, path } => {
                let temp = temp
                    .into_inner()
                    .map_err(|e| IoError::write(&path, e.into_error()))?;
                temp.persist(&path)
                    .map_err(|e| IoError::write(&path, e.error))?;
            }
        }

        Ok(written)
    }
}

/// Write `records` to `target` in one go
pub fn write_collection<'a>(
    target: &OutputTarget,
    records: impl IntoIterator<Item = &'a DependentRecord>,
) -> Result<usize, crate::error::AppError> {
    let mut sink = NdjsonSink::open(target)?;
    sink.write_all(records)?;
    Ok(sink.commit()?)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_commit_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.ndjson");
        fs::write(&path, "old\n").unwrap();

        let records = vec![DependentRecord::new("a", 1), DependentRecord::new("b", 2)];
        let written = write_collection(&OutputTarget::File(path.clone()), &records).unwrap();

        assert_eq!(written, 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"name\":\"a\",\"downloads\":1}\n{\"name\":\"b\",\"downloads\":2}\n"
        );
    }

    #[test]
    fn test_dropped_sink_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.ndjson");
        fs::write(&path, "old\n").unwrap();

        {
            let mut sink = NdjsonSink::open(&OutputTarget::File(path.clone())).unwrap();
            sink.write(&DependentRecord::new("a", 1)).unwrap();
            assert_eq!(sink.written(), 1);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_parent_dir_of_bare_file_name() {
        assert_eq!(parent_dir(Path::new("list.ndjson")), Path::new("."));
        assert_eq!(parent_dir(Path::new("data/list.ndjson")), Path::new("data"));
    }

    #[test]
    fn test_output_target_is_stdout() {
        assert!(OutputTarget::Stdout.is_stdout());
        assert!(!OutputTarget::File(PathBuf::from("x")).is_stdout());
    }
}
