//! Tabular sources and sinks an experiment is loaded from and saved to.
//!
//! Readers drop comment lines (a `#` as the first character of a line) before any field
//! parsing and hand back the remaining records. Interpreting the header and participant rows
//! is up to [`Experiment`](crate::Experiment).

use std::io::{self, Write};
use std::path::Path;

use encoding_rs::Encoding;
use ezexp_core::FileFormat;
use log::{debug, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tempfile::NamedTempFile;

use crate::error::{ExperimentError, Result};

pub trait TabularReader {
    fn read_all(&self, path: &Path, encoding: &'static Encoding) -> Result<Vec<Vec<String>>>;
}

pub trait TabularWriter {
    fn write_all(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        path: &Path,
        encoding: &'static Encoding,
    ) -> Result<()>;
}

/// Reader for the given input format
pub fn reader_for(format: FileFormat, delimiter: u8) -> Result<Box<dyn TabularReader>> {
    match format {
        FileFormat::Csv => Ok(Box::new(CsvTable::new(delimiter))),
        FileFormat::Json | FileFormat::Xml => Err(ExperimentError::UnsupportedFormat {
            format,
            operation: "loading",
        }),
    }
}

/// Writer for the given output format
pub fn writer_for(format: FileFormat, delimiter: u8) -> Result<Box<dyn TabularWriter>> {
    match format {
        FileFormat::Csv => Ok(Box::new(CsvTable::new(delimiter))),
        FileFormat::Json => Ok(Box::new(JsonTable)),
        FileFormat::Xml => Err(ExperimentError::UnsupportedFormat {
            format,
            operation: "saving",
        }),
    }
}

/// Delimited text
#[derive(Debug, Clone, Copy)]
pub struct CsvTable {
    delimiter: u8,
}

impl CsvTable {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvTable {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl TabularReader for CsvTable {
    fn read_all(&self, path: &Path, encoding: &'static Encoding) -> Result<Vec<Vec<String>>> {
        let bytes = std::fs::read(path)?;
        let (text, actual, had_errors) = encoding.decode(&bytes);
        if had_errors {
            warn!(
                "{} contains bytes that are not valid {}, replaced with U+FFFD",
                path.display(),
                actual.name()
            );
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        debug!("read {} records from {}", rows.len(), path.display());
        Ok(rows)
    }
}

impl TabularWriter for CsvTable {
    fn write_all(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        path: &Path,
        encoding: &'static Encoding,
    ) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| io::Error::other(e.to_string()))?;
        let text = String::from_utf8(buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        write_atomic(path, &encode(&text, encoding, path))
    }
}

/// Array of objects, keys in header order
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTable;

struct JsonRow<'a> {
    header: &'a [String],
    values: &'a [String],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.header.len()))?;
        for (name, value) in self.header.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl TabularWriter for JsonTable {
    fn write_all(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        path: &Path,
        encoding: &'static Encoding,
    ) -> Result<()> {
        let rows: Vec<JsonRow<'_>> = rows
            .iter()
            .map(|values| JsonRow { header, values })
            .collect();
        let text = serde_json::to_string_pretty(&rows)?;

        write_atomic(path, &encode(&text, encoding, path))
    }
}

fn encode(text: &str, encoding: &'static Encoding, path: &Path) -> Vec<u8> {
    let (bytes, actual, unmappable) = encoding.encode(text);
    if unmappable {
        warn!(
            "some characters written to {} cannot be represented in {}",
            path.display(),
            actual.name()
        );
    }
    bytes.into_owned()
}

/// Writes through a sibling temp file so a failed save never leaves a truncated output.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
