//! Tabular test data: raw rows plus the two shapes steps consume.

mod gherkin;

use crate::failure::{Failure, Result};
use crate::value::{Map, Value};
use std::path::Path;

/// Rows of cells, header row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Parse CSV text. The first record is kept as a row, not consumed as headers.
    pub fn from_csv(text: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        Self::read_csv(reader, "CSV text")
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|error| {
                Failure::Table(format!("failed to open CSV '{}': {error}", path.display()))
            })?;
        Self::read_csv(reader, &path.display().to_string())
    }

    fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>, source: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|error| {
                Failure::Table(format!("failed to read CSV record from {source}: {error}"))
            })?;
            rows.push(record.iter().map(|cell| cell.trim().to_owned()).collect());
        }
        Ok(Self { rows })
    }

    /// Parse a Gherkin pipe table (`| a | b |` per line).
    pub fn from_gherkin(text: &str) -> Result<Self> {
        gherkin::parse(text).map(|rows| Self { rows })
    }

    pub fn raw(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column → second column. Repeated keys collect their values in an array.
    pub fn rows_hash(&self) -> Value {
        let mut hash = Map::new();
        for row in &self.rows {
            let Some(key) = row.first() else {
                continue;
            };
            let value = row.get(1).cloned().unwrap_or_default();
            insert_or_accumulate(&mut hash, key, value);
        }
        Value::Object(hash)
    }

    /// One object per data row, keyed by the header row. Repeated headers
    /// collect their values in an array.
    pub fn hashes(&self) -> Value {
        let Some((header, rows)) = self.rows.split_first() else {
            return Value::Array(Vec::new());
        };

        let hashes = rows
            .iter()
            .map(|row| {
                let mut hash = Map::new();
                for (key, value) in header.iter().zip(row) {
                    insert_or_accumulate(&mut hash, key, value.clone());
                }
                Value::Object(hash)
            })
            .collect();
        Value::Array(hashes)
    }
}

fn insert_or_accumulate(hash: &mut Map, key: &str, value: String) {
    match hash.get_mut(key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            hash.insert(key.to_owned(), Value::String(value));
        }
    }
}
