//! Column-oriented table used for dataset bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Values held by a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "values")]
pub enum ColumnData {
    /// String cells (identifiers, class names)
    Text(Vec<String>),
    /// Integer cells (encoded labels, fold ids)
    Int(Vec<i64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Text(v) => Self::Text(indices.iter().map(|&i| v[i].clone()).collect()),
            Self::Int(v) => Self::Int(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn int(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, ColumnData::Int(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Text cells, if this is a text column
    pub fn as_text(&self) -> Option<&[String]> {
        match &self.data {
            ColumnData::Text(v) => Some(v),
            ColumnData::Int(_) => None,
        }
    }

    /// Integer cells, if this is an integer column
    pub fn as_int(&self) -> Option<&[i64]> {
        match &self.data {
            ColumnData::Int(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    /// String form of the cell at `row`
    pub fn cell(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Int(v) => v[row].to_string(),
        }
    }

    /// String form of every cell, in row order
    pub fn keys(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.cell(i)).collect()
    }

    /// Distinct cell values in ascending order (numeric order for integer columns)
    pub fn distinct_sorted(&self) -> Vec<String> {
        match &self.data {
            ColumnData::Text(v) => {
                let mut out = v.clone();
                out.sort();
                out.dedup();
                out
            }
            ColumnData::Int(v) => {
                let mut out = v.clone();
                out.sort_unstable();
                out.dedup();
                out.into_iter().map(|x| x.to_string()).collect()
            }
        }
    }
}

/// A small column-oriented table. All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Create an empty frame with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from columns, checking lengths and name uniqueness
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut frame = Self::new();
        for column in columns {
            if frame.has_column(column.name()) {
                return Err(Error::config(format!("duplicate column '{}'", column.name())));
            }
            frame.insert_column(column)?;
        }
        Ok(frame)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column, failing with a configuration error if absent
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns.iter().find(|c| c.name == name).ok_or_else(|| {
            Error::config(format!(
                "column '{name}' not found (available: {})",
                self.column_names().join(", ")
            ))
        })
    }

    /// Insert a column, replacing any existing column of the same name in place
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.len() {
            return Err(Error::ShapeMismatch(format!(
                "column '{}' has {} rows, frame has {}",
                column.name(),
                column.len(),
                self.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// New frame holding the given rows, in the given order
    pub fn take(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.take(indices)))
            .collect();
        Self { columns }
    }

    /// Read a frame from CSV with a header row.
    ///
    /// A column becomes an integer column when every cell parses as `i64`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.as_str()) {
                return Err(Error::config(format!("duplicate column '{h}' in CSV header")));
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (i, value) in record.iter().enumerate() {
                cells[i].push(value.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                let ints: Option<Vec<i64>> =
                    values.iter().map(|v| v.trim().parse::<i64>().ok()).collect();
                match ints {
                    Some(ints) if !values.is_empty() => Column::int(name, ints),
                    _ => Column::text(name, values),
                }
            })
            .collect();
        Self::from_columns(columns)
    }

    /// Read a CSV file from disk
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Write the frame as CSV with a header row
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.column_names())?;
        for row in 0..self.len() {
            wtr.write_record(self.columns.iter().map(|c| c.cell(row)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the frame to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.to_csv_writer(file)
    }
}
