//! The decoded response table

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::io::Read;

/// Columns interpreted as timestamps when decoding the response CSV
const DATE_COLUMNS: &[&str] = &["StartDate", "EndDate"];

/// Metadata rows between the header and the data (question text, internal IDs)
const METADATA_ROWS: usize = 2;

/// Timestamp renderings observed in exported responses
const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One value in the response table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The respondent left this blank
    Empty,
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Decode a raw CSV field. Date columns that fail to parse stay text.
    fn decode(raw: &str, date_column: bool) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }
        if date_column {
            for format in DATE_FORMATS {
                if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
                    return Self::Timestamp(timestamp);
                }
            }
        }
        Self::Text(raw.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A single named column extracted from a [`ResponseTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A borrowed view of one respondent's row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Look up a cell by column name
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.cells.get(index)
    }

    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

/// Decoded survey responses: rows are respondents, columns are
/// question/sub-question codes
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResponseTable {
    /// Decode the CSV payload of an export archive
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();
        let date_mask: Vec<bool> = columns
            .iter()
            .map(|name| DATE_COLUMNS.contains(&name.as_str()))
            .collect();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if index < METADATA_ROWS {
                continue;
            }
            let row = (0..columns.len())
                .map(|i| Cell::decode(record.get(i).unwrap_or(""), date_mask[i]))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// The column names, in CSV order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of respondent rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the respondent rows
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Extract the column with the given name, failing when it is absent
    pub fn column(&self, name: &str) -> Result<Column> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::data_shape(format!("no response column named {name}")))?;

        Ok(Column {
            name: name.to_string(),
            cells: self.rows.iter().map(|row| row[index].clone()).collect(),
        })
    }

    /// A new table containing only the columns whose name matches `pattern`,
    /// preserving column and row order
    pub fn select(&self, pattern: &Regex) -> Self {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| pattern.is_match(name))
            .map(|(i, _)| i)
            .collect();

        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// A new table containing only the rows the predicate keeps. Useful for
    /// building a response subset to hand to `Survey::set_response_subset`.
    pub fn filter_rows(&self, mut keep: impl FnMut(Row<'_>) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|cells| {
                    keep(Row {
                        columns: &self.columns,
                        cells,
                    })
                })
                .cloned()
                .collect(),
        }
    }
}
