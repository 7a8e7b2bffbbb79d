//! Tabular file loader.
//!
//! Reads comma-separated files (via the `csv` crate) or whitespace-separated
//! files (the layout of the original UCI `housing.data`) into a [`Dataset`]
//! with an externally supplied schema.
//!
//! # Example
//! ```no_run
//! use housing_pipeline::dataset::{load_dataset, LoaderOptions, Schema};
//!
//! let dataset = load_dataset("data.csv", &Schema::boston(), &LoaderOptions::default())?;
//! println!("{} rows", dataset.len());
//! # Ok::<(), housing_pipeline::HousingError>(())
//! ```

use crate::dataset::schema::Schema;
use crate::dataset::table::Dataset;
use crate::error::{HousingError, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Cell separator of the input file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    /// Comma if the first non-empty line contains one, whitespace otherwise.
    #[default]
    Auto,
    Comma,
    /// One or more spaces or tabs.
    Whitespace,
}

/// Whether the first line holds column names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderMode {
    /// Header if the first cell of the first line is not numeric.
    #[default]
    Auto,
    Present,
    Absent,
}

/// Options for [`load_dataset`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderOptions {
    pub delimiter: Delimiter,
    pub header: HeaderMode,
}

impl LoaderOptions {
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }
}

const MISSING_MARKERS: [&str; 5] = ["", "NA", "NaN", "nan", "?"];

/// Load a tabular file into a dataset with the given schema.
///
/// # Errors
/// - `Io` if the file cannot be opened or read
/// - `SchemaMismatch` if a row or the header disagrees with the schema
/// - `Parse` if a cell is neither numeric nor a missing marker
/// - `EmptyData` if the file has no data rows
pub fn load_dataset<P: AsRef<Path>>(
    path: P,
    schema: &Schema,
    options: &LoaderOptions,
) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let dataset = read_dataset(BufReader::new(file), schema, options)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.n_columns(),
        missing = dataset.missing_count(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Read a dataset from any reader. See [`load_dataset`].
pub fn read_dataset<R: Read>(
    mut reader: R,
    schema: &Schema,
    options: &LoaderOptions,
) -> Result<Dataset> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let delimiter = match options.delimiter {
        Delimiter::Auto => detect_delimiter(&text),
        other => other,
    };
    debug!(?delimiter, "tokenizing input");

    let records = match delimiter {
        Delimiter::Comma | Delimiter::Auto => comma_records(&text)?,
        Delimiter::Whitespace => whitespace_records(&text),
    };

    let mut records = records.into_iter().peekable();
    let has_header = match (options.header, records.peek()) {
        (HeaderMode::Present, _) => true,
        (HeaderMode::Absent, _) | (HeaderMode::Auto, None) => false,
        (HeaderMode::Auto, Some((_, cells))) => cells
            .first()
            .map(|c| parse_cell(c).is_none())
            .unwrap_or(false),
    };

    if has_header {
        match records.next() {
            Some((_, header)) => check_header(&header, schema)?,
            None => {
                return Err(HousingError::EmptyData(
                    "expected a header line but the input is empty".to_string(),
                ))
            }
        }
    }

    let n_cols = schema.len();
    let mut rows = Vec::new();
    for (line, cells) in records {
        if cells.len() != n_cols {
            return Err(HousingError::schema(
                format!("{} columns {}", n_cols, schema),
                format!("{} columns at line {}", cells.len(), line),
            ));
        }
        let mut row = Vec::with_capacity(n_cols);
        for (cell, column) in cells.iter().zip(schema.columns()) {
            let value = parse_cell(cell).ok_or_else(|| HousingError::Parse {
                line,
                column: column.clone(),
                value: cell.clone(),
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(HousingError::EmptyData("no data rows in input".to_string()));
    }

    Dataset::from_rows(schema.clone(), rows)
}

fn detect_delimiter(text: &str) -> Delimiter {
    match text.lines().find(|l| !l.trim().is_empty()) {
        Some(line) if line.contains(',') => Delimiter::Comma,
        _ => Delimiter::Whitespace,
    }
}

/// `(1-based line number, cells)` for each non-empty record.
fn comma_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(records)
}

fn whitespace_records(text: &str) -> Vec<(usize, Vec<String>)> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l.split_whitespace().map(str::to_string).collect()))
        .collect()
}

/// `Some(NaN)` for missing markers, `Some(v)` for finite numbers, `None`
/// otherwise. Infinities are rejected; a spelled-out NaN counts as missing.
fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell) {
        return Some(f64::NAN);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_infinite() => None,
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

fn check_header(header: &[String], schema: &Schema) -> Result<()> {
    let matches = header.len() == schema.len()
        && header
            .iter()
            .zip(schema.columns())
            .all(|(h, s)| h.trim().eq_ignore_ascii_case(s));
    if matches {
        Ok(())
    } else {
        Err(HousingError::schema(
            schema,
            format!("header [{}]", header.join(", ")),
        ))
    }
}
