//! Roster parser for CSV files and spreadsheet workbooks.
//!
//! Every source is reduced to a [`Roster`]: the header row as column names
//! and one key-value [`Row`] per non-blank line.

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One roster line keyed by column name. Blank cells are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn insert(&mut self, column: &str, cell: Cell) {
        if !cell.is_blank() {
            self.cells.insert(column.to_string(), cell);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Where the roster bytes should be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Picks a format from the file name extension, falling back to the
    /// leading magic bytes (zip container or OLE compound file).
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        let trimmed = name.split(['?', '#']).next().unwrap_or(name);
        let ext = Path::new(trimmed)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("csv") => SourceFormat::Csv,
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => SourceFormat::Workbook,
            _ if bytes.starts_with(b"PK\x03\x04") => SourceFormat::Workbook,
            _ if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) => SourceFormat::Workbook,
            _ => SourceFormat::Csv,
        }
    }
}

/// A parsed grade roster.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Roster {
    /// Reads a CSV roster. The first record is the header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // Byte records so non-UTF-8 exports (cp1252, Latin-1) still load.
        let raw_headers = rdr
            .byte_headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        let columns = normalize_headers(raw_headers);

        let mut rows = Vec::new();
        for (line, result) in rdr.byte_records().enumerate() {
            let record = result.with_context(|| format!("Malformed CSV record {}", line + 1))?;
            let mut row = Row::default();
            for (column, value) in columns.iter().zip(record.iter()) {
                row.insert(column, Cell::Text(String::from_utf8_lossy(value).into_owned()));
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }

        debug!(columns = columns.len(), rows = rows.len(), "CSV roster parsed");
        Ok(Self { columns, rows })
    }

    /// Reads the named sheet (or the first one) of an xlsx/xls/xlsb/ods workbook.
    ///
    /// The first non-blank row is the header row.
    pub fn from_workbook_bytes(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Self> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;

        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("Workbook contains no sheets"))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet '{sheet_name}'"))?;

        let mut lines = range
            .rows()
            .skip_while(|cells| cells.iter().all(|c| Cell::from(c).is_blank()));

        let Some(header) = lines.next() else {
            debug!(sheet = %sheet_name, "Sheet is empty");
            return Ok(Self::default());
        };

        let columns = normalize_headers(
            header
                .iter()
                .map(|c| match c {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect(),
        );

        let rows: Vec<Row> = lines
            .map(|cells| {
                let mut row = Row::default();
                for (column, data) in columns.iter().zip(cells) {
                    row.insert(column, Cell::from(data));
                }
                row
            })
            .filter(|row| !row.is_empty())
            .collect();

        debug!(sheet = %sheet_name, columns = columns.len(), rows = rows.len(), "Workbook roster parsed");
        Ok(Self { columns, rows })
    }

    /// Decodes roster bytes, choosing the reader with [`SourceFormat::detect`].
    pub fn from_bytes(name: &str, bytes: Vec<u8>, sheet: Option<&str>) -> Result<Self> {
        match SourceFormat::detect(name, &bytes) {
            SourceFormat::Csv => Self::from_csv_reader(bytes.as_slice()),
            SourceFormat::Workbook => Self::from_workbook_bytes(bytes, sheet),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// First column whose name mentions a grade or score.
    pub fn guess_grade_column(&self) -> Option<&str> {
        self.guess_column(&["grade", "score"])
    }

    /// First column whose name mentions a group or section.
    pub fn guess_group_column(&self) -> Option<&str> {
        self.guess_column(&["group", "section"])
    }

    fn guess_column(&self, needles: &[&str]) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| {
                let lower = c.to_lowercase();
                needles.iter().any(|n| lower.contains(n))
            })
            .map(String::as_str)
    }
}

/// Blank headers become `__EMPTY`, `__EMPTY_1`, ... and repeated headers get
/// a numeric suffix so every column name is unique.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());

    for header in raw {
        let trimmed = header.trim();
        let base = if trimmed.is_empty() {
            "__EMPTY".to_string()
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        while used.contains(&name) {
            let n = suffixes.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{base}_{n}");
        }

        used.insert(name.clone());
        out.push(name);
    }

    out
}
