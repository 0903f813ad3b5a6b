// sheet.rs

use crate::error::{PhosphoPcaError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use std::path::Path;

/// A single spreadsheet cell, reduced to what the pipeline cares about.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering used for key and gene columns.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// Header row plus data rows of the first (or selected) worksheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PhosphoPcaError::MissingColumn(name.to_string()))
    }

    /// Cell at `(row, col)`; ragged rows read as empty past their end.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    fn from_rows<I>(mut rows: I) -> Result<Self>
    where
        I: Iterator<Item = Vec<Cell>>,
    {
        let headers: Vec<String> = rows
            .next()
            .ok_or(PhosphoPcaError::EmptyTable)?
            .into_iter()
            .map(|c| c.as_text().map(|s| s.trim().to_string()).unwrap_or_default())
            .collect();
        let rows: Vec<Vec<Cell>> = rows.collect();
        Ok(Self { headers, rows })
    }
}

/// Load a table from disk. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods` – workbook, first sheet unless `sheet` is given
/// * `.csv` – comma separated export
/// * `.tsv`, `.txt` – tab separated export
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<SheetTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet)?,
        "csv" => load_delimited(path, b',')?,
        "tsv" | "txt" => load_delimited(path, b'\t')?,
        other => return Err(PhosphoPcaError::UnsupportedFormat(other.to_string())),
    };
    info!(
        "Loaded {} data rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<SheetTable> {
    let spreadsheet_err = |message: String| PhosphoPcaError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|n| n == name) {
                return Err(PhosphoPcaError::MissingSheet(name.to_string()));
            }
            debug!("Reading worksheet '{}'", name);
            workbook
                .worksheet_range(name)
                .map_err(|e| spreadsheet_err(e.to_string()))?
        }
        None => {
            debug!(
                "Reading first worksheet of {:?}",
                workbook.sheet_names()
            );
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| spreadsheet_err("workbook contains no worksheets".to_string()))?
                .map_err(|e| spreadsheet_err(e.to_string()))?
        }
    };

    SheetTable::from_rows(
        range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>()),
    )
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<SheetTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(cell_from_text).collect::<Vec<_>>());
    }
    SheetTable::from_rows(rows.into_iter())
}

pub(crate) fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::String(s) => cell_from_text(s),
        // #N/A, #DIV/0! and friends
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

/// Missing-value markers commonly found in exported proteomics tables.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Numeric-looking text becomes a number; blank text and missing-value
/// markers become an empty cell.
pub(crate) fn cell_from_text(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text(raw.to_string()),
    }
}
