// error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort an analysis run.
#[derive(Debug, Error)]
pub enum PhosphoPcaError {
    #[error("Failed to open spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("Unsupported input extension '.{0}' (expected xlsx, xlsm, xlsb, xls, ods, csv, tsv or txt)")]
    UnsupportedFormat(String),

    #[error("Worksheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("Input table is empty (no header row)")]
    EmptyTable,

    #[error("Required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("Row {0} has data but no 'Annotated Sequence' key")]
    MissingKey(usize),

    #[error("Duplicate peptide key '{sequence}' at sheet rows {first_row} and {second_row}")]
    DuplicatePeptide {
        sequence: String,
        first_row: usize,
        second_row: usize,
    },

    #[error("Row {row}, column '{column}': value '{value}' is not numeric")]
    NonNumericCell {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Peptide '{peptide}' has no replicate values for condition '{condition}'")]
    MissingReplicates { peptide: String, condition: String },

    #[error("Peptide '{peptide}', condition '{condition}': log2 undefined for non-positive abundance {value}")]
    NonPositiveAbundance {
        peptide: String,
        condition: String,
        value: f64,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("PCA input is degenerate: {0}")]
    DegeneratePca(String),

    #[error("Plot rendering failed: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = PhosphoPcaError> = std::result::Result<T, E>;
