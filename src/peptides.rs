// peptides.rs

use crate::conditions::{ConditionSet, REPLICATES_PER_CONDITION};
use crate::error::{PhosphoPcaError, Result};
use crate::sheet::{Cell, SheetTable};
use log::{debug, info};
use std::collections::HashMap;

pub const SEQUENCE_COLUMN: &str = "Annotated Sequence";
pub const GENE_COLUMN: &str = "Gene Name";

/// Replicate abundances of one condition; `None` marks an empty cell.
pub type ReplicateValues = [Option<f64>; REPLICATES_PER_CONDITION];

#[derive(Clone, Debug, PartialEq)]
pub struct PeptideRecord {
    pub sequence: String,
    pub gene_name: Option<String>,
    /// One entry per condition, in `ConditionSet` order.
    pub replicates: Vec<ReplicateValues>,
}

impl PeptideRecord {
    /// Gene name as printed; a missing name prints as `nan`.
    pub fn gene_or_nan(&self) -> &str {
        self.gene_name.as_deref().unwrap_or("nan")
    }
}

/// Peptides keyed by annotated sequence, in sheet row order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeptideTable {
    records: Vec<PeptideRecord>,
}

impl PeptideTable {
    /// Builds the table, checking that every replicate column exists and
    /// that sequence keys are unique. Blank rows are skipped.
    pub fn from_sheet(sheet: &SheetTable, conditions: &ConditionSet) -> Result<Self> {
        let key_col = sheet.column_index(SEQUENCE_COLUMN)?;
        let gene_col = sheet.column_index(GENE_COLUMN)?;

        let mut replicate_cols: Vec<[(usize, String); REPLICATES_PER_CONDITION]> =
            Vec::with_capacity(conditions.len());
        for condition in conditions.iter() {
            let [a, b, c] = condition.replicate_columns();
            replicate_cols.push([
                (sheet.column_index(&a)?, a),
                (sheet.column_index(&b)?, b),
                (sheet.column_index(&c)?, c),
            ]);
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::with_capacity(sheet.rows.len());

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            // header is sheet row 1
            let sheet_row = row_idx + 2;
            if row.iter().all(Cell::is_empty) {
                debug!("Skipping blank sheet row {}", sheet_row);
                continue;
            }

            let sequence = sheet
                .cell(row_idx, key_col)
                .as_text()
                .ok_or(PhosphoPcaError::MissingKey(sheet_row))?;
            if let Some(&first_row) = seen.get(&sequence) {
                return Err(PhosphoPcaError::DuplicatePeptide {
                    sequence,
                    first_row,
                    second_row: sheet_row,
                });
            }
            seen.insert(sequence.clone(), sheet_row);

            let gene_name = sheet.cell(row_idx, gene_col).as_text();

            let mut replicates = Vec::with_capacity(replicate_cols.len());
            for columns in &replicate_cols {
                let mut values: ReplicateValues = [None; REPLICATES_PER_CONDITION];
                for (slot, (col, col_name)) in values.iter_mut().zip(columns.iter()) {
                    *slot = numeric_cell(sheet.cell(row_idx, *col), sheet_row, col_name)?;
                }
                replicates.push(values);
            }

            records.push(PeptideRecord {
                sequence,
                gene_name,
                replicates,
            });
        }

        info!(
            "Parsed {} peptides across {} conditions",
            records.len(),
            conditions.len()
        );
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<PeptideRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PeptideRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeptideRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PeptideRecord> {
        self.records.get(index)
    }
}

/// NaN cells count as missing, like an empty cell. Missing-value markers
/// such as `#N/A` already arrive as `Cell::Empty` from the loader.
fn numeric_cell(cell: &Cell, row: usize, column: &str) -> Result<Option<f64>> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(v) if v.is_nan() => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Text(s) => Err(PhosphoPcaError::NonNumericCell {
            row,
            column: column.to_string(),
            value: s.clone(),
        }),
    }
}
