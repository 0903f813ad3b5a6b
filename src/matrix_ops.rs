// matrix_ops.rs

use crate::conditions::ConditionSet;
use crate::error::{PhosphoPcaError, Result};
use crate::peptides::PeptideTable;
use log::debug;
use ndarray::{Array2, Axis};
use statrs::statistics::Statistics;

/// Peptides x conditions matrix of replicate means.
///
/// Empty replicate cells are left out of the mean; a condition with no
/// values at all is an error.
pub fn average_replicates(peptides: &PeptideTable, conditions: &ConditionSet) -> Result<Array2<f64>> {
    let mut matrix = Array2::<f64>::zeros((peptides.len(), conditions.len()));

    for (peptide_idx, record) in peptides.iter().enumerate() {
        if record.replicates.len() != conditions.len() {
            return Err(PhosphoPcaError::ShapeMismatch(format!(
                "peptide '{}' has {} replicate groups, expected {}",
                record.sequence,
                record.replicates.len(),
                conditions.len()
            )));
        }
        for (condition_idx, (values, condition)) in
            record.replicates.iter().zip(conditions.iter()).enumerate()
        {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                return Err(PhosphoPcaError::MissingReplicates {
                    peptide: record.sequence.clone(),
                    condition: condition.name.clone(),
                });
            }
            if present.len() < values.len() {
                debug!(
                    "Peptide '{}', condition '{}': averaging {} of {} replicates",
                    record.sequence,
                    condition.name,
                    present.len(),
                    values.len()
                );
            }
            matrix[[peptide_idx, condition_idx]] = present.iter().mean();
        }
    }
    Ok(matrix)
}

/// In-place log2. Every value must be strictly positive.
pub fn log2_transform(
    matrix: &mut Array2<f64>,
    peptides: &PeptideTable,
    conditions: &ConditionSet,
) -> Result<()> {
    for ((peptide_idx, condition_idx), value) in matrix.indexed_iter_mut() {
        if *value <= 0.0 || value.is_nan() {
            return Err(PhosphoPcaError::NonPositiveAbundance {
                peptide: peptides
                    .get(peptide_idx)
                    .map(|p| p.sequence.clone())
                    .unwrap_or_default(),
                condition: conditions
                    .get(condition_idx)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                value: *value,
            });
        }
        *value = value.log2();
    }
    Ok(())
}

/// Subtracts each row's mean across all columns.
pub fn center_rows(matrix: &mut Array2<f64>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let row_mean = row.iter().mean();
        row.mapv_inplace(|v| v - row_mean);
    }
}

/// Conditions become observations (rows), peptides features (columns).
pub fn conditions_as_observations(matrix: &Array2<f64>) -> Array2<f64> {
    matrix.t().as_standard_layout().into_owned()
}
