// analysis.rs

use crate::conditions::{ConditionSet, ConditionSpec};
use crate::error::{PhosphoPcaError, Result};
use crate::matrix_ops;
use crate::pca_runner::{self, PcaResult};
use crate::peptides::PeptideTable;
use log::info;
use ndarray::{Array2, ArrayView1};

/// The figure shows PC1 against PC2.
pub const N_COMPONENTS: usize = 2;

pub const DEFAULT_LOADING_THRESHOLD: f64 = 0.05;

/// Every intermediate of one pipeline run, kept for plotting and output.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub conditions: ConditionSet,
    pub peptides: PeptideTable,
    /// Peptides x conditions replicate means.
    pub averaged: Array2<f64>,
    /// Peptides x conditions, log2 and row-centered.
    pub centered: Array2<f64>,
    pub pca: PcaResult,
}

/// Average, log2, center, transpose, then fit the 2-component PCA.
pub fn run_analysis(peptides: PeptideTable, conditions: ConditionSet) -> Result<Analysis> {
    if peptides.is_empty() {
        return Err(PhosphoPcaError::DegeneratePca(
            "no peptides in input table".to_string(),
        ));
    }

    info!(
        "Averaging {} replicates per condition for {} peptides...",
        crate::conditions::REPLICATES_PER_CONDITION,
        peptides.len()
    );
    let averaged = matrix_ops::average_replicates(&peptides, &conditions)?;

    let mut centered = averaged.clone();
    matrix_ops::log2_transform(&mut centered, &peptides, &conditions)?;
    matrix_ops::center_rows(&mut centered);

    let observations = matrix_ops::conditions_as_observations(&centered);
    info!(
        "Fitting PCA on {} conditions x {} peptides",
        observations.nrows(),
        observations.ncols()
    );
    let pca = pca_runner::fit_pca(&observations, N_COMPONENTS)?;
    info!(
        "Explained variance: PC1 {:.1}%, PC2 {:.1}%",
        pca.explained_variance_ratio[0] * 100.0,
        pca.explained_variance_ratio[1] * 100.0
    );

    Ok(Analysis {
        conditions,
        peptides,
        averaged,
        centered,
        pca,
    })
}

impl Analysis {
    /// `(condition, PC1, PC2)` in condition order.
    pub fn condition_coordinates(&self) -> Vec<(&ConditionSpec, f64, f64)> {
        self.conditions
            .iter()
            .enumerate()
            .map(|(row, spec)| {
                let (x, y) = self.pca.coordinates(row);
                (spec, x, y)
            })
            .collect()
    }

    /// Genes of peptides whose PC1 loading is strictly above `threshold`.
    pub fn high_pc1_genes(&self, threshold: f64) -> Vec<&str> {
        genes_above_threshold(&self.peptides, self.pca.loadings(0), threshold)
    }
}

/// Gene names, in peptide order, for loadings strictly greater than `threshold`.
pub fn genes_above_threshold<'a>(
    peptides: &'a PeptideTable,
    loadings: ArrayView1<'_, f64>,
    threshold: f64,
) -> Vec<&'a str> {
    peptides
        .iter()
        .zip(loadings.iter())
        .filter(|&(_, &loading)| loading > threshold)
        .map(|(record, _)| record.gene_or_nan())
        .collect()
}
