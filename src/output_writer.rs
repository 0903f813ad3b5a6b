// output_writer.rs

use crate::analysis::Analysis;
use crate::error::Result;
use log::{info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn create_output_file(prefix: &str, suffix: &str) -> Result<BufWriter<File>> {
    let filename = format!("{}.{}", prefix, suffix);
    Ok(File::create(&filename).map(BufWriter::new)?)
}

/// Gene names to `writer`, one per line.
pub fn write_gene_list<W: Write>(writer: &mut W, genes: &[&str]) -> Result<()> {
    for gene in genes {
        writeln!(writer, "{}", gene)?;
    }
    writer.flush()?;
    Ok(())
}

/// `<prefix>.pca.tsv`: condition scores.
pub fn write_principal_components(output_prefix: &str, analysis: &Analysis) -> Result<()> {
    let scores = &analysis.pca.scores;
    if scores.ncols() == 0 {
        info!("No principal components to write.");
        return Ok(());
    }
    let mut writer = create_output_file(output_prefix, "pca.tsv")?;
    info!("Writing principal components to {}.pca.tsv", output_prefix);

    write!(writer, "Condition\tGroup")?;
    for i in 1..=scores.ncols() {
        write!(writer, "\tPC{}", i)?;
    }
    writeln!(writer)?;

    for (row, spec) in analysis.conditions.iter().enumerate() {
        write!(writer, "{}\t{:?}", spec.name, spec.group)?;
        for pc_idx in 0..scores.ncols() {
            write!(writer, "\t{:.6}", scores[[row, pc_idx]])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// `<prefix>.eigenvalues.tsv`: variance and variance ratio per component.
pub fn write_eigenvalues(output_prefix: &str, analysis: &Analysis) -> Result<()> {
    let pca = &analysis.pca;
    if pca.explained_variance.is_empty() {
        info!("No eigenvalues to write.");
        return Ok(());
    }
    let mut writer = create_output_file(output_prefix, "eigenvalues.tsv")?;
    info!("Writing eigenvalues to {}.eigenvalues.tsv", output_prefix);

    writeln!(writer, "PC\tExplainedVariance\tExplainedVarianceRatio")?;
    for (i, (variance, ratio)) in pca
        .explained_variance
        .iter()
        .zip(pca.explained_variance_ratio.iter())
        .enumerate()
    {
        writeln!(writer, "{}\t{:.6}\t{:.6}", i + 1, variance, ratio)?;
    }
    writer.flush()?;
    Ok(())
}

/// `<prefix>.loadings.tsv`: per-peptide loadings, in sheet order.
pub fn write_loadings(output_prefix: &str, analysis: &Analysis) -> Result<()> {
    let rotation = &analysis.pca.rotation;
    if rotation.ncols() == 0 {
        info!("No loadings to write (0 components).");
        return Ok(());
    }
    let mut writer = create_output_file(output_prefix, "loadings.tsv")?;
    info!("Writing peptide loadings to {}.loadings.tsv", output_prefix);

    write!(writer, "AnnotatedSequence\tGeneName")?;
    for i in 1..=rotation.ncols() {
        write!(writer, "\tPC{}_loading", i)?;
    }
    writeln!(writer)?;

    for (peptide_idx, record) in analysis.peptides.iter().enumerate() {
        if peptide_idx >= rotation.nrows() {
            warn!("Index out of bounds for loadings (peptide {}). Skipping.", peptide_idx);
            continue;
        }
        write!(writer, "{}\t{}", record.sequence, record.gene_or_nan())?;
        for pc_idx in 0..rotation.ncols() {
            write!(writer, "\t{:.6}", rotation[[peptide_idx, pc_idx]])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ConditionScore<'a> {
    condition: &'a str,
    group: &'static str,
    pc1: f64,
    pc2: f64,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    input: String,
    peptides: usize,
    explained_variance_ratio: &'a [f64],
    conditions: Vec<ConditionScore<'a>>,
    loading_threshold: f64,
    selected_genes: Vec<&'a str>,
}

/// `<prefix>.summary.json`: scores, variance ratios and the selected genes.
pub fn write_summary_json(
    output_prefix: &str,
    input: &Path,
    analysis: &Analysis,
    loading_threshold: f64,
) -> Result<()> {
    let summary = Summary {
        input: input.display().to_string(),
        peptides: analysis.peptides.len(),
        explained_variance_ratio: &analysis.pca.explained_variance_ratio,
        conditions: analysis
            .condition_coordinates()
            .into_iter()
            .map(|(spec, pc1, pc2)| ConditionScore {
                condition: &spec.name,
                group: spec.group.legend_label(),
                pc1,
                pc2,
            })
            .collect(),
        loading_threshold,
        selected_genes: analysis.high_pc1_genes(loading_threshold),
    };

    let mut writer = create_output_file(output_prefix, "summary.json")?;
    info!("Writing summary to {}.summary.json", output_prefix);
    serde_json::to_writer_pretty(&mut writer, &summary).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
