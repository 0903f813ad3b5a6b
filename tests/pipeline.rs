use phospho_pca::{
    load_table, output_writer, plot, run_analysis, Analysis, ConditionSet, PeptideTable,
    PhosphoPcaError,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::io::Write;
use std::path::Path;

const N_PEPTIDES: usize = 40;
/// Peptides that respond strongly to late light stimulation.
const RESPONDERS: usize = 5;

struct Synthetic {
    /// [peptide][condition][replicate]
    values: Vec<Vec<[f64; 3]>>,
    genes: Vec<String>,
}

fn synthetic_values(seed: u64) -> Synthetic {
    let conditions = ConditionSet::lightr_src();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut values = Vec::with_capacity(N_PEPTIDES);
    let mut genes = Vec::with_capacity(N_PEPTIDES);
    for peptide in 0..N_PEPTIDES {
        let base: f64 = rng.random_range(0.5..2.0);
        let mut per_condition = Vec::with_capacity(conditions.len());
        for spec in conditions.iter() {
            let boost = if peptide < RESPONDERS
                && spec.group == phospho_pca::Group::Treatment
                && spec.order >= 3
            {
                8.0
            } else {
                1.0
            };
            let mut reps = [0.0; 3];
            for r in reps.iter_mut() {
                *r = base * boost * rng.random_range(0.9..1.1);
            }
            per_condition.push(reps);
        }
        values.push(per_condition);
        genes.push(format!("GENE{}", peptide));
    }
    Synthetic { values, genes }
}

fn write_csv(path: &Path, data: &Synthetic) {
    let conditions = ConditionSet::lightr_src();
    let mut file = fs::File::create(path).unwrap();
    let mut header = vec!["Annotated Sequence".to_string(), "Gene Name".to_string()];
    for spec in conditions.iter() {
        header.extend(spec.replicate_columns());
    }
    writeln!(file, "{}", header.join(",")).unwrap();
    for (i, per_condition) in data.values.iter().enumerate() {
        let mut row = vec![format!("[K].PEPTIDE{}.[R]", i), data.genes[i].clone()];
        for reps in per_condition {
            row.extend(reps.iter().map(|v| v.to_string()));
        }
        writeln!(file, "{}", row.join(",")).unwrap();
    }
}

fn analyze(path: &Path) -> Analysis {
    let conditions = ConditionSet::lightr_src();
    let table = load_table(path, None).unwrap();
    let peptides = PeptideTable::from_sheet(&table, &conditions).unwrap();
    run_analysis(peptides, conditions).unwrap()
}

fn fixture() -> (tempfile::TempDir, Synthetic, Analysis) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phospho.csv");
    let data = synthetic_values(17);
    write_csv(&path, &data);
    let analysis = analyze(&path);
    (dir, data, analysis)
}

#[test]
fn condition_means_are_replicate_means() {
    let (_dir, data, analysis) = fixture();
    assert_eq!(analysis.averaged.dim(), (N_PEPTIDES, 10));
    for (p, per_condition) in data.values.iter().enumerate() {
        for (c, reps) in per_condition.iter().enumerate() {
            let expected = reps.iter().sum::<f64>() / 3.0;
            assert!((analysis.averaged[[p, c]] - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn centered_rows_have_zero_mean() {
    let (_dir, _data, analysis) = fixture();
    for row in analysis.centered.rows() {
        assert!(row.sum().abs() / 10.0 < 1e-10);
    }
}

#[test]
fn explained_variance_ratios_are_fractions() {
    let (_dir, _data, analysis) = fixture();
    let ratios = &analysis.pca.explained_variance_ratio;
    assert_eq!(ratios.len(), 2);
    assert!(ratios.iter().all(|r| (0.0..=1.0).contains(r)));
    assert!(ratios.iter().sum::<f64>() <= 1.0 + 1e-12);
    // the late-treatment response dominates
    assert!(ratios[0] > 0.5);
}

#[test]
fn gene_list_matches_pc1_loadings_in_order() {
    let (_dir, data, analysis) = fixture();
    let loadings = analysis.pca.loadings(0);
    let expected: Vec<&str> = data
        .genes
        .iter()
        .zip(loadings.iter())
        .filter(|&(_, &l)| l > 0.05)
        .map(|(g, _)| g.as_str())
        .collect();
    assert_eq!(analysis.high_pc1_genes(0.05), expected);

    // responders carry the largest PC1 weight
    let (top, _) = loadings
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |(bi, bv), (i, v)| if v.abs() > bv { (i, v.abs()) } else { (bi, bv) });
    assert!(top < RESPONDERS);
}

#[test]
fn rerun_is_deterministic() {
    let (dir, _data, first) = fixture();
    let second = analyze(&dir.path().join("phospho.csv"));
    assert_eq!(first.pca, second.pca);
    assert_eq!(first.high_pc1_genes(0.05), second.high_pc1_genes(0.05));
}

#[test]
fn plot_and_tables_are_written() {
    let (dir, _data, analysis) = fixture();

    let svg = dir.path().join("scores.svg");
    plot::render_score_plot(&analysis, &svg).unwrap();
    let content = fs::read_to_string(&svg).unwrap();
    assert!(content.contains("<svg"));
    assert!(content.contains("PC1 ("));
    assert!(content.contains("LightR-Src HeLa"));

    let prefix = dir.path().join("out").to_string_lossy().into_owned();
    output_writer::write_principal_components(&prefix, &analysis).unwrap();
    output_writer::write_eigenvalues(&prefix, &analysis).unwrap();
    output_writer::write_loadings(&prefix, &analysis).unwrap();
    output_writer::write_summary_json(&prefix, &svg, &analysis, 0.05).unwrap();

    let pcs = fs::read_to_string(format!("{}.pca.tsv", prefix)).unwrap();
    let mut lines = pcs.lines();
    assert_eq!(lines.next(), Some("Condition\tGroup\tPC1\tPC2"));
    assert!(lines.next().unwrap().starts_with("10 s\tTreatment\t"));
    assert_eq!(pcs.lines().count(), 11);

    let loadings = fs::read_to_string(format!("{}.loadings.tsv", prefix)).unwrap();
    assert_eq!(loadings.lines().count(), N_PEPTIDES + 1);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(format!("{}.summary.json", prefix)).unwrap())
            .unwrap();
    assert_eq!(summary["peptides"], N_PEPTIDES);
    assert_eq!(summary["conditions"].as_array().unwrap().len(), 10);
}

#[test]
fn missing_marker_replicate_is_skipped_in_mean() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marker.csv");
    let data = synthetic_values(5);
    write_csv(&path, &data);

    // third replicate of condition 9 ("60 min ctrl") for peptide 4
    let text = fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let mut fields: Vec<&str> = lines[5].split(',').collect();
    fields[2 + 9 * 3 + 2] = "#N/A";
    let edited = fields.join(",");
    lines[5] = edited;
    fs::write(&path, lines.join("\n")).unwrap();

    let analysis = analyze(&path);
    let reps = data.values[4][9];
    let expected = (reps[0] + reps[1]) / 2.0;
    assert!((analysis.averaged[[4, 9]] - expected).abs() < 1e-9);
    assert_eq!(analysis.peptides.len(), N_PEPTIDES);
}

#[test]
fn zero_abundance_aborts_with_domain_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zero.csv");
    let mut data = synthetic_values(3);
    data.values[7][2] = [0.0; 3];
    write_csv(&path, &data);

    let conditions = ConditionSet::lightr_src();
    let table = load_table(&path, None).unwrap();
    let peptides = PeptideTable::from_sheet(&table, &conditions).unwrap();
    let err = run_analysis(peptides, conditions).unwrap_err();
    match err {
        PhosphoPcaError::NonPositiveAbundance { peptide, condition, .. } => {
            assert_eq!(peptide, "[K].PEPTIDE7.[R]");
            assert_eq!(condition, "1 min");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
