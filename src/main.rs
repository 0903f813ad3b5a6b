// main.rs

// --- External Crate Imports ---
use anyhow::{Context, Error, Result};
use clap::Parser;
use log::{debug, info};
use phospho_pca::{
    load_table, output_writer, plot, run_analysis, ConditionSet, PeptideTable,
};
use std::{
    io::{self, BufWriter},
    path::PathBuf,
    time::Instant,
};

// --- Main Function ---
fn main() -> Result<(), Error> {
    let total_time_start = Instant::now();
    let cli_args = cli::CliArgs::parse();

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    info!("Starting phospho_pca with args: {:?}", cli_args);

    // --- 1. Load spreadsheet and index peptides ---
    let conditions = ConditionSet::lightr_src();
    debug!("Conditions: {:?}", conditions.names());
    let table = load_table(&cli_args.input, cli_args.sheet.as_deref())
        .with_context(|| format!("Failed to load {}", cli_args.input.display()))?;
    let peptides = PeptideTable::from_sheet(&table, &conditions)?;

    // --- 2. Average, log2, center, PCA ---
    let analysis = run_analysis(peptides, conditions)?;

    // --- 3. Plot ---
    if cli_args.no_plot {
        info!("Plot output disabled (--no-plot).");
    } else {
        plot::render_score_plot(&analysis, &cli_args.plot)?;
    }

    // --- 4. Optional tabular outputs ---
    if let Some(prefix) = &cli_args.output_prefix {
        let prefix_path = PathBuf::from(prefix);
        if let Some(parent) = prefix_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
                info!("Created output directory: {}", parent.display());
            }
        }
        output_writer::write_principal_components(prefix, &analysis)?;
        output_writer::write_eigenvalues(prefix, &analysis)?;
        output_writer::write_loadings(prefix, &analysis)?;
        output_writer::write_summary_json(
            prefix,
            &cli_args.input,
            &analysis,
            cli_args.loading_threshold,
        )?;
    }

    // --- 5. Genes with high PC1 loading ---
    let genes = analysis.high_pc1_genes(cli_args.loading_threshold);
    info!(
        "{} of {} peptides have PC1 loading > {}",
        genes.len(),
        analysis.peptides.len(),
        cli_args.loading_threshold
    );
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    output_writer::write_gene_list(&mut out, &genes)?;

    info!(
        "phospho_pca finished successfully in {:.2?}.",
        total_time_start.elapsed()
    );
    Ok(())
}

// --- Module Implementations ---

mod cli {
    use clap::Parser;
    use phospho_pca::DEFAULT_LOADING_THRESHOLD;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "PCA of LightR-Src phosphoproteomic timecourse data.", long_about = None, propagate_version = true)]
    pub(crate) struct CliArgs {
        /// Spreadsheet with replicate abundances (xlsx/xls/ods/csv/tsv).
        #[arg(short, long, default_value = "82058_0_supp_1617734_qd653y.xlsx")]
        pub(crate) input: PathBuf,

        /// Worksheet name; defaults to the first sheet.
        #[arg(long)]
        pub(crate) sheet: Option<String>,

        #[arg(long, default_value = "phospho_pca.svg")]
        pub(crate) plot: PathBuf,

        #[arg(long)]
        pub(crate) no_plot: bool,

        /// Prefix for .pca.tsv, .eigenvalues.tsv, .loadings.tsv and .summary.json.
        #[arg(short, long = "out")]
        pub(crate) output_prefix: Option<String>,

        #[arg(long, default_value_t = DEFAULT_LOADING_THRESHOLD)]
        pub(crate) loading_threshold: f64,

        #[arg(long, default_value = "Info")]
        pub(crate) log_level: String,
    }
}
