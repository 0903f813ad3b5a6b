//! PCA of time-resolved phosphoproteomic abundances.
//!
//! Replicate abundances for each condition are averaged, log2-transformed and
//! centered per peptide, then projected with a two-component PCA where the
//! conditions are observations and the peptides are features.

pub mod analysis;
pub mod conditions;
pub mod error;
pub mod matrix_ops;
pub mod output_writer;
pub mod pca_runner;
pub mod peptides;
pub mod plot;
pub mod sheet;

pub use analysis::{run_analysis, Analysis, DEFAULT_LOADING_THRESHOLD, N_COMPONENTS};
pub use conditions::{ConditionSet, ConditionSpec, Group, LabelPosition};
pub use error::{PhosphoPcaError, Result};
pub use pca_runner::{fit_pca, PcaResult};
pub use peptides::{PeptideRecord, PeptideTable};
pub use sheet::{load_table, Cell, SheetTable};
