//! # mzReport
//!
//! A command-line tool for acquisition QC of mass-spectrometry proteomics runs.
//!
//! ## Supported Inputs
//!
//! - **mzML**: HUPO-PSI standard XML format (via streaming parser)
//! - **mzIdentML**: peptide-spectrum identifications with q-values
//! - **DiaNN**: stats and precursor report TSV outputs
//!
//! ## Usage
//!
//! ```bash
//! # Extract per-scan records from an mzML run
//! mzreport extract sample.mzML
//!
//! # Assemble the DIA QC report
//! mzreport dia-report sample.features.csv sample.stats.tsv sample.features.tsv \
//!     sample.report.tsv sample.sequences.tsv sample.pdf sample.windows.csv
//!
//! # Compare scan counts across samples
//! mzreport compare a.features.csv b.features.csv a.stats.tsv b.stats.tsv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
