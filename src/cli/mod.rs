use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod classify;
mod compare;
mod config;
mod dda_report;
mod dia_report;
mod extract;
mod fwhm;
mod ident_plot;
mod sweep;

/// mzReport - Acquisition QC Summaries and PDF Reports
#[derive(Parser)]
#[command(name = "mzreport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract scan records from an mzML acquisition into a features CSV
    Extract {
        /// Input mzML file path
        #[arg(value_name = "MZML")]
        input: PathBuf,

        /// Output CSV path (defaults to <stem>.features.csv)
        #[arg(value_name = "CSV")]
        output: Option<PathBuf>,
    },

    /// Build the DIA QC report PDF and isolation-window table
    DiaReport {
        /// Features CSV produced by the extract command
        #[arg(value_name = "FEATURES_CSV")]
        features_csv: PathBuf,

        /// DiaNN stats TSV carrying Precursors.Identified
        #[arg(value_name = "STATS_TSV")]
        stats_tsv: PathBuf,

        /// Feature TSV with mz, rtApex, and charge columns
        #[arg(value_name = "FEATURES_TSV")]
        features_tsv: PathBuf,

        /// DiaNN precursor report TSV
        #[arg(value_name = "REPORT_TSV")]
        report_tsv: PathBuf,

        /// TSV listing identified modified sequences
        #[arg(value_name = "SEQUENCES_TSV")]
        sequences_tsv: PathBuf,

        /// Output PDF path
        #[arg(value_name = "PDF")]
        output: PathBuf,

        /// Output CSV path for the per-target isolation-window table
        #[arg(value_name = "TABLE_CSV")]
        window_table: PathBuf,

        /// Also write the report metrics as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Build the DDA QC report PDF
    DdaReport {
        /// Features CSV produced by the extract command
        #[arg(value_name = "FEATURES_CSV")]
        features_csv: PathBuf,

        /// Feature TSV with mz, rtApex, and charge columns
        #[arg(value_name = "FEATURES_TSV")]
        features_tsv: PathBuf,

        /// mzIdentML identification document
        #[arg(value_name = "MZID")]
        mzid: PathBuf,

        /// Output PDF path
        #[arg(value_name = "PDF")]
        output: PathBuf,

        /// Also write the report metrics as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Compare scan and identification counts across samples
    Compare {
        /// Feature CSVs, DiaNN stats TSVs, and mzid summary texts
        #[arg(value_name = "INPUTS", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output PDF path
        #[arg(short, long, value_name = "PDF", default_value = "AnalysisReport.pdf")]
        output: PathBuf,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Decide DIA or DDA per feature CSV; exit 1 unless all are DIA
    Classify {
        /// Feature CSVs to classify
        #[arg(value_name = "FEATURES_CSV", required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Render identification scatter PNGs from a mzIdentML document
    IdentPlot {
        /// mzIdentML identification document
        #[arg(value_name = "MZID")]
        input: PathBuf,

        /// Directory for the PNGs (defaults to the input's directory)
        #[arg(value_name = "OUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Plot FWHM against nanogram load from DiaNN stats files
    Fwhm {
        /// Directory scanned for *.stats.tsv files
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Output PNG path
        #[arg(value_name = "PNG", default_value = "fwhm.png")]
        output: PathBuf,
    },

    /// Delete zero-byte files left behind by aborted runs
    Sweep {
        /// Directories to walk recursively
        #[arg(value_name = "DIR", required = true, num_args = 1..)]
        directories: Vec<PathBuf>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract { input, output } => extract::run(input, output),
        Commands::DiaReport {
            features_csv,
            stats_tsv,
            features_tsv,
            report_tsv,
            sequences_tsv,
            output,
            window_table,
            json,
            config,
        } => dia_report::run(
            features_csv,
            stats_tsv,
            features_tsv,
            report_tsv,
            sequences_tsv,
            output,
            window_table,
            json,
            config,
        ),
        Commands::DdaReport {
            features_csv,
            features_tsv,
            mzid,
            output,
            json,
            config,
        } => dda_report::run(features_csv, features_tsv, mzid, output, json, config),
        Commands::Compare {
            inputs,
            output,
            config,
        } => compare::run(inputs, output, config),
        Commands::Classify { files, config } => classify::run(files, config),
        Commands::IdentPlot {
            input,
            output_dir,
            config,
        } => ident_plot::run(input, output_dir, config),
        Commands::Fwhm { directory, output } => fwhm::run(directory, output),
        Commands::Sweep { directories } => sweep::run(directories),
    }
}
