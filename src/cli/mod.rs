//! Command-line parsing for the steady-state aggregator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! scan/extract/aggregate code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::AggregationMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mhca",
    version,
    about = "Aggregate steady-state MHC statistics across simulation runs"
)]
pub struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a run tree, write the data slice, and print aggregated statistics.
    Collect(CollectArgs),
    /// List one parameter's value for every run matching the template.
    Probe(ProbeArgs),
    /// Re-aggregate a previously written data slice.
    Summarize(SummarizeArgs),
}

/// Options shared by every command that scans the run tree.
#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// Earliest run start date to include (YYYY-MM-DD).
    #[arg(long)]
    pub since: String,

    /// Template parameter file marking the VAR / VARX / IRR fields.
    #[arg(long, value_name = "JSON")]
    pub template: PathBuf,

    /// Root of the run tree.
    #[arg(long, env = "MHCA_ROOT", default_value = ".")]
    pub root: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Number of trailing host generations treated as steady state.
    #[arg(long, default_value_t = 1000)]
    pub steady_window: usize,

    /// Prefix of the data slice file name (`<prefix>DataSlice.csv`).
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Directory the data slice is written to; must lie outside `--root`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Dispersion estimate for the aggregated table.
    #[arg(long, value_enum, default_value_t = AggregationMode::Pooled)]
    pub mode: AggregationMode,

    /// Write the aggregated table and axis label to JSON.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,

    /// Do not print the per-run table.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Parameter to report (a key of the run configuration file).
    #[arg(long, default_value = "run_start_date_and_time")]
    pub param: String,
}

#[derive(Debug, Args, Clone)]
pub struct SummarizeArgs {
    /// Data slice written by `mhca collect`.
    #[arg(long, value_name = "CSV")]
    pub slice: PathBuf,

    /// Template used to produce the slice (for the axis label).
    #[arg(long, value_name = "JSON")]
    pub template: PathBuf,

    /// Dispersion estimate for the aggregated table.
    #[arg(long, value_enum, default_value_t = AggregationMode::Pooled)]
    pub mode: AggregationMode,

    /// Write the aggregated table and axis label to JSON.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}
