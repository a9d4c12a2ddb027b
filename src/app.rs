//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the scan / extract / aggregate pipeline
//! - prints reports and writes the data slice and optional summary JSON

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{CollectArgs, Command, ProbeArgs, SummarizeArgs};
use crate::domain::CollectConfig;
use crate::error::AppError;
use crate::io::params::parse_cutoff_date;

pub mod pipeline;

/// Entry point for the `mhca` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Collect(args) => handle_collect(&args),
        Command::Probe(args) => handle_probe(&args),
        Command::Summarize(args) => handle_summarize(&args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn handle_collect(args: &CollectArgs) -> Result<(), AppError> {
    let config = collect_config_from_args(args)?;
    let run = pipeline::run_collect(&config)?;

    let slice_path = config.slice_path();
    crate::io::export::write_data_slice(&slice_path, &run.per_run)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            run.label(),
            run.per_run.len(),
            &run.skipped,
            config.steady_window,
            Some(&slice_path.display().to_string()),
        )
    );
    if !config.quiet {
        println!("{}", crate::report::format_per_run(&run.per_run));
    }
    println!("{}", crate::report::format_aggregated(&run.aggregated, config.mode));

    if let Some(path) = &config.export_summary {
        let summary = crate::io::summary::build_summary(
            run.label(),
            config.mode,
            Some(config.steady_window),
            &run.aggregated,
        );
        crate::io::summary::write_summary_json(path, &summary)?;
    }

    Ok(())
}

fn handle_probe(args: &ProbeArgs) -> Result<(), AppError> {
    let since = parse_cutoff_date(&args.scan.since)?;
    let values = pipeline::run_probe(&args.scan.root, since, &args.scan.template, &args.param)?;
    println!("{}", crate::report::format_probe(&args.param, &values));
    Ok(())
}

fn handle_summarize(args: &SummarizeArgs) -> Result<(), AppError> {
    let out = pipeline::run_summarize(&args.slice, &args.template, args.mode)?;

    println!("Axis label: {}", out.template.axis_label());
    println!(
        "Data slice: {} rows ({} rejected)\n",
        out.slice.rows.len(),
        out.slice.row_errors.len()
    );
    println!("{}", crate::report::format_aggregated(&out.aggregated, args.mode));

    if let Some(path) = &args.export_summary {
        let summary = crate::io::summary::build_summary(out.template.axis_label(), args.mode, None, &out.aggregated);
        crate::io::summary::write_summary_json(path, &summary)?;
    }
    Ok(())
}

pub fn collect_config_from_args(args: &CollectArgs) -> Result<CollectConfig, AppError> {
    if args.steady_window == 0 {
        return Err(AppError::input("`--steady-window` must be at least 1."));
    }
    Ok(CollectConfig {
        root: args.scan.root.clone(),
        since: parse_cutoff_date(&args.scan.since)?,
        template_path: args.scan.template.clone(),
        steady_window: args.steady_window,
        mode: args.mode,
        prefix: args.prefix.clone(),
        out_dir: args.out_dir.clone(),
        export_summary: args.export_summary.clone(),
        quiet: args.quiet,
    })
}
