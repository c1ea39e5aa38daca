//! qabench - QA component timing benchmark.

mod cli;

use clap::Parser;
use qabench_core::{BenchConfig, BenchGrid};
use qabench_ml::OnnxQaEngine;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QABENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = cli::Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            warn!(error = %e, "benchmark aborted");
            eprintln!("qabench: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &cli::Cli) -> qabench_core::Result<()> {
    let grid = match &cli.grid {
        Some(path) => BenchGrid::from_file(path)?,
        None => BenchGrid::default(),
    };

    let config = BenchConfig {
        grid,
        sample_file: cli.sample_file.clone(),
        questions_file: cli.questions_file.clone(),
        num_processes: cli.num_processes,
        output: cli.output.clone(),
    };

    let engine = OnnxQaEngine::new(cli.resolve_hf_token());
    let results = qabench_core::run_benchmark(&engine, &config)?;
    let failed = results.iter().filter(|r| r.outcome.is_failed()).count();
    info!(
        trials = results.len(),
        failed,
        output = %config.output.display(),
        "benchmark complete"
    );
    Ok(())
}
