//! Sequential batch over the whole parameter grid.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument};

use crate::config::BenchConfig;
use crate::engine::InferenceEngine;
use crate::report::{self, ResultRow};
use crate::trial::{self, TrialParams, TrialResult, TrialSettings};
use crate::Result;

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:30.cyan/dim} {pos}/{len} {msg}")?
            .progress_chars("━╸─"),
    );
    Ok(pb)
}

/// Run every combination of the configured grid and write the report.
///
/// Failed trials are recorded, not propagated. The report is written once,
/// after the last trial.
///
/// # Errors
///
/// Returns an error if the grid cannot be built, a combination does not map
/// onto trial parameters, or the report cannot be written.
#[instrument(skip_all, fields(output = %config.output.display()))]
pub fn run_benchmark(
    engine: &dyn InferenceEngine,
    config: &BenchConfig,
) -> Result<Vec<TrialResult>> {
    let grid = config.param_grid()?;
    let count = grid.combination_count();
    println!("Running {count} benchmarks...");
    info!(trials = count, "benchmark started");

    let trials = grid
        .combinations()
        .iter()
        .map(TrialParams::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let settings = TrialSettings {
        sample_file: config.sample_file.clone(),
        num_processes: config.num_processes,
    };

    let pb = progress_bar(trials.len())?;
    let mut results = Vec::with_capacity(trials.len());
    for params in &trials {
        pb.set_message(params.model_name.clone());
        results.push(trial::run_trial(engine, params, &settings));
        pb.inc(1);
    }
    pb.finish_and_clear();

    for result in &results {
        println!("{:#?}", ResultRow::from(result));
        println!();
    }

    let failed = results.iter().filter(|r| r.outcome.is_failed()).count();
    info!(total = results.len(), failed, "benchmark finished");

    report::write_results(&config.output, &results)?;
    Ok(results)
}
