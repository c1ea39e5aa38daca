//! CLI argument parsing.

use clap::Parser;
use qabench_core::config::{DEFAULT_OUTPUT, DEFAULT_QUESTIONS_FILE, DEFAULT_SAMPLE_FILE};
use std::path::PathBuf;

fn at_least_one(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|e| format!("{e}"))?;
    if val >= 1 {
        Ok(val)
    } else {
        Err("num-processes must be at least 1".to_string())
    }
}

/// Without arguments, runs the built-in model/batch/document grid.
#[derive(Parser)]
#[command(
    name = "qabench",
    about = "Time preprocessing, language model and prediction head of QA models"
)]
pub struct Cli {
    /// TOML file with a `[grid]` table overriding the default candidates
    #[arg(long, env = "QABENCH_GRID")]
    pub grid: Option<PathBuf>,

    /// CSV file the results are written to
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Plain-text document the contexts are cut from
    #[arg(long, default_value = DEFAULT_SAMPLE_FILE)]
    pub sample_file: PathBuf,

    /// Newline-delimited questions; the first two are used
    #[arg(long, default_value = DEFAULT_QUESTIONS_FILE)]
    pub questions_file: PathBuf,

    /// Threads given to each inference session
    #[arg(long, default_value = "1", value_parser = at_least_one)]
    pub num_processes: usize,

    /// `HuggingFace` token (direct value)
    #[arg(long, env = "HF_TOKEN")]
    pub hf_token: Option<String>,

    /// Path to `HuggingFace` token file
    #[arg(long, env = "HF_TOKEN_PATH")]
    pub hf_token_path: Option<PathBuf>,
}

impl Cli {
    /// Resolve the HF token from `--hf-token` or `--hf-token-path`.
    #[must_use]
    pub fn resolve_hf_token(&self) -> Option<String> {
        if let Some(ref token) = self.hf_token {
            let trimmed = token.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }

        self.hf_token_path
            .as_deref()
            .and_then(read_token_file)
    }
}

fn read_token_file(path: &std::path::Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
