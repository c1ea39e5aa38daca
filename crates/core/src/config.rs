//! Benchmark configuration and the default parameter grid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::grid::ParamGrid;
use crate::sample;

pub const DEFAULT_SAMPLE_FILE: &str = "samples/question_answering_sample.txt";
pub const DEFAULT_QUESTIONS_FILE: &str = "samples/question_answering_questions.txt";
pub const DEFAULT_OUTPUT: &str = "results_component_test.csv";
pub const DEFAULT_QUESTION_LIMIT: usize = 2;

const DEFAULT_MODELS: &[&str] = &[
    "deepset/bert-base-cased-squad2",
    "deepset/minilm-uncased-squad2",
    "deepset/roberta-base-squad2",
    "deepset/bert-large-uncased-whole-word-masking-squad2",
    "deepset/xlm-roberta-large-squad2",
];

/// Grid parameter names, in declaration order.
pub mod param {
    pub const MODEL_NAME: &str = "model_name";
    pub const BATCH_SIZE: &str = "batch_size";
    pub const DOCUMENT_SIZE: &str = "document_size";
    pub const MAX_SEQ_LEN: &str = "max_seq_len";
    pub const DOC_STRIDE: &str = "doc_stride";
    pub const GPU: &str = "gpu";
    pub const QUESTION: &str = "question";
}

/// Candidate values for every benchmarked parameter.
///
/// `question: None` means the questions are read from the questions file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchGrid {
    pub model_name: Vec<String>,
    pub batch_size: Vec<usize>,
    pub document_size: Vec<usize>,
    pub max_seq_len: Vec<usize>,
    pub doc_stride: Vec<usize>,
    pub gpu: Vec<bool>,
    pub question: Option<Vec<String>>,
}

impl Default for BenchGrid {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            batch_size: vec![16, 32, 64],
            document_size: vec![10_000, 100_000, 1_000_000],
            max_seq_len: vec![384, 512, 1024],
            doc_stride: vec![128],
            gpu: vec![true],
            question: None,
        }
    }
}

/// TOML layout of a grid override file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GridFile {
    grid: BenchGrid,
}

impl BenchGrid {
    /// Parse a `[grid]` table; keys left out keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has unknown keys.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let file: GridFile =
            toml::from_str(content).map_err(|e| eyre::eyre!("invalid grid: {e}"))?;
        Ok(file.grid)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        Self::from_toml(&content).map_err(|e| eyre::eyre!("{}: {e}", path.display()))
    }
}

/// Runtime configuration for one benchmark batch.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub grid: BenchGrid,
    pub sample_file: PathBuf,
    pub questions_file: PathBuf,
    pub num_processes: usize,
    pub output: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            grid: BenchGrid::default(),
            sample_file: PathBuf::from(DEFAULT_SAMPLE_FILE),
            questions_file: PathBuf::from(DEFAULT_QUESTIONS_FILE),
            num_processes: 1,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl BenchConfig {
    /// Questions from the grid, or the first few lines of the questions file.
    ///
    /// # Errors
    ///
    /// Returns an error if the questions file is needed and cannot be read.
    pub fn questions(&self) -> crate::Result<Vec<String>> {
        match &self.grid.question {
            Some(questions) => Ok(questions.clone()),
            None => sample::load_questions(&self.questions_file, DEFAULT_QUESTION_LIMIT),
        }
    }

    /// Build the ordered parameter grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the questions cannot be resolved.
    pub fn param_grid(&self) -> crate::Result<ParamGrid> {
        let grid = &self.grid;
        Ok(ParamGrid::new()
            .with(param::MODEL_NAME, grid.model_name.iter().map(String::as_str))
            .with(param::BATCH_SIZE, grid.batch_size.iter().copied())
            .with(param::DOCUMENT_SIZE, grid.document_size.iter().copied())
            .with(param::MAX_SEQ_LEN, grid.max_seq_len.iter().copied())
            .with(param::DOC_STRIDE, grid.doc_stride.iter().copied())
            .with(param::GPU, grid.gpu.iter().copied())
            .with(param::QUESTION, self.questions()?))
    }
}
