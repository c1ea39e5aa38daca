//! Flat CSV report, one row per trial.

use std::path::Path;

use eyre::WrapErr;
use serde::Serialize;
use tracing::info;

use crate::trial::{TrialOutcome, TrialResult};
use crate::Result;

/// Timing value written for every column of a failed trial.
pub const FAILED_TIMING: f64 = -1.0;

/// Column names, in the field order of [`ResultRow`].
pub const HEADERS: [&str; 14] = [
    "model name",
    "question",
    "preproc",
    "language model",
    "prediction head",
    "total",
    "batch_size",
    "document_size",
    "num_processes",
    "max_seq_len",
    "doc_stride",
    "gpu",
    "sample_file",
    "error",
];

/// One report row. Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "model name")]
    pub model_name: String,
    pub question: String,
    pub preproc: f64,
    #[serde(rename = "language model")]
    pub language_model: f64,
    #[serde(rename = "prediction head")]
    pub prediction_head: f64,
    pub total: f64,
    pub batch_size: usize,
    pub document_size: usize,
    pub num_processes: usize,
    pub max_seq_len: usize,
    pub doc_stride: usize,
    pub gpu: bool,
    pub sample_file: String,
    pub error: String,
}

impl From<&TrialResult> for ResultRow {
    fn from(result: &TrialResult) -> Self {
        let params = &result.params;
        let (preproc, language_model, prediction_head, total, error) = match &result.outcome {
            TrialOutcome::Completed(t) => (
                t.preprocessing,
                t.language_model,
                t.prediction_head,
                t.total,
                String::new(),
            ),
            TrialOutcome::Failed { error } => (
                FAILED_TIMING,
                FAILED_TIMING,
                FAILED_TIMING,
                FAILED_TIMING,
                error.clone(),
            ),
        };

        Self {
            model_name: params.model_name.clone(),
            question: params.question.clone(),
            preproc,
            language_model,
            prediction_head,
            total,
            batch_size: params.batch_size,
            document_size: params.document_size,
            num_processes: result.num_processes,
            max_seq_len: params.max_seq_len,
            doc_stride: params.doc_stride,
            gpu: params.gpu,
            sample_file: result.sample_file.display().to_string(),
            error,
        }
    }
}

/// Write every result to `path` in one go, header first.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_results(path: &Path, results: &[TrialResult]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for result in results {
        writer.serialize(ResultRow::from(result))?;
    }
    writer.flush()?;
    info!(rows = results.len(), path = %path.display(), "results written");
    Ok(())
}
