//! Sample text and question loading.

use std::path::Path;

use eyre::WrapErr;
use tracing::debug;

use crate::engine::QaInput;
use crate::error::BenchError;
use crate::Result;

/// Wrap the first `document_size` characters of the sample with `question`.
///
/// # Errors
///
/// Returns an error if the sample cannot be read or holds fewer than
/// `document_size` characters.
pub fn prepare_inputs(
    sample_file: &Path,
    question: &str,
    document_size: usize,
) -> Result<Vec<QaInput>> {
    let text = std::fs::read_to_string(sample_file)
        .wrap_err_with(|| format!("failed to read sample {}", sample_file.display()))?;

    let context: String = text.chars().take(document_size).collect();
    let available = context.chars().count();
    if available != document_size {
        return Err(BenchError::SampleTooShort {
            path: sample_file.to_path_buf(),
            requested: document_size,
            available,
        }
        .into());
    }

    debug!(document_size, bytes = context.len(), "sample prepared");
    Ok(vec![QaInput {
        questions: vec![question.to_string()],
        context,
    }])
}

/// Read the first `limit` questions, one per line.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_questions(path: &Path, limit: usize) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read questions {}", path.display()))?;

    let questions: Vec<String> = content.lines().take(limit).map(str::to_string).collect();
    debug!(count = questions.len(), path = %path.display(), "questions loaded");
    Ok(questions)
}
