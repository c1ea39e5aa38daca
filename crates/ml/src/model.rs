//! `HuggingFace` model download/caching.

use eyre::WrapErr;
use qabench_core::Result;
use tracing::debug;

/// Files every question-answering model repo must provide.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const ONNX_MODEL_FILE: &str = "onnx/model.onnx";

/// Get a `HuggingFace` Hub repo handle for `model_name`.
///
/// # Errors
///
/// Returns an error if the `HuggingFace` API client cannot be built.
pub fn hf_repo(model_name: &str, token: Option<&str>) -> Result<hf_hub::api::sync::ApiRepo> {
    use hf_hub::api::sync::ApiBuilder;

    let mut builder = ApiBuilder::new();
    if let Some(token) = token {
        debug!("using HuggingFace token from config");
        builder = builder.with_token(Some(token.to_string()));
    } else {
        debug!("no HuggingFace token configured");
    }
    let api = builder
        .build()
        .wrap_err("failed to build HuggingFace API client")?;

    debug!(repo = model_name, "HuggingFace repo handle created");
    Ok(api.model(model_name.to_string()))
}

/// Download (or reuse the cached copy of) `file` from `repo`.
///
/// # Errors
///
/// Returns an error if the file cannot be fetched.
pub fn fetch(repo: &hf_hub::api::sync::ApiRepo, file: &str) -> Result<std::path::PathBuf> {
    repo.get(file)
        .map_err(|e| eyre::eyre!("{file} download failed: {e}"))
}
