//! Question-answering inference on ONNX Runtime.
//!
//! [`OnnxQaEngine`] loads a `HuggingFace` QA model exported to ONNX, splits
//! long contexts into overlapping windows, runs them in batches and decodes
//! answer spans. Preprocessing and model time are tracked separately so a
//! dummy-head run can be told apart from a real-head run.

pub mod benchmarker;
pub mod features;
pub mod head;
pub mod model;

use std::path::Path;
use std::time::Instant;

use benchmarker::Benchmarker;
use features::Window;
use head::Span;
use ort::session::builder::SessionBuilder;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use qabench_core::engine::TASK_QUESTION_ANSWERING;
use qabench_core::{EngineConfig, InferenceEngine, InferenceOutput, Prediction, QaInput, Result};
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument};

/// Engine that loads a fresh model from the `HuggingFace` Hub on every run.
#[derive(Debug, Clone, Default)]
pub struct OnnxQaEngine {
    hf_token: Option<String>,
}

impl OnnxQaEngine {
    #[must_use]
    pub const fn new(hf_token: Option<String>) -> Self {
        Self { hf_token }
    }
}

impl InferenceEngine for OnnxQaEngine {
    #[instrument(skip(self, inputs), fields(model = %config.model_name, head = config.head.as_str()))]
    fn run(&self, config: &EngineConfig, inputs: &[QaInput]) -> Result<InferenceOutput> {
        let mut session = QaSession::load(config, self.hf_token.as_deref())?;
        let predictions = session.infer(inputs)?;
        let timing = session.benchmarker.summary();
        debug!(
            preprocessing = timing.preprocessing,
            model = timing.model,
            "inference complete"
        );
        Ok(InferenceOutput {
            predictions,
            timing,
        })
    }
}

struct QaSession {
    session: Session,
    tokenizer: Tokenizer,
    pad_id: u32,
    wants_type_ids: bool,
    config: EngineConfig,
    benchmarker: Benchmarker,
}

impl QaSession {
    fn load(config: &EngineConfig, hf_token: Option<&str>) -> Result<Self> {
        if config.task_type != TASK_QUESTION_ANSWERING {
            eyre::bail!("unsupported task type `{}`", config.task_type);
        }
        if config.batch_size == 0 || config.max_seq_len == 0 {
            eyre::bail!(
                "batch_size ({}) and max_seq_len ({}) must be positive",
                config.batch_size,
                config.max_seq_len
            );
        }

        let repo = model::hf_repo(&config.model_name, hf_token)?;
        let tokenizer_path = model::fetch(&repo, model::TOKENIZER_FILE)?;
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| eyre::eyre!(e))?;
        let pad_id = features::configure(&mut tokenizer, config.max_seq_len, config.doc_stride)?;
        debug!("tokenizer loaded");

        let model_path = model::fetch(&repo, model::ONNX_MODEL_FILE)?;
        let session = build_session(&model_path, config)?;
        let wants_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");
        info!(
            model = %config.model_name,
            gpu = config.gpu,
            wants_type_ids,
            "QA session initialized"
        );

        Ok(Self {
            session,
            tokenizer,
            pad_id,
            wants_type_ids,
            config: config.clone(),
            benchmarker: Benchmarker::new(config.benchmarking),
        })
    }

    fn infer(&mut self, inputs: &[QaInput]) -> Result<Vec<Prediction>> {
        let started = Instant::now();
        let pairs: Vec<(&str, &str)> = inputs
            .iter()
            .flat_map(|input| {
                input
                    .questions
                    .iter()
                    .map(|q| (q.as_str(), input.context.as_str()))
            })
            .collect();
        let windows =
            features::windows(&self.tokenizer, &pairs, self.config.max_seq_len, self.pad_id)?;
        self.benchmarker.record_preprocessing(started.elapsed());
        debug!(pairs = pairs.len(), windows = windows.len(), "inputs featurized");

        let started = Instant::now();
        let seq = self.config.max_seq_len;
        let mut best: Vec<Option<(Span, &Window)>> = vec![None; pairs.len()];
        for batch in windows.chunks(self.config.batch_size) {
            let (start_logits, end_logits) = self.forward(batch)?;
            if self.config.head.is_dummy() {
                continue;
            }
            for (row, window) in batch.iter().enumerate() {
                let cells = row * seq..(row + 1) * seq;
                let Some(span) = head::best_span(
                    &start_logits[cells.clone()],
                    &end_logits[cells],
                    &window.sequence_ids,
                ) else {
                    continue;
                };
                let slot = &mut best[window.pair];
                if slot.is_none_or(|(b, _)| span.score > b.score) {
                    *slot = Some((span, window));
                }
            }
        }

        let predictions = if self.config.head.is_dummy() {
            Vec::new()
        } else {
            pairs
                .iter()
                .zip(best)
                .map(|(&(question, context), best)| prediction(question, context, best))
                .collect()
        };
        self.benchmarker.record_model(started.elapsed());
        Ok(predictions)
    }

    /// Run one batch; returns flattened `[batch, seq]` start and end logits.
    fn forward(&mut self, batch: &[Window]) -> Result<(Vec<f32>, Vec<f32>)> {
        let seq = self.config.max_seq_len;
        let shape = vec![i64::try_from(batch.len())?, i64::try_from(seq)?];

        let ids = Tensor::from_array((shape.clone(), features::stack(batch, |w| w.ids.as_slice())))?;
        let mask = Tensor::from_array((
            shape.clone(),
            features::stack(batch, |w| w.attention_mask.as_slice()),
        ))?;
        let mut inputs: Vec<(&str, SessionInputValue<'_>)> =
            vec![("input_ids", ids.into()), ("attention_mask", mask.into())];
        if self.wants_type_ids {
            let type_ids =
                Tensor::from_array((shape, features::stack(batch, |w| w.type_ids.as_slice())))?;
            inputs.push(("token_type_ids", type_ids.into()));
        }

        let outputs = self.session.run(inputs)?;
        let extract = |name: &str| -> Result<Vec<f32>> {
            let value = outputs
                .get(name)
                .ok_or_else(|| eyre::eyre!("model has no `{name}` output"))?;
            let array = value.try_extract_array::<f32>()?;
            let slice = array
                .as_slice()
                .ok_or_else(|| eyre::eyre!("`{name}` is not contiguous"))?;
            if slice.len() != batch.len() * seq {
                eyre::bail!(
                    "`{name}` has {} values, expected {}",
                    slice.len(),
                    batch.len() * seq
                );
            }
            Ok(slice.to_vec())
        };

        let start = extract("start_logits")?;
        let end = extract("end_logits")?;
        Ok((start, end))
    }
}

fn prediction(question: &str, context: &str, best: Option<(Span, &Window)>) -> Prediction {
    let found = best.and_then(|(span, window)| {
        head::answer(context, &window.offsets, &span).map(|answer| (span.score, answer))
    });
    match found {
        Some((score, (start, end, text))) => Prediction {
            question: question.to_string(),
            answer: text.to_string(),
            score,
            start,
            end,
        },
        None => Prediction {
            question: question.to_string(),
            answer: String::new(),
            score: f32::NEG_INFINITY,
            start: 0,
            end: 0,
        },
    }
}

fn build_session(model_path: &Path, config: &EngineConfig) -> Result<Session> {
    let builder = Session::builder()
        .map_err(|e| eyre::eyre!("failed to create ONNX session builder: {e}"))?
        .with_intra_threads(config.num_processes.max(1))
        .map_err(|e| eyre::eyre!("failed to configure ONNX session: {e}"))?;
    let builder = if config.gpu {
        with_gpu(builder)?
    } else {
        builder
    };
    builder
        .commit_from_file(model_path)
        .map_err(|e| eyre::eyre!("failed to load {}: {e}", model_path.display()))
}

#[cfg(feature = "cuda")]
fn with_gpu(builder: SessionBuilder) -> Result<SessionBuilder> {
    builder
        .with_execution_providers([
            ort::execution_providers::CUDAExecutionProvider::default()
                .build()
                .error_on_failure(),
        ])
        .map_err(|e| eyre::eyre!("CUDA execution provider unavailable: {e}"))
}

#[cfg(not(feature = "cuda"))]
fn with_gpu(_builder: SessionBuilder) -> Result<SessionBuilder> {
    Err(eyre::eyre!(
        "gpu requested but CUDA support not compiled in (enable 'cuda' feature)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Window {
        Window {
            pair: 0,
            ids: vec![0; 4],
            attention_mask: vec![1; 4],
            type_ids: vec![0; 4],
            sequence_ids: vec![None, Some(0), Some(1), Some(1)],
            offsets: vec![(0, 0), (0, 4), (0, 5), (6, 11)],
        }
    }

    #[test]
    fn prediction_from_best_span() {
        let w = window();
        let span = Span {
            start_token: 2,
            end_token: 3,
            score: 4.5,
        };
        let p = prediction("Who?", "hello world", Some((span, &w)));
        assert_eq!(p.answer, "hello world");
        assert_eq!((p.start, p.end), (0, 11));
        assert!((p.score - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn prediction_without_span_is_empty() {
        let p = prediction("Who?", "hello world", None);
        assert!(p.answer.is_empty());
        assert_eq!(p.question, "Who?");
    }

    fn config() -> EngineConfig {
        EngineConfig {
            model_name: "deepset/minilm-uncased-squad2".to_string(),
            batch_size: 1,
            gpu: false,
            task_type: TASK_QUESTION_ANSWERING.to_string(),
            max_seq_len: 384,
            num_processes: 1,
            doc_stride: 128,
            head: qabench_core::HeadMode::Real,
            benchmarking: true,
        }
    }

    #[test]
    fn rejects_other_task_types() {
        let config = EngineConfig {
            task_type: "text_classification".to_string(),
            ..config()
        };
        let err = OnnxQaEngine::default().run(&config, &[]).unwrap_err();
        assert!(err.to_string().contains("unsupported task type"));
    }

    #[test]
    fn rejects_zero_batch_size_before_download() {
        let config = EngineConfig {
            batch_size: 0,
            ..config()
        };
        let err = OnnxQaEngine::default().run(&config, &[]).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }
}
