//! One parameter combination, measured with and without the prediction head.

use std::path::PathBuf;

use eyre::WrapErr;
use tracing::{debug, instrument, warn};

use crate::config::param;
use crate::engine::{EngineConfig, HeadMode, InferenceEngine, TASK_QUESTION_ANSWERING};
use crate::error::BenchError;
use crate::grid::{Combination, ParamValue};
use crate::sample;
use crate::timing::TimingBreakdown;

/// Typed view of one grid combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialParams {
    pub model_name: String,
    pub batch_size: usize,
    pub document_size: usize,
    pub max_seq_len: usize,
    pub doc_stride: usize,
    pub gpu: bool,
    pub question: String,
}

impl TrialParams {
    /// Range checks that fail the trial rather than the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` or `max_seq_len` is zero.
    pub fn validate(&self) -> Result<(), BenchError> {
        for (name, n) in [
            (param::BATCH_SIZE, self.batch_size),
            (param::MAX_SEQ_LEN, self.max_seq_len),
        ] {
            if n == 0 {
                return Err(invalid(name, &ParamValue::from(n), "a positive integer"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn engine_config(&self, head: HeadMode, num_processes: usize) -> EngineConfig {
        EngineConfig {
            model_name: self.model_name.clone(),
            batch_size: self.batch_size,
            gpu: self.gpu,
            task_type: TASK_QUESTION_ANSWERING.to_string(),
            max_seq_len: self.max_seq_len,
            num_processes,
            doc_stride: self.doc_stride,
            head,
            benchmarking: true,
        }
    }
}

fn lookup<'a>(combination: &'a Combination, name: &str) -> Result<&'a ParamValue, BenchError> {
    combination
        .get(name)
        .ok_or_else(|| BenchError::MissingParam(name.to_string()))
}

fn invalid(name: &str, value: &ParamValue, expected: &'static str) -> BenchError {
    BenchError::InvalidParam {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn string_param(combination: &Combination, name: &str) -> Result<String, BenchError> {
    let value = lookup(combination, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, value, "a string"))
}

fn count_param(combination: &Combination, name: &str) -> Result<usize, BenchError> {
    let value = lookup(combination, name)?;
    value
        .as_usize()
        .ok_or_else(|| invalid(name, value, "a non-negative integer"))
}

fn bool_param(combination: &Combination, name: &str) -> Result<bool, BenchError> {
    let value = lookup(combination, name)?;
    value.as_bool().ok_or_else(|| invalid(name, value, "a boolean"))
}

impl TryFrom<&Combination> for TrialParams {
    type Error = BenchError;

    fn try_from(combination: &Combination) -> Result<Self, Self::Error> {
        Ok(Self {
            model_name: string_param(combination, param::MODEL_NAME)?,
            batch_size: count_param(combination, param::BATCH_SIZE)?,
            document_size: count_param(combination, param::DOCUMENT_SIZE)?,
            max_seq_len: count_param(combination, param::MAX_SEQ_LEN)?,
            doc_stride: count_param(combination, param::DOC_STRIDE)?,
            gpu: bool_param(combination, param::GPU)?,
            question: string_param(combination, param::QUESTION)?,
        })
    }
}

/// Settings shared by every trial of a batch.
#[derive(Debug, Clone)]
pub struct TrialSettings {
    pub sample_file: PathBuf,
    pub num_processes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Completed(TimingBreakdown),
    Failed { error: String },
}

impl TrialOutcome {
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub const fn timing(&self) -> Option<&TimingBreakdown> {
        match self {
            Self::Completed(timing) => Some(timing),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub params: TrialParams,
    pub num_processes: usize,
    pub sample_file: PathBuf,
    pub outcome: TrialOutcome,
}

/// Run the dummy-head and real-head passes for one combination.
///
/// Never fails: any error from sample preparation, engine load or inference
/// becomes a [`TrialOutcome::Failed`].
#[instrument(skip_all, fields(model = %params.model_name, batch_size = params.batch_size, document_size = params.document_size))]
pub fn run_trial(
    engine: &dyn InferenceEngine,
    params: &TrialParams,
    settings: &TrialSettings,
) -> TrialResult {
    let outcome = match measure(engine, params, settings) {
        Ok(timing) => {
            debug!(total = timing.total, "trial complete");
            TrialOutcome::Completed(timing)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "trial failed");
            TrialOutcome::Failed {
                error: format!("{e:#}"),
            }
        }
    };

    TrialResult {
        params: params.clone(),
        num_processes: settings.num_processes,
        sample_file: settings.sample_file.clone(),
        outcome,
    }
}

fn measure(
    engine: &dyn InferenceEngine,
    params: &TrialParams,
    settings: &TrialSettings,
) -> crate::Result<TimingBreakdown> {
    params.validate()?;
    let inputs = sample::prepare_inputs(
        &settings.sample_file,
        &params.question,
        params.document_size,
    )?;

    let run = |head: HeadMode| {
        let config = params.engine_config(head, settings.num_processes);
        engine
            .run(&config, &inputs)
            .map(|output| output.timing)
            .wrap_err_with(|| format!("{} prediction head run", head.as_str()))
    };

    let dummy = run(HeadMode::Dummy)?;
    let real = run(HeadMode::Real)?;
    Ok(TimingBreakdown::analyse(dummy, real))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InferenceOutput, QaInput};
    use crate::grid::ParamGrid;
    use crate::timing::TimingPair;
    use std::cell::RefCell;
    use std::io::Write;

    /// Records every load; fails on the given call index.
    struct ScriptedEngine {
        fail_on: Option<usize>,
        calls: RefCell<Vec<EngineConfig>>,
    }

    impl ScriptedEngine {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                fail_on,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl InferenceEngine for ScriptedEngine {
        fn run(&self, config: &EngineConfig, inputs: &[QaInput]) -> crate::Result<InferenceOutput> {
            let mut calls = self.calls.borrow_mut();
            let index = calls.len();
            calls.push(config.clone());
            assert_eq!(inputs.len(), 1);
            if self.fail_on == Some(index) {
                eyre::bail!("CUDA out of memory");
            }
            let timing = match config.head {
                HeadMode::Dummy => TimingPair::new(1.0, 2.0),
                HeadMode::Real => TimingPair::new(1.2, 5.0),
            };
            Ok(InferenceOutput {
                predictions: Vec::new(),
                timing,
            })
        }
    }

    fn params(document_size: usize) -> TrialParams {
        TrialParams {
            model_name: "deepset/minilm-uncased-squad2".to_string(),
            batch_size: 16,
            document_size,
            max_seq_len: 384,
            doc_stride: 128,
            gpu: false,
            question: "Who?".to_string(),
        }
    }

    fn settings(file: &tempfile::NamedTempFile) -> TrialSettings {
        TrialSettings {
            sample_file: file.path().to_path_buf(),
            num_processes: 1,
        }
    }

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("lorem ipsum ".repeat(20).as_bytes()).unwrap();
        file
    }

    #[test]
    fn runs_dummy_then_real_head() {
        let file = sample_file();
        let engine = ScriptedEngine::new(None);
        let result = run_trial(&engine, &params(100), &settings(&file));

        let timing = result.outcome.timing().unwrap();
        assert!((timing.total - 6.2).abs() < 1e-9);

        let calls = engine.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].head, HeadMode::Dummy);
        assert_eq!(calls[1].head, HeadMode::Real);
        for call in calls.iter() {
            assert!(call.benchmarking);
            assert_eq!(call.task_type, TASK_QUESTION_ANSWERING);
            assert_eq!(call.batch_size, 16);
            assert_eq!(call.doc_stride, 128);
        }
    }

    #[test]
    fn real_head_failure_marks_trial_failed() {
        let file = sample_file();
        let engine = ScriptedEngine::new(Some(1));
        let result = run_trial(&engine, &params(100), &settings(&file));

        match &result.outcome {
            TrialOutcome::Failed { error } => {
                assert!(error.contains("CUDA out of memory"));
                assert!(error.contains("real"));
            }
            TrialOutcome::Completed(_) => panic!("expected failure"),
        }
        assert_eq!(engine.calls.borrow().len(), 2);
    }

    #[test]
    fn dummy_failure_skips_real_run() {
        let file = sample_file();
        let engine = ScriptedEngine::new(Some(0));
        let result = run_trial(&engine, &params(100), &settings(&file));
        assert!(result.outcome.is_failed());
        assert_eq!(engine.calls.borrow().len(), 1);
    }

    #[test]
    fn short_sample_fails_before_loading() {
        let file = sample_file();
        let engine = ScriptedEngine::new(None);
        let result = run_trial(&engine, &params(1_000_000), &settings(&file));
        match &result.outcome {
            TrialOutcome::Failed { error } => assert!(error.contains("1000000 requested")),
            TrialOutcome::Completed(_) => panic!("expected failure"),
        }
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn params_from_combination() {
        let grid = ParamGrid::new()
            .with(param::MODEL_NAME, ["m"])
            .with(param::BATCH_SIZE, [8usize])
            .with(param::DOCUMENT_SIZE, [10usize])
            .with(param::MAX_SEQ_LEN, [256usize])
            .with(param::DOC_STRIDE, [64usize])
            .with(param::GPU, [true])
            .with(param::QUESTION, ["Why?"]);
        let combination = &grid.combinations()[0];
        let params = TrialParams::try_from(combination).unwrap();
        assert_eq!(params.model_name, "m");
        assert_eq!(params.batch_size, 8);
        assert!(params.gpu);
        assert_eq!(params.question, "Why?");
    }

    #[test]
    fn zero_batch_size_fails_trial_without_loading() {
        let file = sample_file();
        let engine = ScriptedEngine::new(None);
        let mut zero = params(100);
        zero.batch_size = 0;
        let result = run_trial(&engine, &zero, &settings(&file));
        match &result.outcome {
            TrialOutcome::Failed { error } => assert!(error.contains("batch_size")),
            TrialOutcome::Completed(_) => panic!("expected failure"),
        }
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn params_reject_bad_values() {
        let grid = ParamGrid::new()
            .with(param::MODEL_NAME, ["m"])
            .with(param::BATCH_SIZE, [true]);
        let err = TrialParams::try_from(&grid.combinations()[0]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidParam { .. }));

        let grid = ParamGrid::new().with(param::MODEL_NAME, ["m"]);
        let err = TrialParams::try_from(&grid.combinations()[0]).unwrap_err();
        assert!(matches!(err, BenchError::MissingParam(name) if name == param::BATCH_SIZE));
    }
}
