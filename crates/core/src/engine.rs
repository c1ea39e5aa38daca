//! Boundary to the inference engine being measured.
//!
//! An engine is a function of its configuration and its inputs: every call
//! to [`InferenceEngine::run`] loads a fresh instance, runs inference once and
//! reports the predictions together with the timings gathered since load.

use crate::timing::TimingPair;
use crate::Result;

pub const TASK_QUESTION_ANSWERING: &str = "question_answering";

/// Whether the prediction head does real work or is replaced by a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadMode {
    Dummy,
    Real,
}

impl HeadMode {
    #[must_use]
    pub const fn is_dummy(self) -> bool {
        matches!(self, Self::Dummy)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Real => "real",
        }
    }
}

/// Everything an engine load takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// `HuggingFace` repo ID (e.g. `"deepset/roberta-base-squad2"`).
    pub model_name: String,
    pub batch_size: usize,
    pub gpu: bool,
    pub task_type: String,
    pub max_seq_len: usize,
    pub num_processes: usize,
    pub doc_stride: usize,
    pub head: HeadMode,
    /// Expose preprocessing/model timings in [`InferenceOutput::timing`].
    pub benchmarking: bool,
}

/// One input unit: questions asked against a shared context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaInput {
    pub questions: Vec<String>,
    pub context: String,
}

/// Best answer span for one question. Offsets are byte offsets into the context.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub question: String,
    pub answer: String,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceOutput {
    pub predictions: Vec<Prediction>,
    pub timing: TimingPair,
}

pub trait InferenceEngine {
    /// Load an engine for `config` and run inference over `inputs`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the model or running inference fails.
    fn run(&self, config: &EngineConfig, inputs: &[QaInput]) -> Result<InferenceOutput>;
}
