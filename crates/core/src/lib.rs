//! Component timing benchmark for question-answering inference.
//!
//! Expands a parameter grid, runs every combination twice against an
//! [`InferenceEngine`] (dummy and real prediction head) and reports the
//! preprocessing / language model / prediction head split per combination.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grid;
pub mod report;
pub mod sample;
pub mod timing;
pub mod trial;

pub use config::{BenchConfig, BenchGrid};
pub use driver::run_benchmark;
pub use engine::{EngineConfig, HeadMode, InferenceEngine, InferenceOutput, Prediction, QaInput};
pub use error::{BenchError, Result};
pub use grid::{Combination, ParamGrid, ParamValue};
pub use timing::{TimingBreakdown, TimingPair};
pub use trial::{run_trial, TrialOutcome, TrialParams, TrialResult};
