use std::path::PathBuf;

pub type Result<T> = eyre::Result<T>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("sample {} holds {available} characters, {requested} requested", .path.display())]
    SampleTooShort {
        path: PathBuf,
        requested: usize,
        available: usize,
    },
    #[error("parameter `{name}` = {value} is not {expected}")]
    InvalidParam {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("parameter `{0}` missing from combination")]
    MissingParam(String),
}
