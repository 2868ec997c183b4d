use std::path::PathBuf;

use crate::model::Position;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path}: required column `{column}` is missing")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("no round files (rodada-*.csv) found in {0}")]
    NoRoundFiles(PathBuf),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("invalid round range: {first} > {last}")]
    InvalidRoundRange { first: u32, last: u32 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error("candidate pool is empty")]
    EmptyPool,

    #[error("not enough {position} candidates: formation needs {required}, pool has {available}")]
    InsufficientCandidates {
        position: Position,
        required: usize,
        available: usize,
    },

    #[error("budget must be a positive finite amount, got {0}")]
    InvalidBudget(f64),
}
