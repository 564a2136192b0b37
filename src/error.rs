use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: missing column {column:?}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path}: table has no rows")]
    EmptyTable { path: PathBuf },
    #[error("{observations} observations cannot identify {parameters} parameters")]
    InsufficientObservations {
        observations: usize,
        parameters: usize,
    },
    #[error("design matrix is rank deficient: {term:?} is collinear with earlier terms")]
    RankDeficient { term: String },
    #[error("response {response:?} is constant; R-squared is undefined")]
    ConstantResponse { response: String },
    #[error("{player}: {attempts} pass attempts, per-attempt rates are undefined")]
    ZeroAttempts { player: String, attempts: i32 },
    #[error("no rows for team {team:?}")]
    UnknownTeam { team: String },
    #[error("design term {actual:?} does not match fitted term {expected:?}")]
    TermMismatch { expected: String, actual: String },
    #[error("column {column:?} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}
