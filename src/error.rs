// src/error.rs

use std::time::Duration;

use arrow::error::ArrowError;
use thiserror::Error;

/// Structural problems in a record's count line or header block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid count: {found:?} is not a positive integer")]
    InvalidCount { found: String },
    #[error("truncated header: expected {expected} variable names, found {found}")]
    TruncatedHeader { expected: usize, found: usize },
}

/// Problems turning the flat token payload into a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error(
        "token count is not a multiple of variable count: {tokens} tokens, {variables} variables"
    )]
    RaggedPayload { tokens: usize, variables: usize },
    #[error("non-numeric token {token:?} at position {index}")]
    NonNumericToken { token: String, index: usize },
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),
}

/// Reasons a persisted table cannot be put on a fixed-rate grid.
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("no column name contains {hint:?}")]
    MissingTimeColumn { hint: String },
    #[error("empty time grid: span [{t_min}, {t_max}] holds no step")]
    EmptyGrid { t_min: f64, t_max: f64 },
    #[error("time grid too large: span [{t_min}, {t_max}] needs more than {limit} points")]
    GridTooLarge { t_min: f64, t_max: f64, limit: usize },
    #[error("resampled table is malformed: {0}")]
    Shape(#[from] ShapeError),
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// A header variable with no entry in the name mapping. The original name is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no mapping for {name:?}")]
pub struct MappingMiss {
    pub name: String,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("input directory not found: {0}")]
    MissingInputDir(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{stage} stopped on {file}: {reason}")]
    Stopped {
        stage: String,
        file: String,
        reason: String,
    },
}

/// True for errors that make one file unusable without indicating anything wrong
/// with the environment: the batch records the file as skipped.
pub fn is_skippable(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<FormatError>()
            || cause.is::<ShapeError>()
            || matches!(
                cause.downcast_ref::<ResampleError>(),
                Some(
                    ResampleError::MissingTimeColumn { .. }
                        | ResampleError::EmptyGrid { .. }
                        | ResampleError::GridTooLarge { .. }
                )
            )
            || matches!(cause.downcast_ref::<BatchError>(), Some(BatchError::Timeout(_)))
    })
}
