//! Error types for ChangeLens

use thiserror::Error;

/// Main error type for ChangeLens operations.
///
/// All variants are fatal for the enclosing pipeline run except where a
/// caller explicitly documents a recovery (the area aggregator treats
/// `NoValidData` as "no significant area").
#[derive(Error, Debug)]
pub enum Error {
    #[error("required band '{band}' is missing during {stage}")]
    MissingBand { band: String, stage: &'static str },

    #[error("degenerate value range for band '{band}': min == max == {value}")]
    DegenerateRange { band: String, value: f64 },

    #[error("grid mismatch between '{left}' and '{right}': {detail}")]
    GridMismatch {
        left: String,
        right: String,
        detail: String,
    },

    #[error("resolution budget exceeded: region covers {required} pixels at this scale, budget is {budget}")]
    ResolutionBudgetExceeded { required: u64, budget: u64 },

    #[error("no valid data for band '{band}' within the region")]
    NoValidData { band: String },

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ChangeLens operations
pub type Result<T> = std::result::Result<T, Error>;
