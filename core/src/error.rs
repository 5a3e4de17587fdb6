use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdjustError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required column '{name}' not found in dataset")]
    MissingColumn { name: String },

    #[error("Dataset at '{path}' has no header row")]
    NoHeader { path: String },

    #[error("Dataset contains no rows")]
    EmptyFrame,

    #[error("Cannot compute ZIP band cut points: {reason}")]
    DegenerateQuantiles { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AdjustResult<T> = Result<T, AdjustError>;
