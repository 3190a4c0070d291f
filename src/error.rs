//! Typed precondition failures
//!
//! Library functions return `anyhow::Result`; these variants travel inside it
//! so callers can `downcast_ref::<PipelineError>()` when they need to react
//! to a specific failure.

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{context}: missing required columns {missing:?}")]
    MissingColumns {
        context: String,
        missing: Vec<String>,
    },

    #[error("row {row}: missing identity value in column '{column}'")]
    MissingIdentity { row: usize, column: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
}
