//! Error type shared by all alignment entry points.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The model parameter object failed validation.
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),
    /// A sequence contained a byte that is not a nucleotide or gap.
    #[error("unrecognized nucleotide, ascii {0}")]
    InvalidSequence(u8),
    /// An aligned input did not have the shape of an alignment.
    #[error("invalid alignment: {0}")]
    InvalidAlignment(String),
    /// Two expressions could not be separated within the precision cap.
    #[error("tenacious strict comparison failed")]
    ComparisonExhausted,
    /// The escalation driver ran out of precision levels before the
    /// symbolic verification succeeded.
    #[error("precision escalation exhausted without an optimality certificate")]
    EscalationExhausted,
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type with this crate's [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;
