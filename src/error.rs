use std::io;

use thiserror::Error;

use crate::geometry::ReplacementKind;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("malformed address '{address}' on trace line {line}")]
    MalformedAddress { address: String, line: usize },

    #[error("trace line {line}: {reason}")]
    TraceFormat { line: usize, reason: String },

    #[error("{} replacement is not implemented, try RR or RND instead", .0.pretty_name())]
    UnsupportedPolicy(ReplacementKind),

    #[error(transparent)]
    Io(#[from] io::Error),
}
