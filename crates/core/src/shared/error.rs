use std::fmt::Display;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("cannot open source {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },
    #[error("failed to decode frame {index}: {reason}")]
    DecodeFailure { index: usize, reason: String },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("display sink failed: {0}")]
    SinkFailure(String),
}

impl ProcessingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ProcessingError::InvalidParameter(message.into())
    }

    pub fn source_unavailable(location: impl Display, reason: impl ToString) -> Self {
        ProcessingError::SourceUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn sink(reason: impl ToString) -> Self {
        ProcessingError::SinkFailure(reason.to_string())
    }
}
