use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ParserAttempt {
    pub parser: String,
    pub message: String,
}

impl ParserAttempt {
    pub fn new(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParserAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parser, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} format mismatch: {reason}")]
    FormatMismatch { parser: String, reason: String },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: String,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} schema invalid: {message}")]
    InvalidSchema { parser: String, message: String },

    #[error("{parser} validation error: {message}")]
    Validation { parser: String, message: String },

    #[error("{parser} file did not contain any data rows")]
    EmptyData { parser: String },

    #[error("no source layout recognized this file; attempts: {attempts:?}")]
    NoMatchingParser { attempts: Vec<ParserAttempt> },
}
