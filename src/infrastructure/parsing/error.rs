//! Parsing error types
//!
//! Extraction itself never fails: a bad listing lands in the failure log.
//! These errors cover building the parser from its selector configuration.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid link pattern: {pattern} - {reason}")]
    InvalidLinkPattern { pattern: String, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;
