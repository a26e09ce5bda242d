//! Error types for Verity

use crate::logic::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerityError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action '{action}' is missing required argument '{parameter}'")]
    MissingArgument { action: String, parameter: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VerityError>;
