//! Error types for the editor

use crate::validation::SceneViolation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Sequence has {} order key violation(s)", .violations.len())]
    InvalidOrderKeys { violations: Vec<SceneViolation> },

    #[error("Index {index} is out of bounds for {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;
