//! Error types for order key generation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    #[error("Order key is empty")]
    Empty,

    #[error("Invalid integer head '{0}'")]
    InvalidHead(char),

    #[error("Integer part of '{0}' does not match its head")]
    InvalidLength(String),

    #[error("Invalid digit '{digit}' in order key '{key}'")]
    InvalidDigit { key: String, digit: char },

    #[error("Fractional part of '{0}' ends with a zero")]
    TrailingZero(String),

    #[error("Order key '{0}' is reserved")]
    ReservedKey(String),

    #[error("Lower bound '{low}' is not below upper bound '{high}'")]
    OutOfOrder { low: String, high: String },

    #[error("No order key exists beyond '{0}'")]
    Exhausted(String),

    #[error("Order keys are not strictly increasing at position {0}")]
    Unordered(usize),
}

pub type OrderKeyResult<T> = Result<T, OrderKeyError>;
