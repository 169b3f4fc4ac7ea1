//! # Order Keys
//!
//! An order key is a base-62 string made of a variable-length integer part
//! followed by an optional fraction:
//!
//! ```text
//!   a0   a1 ... az   b00 ... bzz   c000 ...     (growing upwards)
//!   Zz   Zy ... Z0   Yzz ... Y00   Xzzz ...     (growing downwards)
//!
//!   a1V = integer "a1" + fraction "V"
//! ```
//!
//! The head character encodes the length of the integer part, so plain
//! byte-wise string comparison matches the intended order.

use crate::error::{OrderKeyError, OrderKeyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const DIGITS: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub(crate) const BASE: u8 = 62;

/// Integer part of the first key handed out for an empty sequence
pub(crate) const INTEGER_ZERO: &str = "a0";

/// Smallest integer part. Reserved so that a key below any valid key exists.
pub(crate) const SMALLEST_INTEGER: &str = "A00000000000000000000000000";

/// Position key compared lexicographically.
///
/// Deserialization is deliberately unchecked: sequences received from
/// storage or collaborators may carry malformed keys, which the enforcer
/// treats as invalid and rewrites.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Parse and validate a key
    pub fn parse(key: impl Into<String>) -> OrderKeyResult<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub(crate) fn from_generated(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the key follows the order key grammar
    pub fn is_well_formed(&self) -> bool {
        validate_key(&self.0).is_ok()
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderKey {
    type Err = OrderKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'a'..=b'z' => Some(byte - b'a' + 36),
        _ => None,
    }
}

pub(crate) fn digit_char(value: u8) -> u8 {
    DIGITS[value as usize]
}

/// Value of a digit at `byte`, reported against the key it came from
pub(crate) fn checked_digit(byte: u8, key: &str) -> OrderKeyResult<u8> {
    digit_value(byte).ok_or_else(|| OrderKeyError::InvalidDigit {
        key: key.to_string(),
        digit: byte as char,
    })
}

pub(crate) fn integer_length(head: u8) -> OrderKeyResult<usize> {
    match head {
        b'a'..=b'z' => Ok((head - b'a') as usize + 2),
        b'A'..=b'Z' => Ok((b'Z' - head) as usize + 2),
        _ => Err(OrderKeyError::InvalidHead(head as char)),
    }
}

/// Integer part of an ASCII key
pub(crate) fn integer_part(key: &str) -> OrderKeyResult<&str> {
    let head = *key.as_bytes().first().ok_or(OrderKeyError::Empty)?;
    let length = integer_length(head)?;
    if length > key.len() {
        return Err(OrderKeyError::InvalidLength(key.to_string()));
    }
    Ok(&key[..length])
}

pub(crate) fn validate_integer(integer: &str) -> OrderKeyResult<()> {
    let head = *integer.as_bytes().first().ok_or(OrderKeyError::Empty)?;
    if integer_length(head)? != integer.len() {
        return Err(OrderKeyError::InvalidLength(integer.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_key(key: &str) -> OrderKeyResult<()> {
    if key.is_empty() {
        return Err(OrderKeyError::Empty);
    }
    for byte in key.bytes() {
        checked_digit(byte, key)?;
    }
    if key == SMALLEST_INTEGER {
        return Err(OrderKeyError::ReservedKey(key.to_string()));
    }
    let integer = integer_part(key)?;
    if key[integer.len()..].ends_with('0') {
        return Err(OrderKeyError::TrailingZero(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_keys() {
        for key in ["a0", "a1V", "Zz", "b00", "Xzzz", "a0G"] {
            assert!(OrderKey::parse(key).is_ok(), "{key} should parse");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert_eq!(OrderKey::parse(""), Err(OrderKeyError::Empty));
        assert_eq!(OrderKey::parse("0"), Err(OrderKeyError::InvalidHead('0')));
        assert_eq!(
            OrderKey::parse("b0"),
            Err(OrderKeyError::InvalidLength("b0".to_string()))
        );
        assert_eq!(
            OrderKey::parse("a10"),
            Err(OrderKeyError::TrailingZero("a10".to_string()))
        );
        assert!(matches!(
            OrderKey::parse("a1-"),
            Err(OrderKeyError::InvalidDigit { digit: '-', .. })
        ));
        assert!(matches!(
            OrderKey::parse(SMALLEST_INTEGER),
            Err(OrderKeyError::ReservedKey(_))
        ));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let keys: Vec<OrderKey> = ["Zz", "a0", "a0V", "a1", "az", "b00"]
            .iter()
            .map(|k| OrderKey::parse(*k).unwrap())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_deserialize_keeps_malformed_keys() {
        let key: OrderKey = serde_json::from_str("\"a00\"").unwrap();
        assert_eq!(key.as_str(), "a00");
        assert!(!key.is_well_formed());
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a00\"");
    }
}
