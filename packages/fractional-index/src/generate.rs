//! # Key Generation
//!
//! Produces keys strictly between two neighbours. Generation is pure and
//! has no jitter: the same bounds always yield the same key, so replicas
//! repairing the same sequence converge on the same keys.

use crate::error::{OrderKeyError, OrderKeyResult};
use crate::key::{
    checked_digit, digit_char, integer_part, validate_integer, validate_key, OrderKey, BASE,
    INTEGER_ZERO, SMALLEST_INTEGER,
};

/// Key strictly between `low` and `high`, where `None` is unbounded.
///
/// # Panics
///
/// Panics when `low >= high` or when either bound is malformed. Use
/// [`try_key_between`] when the bounds are not known to be valid.
pub fn key_between(low: Option<&OrderKey>, high: Option<&OrderKey>) -> OrderKey {
    match try_key_between(low, high) {
        Ok(key) => key,
        Err(err) => panic!("invalid order key bounds: {err}"),
    }
}

/// `n` ascending keys strictly between `low` and `high`.
///
/// # Panics
///
/// Same contract as [`key_between`].
pub fn n_keys_between(low: Option<&OrderKey>, high: Option<&OrderKey>, n: usize) -> Vec<OrderKey> {
    match try_n_keys_between(low, high, n) {
        Ok(keys) => keys,
        Err(err) => panic!("invalid order key bounds: {err}"),
    }
}

/// Checked variant of [`key_between`]
pub fn try_key_between(low: Option<&OrderKey>, high: Option<&OrderKey>) -> OrderKeyResult<OrderKey> {
    let low = low.map(OrderKey::as_str);
    let high = high.map(OrderKey::as_str);

    if let Some(low) = low {
        validate_key(low)?;
    }
    if let Some(high) = high {
        validate_key(high)?;
    }

    let key = match (low, high) {
        (None, None) => INTEGER_ZERO.to_string(),
        (None, Some(high)) => {
            let integer = integer_part(high)?;
            let fraction = &high[integer.len()..];
            if integer == SMALLEST_INTEGER {
                format!("{integer}{}", midpoint("", Some(fraction))?)
            } else if integer < high {
                integer.to_string()
            } else {
                decrement_integer(integer)?
                    .ok_or_else(|| OrderKeyError::Exhausted(high.to_string()))?
            }
        }
        (Some(low), None) => {
            let integer = integer_part(low)?;
            let fraction = &low[integer.len()..];
            match increment_integer(integer)? {
                Some(next) => next,
                None => format!("{integer}{}", midpoint(fraction, None)?),
            }
        }
        (Some(low), Some(high)) => {
            if low >= high {
                return Err(OrderKeyError::OutOfOrder {
                    low: low.to_string(),
                    high: high.to_string(),
                });
            }
            let low_integer = integer_part(low)?;
            let low_fraction = &low[low_integer.len()..];
            let high_integer = integer_part(high)?;
            let high_fraction = &high[high_integer.len()..];

            if low_integer == high_integer {
                format!("{low_integer}{}", midpoint(low_fraction, Some(high_fraction))?)
            } else {
                let next = increment_integer(low_integer)?
                    .ok_or_else(|| OrderKeyError::Exhausted(low.to_string()))?;
                if next.as_str() < high {
                    next
                } else {
                    format!("{low_integer}{}", midpoint(low_fraction, None)?)
                }
            }
        }
    };

    Ok(OrderKey::from_generated(key))
}

/// Checked variant of [`n_keys_between`]
///
/// With both bounds present the gap is bisected recursively, which keeps
/// the generated keys short.
pub fn try_n_keys_between(
    low: Option<&OrderKey>,
    high: Option<&OrderKey>,
    n: usize,
) -> OrderKeyResult<Vec<OrderKey>> {
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![try_key_between(low, high)?]),
        _ => {}
    }

    match (low, high) {
        (_, None) => {
            let mut keys = Vec::with_capacity(n);
            let mut current = try_key_between(low, None)?;
            keys.push(current.clone());
            for _ in 1..n {
                current = try_key_between(Some(&current), None)?;
                keys.push(current.clone());
            }
            Ok(keys)
        }
        (None, Some(high)) => {
            let mut keys = Vec::with_capacity(n);
            let mut current = try_key_between(None, Some(high))?;
            keys.push(current.clone());
            for _ in 1..n {
                current = try_key_between(None, Some(&current))?;
                keys.push(current.clone());
            }
            keys.reverse();
            Ok(keys)
        }
        (Some(_), Some(_)) => {
            let half = n / 2;
            let middle = try_key_between(low, high)?;
            let mut keys = try_n_keys_between(low, Some(&middle), half)?;
            keys.push(middle.clone());
            keys.extend(try_n_keys_between(Some(&middle), high, n - half - 1)?);
            Ok(keys)
        }
    }
}

/// Fraction strictly between fractions `low` and `high` (`None` = 1)
fn midpoint(low: &str, high: Option<&str>) -> OrderKeyResult<String> {
    if let Some(high) = high {
        if low >= high {
            return Err(OrderKeyError::OutOfOrder {
                low: low.to_string(),
                high: high.to_string(),
            });
        }
    }
    if low.ends_with('0') {
        return Err(OrderKeyError::TrailingZero(low.to_string()));
    }
    if let Some(high) = high.filter(|high| high.ends_with('0')) {
        return Err(OrderKeyError::TrailingZero(high.to_string()));
    }

    if let Some(high) = high {
        // Shared prefix, padding `low` with zeros
        let (low_bytes, high_bytes) = (low.as_bytes(), high.as_bytes());
        let mut shared = 0;
        while shared < high_bytes.len()
            && low_bytes.get(shared).copied().unwrap_or(b'0') == high_bytes[shared]
        {
            shared += 1;
        }
        if shared > 0 {
            let rest = midpoint(low.get(shared..).unwrap_or(""), Some(&high[shared..]))?;
            return Ok(format!("{}{rest}", &high[..shared]));
        }
    }

    let low_digit = match low.as_bytes().first() {
        Some(&byte) => checked_digit(byte, low)?,
        None => 0,
    };
    let high_digit = match high.and_then(|high| high.as_bytes().first().map(|b| (*b, high))) {
        Some((byte, high)) => checked_digit(byte, high)?,
        None => BASE,
    };

    if high_digit - low_digit > 1 {
        let middle = (low_digit + high_digit + 1) / 2;
        return Ok((digit_char(middle) as char).to_string());
    }

    if let Some(high) = high.filter(|high| high.len() > 1) {
        return Ok(high[..1].to_string());
    }

    let rest = midpoint(low.get(1..).unwrap_or(""), None)?;
    Ok(format!("{}{rest}", digit_char(low_digit) as char))
}

fn increment_integer(integer: &str) -> OrderKeyResult<Option<String>> {
    validate_integer(integer)?;
    let bytes = integer.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();

    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        let value = checked_digit(*digit, integer)? + 1;
        if value == BASE {
            *digit = b'0';
        } else {
            *digit = digit_char(value);
            carry = false;
            break;
        }
    }

    if !carry {
        return Ok(Some(assemble(head, &digits)));
    }
    match head {
        b'Z' => Ok(Some(INTEGER_ZERO.to_string())),
        b'z' => Ok(None),
        _ => {
            let next_head = head + 1;
            if next_head > b'a' {
                digits.push(b'0');
            } else {
                digits.pop();
            }
            Ok(Some(assemble(next_head, &digits)))
        }
    }
}

fn decrement_integer(integer: &str) -> OrderKeyResult<Option<String>> {
    validate_integer(integer)?;
    let bytes = integer.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();

    let mut borrow = true;
    for digit in digits.iter_mut().rev() {
        let value = checked_digit(*digit, integer)?;
        if value == 0 {
            *digit = b'z';
        } else {
            *digit = digit_char(value - 1);
            borrow = false;
            break;
        }
    }

    if !borrow {
        return Ok(Some(assemble(head, &digits)));
    }
    match head {
        b'a' => Ok(Some("Zz".to_string())),
        b'A' => Ok(None),
        _ => {
            let next_head = head - 1;
            if next_head < b'Z' {
                digits.push(b'z');
            } else {
                digits.pop();
            }
            Ok(Some(assemble(next_head, &digits)))
        }
    }
}

fn assemble(head: u8, digits: &[u8]) -> String {
    let mut integer = String::with_capacity(digits.len() + 1);
    integer.push(head as char);
    integer.extend(digits.iter().map(|&digit| digit as char));
    integer
}
