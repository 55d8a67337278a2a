//! Quota operations and their validation

use serde_json::Value;

use crate::domain::DomainError;

/// A validated mutation of a key's remaining counter. Values are never
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOperation {
    Increment(i64),
    Decrement(i64),
    Set(i64),
}

impl QuotaOperation {
    /// Validate a raw operation tag and value.
    ///
    /// Accepted tags are `increment`, `decrement` and `set`. The value must
    /// be a JSON integer in `0..=i64::MAX`; integral floats such as `10.0`
    /// are accepted.
    pub fn parse(op: &str, value: &Value) -> Result<Self, DomainError> {
        let constructor: fn(i64) -> Self = match op {
            "increment" => Self::Increment,
            "decrement" => Self::Decrement,
            "set" => Self::Set,
            other => {
                return Err(DomainError::validation(
                    "op",
                    format!(
                        "unknown operation '{}', expected one of: increment, decrement, set",
                        other
                    ),
                ));
            }
        };

        Ok(constructor(parse_value(value)?))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Increment(_) => "increment",
            Self::Decrement(_) => "decrement",
            Self::Set(_) => "set",
        }
    }

    pub fn value(&self) -> i64 {
        match self {
            Self::Increment(v) | Self::Decrement(v) | Self::Set(v) => *v,
        }
    }
}

impl std::fmt::Display for QuotaOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.value())
    }
}

fn parse_value(value: &Value) -> Result<i64, DomainError> {
    let invalid = || DomainError::validation("value", "must be a non-negative integer");

    let Value::Number(number) = value else {
        return Err(invalid());
    };

    if let Some(v) = number.as_i64() {
        return if v >= 0 { Ok(v) } else { Err(invalid()) };
    }

    if number.as_u64().is_some() {
        return Err(DomainError::validation(
            "value",
            format!("must not exceed {}", i64::MAX),
        ));
    }

    match number.as_f64() {
        Some(v) if v.fract() == 0.0 && v >= 0.0 && v < i64::MAX as f64 => Ok(v as i64),
        _ => Err(invalid()),
    }
}

/// Add `delta` to a finite counter, refusing to go below zero or overflow.
///
/// Storage adapters without a native guarded update use this inside their
/// critical section.
pub fn apply_delta(current: i64, delta: i64) -> Result<i64, DomainError> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| DomainError::validation("value", "remaining would overflow"))?;

    if next < 0 {
        return Err(DomainError::underflow(current, delta.saturating_neg()));
    }

    Ok(next)
}
