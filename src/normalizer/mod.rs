//! Turns matched substrings into typed field values.
//!
//! The extractors only find *where* a value sits on the page; everything
//! about what the text means (comma decimals, "unavailable" markers, state
//! words) is decided here.

use crate::models::field::FieldKey;
use crate::models::reading::FieldValue;
use thiserror::Error;

pub mod decimal;
pub mod naming;
pub mod vocabulary;
pub mod wind;

/// Shape of the text expected after a field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Number,
    State,
    Text,
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldCoercionError {
    #[error("empty value")]
    Empty,

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("unknown state word: {0:?}")]
    UnknownState(String),
}

/// Coerces the raw text matched for `key` into its typed value.
///
/// Placeholder tokens on numeric fields become [`FieldValue::Unavailable`].
pub fn coerce(key: FieldKey, raw: &str) -> Result<FieldValue, FieldCoercionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldCoercionError::Empty);
    }

    match key.shape() {
        ValueShape::Number => {
            if decimal::is_placeholder(raw) {
                return Ok(FieldValue::Unavailable);
            }
            decimal::parse_decimal(raw).map(FieldValue::Number)
        }
        ValueShape::State => vocabulary::state_for(key, raw)
            .map(FieldValue::Boolean)
            .ok_or_else(|| FieldCoercionError::UnknownState(raw.to_string())),
        ValueShape::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert_eq!(coerce(FieldKey::Temperature, "21,3"), Ok(FieldValue::Number(21.3)));
    }

    #[test]
    fn test_placeholder_becomes_sentinel() {
        assert_eq!(coerce(FieldKey::Temperature, "---"), Ok(FieldValue::Unavailable));
        assert_eq!(coerce(FieldKey::HumidityAvg24h, "OFL"), Ok(FieldValue::Unavailable));
    }

    #[test]
    fn test_bad_number_is_an_error() {
        assert_eq!(
            coerce(FieldKey::RainTotal, "1.234,5"),
            Err(FieldCoercionError::NotANumber("1.234,5".to_string()))
        );
    }

    #[test]
    fn test_state() {
        assert_eq!(coerce(FieldKey::Contact, "offen"), Ok(FieldValue::Boolean(true)));
        assert_eq!(
            coerce(FieldKey::Contact, "kaputt"),
            Err(FieldCoercionError::UnknownState("kaputt".to_string()))
        );
    }

    #[test]
    fn test_text() {
        assert_eq!(
            coerce(FieldKey::WindDirection, "Nordwest"),
            Ok(FieldValue::Text("Nordwest".to_string()))
        );
        assert_eq!(coerce(FieldKey::WindDirection, " "), Err(FieldCoercionError::Empty));
    }
}
