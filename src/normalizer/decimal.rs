use super::FieldCoercionError;

/// Tokens the portal prints instead of a number when a sensor has no valid
/// reading (lost radio contact, overflow, probe unplugged).
const PLACEHOLDERS: &[&str] = &["OFL", "OL", "n/a"];

/// Checks whether `raw` is one of the "value unavailable" markers, including
/// dash runs like `---` or `--.-`.
pub fn is_placeholder(raw: &str) -> bool {
    let token = raw.trim();
    if token.is_empty() {
        return false;
    }

    let dashes = token.chars().filter(|c| *c == '-').count();
    if dashes >= 2 && token.chars().all(|c| matches!(c, '-' | '.' | ',')) {
        return true;
    }

    PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(token))
}

/// Parses a locale formatted decimal such as `21,3` or `-2,5`.
///
/// Only the first comma is treated as the decimal separator, so grouped
/// numbers like `1.234,5` are rejected rather than misread.
pub fn parse_decimal(raw: &str) -> Result<f64, FieldCoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldCoercionError::Empty);
    }

    let normalized = trimmed.replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FieldCoercionError::NotANumber(trimmed.to_string())),
    }
}
