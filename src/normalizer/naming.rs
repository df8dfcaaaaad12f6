const SEPARATOR: char = '_';

/// Turns a display name into a state-store path segment.
///
/// German umlauts are transliterated, every character outside
/// `[A-Za-z0-9_-]` becomes `_`, separator runs collapse into one and
/// separators at either end are trimmed. May return an empty string when
/// nothing usable is left; callers fall back to [`fallback_name`].
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            c if c.is_ascii_alphanumeric() || c == '-' => out.push(c),
            _ => out.push(SEPARATOR),
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    let mut previous_separator = false;
    for c in out.chars() {
        let is_separator = c == SEPARATOR || c == '-';
        if is_separator && previous_separator {
            continue;
        }
        previous_separator = is_separator;
        collapsed.push(c);
    }

    collapsed
        .trim_matches(|c| c == SEPARATOR || c == '-')
        .to_string()
}

/// Synthetic name for a sensor block without any usable label (1-based).
pub fn fallback_name(index: usize) -> String {
    format!("Sensor_{}", index)
}

/// State-store group holding every sensor reported for a phone id.
pub fn group_id(phone_id: &str) -> String {
    format!("Phone_{}", sanitize(phone_id))
}
