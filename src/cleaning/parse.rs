//! Free-text field parsers.
//!
//! None of these functions fail: anything they cannot read is reported as
//! missing (`None`) and the caller decides whether the record survives.

/// Extract the bedroom count from free text such as `"2 BHK"` or `"4 Bedroom"`.
///
/// Returns the first run of ASCII digits, or `None` if there is none (or it
/// does not fit in a `u32`).
pub fn extract_bedroom_count(size_text: &str) -> Option<u32> {
    let start = size_text.find(|c: char| c.is_ascii_digit())?;
    let digits = &size_text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Normalize a square footage field to one number.
///
/// - `"1056"` → `Some(1056.0)`
/// - `"1000-1200"` → `Some(1100.0)` (midpoint of the range)
/// - `"34.46Sq. Meter"`, `""`, `"1-2-3"` → `None`
pub fn normalize_square_footage(text: &str) -> Option<f64> {
    let value = if text.contains('-') {
        let mut parts = text.split('-');
        let low = parse_number(parts.next()?)?;
        let high = parse_number(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        (low + high) / 2.0
    } else {
        parse_number(text)?
    };

    value.is_finite().then_some(value)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Collapse internal whitespace runs and trim, so `"Super built-up  Area"`
/// and `"Super built-up Area"` name the same category.
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
