const MAX_VALUE_LEN: usize = 120;

/// Trims DICOM padding (spaces and NULs); blank values count as missing.
pub fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses an Integer String value. Decimal renderings are accepted only when
/// they are integral (`"3.0"` but not `"3.5"`).
pub fn parse_integer_string(raw: &str) -> Option<i64> {
    let text = clean_text(raw)?;
    let text = text.split('\\').next().unwrap_or_default().trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }

    let value = text.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

pub fn truncate_for_display(value: &str) -> String {
    if value.chars().count() > MAX_VALUE_LEN {
        let mut truncated = value.chars().take(MAX_VALUE_LEN).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        value.to_string()
    }
}
