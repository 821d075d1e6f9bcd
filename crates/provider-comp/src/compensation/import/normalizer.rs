pub(crate) fn normalize_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses spreadsheet numbers, tolerating currency symbols, thousands separators, and
/// accounting-style parentheses for negatives. Blank cells read as `None`.
pub(crate) fn parse_number(value: &str) -> Result<Option<f64>, String> {
    let cleaned: String = normalize_cell(value)
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }

    let (negative, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let parsed: f64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !parsed.is_finite() {
        return Err(format!("'{}' is not a finite number", value.trim()));
    }
    Ok(Some(if negative { -parsed } else { parsed }))
}

#[cfg(test)]
pub(crate) fn parse_number_for_tests(value: &str) -> Result<Option<f64>, String> {
    parse_number(value)
}
