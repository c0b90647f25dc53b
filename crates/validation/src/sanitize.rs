use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use std::str::FromStr;

const DESCRIBE_LIMIT: usize = 64;

/// Escapes the five HTML-significant characters (`& < > " '`).
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Truncates to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

/// An escaped, length-limited rendering of an arbitrary JSON value for diagnostics.
pub fn describe(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    escape_html(&truncate_chars(&rendered, DESCRIBE_LIMIT))
}

/// Why a value could not be read as a decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    /// Not a number at all.
    NotNumeric,
    /// A finite number too large in magnitude for a `Decimal`.
    OutOfScale,
}

/// Reads a JSON number or numeric string as a decimal.
///
/// Values with more precision than a `Decimal` holds are rounded.
pub fn parse_decimal(value: &Value) -> Result<Decimal, NumberError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(NumberError::NotNumeric),
    };
    if let Ok(number) = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        return Ok(number);
    }
    match text.parse::<f64>() {
        Ok(float) if float.is_finite() => Decimal::from_f64(float).ok_or(NumberError::OutOfScale),
        _ => Err(NumberError::NotNumeric),
    }
}
