//! Numeric conversion for regex-captured benchmark fields.
//!
//! The extraction patterns only admit digits and `.`, so a capture can still
//! fail conversion (`1.2.3`) or overflow (`queries` beyond `u64`, a digit run
//! too long for a finite `f64`). Both cases surface as `ParseError` rather
//! than a clamped or infinite value.

/// Error produced when a matched field cannot be represented as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidNumber { field: &'static str, value: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidNumber { field, value } => {
                write!(f, "field '{field}' has unrepresentable value '{value}'")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a float field, rejecting anything that is not finite.
pub fn parse_f64(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Parse an unsigned integer field.
pub fn parse_u64(field: &'static str, raw: &str) -> Result<u64, ParseError> {
    raw.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}
