//! Interpretation of a successful invocation's stdout.

use serde_json::Value;

/// Parsed result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutput {
    /// Stdout was, or contained, a JSON document.
    Json(Value),
    /// Stdout held no recoverable JSON object.
    Text(String),
}

impl InvocationOutput {
    /// Returns the JSON value when one was recovered.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

/// Parses stdout strictly, then falls back to the first embedded JSON object,
/// then to the raw text.
pub(super) fn parse_output(stdout: &str) -> InvocationOutput {
    let trimmed = stdout.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return InvocationOutput::Json(value);
    }

    first_embedded_object(trimmed).map_or_else(
        || InvocationOutput::Text(stdout.to_owned()),
        InvocationOutput::Json,
    )
}

/// Scans for the first `{` that starts a complete JSON object.
///
/// The streaming deserializer stops at the end of the first value, so braces
/// inside string literals never unbalance the match and trailing prose is
/// ignored.
fn first_embedded_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let candidate = text.get(start..)?;
        let mut values = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}
