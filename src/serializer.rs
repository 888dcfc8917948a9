//! Conversion of located JSON values into header text.

use http::HeaderValue;
use serde_json::Value as JsonValue;
use std::borrow::Cow;

/// Render a JSON value as header text.
///
/// Strings are emitted raw (no quotes, no escaping). Everything else is
/// emitted as compact JSON.
pub fn serialize(value: &JsonValue) -> Cow<'_, str> {
    match value {
        JsonValue::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Render a JSON value as a [`HeaderValue`].
pub fn to_header_value(value: &JsonValue) -> Result<HeaderValue, SerializeError> {
    let text = serialize(value);
    HeaderValue::from_str(&text).map_err(|_| SerializeError::InvalidHeaderValue {
        value: truncate(&text, 64),
    })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Errors produced while turning a value into a header.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("Value cannot be used as a header value: {value:?}")]
    InvalidHeaderValue { value: String },
}
