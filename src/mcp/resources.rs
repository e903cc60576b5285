//! Text resources.
//!
//! Entries are exposed as `resource://sm/v1/texts/{symbol-or-alias}`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// URI prefix for text resources.
pub const TEXT_URI_PREFIX: &str = "resource://sm/v1/texts/";

/// Builds the resource URI for a symbol or alias.
#[must_use]
pub fn text_uri(symbol_or_alias: &str) -> String {
    format!("{TEXT_URI_PREFIX}{symbol_or_alias}")
}

/// Extracts the symbol or alias from a text resource URI.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the URI does not use the text scheme, or
/// its final segment is empty or nested.
pub fn parse_text_uri(uri: &str) -> Result<&str> {
    let name = uri
        .strip_prefix(TEXT_URI_PREFIX)
        .ok_or_else(|| Error::Protocol(format!("invalid resource uri: {uri}")))?;

    if name.is_empty() || name.contains('/') {
        return Err(Error::Protocol(format!("invalid resource uri: {uri}")));
    }
    Ok(name)
}

/// Content returned by `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContent {
    /// The requested URI, echoed back.
    pub uri: String,
    /// Always `"text"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Entry body.
    pub text: String,
}

impl ResourceContent {
    /// Wraps a body read for `uri`.
    #[must_use]
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Result envelope of `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    /// Resource contents (exactly one for text resources).
    pub contents: Vec<ResourceContent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("resource://sm/v1/texts/HGI.DEF", "HGI.DEF")]
    #[test_case("resource://sm/v1/texts/hgi", "hgi")]
    fn test_parse_valid_uri(uri: &str, expected: &str) {
        assert_eq!(parse_text_uri(uri).unwrap(), expected);
    }

    #[test_case("resource://sm/v1/texts/" ; "empty segment")]
    #[test_case("resource://sm/v1/texts/a/b" ; "nested segment")]
    #[test_case("file:///tmp/x" ; "foreign scheme")]
    #[test_case("HGI.DEF" ; "bare symbol")]
    fn test_parse_invalid_uri(uri: &str) {
        assert!(matches!(parse_text_uri(uri), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_read_result_wire_shape() {
        let result = ReadResult {
            contents: vec![ResourceContent::text(text_uri("X"), "body")],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["contents"][0]["uri"], "resource://sm/v1/texts/X");
        assert_eq!(value["contents"][0]["type"], "text");
        assert_eq!(value["contents"][0]["text"], "body");
    }
}
