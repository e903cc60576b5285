//! Argument types for gateway tools.
//!
//! Argument structs use `#[serde(deny_unknown_fields)]` so that a misspelled
//! field is reported instead of silently dropped.

use crate::models::SaveRequest;
use serde::Deserialize;

/// Name of the save tool.
pub const SAVE_TOOL: &str = "sm.texts.save";

/// Arguments for `sm.texts.save`.
///
/// `body`, `category` and `subcategory` are accepted as alternative names
/// for `text`, `cat` and `subcat`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveArgs {
    /// Target symbol.
    pub symbol: String,
    /// Entry body.
    #[serde(alias = "body")]
    pub text: String,
    /// Optional category.
    #[serde(default, alias = "category")]
    pub cat: Option<String>,
    /// Optional subcategory.
    #[serde(default, alias = "subcategory")]
    pub subcat: Option<String>,
    /// Optional aliases.
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
}

impl From<SaveArgs> for SaveRequest {
    fn from(args: SaveArgs) -> Self {
        Self {
            symbol: args.symbol,
            text: args.text,
            category: args.cat,
            subcategory: args.subcat,
            aliases: args.aliases.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_args_accept_alternative_names() {
        let args: SaveArgs = serde_json::from_value(json!({
            "symbol": "TST.ONE",
            "body": "hello",
            "category": "ai",
            "subcategory": "architecture.hybrid",
        }))
        .unwrap();
        let request = SaveRequest::from(args);

        assert_eq!(request.text, "hello");
        assert_eq!(request.category.as_deref(), Some("ai"));
        assert_eq!(request.subcategory.as_deref(), Some("architecture.hybrid"));
        assert!(request.aliases.is_empty());
    }

    #[test]
    fn test_save_args_reject_malformed_aliases() {
        let result: Result<SaveArgs, _> = serde_json::from_value(json!({
            "symbol": "TST.ONE",
            "text": "hello",
            "aliases": "not-a-list",
        }));
        assert!(result.is_err());

        let result: Result<SaveArgs, _> = serde_json::from_value(json!({
            "symbol": "TST.ONE",
            "text": "hello",
            "aliases": ["ok", 3],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_args_reject_unknown_fields_and_missing_text() {
        let result: Result<SaveArgs, _> = serde_json::from_value(json!({
            "symbol": "TST.ONE",
            "text": "hello",
            "tags": ["x"],
        }));
        assert!(result.is_err());

        let result: Result<SaveArgs, _> = serde_json::from_value(json!({ "symbol": "TST.ONE" }));
        assert!(result.is_err());
    }
}
