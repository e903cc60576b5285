//! DEFINE block parsing.
//!
//! A markdown document may contain fenced blocks tagged `DEFINE`:
//!
//! ````text
//! ```DEFINE
//! symbol: HGI.DEF
//! cat: ai
//! subcat: architecture.hybrid
//! aliases: hgi, hybrid-intelligence
//!
//! Hybrid intelligence combines symbolic memory with a language model.
//! ```
//! ````
//!
//! Only the last block in the document is used. Header lines are
//! `key: value` pairs (keys are case-insensitive) that end at the first
//! blank line, or at the first line that is not a header.

use crate::models::SaveRequest;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

#[allow(clippy::expect_used)]
static DEFINE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```DEFINE\s*\n(.*?)\n```").expect("static DEFINE regex must compile"));

#[allow(clippy::expect_used)]
static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)\s*:\s*(.*)$").expect("static header regex must compile")
});

/// Project used when the block does not name one.
pub const DEFAULT_PROJECT: &str = "default";

/// A parsed DEFINE block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineBlock {
    /// `symbol:` header.
    pub symbol: Option<String>,
    /// `project:` header, [`DEFAULT_PROJECT`] when absent.
    pub project: String,
    /// `cat:` header.
    pub category: Option<String>,
    /// `subcat:` header.
    pub subcategory: Option<String>,
    /// Comma-separated `tags:` header.
    pub tags: Vec<String>,
    /// Comma-separated `aliases:` header.
    pub aliases: Vec<String>,
    /// Everything after the headers, trailing newlines removed.
    pub body: String,
}

impl DefineBlock {
    /// Parses the last DEFINE block of a markdown document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the document has no DEFINE block or
    /// the block body is blank.
    pub fn parse_last(markdown: &str) -> Result<Self> {
        let raw = DEFINE_BLOCK
            .captures_iter(markdown)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| Error::InvalidInput("no ```DEFINE``` block found".to_string()))?;

        let (mut headers, body) = split_headers(raw);
        if body.trim().is_empty() {
            return Err(Error::InvalidInput("DEFINE block body is empty".to_string()));
        }

        let mut take = |key: &str| headers.remove(key).filter(|v| !v.is_empty());

        Ok(Self {
            symbol: take("symbol"),
            project: take("project").unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            category: take("cat"),
            subcategory: take("subcat"),
            tags: split_list(take("tags").as_deref()),
            aliases: split_list(take("aliases").as_deref()),
            body,
        })
    }

    /// Builds a save request, preferring `symbol_override` over the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if neither provides a symbol.
    pub fn into_save_request(self, symbol_override: Option<&str>) -> Result<SaveRequest> {
        let symbol = symbol_override
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .or(self.symbol)
            .ok_or_else(|| {
                Error::InvalidInput(
                    "symbol missing: add 'symbol:' to the DEFINE block or pass it explicitly"
                        .to_string(),
                )
            })?;

        Ok(SaveRequest {
            symbol,
            text: self.body,
            category: self.category,
            subcategory: self.subcategory,
            aliases: self.aliases,
        })
    }
}

fn split_headers(raw: &str) -> (HashMap<String, String>, String) {
    let lines: Vec<&str> = raw.lines().collect();
    let mut headers = HashMap::new();
    let mut body_start = lines.len();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            body_start = i + 1;
            break;
        }
        let Some(caps) = HEADER_LINE.captures(line) else {
            body_start = i;
            break;
        };
        headers.insert(caps[1].trim().to_lowercase(), caps[2].trim().to_string());
    }

    let body = lines
        .get(body_start..)
        .unwrap_or_default()
        .join("\n")
        .trim_end_matches('\n')
        .to_string();

    (headers, body)
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
