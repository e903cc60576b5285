//! Gateway method dispatch.
//!
//! ```text
//! McpMethod
//!   ├── Initialize      "initialize"
//!   ├── Initialized     "notifications/initialized"
//!   ├── CallTool        "tools/call"      (only sm.texts.save)
//!   ├── ReadResource    "resources/read"  (resource://sm/v1/texts/<name>)
//!   └── Unknown(String)
//! ```
//!
//! Adding a method means adding a variant here and a handler in
//! [`McpServer::dispatch_method`](super::McpServer).

use std::fmt;

/// Gateway method identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum McpMethod {
    /// Handshake.
    Initialize,
    /// Handshake acknowledgment.
    Initialized,
    /// Tool invocation.
    CallTool,
    /// Resource read.
    ReadResource,
    /// Anything else.
    Unknown(String),
}

impl McpMethod {
    /// Returns the wire method name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::CallTool => "tools/call",
            Self::ReadResource => "resources/read",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns true if this is a known method.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns all known methods.
    #[must_use]
    pub const fn known_methods() -> &'static [Self] {
        &[
            Self::Initialize,
            Self::Initialized,
            Self::CallTool,
            Self::ReadResource,
        ]
    }
}

impl From<&str> for McpMethod {
    fn from(s: &str) -> Self {
        match s {
            "initialize" => Self::Initialize,
            "notifications/initialized" => Self::Initialized,
            "tools/call" => Self::CallTool,
            "resources/read" => Self::ReadResource,
            unknown => Self::Unknown(unknown.to_string()),
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("initialize", McpMethod::Initialize)]
    #[test_case("notifications/initialized", McpMethod::Initialized)]
    #[test_case("tools/call", McpMethod::CallTool)]
    #[test_case("resources/read", McpMethod::ReadResource)]
    fn test_method_from_str(name: &str, expected: McpMethod) {
        assert_eq!(McpMethod::from(name), expected);
    }

    #[test_case("tools/list" ; "tool listing is not served")]
    #[test_case("ping" ; "ping is not served")]
    #[test_case("Initialize" ; "names are case sensitive")]
    fn test_unsupported_methods_are_unknown(name: &str) {
        let method = McpMethod::from(name);
        assert!(!method.is_known());
        assert_eq!(method.as_str(), name);
    }

    #[test]
    fn test_method_as_str_roundtrip() {
        for method in McpMethod::known_methods() {
            assert_eq!(&McpMethod::from(method.as_str()), method, "roundtrip failed for {method}");
        }
    }
}
