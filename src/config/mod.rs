//! Configuration management.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <path>`, else `SYMMEM_CONFIG_PATH`, else
//!    `<platform config dir>/symmem/config.toml` when it exists
//! 3. Environment variables (`SYMMEM_*`, `OPENAI_API_KEY`, `MISTRAL_API_KEY`)
//!
//! ```toml
//! db_path = "sm.db"
//! server_url = "http://127.0.0.1:8000/mcp"
//!
//! [suggestion]
//! limit_rows = 2000
//! min_similarity = 0.10
//!
//! [bridge]
//! backend = "ollama"
//! model = "llama3.1:8b"
//! ```

use crate::bridge::{BackendKind, DEFAULT_MAX_STEPS, OpenAiCompatClient};
use crate::observability::LogFormat;
use crate::services::SuggestionConfig;
use crate::similarity::DEFAULT_MAX_TOKENS;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for symmem.
#[derive(Debug, Clone)]
pub struct SymmemConfig {
    /// `SQLite` database path.
    pub db_path: PathBuf,
    /// Apply journal path.
    pub journal_path: PathBuf,
    /// Gateway URL used by client commands.
    pub server_url: String,
    /// Timeout for gateway requests, in seconds.
    pub request_timeout_secs: u64,
    /// Suggester tuning.
    pub suggestion: SuggestionConfig,
    /// Tool-calling bridge settings.
    pub bridge: BridgeSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Tool-calling bridge settings.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Chat backend kind.
    pub backend: BackendKind,
    /// Model name.
    pub model: String,
    /// Ollama chat completions URL.
    pub ollama_url: String,
    /// OpenAI-compatible chat completions URL.
    pub openai_url: String,
    /// Bearer key for the OpenAI-compatible backend.
    pub api_key: Option<SecretString>,
    /// Cap on model turns.
    pub max_steps: usize,
    /// Timeout for chat requests, in seconds.
    pub timeout_secs: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            model: OpenAiCompatClient::DEFAULT_MODEL.to_string(),
            ollama_url: OpenAiCompatClient::DEFAULT_OLLAMA_URL.to_string(),
            openai_url: OpenAiCompatClient::DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            max_steps: DEFAULT_MAX_STEPS,
            timeout_secs: 60,
        }
    }
}

impl BridgeSettings {
    /// Builds the configured chat client.
    #[must_use]
    pub fn client(&self) -> OpenAiCompatClient {
        let client = match self.backend {
            BackendKind::Ollama => OpenAiCompatClient::ollama().with_endpoint(&self.ollama_url),
            BackendKind::OpenAiCompat => OpenAiCompatClient::openai_compat(&self.openai_url),
        };
        let client = client
            .with_model(&self.model)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.api_key {
            Some(key) if self.backend == BackendKind::OpenAiCompat => client.with_api_key(key.clone()),
            _ => client,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Filter directive such as `info` or `symmem=debug`.
    pub level: Option<String>,
    /// Output format.
    pub format: Option<LogFormat>,
    /// Optional log file; logs go to stderr otherwise.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub db_path: Option<String>,
    /// Journal path.
    pub journal_path: Option<String>,
    /// Gateway URL.
    pub server_url: Option<String>,
    /// Gateway request timeout.
    pub request_timeout_secs: Option<u64>,
    /// Suggestion section.
    pub suggestion: Option<ConfigFileSuggestion>,
    /// Bridge section.
    pub bridge: Option<ConfigFileBridge>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Suggestion section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileSuggestion {
    /// Rows scanned.
    pub limit_rows: Option<usize>,
    /// Minimum neighbor similarity.
    pub min_similarity: Option<f64>,
    /// Token cap.
    pub max_tokens: Option<usize>,
}

/// Bridge section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileBridge {
    /// `ollama` or `openai_compat`.
    pub backend: Option<BackendKind>,
    /// Model name.
    pub model: Option<String>,
    /// Ollama URL.
    pub ollama_url: Option<String>,
    /// OpenAI-compatible URL.
    pub openai_url: Option<String>,
    /// Bearer key.
    pub api_key: Option<String>,
    /// Step cap.
    pub max_steps: Option<usize>,
    /// Chat timeout.
    pub timeout_secs: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for SymmemConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("sm.db"),
            journal_path: PathBuf::from(".symmem").join("apply_journal.jsonl"),
            server_url: "http://127.0.0.1:8000/mcp".to_string(),
            request_timeout_secs: 10,
            suggestion: SuggestionConfig {
                limit_rows: 2000,
                min_similarity: 0.10,
                max_tokens: DEFAULT_MAX_TOKENS,
            },
            bridge: BridgeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SymmemConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from every source.
    ///
    /// An explicit `path` (or `SYMMEM_CONFIG_PATH`) must exist and parse; the
    /// platform default is used only when present, but must parse if it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("SYMMEM_CONFIG_PATH").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Returns the platform default config path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("symmem").join("config.toml"))
    }

    /// Loads the platform default file, or defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Self> {
        Self::load_if_present(Self::default_path().as_deref())
    }

    fn load_if_present(path: Option<&Path>) -> Result<Self> {
        match path.filter(|p| p.exists()) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(journal_path) = file.journal_path {
            config.journal_path = PathBuf::from(journal_path);
        }
        if let Some(url) = file.server_url {
            config.server_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(suggestion) = file.suggestion {
            if let Some(v) = suggestion.limit_rows {
                config.suggestion.limit_rows = v;
            }
            if let Some(v) = suggestion.min_similarity {
                config.suggestion.min_similarity = v;
            }
            if let Some(v) = suggestion.max_tokens {
                config.suggestion.max_tokens = v;
            }
        }
        if let Some(bridge) = file.bridge {
            if let Some(v) = bridge.backend {
                config.bridge.backend = v;
            }
            if let Some(v) = bridge.model {
                config.bridge.model = v;
            }
            if let Some(v) = bridge.ollama_url {
                config.bridge.ollama_url = v;
            }
            if let Some(v) = bridge.openai_url {
                config.bridge.openai_url = v;
            }
            config.bridge.api_key = bridge.api_key.map(SecretString::from);
            if let Some(v) = bridge.max_steps {
                config.bridge.max_steps = v;
            }
            if let Some(v) = bridge.timeout_secs {
                config.bridge.timeout_secs = v;
            }
        }
        if let Some(logging) = file.logging {
            config.logging.level = logging.level;
            config.logging.format = logging.format.as_deref().map(LogFormat::parse);
            config.logging.file = logging.file.map(PathBuf::from);
        }

        config
    }

    /// Applies `SYMMEM_*` and API key overrides from `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SYMMEM_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SYMMEM_JOURNAL_PATH") {
            self.journal_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SYMMEM_URL") {
            self.server_url = v;
        }
        if let Some(v) = parse_override(&lookup, "SYMMEM_SUGGEST_LIMIT_ROWS") {
            self.suggestion.limit_rows = v;
        }
        if let Some(v) = parse_override(&lookup, "SYMMEM_SUGGEST_MIN_SIM") {
            self.suggestion.min_similarity = v;
        }
        if let Some(v) = parse_override(&lookup, "SYMMEM_BRIDGE_MAX_STEPS") {
            self.bridge.max_steps = v;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").or_else(|| lookup("MISTRAL_API_KEY")) {
            self.bridge.api_key = Some(SecretString::from(key));
        }
    }

    /// Returns the gateway request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Sets the journal path.
    #[must_use]
    pub fn with_journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.journal_path = path.into();
        self
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    raw.trim().parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable override");
            None
        },
        Some,
    )
}
