//! Configuration management for simplate serving.
//!
//! Parses `sp.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [media_types]
//! json = "application/json"
//! jsonp = "application/javascript"
//!
//! [renderers]
//! default = "template"
//!
//! [response]
//! charset = "UTF-8"
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the default renderer.
    pub default_renderer: Option<String>,
    /// Override the response charset.
    pub charset: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "sp.toml";

/// Pattern a configured media type must match.
pub const MEDIA_TYPE_PATTERN: &str = "[A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+";

/// Pattern a configured charset must match (an RFC 7230 token).
pub const CHARSET_PATTERN: &str = "[!#$%&'*+.^_`|~0-9A-Za-z-]+";

/// Renderer used when none is configured.
pub const DEFAULT_RENDERER: &str = "template";

static MEDIA_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{MEDIA_TYPE_PATTERN}$")).unwrap());

static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{CHARSET_PATTERN}$")).unwrap());

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media types for JSON responses.
    pub media_types: MediaTypesConfig,
    /// Renderer configuration.
    pub renderers: RenderersConfig,
    /// Response configuration.
    pub response: ResponseConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Media types served by JSON resources.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MediaTypesConfig {
    /// Media type of JSON responses.
    pub json: String,
    /// Media type of JSONP responses.
    pub jsonp: String,
}

impl Default for MediaTypesConfig {
    fn default() -> Self {
        Self {
            json: "application/json".to_owned(),
            jsonp: "application/javascript".to_owned(),
        }
    }
}

/// Renderer configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderersConfig {
    /// Renderer used when a specline names only a media type.
    pub default: String,
}

impl Default for RenderersConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_RENDERER.to_owned(),
        }
    }
}

/// Response configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Charset appended to `text/*` content types.
    pub charset: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            charset: "UTF-8".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a string field to be a `type/subtype` media type.
fn require_media_type(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if !MEDIA_TYPE_RE.is_match(value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a media type like type/subtype, got {value}"
        )));
    }
    Ok(())
}

/// Require a string field to be a header token, as used for charsets.
fn require_token(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if !CHARSET_RE.is_match(value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a token without spaces or separators, got {value:?}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `sp.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(renderer) = &settings.default_renderer {
            self.renderers.default.clone_from(renderer);
        }
        if let Some(charset) = &settings.charset {
            self.response.charset.clone_from(charset);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_media_type(&self.media_types.json, "media_types.json")?;
        require_media_type(&self.media_types.jsonp, "media_types.jsonp")?;
        require_non_empty(&self.renderers.default, "renderers.default")?;
        require_token(&self.response.charset, "response.charset")?;
        Ok(())
    }
}
