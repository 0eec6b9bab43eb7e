use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// Flat rule parameters (`rule1_enabled`, `rule1_title`, ..., `development_mode`)
    #[serde(default)]
    pub params: PluginParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the blog database (defaults to `<data_dir>/blog.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Blog feature that must be enabled before any rule runs
    #[serde(default = "default_required_feature")]
    pub required_feature: String,
    /// Connection busy timeout in seconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            required_feature: default_required_feature(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Write run summaries to the diagnostics file
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Diagnostics file path (defaults to `<data_dir>/logs/blog_diagnostics.php`)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Prefix a new file with the PHP execution guard line
    #[serde(default = "default_true")]
    pub php_guard: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            log_file: None,
            php_guard: default_true(),
        }
    }
}

/// Loosely typed key/value parameters, read with a default per key.
///
/// Values are coerced the way a form-backed parameter store hands them out:
/// `"1"`, `1` and `true` are all truthy, `"30"` is a valid day count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginParams(BTreeMap<String, toml::Value>);

impl PluginParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, returning self for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(toml::Value::Boolean(b)) => *b,
            Some(toml::Value::Integer(i)) => *i != 0,
            Some(toml::Value::Float(f)) => *f != 0.0,
            Some(toml::Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Some(_) => default,
            None => default,
        }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.0.get(key) {
            Some(toml::Value::String(s)) => s.clone(),
            Some(toml::Value::Integer(i)) => i.to_string(),
            Some(toml::Value::Float(f)) => f.to_string(),
            Some(toml::Value::Boolean(b)) => (if *b { "1" } else { "0" }).to_string(),
            Some(_) | None => default.to_string(),
        }
    }

    /// Integer parameter; unparsable strings read as 0
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.0.get(key) {
            Some(toml::Value::Integer(i)) => *i,
            Some(toml::Value::Float(f)) => f.trunc() as i64,
            Some(toml::Value::Boolean(b)) => i64::from(*b),
            Some(toml::Value::String(s)) => parse_leading_int(s),
            Some(_) => default,
            None => default,
        }
    }

    /// Global dry-run toggle
    pub fn development_mode(&self) -> bool {
        self.get_bool("development_mode", false)
    }
}

/// Parse the leading integer of a string ("45 days" -> 45, "abc" -> 0)
fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autoexpire")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_required_feature() -> String {
    "foundry".to_string()
}

fn default_busy_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults if absent
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/autoexpire/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("autoexpire")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Get the blog database path
    pub fn database_path(&self) -> PathBuf {
        match &self.store.database_path {
            Some(path) => expand_tilde(path),
            None => self.data_dir().join("blog.db"),
        }
    }

    /// Get the diagnostics log path
    pub fn diagnostics_path(&self) -> PathBuf {
        match &self.diagnostics.log_file {
            Some(path) => expand_tilde(path),
            None => self.data_dir().join("logs").join("blog_diagnostics.php"),
        }
    }
}
