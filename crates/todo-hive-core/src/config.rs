//! Configuration management for todo-hive.
//!
//! Loads configuration from ${TODO_HIVE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::BackendVariant;

/// Which backend variant the client should expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Detect from the first register/login response (default)
    #[default]
    Auto,
    /// Always start from Worker A until a response says otherwise
    WorkerA,
    /// Always start from Worker B until a response says otherwise
    WorkerB,
}

impl BackendPreference {
    /// Returns the pinned variant, or None for auto detection.
    pub fn pinned(self) -> Option<BackendVariant> {
        match self {
            BackendPreference::Auto => None,
            BackendPreference::WorkerA => Some(BackendVariant::A),
            BackendPreference::WorkerB => Some(BackendVariant::B),
        }
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments from the template are kept while the user's values win.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for todo-hive configuration and session data.
    //!
    //! TODO_HIVE_HOME resolution order:
    //! 1. TODO_HIVE_HOME environment variable (if set)
    //! 2. ~/.config/todo-hive (default)

    use std::env;
    use std::path::PathBuf;

    /// Returns the todo-hive home directory.
    ///
    /// Falls back to the current directory when no home directory is known.
    pub fn hive_home() -> PathBuf {
        if let Ok(home) = env::var("TODO_HIVE_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("todo-hive"))
            .unwrap_or_else(|| PathBuf::from(".todo-hive"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        hive_home().join("config.toml")
    }

    /// Returns the path to the persisted session.
    pub fn session_path() -> PathBuf {
        hive_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,

    /// Expected backend variant
    pub backend: BackendPreference,

    /// HTTP timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the base_url field to a specific config file path.
    ///
    /// Creates the file with the default template if it doesn't exist,
    /// otherwise merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_base_url_to(path: &Path, base_url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let base_url = validate_base_url(base_url)?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["base_url"] = value(base_url);

        Self::write_config(path, &doc.to_string())
    }

    /// Resolves the base URL with precedence: override > config > default.
    ///
    /// The override is the `--base-url` flag or `TODO_HIVE_BASE_URL`.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid URL.
    pub fn effective_base_url(&self, override_url: Option<&str>) -> Result<String> {
        if let Some(url) = override_url.map(str::trim).filter(|url| !url.is_empty()) {
            return validate_base_url(url);
        }

        let configured = self.base_url.trim();
        if !configured.is_empty() {
            return validate_base_url(configured);
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            backend: BackendPreference::default(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Validates a base URL and strips any trailing slash.
fn validate_base_url(url: &str) -> Result<String> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(url.trim_end_matches('/').to_string())
}
