use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::debounce::DEFAULT_SEARCH_DEBOUNCE;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::export::DEFAULT_FILENAME_PREFIX;
use crate::models::{FilterCriteria, SortBy, SortOrder};

const CONFIG_FILE_NAME: &str = "etfdash.toml";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_search_debounce() -> Duration {
    DEFAULT_SEARCH_DEBOUNCE
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, including the `/api` prefix.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Initial dashboard criteria and input behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,

    /// Quiet period after the last keystroke before a search is sent.
    #[serde(
        default = "default_search_debounce",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub search_debounce: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            search_debounce: default_search_debounce(),
        }
    }
}

impl DashboardConfig {
    pub fn initial_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            ..FilterCriteria::default()
        }
    }
}

/// CSV export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output directory. If relative, resolved from the config file location.
    /// Defaults to the config file's directory.
    pub dir: Option<PathBuf>,

    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file used while the terminal dashboard owns the screen.
    /// If relative, resolved from the config file location.
    pub file: Option<PathBuf>,
}

/// Application configuration as written in the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

fn resolve_path(path: &Path, config_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub export_dir: PathBuf,
    pub export_prefix: String,
    pub log_file: Option<PathBuf>,
}

impl ResolvedConfig {
    fn resolve(config: Config, config_dir: &Path) -> Self {
        let export_dir = config
            .export
            .dir
            .as_deref()
            .map(|dir| resolve_path(dir, config_dir))
            .unwrap_or_else(|| config_dir.to_path_buf());
        let log_file = config
            .logging
            .file
            .as_deref()
            .map(|file| resolve_path(file, config_dir));

        Self {
            api: config.api,
            dashboard: config.dashboard,
            export_dir,
            export_prefix: config.export.filename_prefix,
            log_file,
        }
    }

    /// Load and resolve config from a file path.
    ///
    /// Relative paths are resolved against the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Ok(Self::resolve(config, config_dir))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a file, paths resolve against the directory the file would live in.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };
        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Self::resolve(Config::default(), config_dir))
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./etfdash.toml` if it exists in current directory
/// 2. `<config dir>/etfdash/etfdash.toml` (e.g. `~/.config/etfdash/etfdash.toml`)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("etfdash").join(CONFIG_FILE_NAME);
    }

    local_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.dashboard.sort_by, SortBy::NavMillionRub);
        assert_eq!(config.dashboard.sort_order, SortOrder::Desc);
        assert_eq!(config.dashboard.search_debounce, Duration::from_millis(300));
        assert_eq!(config.export.filename_prefix, "etf_data");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("etfdash.toml");
        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.export.dir, None);

        Ok(())
    }

    #[test]
    fn test_load_full_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("etfdash.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[api]")?;
        writeln!(file, "base_url = \"http://funds.internal:9000/api\"")?;
        writeln!(file, "[dashboard]")?;
        writeln!(file, "sort_by = \"ter_percent\"")?;
        writeln!(file, "sort_order = \"asc\"")?;
        writeln!(file, "search_debounce = \"500ms\"")?;
        writeln!(file, "[export]")?;
        writeln!(file, "filename_prefix = \"funds\"")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.api.base_url, "http://funds.internal:9000/api");
        assert_eq!(config.dashboard.sort_by, SortBy::TerPercent);
        assert_eq!(config.dashboard.sort_order, SortOrder::Asc);
        assert_eq!(config.dashboard.search_debounce, Duration::from_millis(500));
        assert_eq!(config.export.filename_prefix, "funds");

        let criteria = config.dashboard.initial_criteria();
        assert_eq!(criteria.sort_by, SortBy::TerPercent);
        assert!(criteria.is_all_asset_classes());

        Ok(())
    }

    #[test]
    fn test_invalid_sort_key_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("etfdash.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[dashboard]")?;
        writeln!(file, "sort_by = \"volume\"")?;

        assert!(Config::load(&config_path).is_err());
        Ok(())
    }

    #[test]
    fn test_resolved_paths_are_relative_to_config_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("etfdash.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[export]")?;
        writeln!(file, "dir = \"./exports\"")?;
        writeln!(file, "[logging]")?;
        writeln!(file, "file = \"/var/log/etfdash.log\"")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        let config_dir = dir.path().canonicalize()?;
        assert_eq!(resolved.export_dir, config_dir.join("./exports"));
        assert_eq!(resolved.log_file, Some(PathBuf::from("/var/log/etfdash.log")));

        Ok(())
    }

    #[test]
    fn test_resolved_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("etfdash.toml");

        let resolved = ResolvedConfig::load_or_default(&config_path)?;
        assert_eq!(resolved.export_dir, dir.path());
        assert_eq!(resolved.export_prefix, "etf_data");
        assert_eq!(resolved.api.base_url, DEFAULT_BASE_URL);

        Ok(())
    }
}
