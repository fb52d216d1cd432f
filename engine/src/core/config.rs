use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::sql::Backend;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Configuration
// =============================================================================

/// Schema catalog section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SchemaFileConfig {
    pub path: Option<String>,
}

/// Query rendering section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub backend: Option<Backend>,
    pub positional: Option<bool>,
}

/// Resolver metrics section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MetricsFileConfig {
    pub enabled: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub schema: Option<SchemaFileConfig>,
    pub query: Option<QueryFileConfig>,
    pub metrics: Option<MetricsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.resolve_relative_paths(path);
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Make a relative schema path relative to the config file's directory
    fn resolve_relative_paths(&mut self, config_path: &Path) {
        let Some(base) = config_path.parent() else {
            return;
        };
        if let Some(schema) = self.schema.as_mut()
            && let Some(path) = schema.path.as_mut()
            && !path.starts_with('~')
            && Path::new(path.as_str()).is_relative()
        {
            *path = base.join(path.as_str()).to_string_lossy().into_owned();
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(schema) = other.schema {
            let current = self.schema.get_or_insert_with(SchemaFileConfig::default);
            if schema.path.is_some() {
                tracing::trace!(path = ?schema.path, "Merging schema.path");
                current.path = schema.path;
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.backend.is_some() {
                tracing::trace!(backend = ?query.backend, "Merging query.backend");
                current.backend = query.backend;
            }
            if query.positional.is_some() {
                tracing::trace!(positional = ?query.positional, "Merging query.positional");
                current.positional = query.positional;
            }
        }

        if let Some(metrics) = other.metrics {
            let current = self.metrics.get_or_insert_with(MetricsFileConfig::default);
            if metrics.enabled.is_some() {
                tracing::trace!(enabled = ?metrics.enabled, "Merging metrics.enabled");
                current.enabled = metrics.enabled;
            }
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Final merged application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Schema catalog file, if one was configured
    pub schema_path: Option<PathBuf>,
    pub backend: Backend,
    /// Render positional placeholders by default
    pub positional: bool,
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.pgfilter/pgfilter.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let profile = get_profile_config_path();
        Self::load_with_profile(cli, profile.as_deref())
    }

    fn load_with_profile(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let file_schema = file_config.schema.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();
        let file_metrics = file_config.metrics.unwrap_or_default();

        // 3. Layer configs: defaults -> file config -> CLI/env overrides
        let schema_path = cli
            .schema
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_schema.path.as_deref().map(expand_path));

        let config = Self {
            schema_path,
            backend: cli.backend.or(file_query.backend).unwrap_or_default(),
            positional: file_query.positional.unwrap_or(false),
            metrics_enabled: cli.metrics.or(file_metrics.enabled).unwrap_or(false),
        };

        tracing::debug!(
            schema = ?config.schema_path,
            backend = %config.backend,
            metrics = config.metrics_enabled,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Schema catalog path, required by every command
    pub fn require_schema_path(&self) -> Result<&Path> {
        self.schema_path.as_deref().with_context(|| {
            format!(
                "No schema catalog configured. Pass --schema or set schema.path in {}",
                CONFIG_FILE_NAME
            )
        })
    }
}

/// Get the profile config path (~/.pgfilter/pgfilter.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
