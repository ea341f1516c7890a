//! Effective configuration with provenance
//!
//! Merges built-in defaults, the repo config file and CLI overrides, and
//! records where each layer came from.

use chrono::{DateTime, Utc};
use globset::Glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::Settings;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "plistmods/effective_config@1";

/// Repo config file looked up when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = ".plistmods.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Repo,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Directory of the repo config file; relative paths resolve against it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,

    /// Whether `mods.dirs` came from the repo file or the CLI.
    #[serde(skip)]
    mods_dirs_explicit: bool,
}

impl EffectiveConfig {
    /// Build effective config from layers.
    ///
    /// A repo config path that does not exist is skipped, so the default
    /// `.plistmods.toml` is optional.
    pub fn build(
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();
        let mut base_dir = None;
        let mut mods_dirs_explicit = false;

        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        if let Some(path) = repo_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                mods_dirs_explicit |= Self::sets_mods_dirs(&value);
                base_dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf);
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Repo,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            mods_dirs_explicit |= Self::sets_mods_dirs(&cli);
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
            base_dir,
            mods_dirs_explicit,
        })
    }

    fn sets_mods_dirs(layer: &Value) -> bool {
        layer.get("mods").and_then(|m| m.get("dirs")).is_some()
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Validate configuration values
    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        let pattern = config
            .get("mods")
            .and_then(|m| m.get("pattern"))
            .and_then(|p| p.as_str())
            .unwrap_or_default();
        if pattern.is_empty() {
            return Err(ConfigError::ValidationError(
                "mods.pattern must be a non-empty glob".to_string(),
            ));
        }
        Glob::new(pattern).map_err(|e| {
            ConfigError::ValidationError(format!("mods.pattern is not a valid glob: {}", e))
        })?;

        if let Some(excludes) = config.get("mods").and_then(|m| m.get("exclude")) {
            let excludes = excludes.as_array().ok_or_else(|| {
                ConfigError::ValidationError("mods.exclude must be an array of globs".to_string())
            })?;
            for exclude in excludes {
                let exclude = exclude.as_str().ok_or_else(|| {
                    ConfigError::ValidationError("mods.exclude entries must be strings".to_string())
                })?;
                Glob::new(exclude).map_err(|e| {
                    ConfigError::ValidationError(format!(
                        "mods.exclude entry '{}' is not a valid glob: {}",
                        exclude, e
                    ))
                })?;
            }
        }

        let default_target = config
            .get("targets")
            .and_then(|t| t.get("default"))
            .and_then(|d| d.as_str())
            .unwrap_or_default();
        if default_target.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "targets.default must be a non-empty string".to_string(),
            ));
        }

        let policy = config
            .get("merge")
            .and_then(|m| m.get("on_kind_mismatch"))
            .and_then(|p| p.as_str());
        if !matches!(policy, Some("replace") | Some("skip")) {
            return Err(ConfigError::ValidationError(
                "merge.on_kind_mismatch must be \"replace\" or \"skip\"".to_string(),
            ));
        }

        Ok(())
    }

    /// Typed settings view of the merged config.
    ///
    /// Relative `plist` and `mods.dirs` are resolved against the repo config
    /// file's directory, when one was loaded.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings: Settings = serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ValidationError(format!("Invalid configuration: {}", e)))?;
        if let Some(base) = &self.base_dir {
            settings.resolve_relative_to(base);
        }
        settings.mods.warn_missing_dirs = self.mods_dirs_explicit;
        Ok(settings)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MismatchPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.get_str("plist"), Some("Info.plist"));
        assert_eq!(config.get_str("mods.pattern"), Some("*.plistmods"));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_repo_file_layer() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "plist = \"App/Info.plist\"").unwrap();
        writeln!(temp, "[mods]").unwrap();
        writeln!(temp, "dirs = [\"Config/PlistMods\", \"Vendor/PlistMods\"]").unwrap();
        writeln!(temp, "exclude = [\"**/disabled/**\"]").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None).unwrap();

        assert_eq!(config.get_str("plist"), Some("App/Info.plist"));
        assert_eq!(config.get_str("mods.pattern"), Some("*.plistmods"));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].origin, ConfigOrigin::Repo);
        assert_eq!(config.sources[1].digest.as_ref().map(|d| d.len()), Some(64));

        let settings = config.settings().unwrap();
        assert_eq!(settings.mods.dirs.len(), 2);
        assert_eq!(settings.mods.exclude, vec!["**/disabled/**"]);
    }

    #[test]
    fn test_missing_repo_file_is_skipped() {
        let config =
            EffectiveConfig::build(Some(Path::new("/nonexistent/.plistmods.toml")), None).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_cli_overrides_repo() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[merge]").unwrap();
        writeln!(temp, "on_kind_mismatch = \"skip\"").unwrap();

        let cli = serde_json::json!({"merge": {"on_kind_mismatch": "replace"}});
        let config = EffectiveConfig::build(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(config.settings().unwrap().merge.on_kind_mismatch, MismatchPolicy::Replace);
        assert_eq!(config.sources.last().unwrap().origin, ConfigOrigin::Cli);
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "plist = ").unwrap();

        let err = EffectiveConfig::build(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_pattern() {
        let cli = serde_json::json!({"mods": {"pattern": ""}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("mods.pattern"));

        let cli = serde_json::json!({"mods": {"pattern": "[unclosed"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("not a valid glob"));
    }

    #[test]
    fn test_validation_exclude() {
        let cli = serde_json::json!({"mods": {"exclude": "not-an-array"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("mods.exclude"));
    }

    #[test]
    fn test_validation_policy() {
        let cli = serde_json::json!({"merge": {"on_kind_mismatch": "explode"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("on_kind_mismatch"));
    }

    #[test]
    fn test_validation_default_target() {
        let cli = serde_json::json!({"targets": {"default": " "}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("targets.default"));
    }

    #[test]
    fn test_to_json_has_provenance() {
        let config = EffectiveConfig::build(None, None).unwrap();
        let json: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(json["schema_id"], SCHEMA_ID);
        assert_eq!(json["sources"][0]["origin"], "builtin");
    }

    #[test]
    fn test_repo_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".plistmods.toml");
        std::fs::write(
            &config_path,
            "plist = \"App/Info.plist\"\n[mods]\ndirs = [\"PlistMods\", \"/abs/mods\"]\n",
        )
        .unwrap();

        let settings = EffectiveConfig::build(Some(config_path.as_path()), None)
            .unwrap()
            .settings()
            .unwrap();

        assert_eq!(settings.plist, dir.path().join("App/Info.plist"));
        assert_eq!(
            settings.mods.dirs,
            vec![dir.path().join("PlistMods"), PathBuf::from("/abs/mods")]
        );
    }

    #[test]
    fn test_bare_config_name_stays_cwd_relative() {
        let config = EffectiveConfig::build(Some(Path::new(".plistmods.toml")), None).unwrap();
        assert!(config.base_dir.is_none());

        let settings = EffectiveConfig::build(None, None).unwrap().settings().unwrap();
        assert_eq!(settings.plist, PathBuf::from("Info.plist"));
    }

    #[test]
    fn test_explicit_mods_dirs_flagged() {
        let defaults = EffectiveConfig::build(None, None).unwrap().settings().unwrap();
        assert!(!defaults.mods.warn_missing_dirs);

        let cli = serde_json::json!({"mods": {"dirs": ["/abs/mods"]}});
        let settings = EffectiveConfig::build(None, Some(cli))
            .unwrap()
            .settings()
            .unwrap();
        assert!(settings.mods.warn_missing_dirs);

        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[mods]").unwrap();
        writeln!(temp, "pattern = \"*.json\"").unwrap();
        let settings = EffectiveConfig::build(Some(temp.path()), None)
            .unwrap()
            .settings()
            .unwrap();
        assert!(!settings.mods.warn_missing_dirs);
    }
}
