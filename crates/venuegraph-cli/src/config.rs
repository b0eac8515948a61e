//! CLI configuration: JSON file, then environment, then flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Path of the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "VENUEGRAPH_CONFIG";
/// Overrides `abbreviation_cache`.
pub const ABBREVIATIONS_ENV: &str = "VENUEGRAPH_ABBREVIATIONS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Abbreviation cache used by `normalize` when `--cache` is not given.
    pub abbreviation_cache: Option<PathBuf>,
    pub default_cutoff: f64,
    pub default_max_links: usize,
    /// `EnvFilter` directives used when neither `-v` nor `RUST_LOG` is set.
    pub log_filter: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            abbreviation_cache: None,
            default_cutoff: 0.0,
            default_max_links: 2,
            log_filter: None,
        }
    }
}

impl CliConfig {
    /// Load from `--config` or `$VENUEGRAPH_CONFIG`, then apply
    /// `$VENUEGRAPH_ABBREVIATIONS`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve(
            explicit,
            std::env::var_os(CONFIG_ENV),
            std::env::var_os(ABBREVIATIONS_ENV),
        )
    }

    fn resolve(
        explicit: Option<&Path>,
        config_env: Option<OsString>,
        abbreviations_env: Option<OsString>,
    ) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| config_env.map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(cache) = abbreviations_env {
            config.abbreviation_cache = Some(PathBuf::from(cache));
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_source() {
        let config = CliConfig::resolve(None, None, None).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.default_max_links, 2);
    }

    #[test]
    fn file_then_environment_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venuegraph.json");
        fs::write(
            &path,
            r#"{"abbreviation_cache": "from-file.json", "default_cutoff": 0.1}"#,
        )
        .unwrap();

        let config = CliConfig::resolve(None, Some(path.clone().into()), None).unwrap();
        assert_eq!(config.default_cutoff, 0.1);
        assert_eq!(config.default_max_links, 2);
        assert_eq!(config.abbreviation_cache, Some(PathBuf::from("from-file.json")));

        let config =
            CliConfig::resolve(Some(&path), None, Some(OsString::from("env.json"))).unwrap();
        assert_eq!(config.abbreviation_cache, Some(PathBuf::from("env.json")));
    }

    #[test]
    fn unknown_fields_and_missing_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"cutoff": 0.5}"#).unwrap();
        assert!(CliConfig::resolve(Some(&path), None, None).is_err());
        assert!(CliConfig::resolve(Some(&dir.path().join("none.json")), None, None).is_err());
    }
}
