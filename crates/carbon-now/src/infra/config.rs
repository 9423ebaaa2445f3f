//! Configuration management utilities.
//!
//! Presets live in a JSON file mapping preset names to partial [`Settings`]. A file passed with
//! `--config` is strictly read-only; only the default file in the home directory is updated.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::home_dir;
use serde_json::{Map, Value};

use crate::infra::carbon::{DEFAULT_BASE_URL, Settings};

const DEFAULT_CONFIG_FILE: &str = ".carbon-now.json";
pub const LATEST_PRESET: &str = "latest-preset";

/// Whether the tool may write back to the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Persistent,
}

/// Preset table loaded from disk.
#[derive(Debug, Clone)]
pub struct Config {
    path: Option<PathBuf>,
    access: Access,
    presets: BTreeMap<String, Map<String, Value>>,
}

impl Config {
    /// Load the file given by `--config`, or the default file when `explicit` is `None`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(Some(path.to_path_buf()), Access::ReadOnly),
            None => Self::load_from(default_config_path(), Access::Persistent),
        }
    }

    fn load_from(path: Option<PathBuf>, access: Access) -> Result<Self> {
        let presets = match path.as_deref().filter(|path| path.exists()) {
            Some(existing) => read_presets(existing)?,
            None => {
                tracing::debug!(path = ?path, "config file absent, using defaults");
                BTreeMap::new()
            }
        };
        Ok(Self {
            path,
            access,
            presets,
        })
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn preset(&self, name: &str) -> Option<&Map<String, Value>> {
        self.presets.get(name)
    }

    /// Resolve settings: defaults, then the named preset, then inline overrides.
    pub fn resolve_settings(
        &self,
        preset: Option<&str>,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Settings> {
        let name = preset.unwrap_or(LATEST_PRESET);
        let mut settings = Settings::default();
        match self.preset(name) {
            Some(values) => settings = settings.merged_with(values)?,
            None if preset.is_some() => {
                tracing::warn!(preset = name, "preset not found, using default settings");
            }
            None => {}
        }
        if let Some(overrides) = overrides {
            settings = settings.merged_with(overrides)?;
        }
        Ok(settings)
    }

    /// Remember `settings` as the latest preset. A no-op for read-only files.
    pub fn save_latest(&mut self, settings: &Settings) -> Result<()> {
        if self.access == Access::ReadOnly {
            return Ok(());
        }
        let Some(path) = self.path.clone() else {
            tracing::debug!("no home directory, latest preset not saved");
            return Ok(());
        };

        let Value::Object(values) =
            serde_json::to_value(settings).context("failed to serialize settings")?
        else {
            return Ok(());
        };
        self.presets.insert(LATEST_PRESET.to_owned(), values);

        let data = serde_json::to_string_pretty(&self.presets)
            .context("failed to serialize config presets")?;
        write_atomic(&path, data.as_bytes())?;
        tracing::debug!(path = %path.display(), "saved latest preset");
        Ok(())
    }
}

/// Stage `data` next to `path` and rename it into place so readers never see a partial file.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".carbon-now-")
        .suffix(".json")
        .tempfile_in(dir)
        .with_context(|| format!("failed to stage config file in {}", dir.display()))?;
    staged
        .write_all(data)
        .context("failed to write staged config file")?;
    staged
        .persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn read_presets(path: &Path) -> Result<BTreeMap<String, Map<String, Value>>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse JSON config: {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

/// Environment overrides for collaborator locations.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub browser: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            base_url: non_empty_var("CARBON_NOW_URL"),
            browser: non_empty_var("CARBON_NOW_BROWSER").map(PathBuf::from),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
