//! Project configuration stored in `pkgver.toml` at the project root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::frozen::DEFAULT_FROZEN_FILE;
use crate::core::render::LocalScheme;

/// File name looked up in the inspected directory.
pub const CONFIG_FILE: &str = "pkgver.toml";

/// Version resolution configuration (TOML).
///
/// This file is intended to be edited by humans. Snapshots copy a non-default
/// configuration into the artifact, so an unpacked artifact resolves with the
/// same settings. Missing fields default to the conventional values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PkgverConfig {
    /// Prefix that marks a tag as a release (stripped before use).
    pub tag_prefix: String,

    pub local_scheme: LocalScheme,

    /// Frozen metadata path, relative to an artifact root.
    pub frozen_file: PathBuf,

    /// Project name written into frozen metadata and required as the
    /// directory-name prefix when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Look for history metadata in ancestors of the inspected directory.
    pub search_parent_directories: bool,
}

impl Default for PkgverConfig {
    fn default() -> Self {
        Self {
            tag_prefix: "v".to_string(),
            local_scheme: LocalScheme::default(),
            frozen_file: PathBuf::from(DEFAULT_FROZEN_FILE),
            project_name: None,
            search_parent_directories: true,
        }
    }
}

impl PkgverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tag_prefix.chars().any(|c| c.is_whitespace() || c == '*') {
            return Err(anyhow!("tag_prefix must not contain whitespace or '*'"));
        }
        if self.frozen_file.as_os_str().is_empty() {
            return Err(anyhow!("frozen_file must be a non-empty path"));
        }
        if !self
            .frozen_file
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(anyhow!(
                "frozen_file must be a relative path without '..' ({})",
                self.frozen_file.display()
            ));
        }
        if let Some(name) = &self.project_name
            && name.trim().is_empty()
        {
            return Err(anyhow!("project_name must not be empty when set"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PkgverConfig::default()`.
pub fn load_config(path: &Path) -> Result<PkgverConfig> {
    if !path.exists() {
        let cfg = PkgverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PkgverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Load the configuration governing `dir`.
///
/// `explicit` (from `--config`) wins over `<dir>/pkgver.toml`.
pub fn load_project_config(dir: &Path, explicit: Option<&Path>) -> Result<PkgverConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => load_config(&dir.join(CONFIG_FILE)),
    }
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PkgverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
