//! Initialization helpers for the version-support files of a project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::archival::{ARCHIVAL_FILE, ARCHIVAL_TEMPLATE};
use super::config::{CONFIG_FILE, PkgverConfig, write_config};

/// Line that makes `git archive` substitute the descriptor placeholders.
pub const EXPORT_SUBST_LINE: &str = ".git_archival.txt export-subst";

/// All paths `init_project` touches for a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub archival_path: PathBuf,
    pub gitattributes_path: PathBuf,
    pub config_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            archival_path: root.join(ARCHIVAL_FILE),
            gitattributes_path: root.join(".gitattributes"),
            config_path: root.join(CONFIG_FILE),
            root,
        }
    }
}

/// Options for `init_project`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing version-support files.
    pub force: bool,
}

/// Write the archive descriptor, its `export-subst` attribute and a config.
///
/// Fails if the descriptor or config already exist unless `options.force` is
/// set. `.gitattributes` is only ever appended to.
pub fn init_project(
    root: &Path,
    config: &PkgverConfig,
    options: &InitOptions,
) -> Result<ProjectPaths> {
    let paths = ProjectPaths::new(root);
    if !paths.root.is_dir() {
        return Err(anyhow!(
            "pkgver init: {} is not a directory",
            paths.root.display()
        ));
    }
    for existing in [&paths.archival_path, &paths.config_path] {
        if existing.exists() && !options.force {
            return Err(anyhow!(
                "pkgver init: {} already exists (use --force to overwrite)",
                existing.display()
            ));
        }
    }

    write_file(&paths.archival_path, ARCHIVAL_TEMPLATE)?;
    ensure_export_subst(&paths.gitattributes_path)?;
    write_config(&paths.config_path, config)?;
    debug!(root = %paths.root.display(), "initialized version support files");
    Ok(paths)
}

fn ensure_export_subst(path: &Path) -> Result<()> {
    let mut contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    if contents.lines().any(|line| line.trim() == EXPORT_SUBST_LINE) {
        return Ok(());
    }
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(EXPORT_SUBST_LINE);
    contents.push('\n');
    write_file(path, &contents)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
