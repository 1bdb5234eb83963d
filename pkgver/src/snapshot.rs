//! Build-time snapshot: freeze the current version into an artifact.
//!
//! Resolving a history-less copy of the artifact later (frozen probe) returns
//! exactly the string captured here.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, instrument};

use crate::core::facts::RenderedVersion;
use crate::io::config::{CONFIG_FILE, PkgverConfig, write_config};
use crate::io::frozen::write_frozen;
use crate::resolve::Resolver;

/// Name written into frozen metadata when neither config nor directory gives one.
const UNKNOWN_PROJECT: &str = "UNKNOWN";

/// Resolve `source` and write its frozen metadata under `artifact_dir`.
///
/// `artifact_dir` is created only once the version is known and must not be
/// `source` itself: the live tree is never written to. A non-default
/// configuration is copied alongside so the artifact is read back with the
/// same `frozen_file`.
#[instrument(skip_all, fields(source = %source.display(), artifact = %artifact_dir.display()))]
pub fn snapshot(
    resolver: &Resolver,
    source: &Path,
    artifact_dir: &Path,
) -> Result<RenderedVersion> {
    let source = source
        .canonicalize()
        .with_context(|| format!("resolve source {}", source.display()))?;
    let rendered = resolver
        .resolve(&source)
        .with_context(|| format!("resolve version of {}", source.display()))?;

    fs::create_dir_all(artifact_dir)
        .with_context(|| format!("create artifact directory {}", artifact_dir.display()))?;
    let artifact_dir = artifact_dir
        .canonicalize()
        .with_context(|| format!("resolve artifact {}", artifact_dir.display()))?;
    if artifact_dir == source {
        bail!(
            "artifact directory {} is the source tree; snapshots go to a separate location",
            artifact_dir.display()
        );
    }

    let config = resolver.config();
    let name = project_name(resolver, &source);
    let path = artifact_dir.join(&config.frozen_file);
    write_frozen(&path, &name, &rendered.version)
        .with_context(|| format!("write frozen metadata {}", path.display()))?;
    if *config != PkgverConfig::default() {
        let config_path = artifact_dir.join(CONFIG_FILE);
        write_config(&config_path, config)
            .with_context(|| format!("write artifact config {}", config_path.display()))?;
    }
    info!(version = %rendered.version, path = %path.display(), "froze version");
    Ok(rendered)
}

fn project_name(resolver: &Resolver, source: &Path) -> String {
    if let Some(name) = &resolver.config().project_name {
        return name.clone();
    }
    source
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_PROJECT.to_string())
}
