//! Frozen version metadata baked into distribution artifacts.
//!
//! The file uses core-metadata header syntax (`Key: value` lines up to the
//! first blank line). Only the `Version` header matters here and its value is
//! returned exactly as written.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::facts::FrozenVersion;
use crate::core::pep440::Version;
use crate::error::ResolveError;

/// Conventional frozen metadata location, relative to the artifact root.
pub const DEFAULT_FROZEN_FILE: &str = "PKG-INFO";

const PKG_INFO_TEMPLATE: &str = include_str!("templates/PKG-INFO.j2");

/// Read the frozen version at `path`.
///
/// A missing file is not an error (`Ok(None)`); a file whose version header is
/// missing, duplicated or invalid is [`ResolveError::FrozenMetadataCorrupt`].
pub fn read_frozen(path: &Path) -> Result<Option<FrozenVersion>, ResolveError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ResolveError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let text = parse_version_header(&contents)
        .map_err(|reason| ResolveError::frozen_corrupt(path, reason))?;
    debug!(path = %path.display(), version = %text, "read frozen version");
    Ok(Some(FrozenVersion {
        text,
        path: path.to_path_buf(),
    }))
}

/// Write a frozen metadata file declaring `name` at `version`.
pub fn write_frozen(path: &Path, name: &str, version: &str) -> Result<()> {
    version
        .parse::<Version>()
        .with_context(|| format!("refuse to freeze invalid version '{version}'"))?;
    if name.trim().is_empty() || name.contains(['\n', '\r']) {
        return Err(anyhow!("invalid project name for frozen metadata: '{name}'"));
    }
    let contents = render_pkg_info(name, version)?;
    write_atomic(path, &contents)
}

fn render_pkg_info(name: &str, version: &str) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("PKG-INFO", PKG_INFO_TEMPLATE)
        .context("load PKG-INFO template")?;
    let mut rendered = env
        .get_template("PKG-INFO")?
        .render(context! { name, version })
        .context("render PKG-INFO")?;
    rendered.push('\n');
    Ok(rendered)
}

fn parse_version_header(contents: &str) -> std::result::Result<String, String> {
    let mut found: Option<String> = None;
    for line in contents.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("version") {
            continue;
        }
        if found.is_some() {
            return Err("multiple Version headers".to_string());
        }
        found = Some(value.trim().to_string());
    }
    let text = found.ok_or_else(|| "missing Version header".to_string())?;
    text.parse::<Version>().map_err(|err| err.to_string())?;
    Ok(text)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp metadata {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace metadata {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_a_signal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let read = read_frozen(&temp.path().join(DEFAULT_FROZEN_FILE)).expect("read");
        assert_eq!(read, None);
    }

    #[test]
    fn written_version_reads_back_verbatim() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_FROZEN_FILE);
        write_frozen(&path, "demoapp", "0.0.post0.dev1+g1a2b3c4.dirty").expect("write");

        let contents = fs::read_to_string(&path).expect("read raw");
        assert_eq!(
            contents,
            "Metadata-Version: 2.1\nName: demoapp\nVersion: 0.0.post0.dev1+g1a2b3c4.dirty\n"
        );
        let frozen = read_frozen(&path).expect("read").expect("present");
        assert_eq!(frozen.text, "0.0.post0.dev1+g1a2b3c4.dirty");
    }

    #[test]
    fn version_is_not_normalized_on_read() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_FROZEN_FILE);
        fs::write(&path, "Metadata-Version: 1.1\nName: x\nversion: 1.0-RC1\n\nbody\n")
            .expect("write");
        let frozen = read_frozen(&path).expect("read").expect("present");
        assert_eq!(frozen.text, "1.0-RC1");
    }

    #[test]
    fn corrupt_metadata_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_FROZEN_FILE);
        for contents in [
            "Name: x\n",
            "Name: x\nVersion: not-a-version\n",
            "Version: 1.0\nVersion: 1.1\n",
            "Name: x\n\nVersion: 1.0\n",
        ] {
            fs::write(&path, contents).expect("write");
            let err = read_frozen(&path).expect_err("corrupt");
            assert!(
                matches!(err, ResolveError::FrozenMetadataCorrupt { .. }),
                "{contents:?} gave {err}"
            );
        }
    }

    #[test]
    fn refuses_to_freeze_invalid_version() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_FROZEN_FILE);
        assert!(write_frozen(&path, "demoapp", "unknown").is_err());
        assert!(!path.exists());
    }
}
