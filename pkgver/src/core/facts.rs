//! Shared deterministic types for version resolution.
//!
//! These types carry what a probe observed and what the engine reports. They
//! never touch the filesystem and are rebuilt on every resolution.

use std::path::PathBuf;

use serde::Serialize;

use super::pep440::Version;
use crate::error::ResolveError;

/// A release tag whose prefix matched and whose remainder is a valid version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    /// Tag name as stored in history (e.g. `v1.0`).
    pub name: String,
    /// Tag name with the prefix stripped, kept verbatim (e.g. `1.0`).
    pub text: String,
    pub version: Version,
}

impl ReleaseTag {
    /// Strip `prefix` from `name` and validate the rest.
    ///
    /// Callers only pass tags that already carry the prefix; a missing prefix
    /// here is still reported rather than silently accepted.
    pub fn parse(name: &str, prefix: &str) -> Result<Self, ResolveError> {
        let text = name.strip_prefix(prefix).ok_or_else(|| {
            ResolveError::malformed_tag(name, format!("missing release prefix '{prefix}'"))
        })?;
        let version: Version = text
            .parse()
            .map_err(|err| ResolveError::malformed_tag(name, format!("{err}")))?;
        if version.is_local() {
            return Err(ResolveError::malformed_tag(
                name,
                "release tags must not carry a local segment",
            ));
        }
        Ok(Self {
            name: name.to_string(),
            text: text.to_string(),
            version,
        })
    }
}

/// What the rendered version is counted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    Tagged(ReleaseTag),
    /// No release tag is reachable. Distinct from a real `0.0` tag even though
    /// both render with the bootstrap baseline.
    Untagged,
}

impl Baseline {
    pub fn tag(&self) -> Option<&ReleaseTag> {
        match self {
            Baseline::Tagged(tag) => Some(tag),
            Baseline::Untagged => None,
        }
    }
}

/// Raw facts extracted from history (or a substituted archive descriptor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVersionFacts {
    pub baseline: Baseline,
    /// Commits since the baseline tag, or since (and including) the root
    /// commit when untagged.
    pub distance: u32,
    /// Tracked files differ from the last commit. Always false without history.
    pub is_dirty: bool,
    pub short_id: Option<String>,
}

impl RawVersionFacts {
    /// Sitting exactly on the baseline.
    pub fn is_exact(&self) -> bool {
        self.distance == 0
    }
}

/// Version text baked into an artifact at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenVersion {
    pub text: String,
    pub path: PathBuf,
}

/// Version encoded in an unpacked distribution's directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryVersion {
    pub project: String,
    pub version: String,
}

/// A probe's positive answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    History(RawVersionFacts),
    Archive(RawVersionFacts),
    Frozen(FrozenVersion),
    DirectoryName(DirectoryVersion),
}

/// Which signal produced a rendered version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum Origin {
    History {
        /// `None` when no release tag was reachable.
        tag: Option<String>,
        distance: u32,
        short_id: Option<String>,
    },
    Archive {
        tag: Option<String>,
        short_id: Option<String>,
    },
    Frozen {
        path: PathBuf,
    },
    DirectoryName {
        project: String,
    },
}

/// The engine's answer for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedVersion {
    pub version: String,
    pub dirty: bool,
    pub origin: Origin,
}
