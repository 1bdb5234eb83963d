//! Probe strategies, one per tree shape.
//!
//! Each probe inspects a directory and answers with a [`Signal`], with
//! `Ok(None)` when its tree shape does not apply, or with an error when it
//! found a signal that cannot be trusted. Probes never write.

use std::path::Path;

use tracing::{debug, instrument};

use crate::core::dirname::parse_dir_name;
use crate::core::facts::{Baseline, RawVersionFacts, ReleaseTag, Signal};
use crate::error::ResolveError;
use crate::io::archival::read_archival;
use crate::io::config::PkgverConfig;
use crate::io::frozen::read_frozen;
use crate::io::history::{GitHistory, HistorySource, find_repo_root};

pub trait Probe {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn probe(&self, dir: &Path, config: &PkgverConfig) -> Result<Option<Signal>, ResolveError>;
}

/// Probes in priority order: live history, frozen metadata, archive
/// descriptor, directory name.
pub fn default_probes() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(HistoryProbe::new(GitHistory)),
        Box::new(FrozenProbe),
        Box::new(ArchiveProbe),
        Box::new(DirectoryNameProbe),
    ]
}

/// Live checkout: query history when `.git` is reachable.
#[derive(Debug, Clone)]
pub struct HistoryProbe<S> {
    source: S,
}

impl<S: HistorySource> HistoryProbe<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: HistorySource> Probe for HistoryProbe<S> {
    fn name(&self) -> &'static str {
        "history"
    }

    #[instrument(skip_all, fields(dir = %dir.display()))]
    fn probe(&self, dir: &Path, config: &PkgverConfig) -> Result<Option<Signal>, ResolveError> {
        let Some(root) = find_repo_root(dir, config.search_parent_directories) else {
            return Ok(None);
        };
        debug!(root = %root.display(), "history metadata found");
        let Some(snapshot) = self.source.query(dir, &config.tag_prefix)? else {
            return Ok(None);
        };
        let baseline = match snapshot.tag {
            Some(name) => Baseline::Tagged(ReleaseTag::parse(&name, &config.tag_prefix)?),
            None => Baseline::Untagged,
        };
        Ok(Some(Signal::History(RawVersionFacts {
            baseline,
            distance: snapshot.distance,
            is_dirty: snapshot.dirty,
            short_id: Some(snapshot.short_id),
        })))
    }
}

/// Unpacked artifact carrying frozen metadata.
#[derive(Debug, Clone, Copy)]
pub struct FrozenProbe;

impl Probe for FrozenProbe {
    fn name(&self) -> &'static str {
        "frozen"
    }

    fn probe(&self, dir: &Path, config: &PkgverConfig) -> Result<Option<Signal>, ResolveError> {
        Ok(read_frozen(&dir.join(&config.frozen_file))?.map(Signal::Frozen))
    }
}

/// Tree exported by `git archive` with a substituted descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveProbe;

impl Probe for ArchiveProbe {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn probe(&self, dir: &Path, config: &PkgverConfig) -> Result<Option<Signal>, ResolveError> {
        Ok(read_archival(dir, &config.tag_prefix)?.map(Signal::Archive))
    }
}

/// Directory named `{project}-{version}`.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryNameProbe;

impl Probe for DirectoryNameProbe {
    fn name(&self) -> &'static str {
        "directory-name"
    }

    fn probe(&self, dir: &Path, config: &PkgverConfig) -> Result<Option<Signal>, ResolveError> {
        let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
            return Ok(None);
        };
        Ok(parse_dir_name(name, config.project_name.as_deref()).map(Signal::DirectoryName))
    }
}
