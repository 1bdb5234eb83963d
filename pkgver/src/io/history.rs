//! Control-metadata query interface.
//!
//! The engine only depends on the shape of a history snapshot; the git CLI is
//! one implementation of [`HistorySource`].

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::git::{Describe, Git};
use crate::error::ResolveError;

/// Name of the history metadata entry (directory, or file for worktrees).
pub const CONTROL_DIR: &str = ".git";

/// What the history tool reports about HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    /// Nearest reachable tag carrying the release prefix, unmodified.
    pub tag: Option<String>,
    /// Commits since `tag`, or all commits reachable from HEAD when untagged.
    pub distance: u32,
    pub short_id: String,
    /// Tracked files differ from HEAD.
    pub dirty: bool,
}

pub trait HistorySource {
    /// Query history for `dir`.
    ///
    /// `Ok(None)` means the repository exists but has nothing to count yet.
    fn query(&self, dir: &Path, tag_prefix: &str)
    -> Result<Option<HistorySnapshot>, ResolveError>;
}

/// [`HistorySource`] backed by the `git` command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHistory;

impl HistorySource for GitHistory {
    #[instrument(skip_all, fields(dir = %dir.display(), tag_prefix))]
    fn query(
        &self,
        dir: &Path,
        tag_prefix: &str,
    ) -> Result<Option<HistorySnapshot>, ResolveError> {
        let git = Git::new(dir);
        let has_head = git
            .has_head()
            .map_err(|err| ResolveError::history_failed("git rev-parse HEAD", &err))?;
        if !has_head {
            return Ok(None);
        }

        let describe = git
            .describe(tag_prefix)
            .map_err(|err| ResolveError::history_failed("git describe", &err))?;
        let (tag, distance, short_id) = match describe {
            Describe::Tagged { tag, distance, sha } => (Some(tag), distance, sha),
            Describe::Untagged { sha } => {
                let count = git
                    .count_commits()
                    .map_err(|err| ResolveError::history_failed("git rev-list --count", &err))?;
                (None, count, sha)
            }
        };

        let dirty = git
            .has_tracked_changes()
            .map_err(|err| ResolveError::history_failed("git status", &err))?;
        debug!(dirty, "checked tracked files");

        Ok(Some(HistorySnapshot {
            tag,
            distance,
            short_id,
            dirty,
        }))
    }
}

/// Locate the directory holding history metadata for `dir`.
///
/// Returns `dir` itself or, when `search_parents` is set, the nearest
/// ancestor containing a [`CONTROL_DIR`] entry.
pub fn find_repo_root(dir: &Path, search_parents: bool) -> Option<PathBuf> {
    if dir.join(CONTROL_DIR).exists() {
        return Some(dir.to_path_buf());
    }
    if !search_parents {
        return None;
    }
    dir.ancestors()
        .skip(1)
        .find(|ancestor| ancestor.join(CONTROL_DIR).exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn finds_control_dir_in_ancestor() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join(CONTROL_DIR)).expect("mkdir .git");
        let nested = temp.path().join("src").join("pkg");
        fs::create_dir_all(&nested).expect("mkdir nested");

        assert_eq!(
            find_repo_root(&nested, true),
            Some(temp.path().to_path_buf())
        );
        assert_eq!(find_repo_root(&nested, false), None);
        assert_eq!(
            find_repo_root(temp.path(), false),
            Some(temp.path().to_path_buf())
        );
    }
}
