//! Archive descriptor written by `git archive` through `export-subst`.
//!
//! The checked-in file carries `$Format:...$` placeholders; an exported tree
//! carries the substituted commit id and ref names. Only a release tag among
//! the ref names is trustworthy: an archive has no history to count from.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::core::facts::{Baseline, RawVersionFacts, ReleaseTag};
use crate::error::ResolveError;

/// File name of the archive descriptor, relative to the project root.
pub const ARCHIVAL_FILE: &str = ".git_archival.txt";

/// Unsubstituted descriptor contents, as written into a project.
pub const ARCHIVAL_TEMPLATE: &str = include_str!("templates/git_archival.txt");

const SHORT_ID_LEN: usize = 7;

/// Read `ARCHIVAL_FILE` under `dir`.
///
/// `Ok(None)` when the file is absent, still unsubstituted, or names no
/// release tag.
pub fn read_archival(
    dir: &Path,
    tag_prefix: &str,
) -> Result<Option<RawVersionFacts>, ResolveError> {
    let path = dir.join(ARCHIVAL_FILE);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ResolveError::Io { path, source }),
    };
    parse_archival(&contents, tag_prefix)
}

/// Parse substituted descriptor contents.
pub fn parse_archival(
    contents: &str,
    tag_prefix: &str,
) -> Result<Option<RawVersionFacts>, ResolveError> {
    if contents.contains("$Format") {
        debug!("archive descriptor is not substituted");
        return Ok(None);
    }

    let mut node = None;
    let mut ref_names = "";
    for line in contents.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "node" => node = Some(value.trim()),
            "ref-names" => ref_names = value.trim(),
            _ => {}
        }
    }

    let mut best: Option<ReleaseTag> = None;
    for name in ref_names
        .split(',')
        .filter_map(|entry| entry.trim().strip_prefix("tag: "))
        .filter(|name| name.starts_with(tag_prefix))
    {
        let tag = ReleaseTag::parse(name, tag_prefix)?;
        if best.as_ref().is_none_or(|current| tag.version > current.version) {
            best = Some(tag);
        }
    }
    let Some(tag) = best else {
        debug!(ref_names, "archive descriptor names no release tag");
        return Ok(None);
    };

    let short_id = node
        .filter(|id| !id.is_empty())
        .map(|id| id.chars().take(SHORT_ID_LEN).collect());
    Ok(Some(RawVersionFacts {
        baseline: Baseline::Tagged(tag),
        distance: 0,
        is_dirty: false,
        short_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubstituted_template_is_not_a_signal() {
        assert_eq!(parse_archival(ARCHIVAL_TEMPLATE, "v").expect("parse"), None);
    }

    #[test]
    fn substituted_tag_becomes_exact_baseline() {
        let contents = "node: 1a2b3c4d5e6f\nref-names: HEAD -> master, tag: v1.0, origin/master\n";
        let facts = parse_archival(contents, "v").expect("parse").expect("facts");
        assert_eq!(facts.distance, 0);
        assert!(!facts.is_dirty);
        assert_eq!(facts.short_id.as_deref(), Some("1a2b3c4"));
        assert_eq!(facts.baseline.tag().map(|t| t.text.as_str()), Some("1.0"));
    }

    #[test]
    fn highest_release_tag_wins_and_foreign_tags_are_ignored() {
        let contents = "node: abc\nref-names: tag: v1.0, tag: nightly, tag: v1.0.1, tag: 2.0\n";
        let facts = parse_archival(contents, "v").expect("parse").expect("facts");
        assert_eq!(facts.baseline.tag().map(|t| t.text.as_str()), Some("1.0.1"));
    }

    #[test]
    fn no_release_tag_is_not_a_signal() {
        let contents = "node: abc\nref-names: HEAD -> master\n";
        assert_eq!(parse_archival(contents, "v").expect("parse"), None);
    }

    #[test]
    fn malformed_release_tag_is_reported() {
        let contents = "node: abc\nref-names: tag: vnext\n";
        assert!(matches!(
            parse_archival(contents, "v"),
            Err(ResolveError::MalformedTag { .. })
        ));
    }
}
