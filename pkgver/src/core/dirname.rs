//! Extract a version from a `{project}-{version}` directory name.

use super::facts::DirectoryVersion;
use super::pep440::Version;

/// Split `name` at the right-most hyphen whose suffix is a valid version.
///
/// Trying hyphens right to left lets hyphenated project names
/// (`my-proj-2.3.1`) and hyphenated versions (`proj-1.0-rc1`) both work.
/// When `expected_project` is given, the prefix must match it, ignoring case
/// and `-`/`_`/`.` differences.
pub fn parse_dir_name(name: &str, expected_project: Option<&str>) -> Option<DirectoryVersion> {
    for (idx, _) in name.rmatch_indices('-') {
        let (project, rest) = (&name[..idx], &name[idx + 1..]);
        if project.is_empty() || !rest.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if rest.parse::<Version>().is_err() {
            continue;
        }
        if let Some(expected) = expected_project
            && normalize_name(expected) != normalize_name(project)
        {
            continue;
        }
        return Some(DirectoryVersion {
            project: project.to_string(),
            version: rest.to_string(),
        });
    }
    None
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '_' | '.' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
