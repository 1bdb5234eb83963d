//! Git adapter for history queries.
//!
//! Version resolution only ever reads history, so this is a small, explicit
//! wrapper around read-only `git` subprocess calls.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use tracing::{debug, instrument};

static DESCRIBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<tag>.+)-(?P<distance>[0-9]+)-g(?P<sha>[0-9a-f]+)$")
        .expect("describe regex should compile")
});

/// Parsed `git describe --tags --long --always` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Describe {
    Tagged {
        tag: String,
        distance: u32,
        sha: String,
    },
    /// No matching tag is reachable; only the abbreviated HEAD id.
    Untagged { sha: String },
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// True once the repository has at least one commit.
    pub fn has_head(&self) -> Result<bool> {
        let output = self.run(&["rev-parse", "--verify", "--quiet", "HEAD"])?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            debug!("repository has no commits yet");
            return Ok(false);
        }
        Err(anyhow!("git rev-parse HEAD failed: {}", stderr.trim()))
    }

    /// Describe HEAD relative to the nearest tag starting with `prefix`.
    ///
    /// Tags without the prefix are skipped by the search itself.
    #[instrument(skip_all, fields(prefix))]
    pub fn describe(&self, prefix: &str) -> Result<Describe> {
        let pattern = format!("{prefix}*");
        let out = self.run_capture(&[
            "describe", "--tags", "--long", "--always", "--match", &pattern, "HEAD",
        ])?;
        let describe = parse_describe(out.trim())?;
        debug!(?describe, "described HEAD");
        Ok(describe)
    }

    /// Number of commits reachable from HEAD.
    pub fn count_commits(&self) -> Result<u32> {
        let out = self.run_capture(&["rev-list", "--count", "HEAD"])?;
        out.trim()
            .parse()
            .with_context(|| format!("parse commit count '{}'", out.trim()))
    }

    /// Return the current HEAD short SHA (stable given repo state).
    pub fn head_short_sha(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--short", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    /// True when tracked files differ from HEAD (index or worktree).
    ///
    /// Untracked files are ignored.
    pub fn has_tracked_changes(&self) -> Result<bool> {
        let out = self.run_capture(&["status", "--porcelain=v1", "--untracked-files=no"])?;
        Ok(!out.trim().is_empty())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub(crate) fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

fn parse_describe(out: &str) -> Result<Describe> {
    if let Some(caps) = DESCRIBE_RE.captures(out) {
        let distance = caps["distance"]
            .parse()
            .with_context(|| format!("parse describe distance in '{out}'"))?;
        return Ok(Describe::Tagged {
            tag: caps["tag"].to_string(),
            distance,
            sha: caps["sha"].to_string(),
        });
    }
    if !out.is_empty() && out.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(Describe::Untagged {
            sha: out.to_string(),
        });
    }
    Err(anyhow!("unexpected describe output: '{out}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;

    #[test]
    fn tracked_changes_ignore_untracked_files() {
        let repo = TestRepo::new("demoapp").expect("repo");
        let git = Git::new(repo.path());
        assert!(!git.has_tracked_changes().expect("status"));

        repo.write("scratch.txt", "untracked\n").expect("write");
        assert!(!git.has_tracked_changes().expect("status"));

        repo.make_dirty().expect("dirty");
        assert!(git.has_tracked_changes().expect("status"));
    }

    #[test]
    fn parses_tagged_describe() {
        assert_eq!(
            parse_describe("v1.0-3-g1a2b3c4").expect("parse"),
            Describe::Tagged {
                tag: "v1.0".to_string(),
                distance: 3,
                sha: "1a2b3c4".to_string()
            }
        );
    }

    #[test]
    fn tag_names_may_contain_hyphens() {
        assert_eq!(
            parse_describe("v1.0-rc1-0-gabcdef0").expect("parse"),
            Describe::Tagged {
                tag: "v1.0-rc1".to_string(),
                distance: 0,
                sha: "abcdef0".to_string()
            }
        );
    }

    #[test]
    fn bare_sha_means_untagged() {
        assert_eq!(
            parse_describe("abcdef0").expect("parse"),
            Describe::Untagged {
                sha: "abcdef0".to_string()
            }
        );
    }

    #[test]
    fn garbage_describe_is_an_error() {
        assert!(parse_describe("").is_err());
        assert!(parse_describe("fatal: nope").is_err());
    }
}
