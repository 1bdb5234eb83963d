//! Test-only fixtures: throwaway git repositories and the tree shapes
//! derived from them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

use crate::io::archival::ARCHIVAL_FILE;
use crate::io::config::{CONFIG_FILE, PkgverConfig};
use crate::io::git::Git;
use crate::io::init::{InitOptions, init_project};

/// Git repository in a temporary directory, removed on drop.
///
/// The repository lives at `<tmp>/<name>`; exported trees are created as
/// siblings so they never see its `.git`.
pub struct TestRepo {
    temp: TempDir,
    root: PathBuf,
}

impl TestRepo {
    /// Initialize a repository with one commit of tracked files.
    pub fn new(name: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = temp.path().join(name);
        fs::create_dir(&root).with_context(|| format!("create {}", root.display()))?;
        let repo = Self { temp, root };

        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "user.name", "test"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.git(&["config", "tag.gpgsign", "false"])?;

        repo.write("README.md", "demo project\n")?;
        repo.write("src/demoapp/__init__.py", "")?;
        repo.git(&["add", "--all"])?;
        repo.git(&["commit", "--quiet", "-m", "initial commit"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Scratch directory next to the repository.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// Run git in the repository and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Git::new(&self.root).run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn head_short_sha(&self) -> Result<String> {
        Git::new(&self.root).head_short_sha()
    }

    /// Write `rel` under the repository root without staging it.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Write and commit a single file.
    pub fn commit_file(&self, rel: &str, contents: &str, message: &str) -> Result<()> {
        self.write(rel, contents)?;
        self.git(&["add", rel])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Add an empty commit.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message])?;
        Ok(())
    }

    /// Create an annotated tag on HEAD.
    pub fn tag(&self, name: &str) -> Result<()> {
        self.git(&["tag", "-a", name, "-m", name])?;
        Ok(())
    }

    /// Modify a tracked file without committing.
    pub fn make_dirty(&self) -> Result<()> {
        let path = self.root.join("README.md");
        let mut contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        contents.push_str("uncommitted change\n");
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Delete `.git`, leaving a plain copy of the working tree in place.
    pub fn remove_history(&self) -> Result<()> {
        let control = self.root.join(".git");
        fs::remove_dir_all(&control).with_context(|| format!("remove {}", control.display()))
    }

    /// Copy tracked files into a sibling directory named `dest_name`.
    pub fn export_tree(&self, dest_name: &str) -> Result<PathBuf> {
        let dest = self.scratch(dest_name);
        fs::create_dir_all(&dest).with_context(|| format!("create {}", dest.display()))?;
        for rel in self.git(&["ls-files"])?.lines() {
            let from = self.root.join(rel);
            let to = dest.join(rel);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::copy(&from, &to)
                .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
        }
        Ok(dest)
    }

    /// Commit the files written by `pkgver init`.
    pub fn enable_archival(&self) -> Result<()> {
        init_project(
            &self.root,
            &PkgverConfig::default(),
            &InitOptions { force: false },
        )?;
        self.git(&["add", ARCHIVAL_FILE, ".gitattributes", CONFIG_FILE])?;
        self.git(&["commit", "--quiet", "-m", "enable archive versions"])?;
        Ok(())
    }

    /// Unpack `git archive HEAD` into a sibling directory named `dest_name`.
    ///
    /// Placeholders are only substituted after [`TestRepo::enable_archival`].
    pub fn export_archive(&self, dest_name: &str) -> Result<PathBuf> {
        let dest = self.scratch(dest_name);
        fs::create_dir_all(&dest).with_context(|| format!("create {}", dest.display()))?;
        let tarball = self.scratch(&format!("{dest_name}.tar"));
        let tarball_arg = tarball
            .to_str()
            .with_context(|| format!("non-UTF-8 path {}", tarball.display()))?;
        self.git(&["archive", "--format=tar", "--output", tarball_arg, "HEAD"])?;

        let status = Command::new("tar")
            .arg("-xf")
            .arg(&tarball)
            .arg("-C")
            .arg(&dest)
            .status()
            .context("spawn tar")?;
        if !status.success() {
            bail!("tar -xf {} failed: {status}", tarball.display());
        }
        Ok(dest)
    }
}
