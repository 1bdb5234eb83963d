//! Error taxonomy for version resolution.
//!
//! Probes distinguish "no signal here" (a normal outcome, `Ok(None)`) from a
//! signal that was found but cannot be trusted. Everything that can go wrong
//! while trusting a signal is a [`ResolveError`]; the orchestrator wraps the
//! most specific cause into a single [`VersionUnknown`].

use std::path::PathBuf;

use thiserror::Error;

/// Why a version could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No probe strategy recognized the directory.
    #[error("no version signal found in {}", dir.display())]
    NoSignalFound { dir: PathBuf },

    /// A release tag was found but does not satisfy the version grammar.
    #[error("malformed release tag '{tag}': {reason}")]
    MalformedTag { tag: String, reason: String },

    /// A frozen metadata file exists but its version is unusable.
    #[error("frozen version metadata {} is corrupt: {reason}", path.display())]
    FrozenMetadataCorrupt { path: PathBuf, reason: String },

    /// The history tool is present but one of its queries failed.
    #[error("history query `{command}` failed: {detail}")]
    HistoryQueryFailed { command: String, detail: String },

    /// A found signal could not be read from disk.
    #[error("read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ResolveError {
    pub fn malformed_tag(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTag {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    pub fn frozen_corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FrozenMetadataCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an `anyhow` failure from the git adapter, keeping its full chain.
    pub fn history_failed(command: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::HistoryQueryFailed {
            command: command.into(),
            detail: format!("{err:#}"),
        }
    }

    /// Stable short label for diagnostics and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSignalFound { .. } => "no-signal-found",
            Self::MalformedTag { .. } => "malformed-tag",
            Self::FrozenMetadataCorrupt { .. } => "frozen-metadata-corrupt",
            Self::HistoryQueryFailed { .. } => "history-query-failed",
            Self::Io { .. } => "io",
            Self::Config(_) => "config",
        }
    }
}

/// The single failure exposed by [`crate::resolve::Resolver::resolve`].
#[derive(Debug, Error)]
#[error("version unknown")]
pub struct VersionUnknown {
    #[source]
    pub cause: ResolveError,
}

impl VersionUnknown {
    /// True when nothing was recognized (as opposed to a broken signal).
    pub fn is_no_signal(&self) -> bool {
        matches!(self.cause, ResolveError::NoSignalFound { .. })
    }
}

impl From<ResolveError> for VersionUnknown {
    fn from(cause: ResolveError) -> Self {
        Self { cause }
    }
}
