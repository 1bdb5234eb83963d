//! Render raw version facts into a version string.
//!
//! Public part:
//! - on the tag: the tag text exactly
//! - `d` commits past the tag: `<base>.post<p>.dev<d>`, which sorts after the
//!   tag and before any later release
//! - no tag: the bootstrap baseline `0.0` stands in for the tag
//!
//! Local part (see [`LocalScheme`]) marks dirty trees and, off-tag, the commit.

use serde::{Deserialize, Serialize};

use super::facts::{Baseline, RawVersionFacts};
use super::pep440::{LocalSegment, Version};
use crate::error::ResolveError;

/// Public version used when no release tag has ever been reachable.
pub const BOOTSTRAP_BASELINE: &str = "0.0";

/// Literal placed in the local segment of dirty builds.
pub const DIRTY_MARKER: &str = "dirty";

/// How the local version segment is composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalScheme {
    /// `+g<id>` off-tag, `.dirty` appended when dirty, `+dirty` on a dirty tag.
    #[default]
    NodeAndDirty,
    /// `+dirty` when dirty, nothing otherwise.
    DirtyTag,
}

/// Render `facts` into a version string.
///
/// Fails only when the baseline tag cannot be extended into a valid version.
pub fn render(facts: &RawVersionFacts, scheme: LocalScheme) -> Result<String, ResolveError> {
    let public = render_public(facts)?;
    let rendered = match render_local(facts, scheme) {
        Some(local) => format!("{public}+{local}"),
        None => public,
    };
    if let Err(err) = rendered.parse::<Version>() {
        let tag = facts
            .baseline
            .tag()
            .map(|tag| tag.name.clone())
            .unwrap_or_default();
        return Err(ResolveError::malformed_tag(
            tag,
            format!("rendered version is invalid: {err}"),
        ));
    }
    Ok(rendered)
}

fn render_public(facts: &RawVersionFacts) -> Result<String, ResolveError> {
    let tag = match &facts.baseline {
        Baseline::Untagged if facts.is_exact() => return Ok(BOOTSTRAP_BASELINE.to_string()),
        Baseline::Untagged => {
            return Ok(format!("{BOOTSTRAP_BASELINE}.post0.dev{}", facts.distance));
        }
        Baseline::Tagged(tag) => tag,
    };
    if facts.is_exact() {
        return Ok(tag.text.clone());
    }

    let version = &tag.version;
    match version.dev() {
        None | Some(0) => {}
        Some(n) => {
            return Err(ResolveError::malformed_tag(
                &tag.name,
                format!("tag carries its own dev number ({n}); only .dev0 can be extended"),
            ));
        }
    }
    let post = version.post().map(|n| n + 1).unwrap_or(0);
    Ok(format!(
        "{}.post{post}.dev{}",
        version.base(),
        facts.distance
    ))
}

fn render_local(facts: &RawVersionFacts, scheme: LocalScheme) -> Option<String> {
    match scheme {
        LocalScheme::DirtyTag => facts.is_dirty.then(|| DIRTY_MARKER.to_string()),
        LocalScheme::NodeAndDirty => {
            let node = if facts.is_exact() {
                None
            } else {
                facts.short_id.as_deref().map(node_label)
            };
            match (node, facts.is_dirty) {
                (Some(node), true) => Some(format!("{node}.{DIRTY_MARKER}")),
                (Some(node), false) => Some(node),
                (None, true) => Some(DIRTY_MARKER.to_string()),
                (None, false) => None,
            }
        }
    }
}

fn node_label(short_id: &str) -> String {
    format!("g{}", short_id.to_ascii_lowercase())
}

/// True when `version` was rendered from a dirty tree: its local segment ends
/// with [`DIRTY_MARKER`].
pub fn is_dirty_version(version: &str) -> bool {
    version.parse::<Version>().is_ok_and(|parsed| {
        matches!(parsed.local().last(), Some(LocalSegment::Alpha(part)) if part == DIRTY_MARKER)
    })
}
