//! Version resolution from version-control history and distribution metadata.
//!
//! Given an arbitrary directory (live checkout, exported archive, unpacked
//! source distribution, plain copy) the engine deduces one version string and
//! a dirty flag. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (version grammar, rendering,
//!   directory-name parsing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (git subprocesses, metadata files,
//!   configuration). Isolated behind narrow interfaces.
//!
//! Orchestration modules ([`probe`], [`resolve`], [`snapshot`]) coordinate
//! core logic with I/O to implement CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod probe;
pub mod resolve;
pub mod snapshot;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::facts::{Origin, RenderedVersion};
pub use crate::error::{ResolveError, VersionUnknown};
pub use crate::resolve::{Resolver, resolve_dir};
