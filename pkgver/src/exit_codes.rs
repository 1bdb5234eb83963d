//! Stable exit codes for pkgver CLI commands.

/// Command succeeded (version resolved, files written).
pub const OK: i32 = 0;
/// Command failed: broken signal, invalid config, or other errors.
pub const INVALID: i32 = 1;
/// No probe recognized the directory; the version is unknown.
pub const UNKNOWN: i32 = 2;
