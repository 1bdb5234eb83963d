//! I/O adapters for version resolution: history, artifact metadata, config.

pub mod archival;
pub mod config;
pub mod frozen;
pub mod git;
pub mod history;
pub mod init;
