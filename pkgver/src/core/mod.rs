//! Deterministic, pure logic for version resolution.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! facts and return deterministic outputs suitable for tests.

pub mod dirname;
pub mod facts;
pub mod pep440;
pub mod render;
