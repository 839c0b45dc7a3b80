//! Shared utilities.
//!
//! Filesystem helpers used between build steps and content hashing for
//! release descriptors.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
