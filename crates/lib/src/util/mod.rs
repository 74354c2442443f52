//! Shared utilities.
//!
//! Common utilities used across the crate: fingerprinting and atomic file writes.

pub mod fs;
pub mod hash;
