//! Terminal output for git-release.
//!
//! Diagnostics go through `tracing`; this module is for what the user is
//! meant to read.

mod formatter;

pub use formatter::*;
