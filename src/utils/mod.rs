//! Shared utilities.
//!
//! - [`tracing`]: security/audit event macros and span helpers

pub mod tracing;
