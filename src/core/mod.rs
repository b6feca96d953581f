//! Shared engine plumbing: configuration and error types.
//!
//! Nothing in here touches pixels; the drawing modules depend on it, not the
//! other way around.

pub mod config;
pub mod errors;
