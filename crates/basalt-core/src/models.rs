//! Domain models for basalt.
//!
//! These are the core types shared across all crates.

pub mod credential;
pub mod tenant;
