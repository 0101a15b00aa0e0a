//! CLI command implementations.

pub mod classify;
pub mod common;
pub mod evaluate;
pub mod version;
