//! CLI command implementations.

pub mod package;
pub mod push;
pub mod serve;
