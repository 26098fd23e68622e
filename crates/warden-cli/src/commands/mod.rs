//! CLI command implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod policies;
pub mod version;
