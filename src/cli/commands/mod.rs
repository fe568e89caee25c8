//! CLI command implementations.

pub mod init;
pub mod merge;
pub mod prepare;
pub mod status;
