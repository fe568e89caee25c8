//! Filesystem and configuration plumbing.

pub mod config;
pub mod workspace;
