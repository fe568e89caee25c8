//! Pure orchestration logic: identity, validation, scheduling, merging,
//! coverage, and markdown projections. Nothing in this layer touches the
//! filesystem.

pub mod coverage;
pub mod fingerprint;
pub mod merge;
pub mod report;
pub mod scheduler;
pub mod validation;
