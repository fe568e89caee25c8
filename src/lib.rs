//! UX-Map - Journey and feature discovery orchestrator
//!
//! UX-Map coordinates rounds of external subagent workers that explore a web
//! application's user journeys and feature-level interactions. The
//! orchestrator schedules frontier items into worker tasks, then validates,
//! deduplicates, and merges the workers' JSON findings into append-only
//! journey and feature maps with coverage tracking and completion gates.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Pure data model and error types
//! - **Service Layer** (`services`): Scheduling, validation, merge, coverage
//! - **Infrastructure Layer** (`infrastructure`): Filesystem workspace and
//!   configuration loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! All durable state lives as JSON documents under `docs/`; the orchestrator
//! is single-threaded and synchronous, with the pending-round marker as its
//! only cross-invocation coordination primitive.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{OrchestratorError, OrchestratorResult};
pub use domain::models::{
    AcceptedFeature, AcceptedJourney, CompletionGates, FeatureMap, FrontierFile, JourneyMap,
    OrchestrationConfig, OrchestrationState, RoundManifest, WorkerTask,
};
pub use infrastructure::config::ConfigLoader;
pub use infrastructure::workspace::Workspace;
