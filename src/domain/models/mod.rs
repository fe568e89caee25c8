//! Domain models.
//!
//! Everything here mirrors an on-disk JSON document (camelCase field names)
//! or an in-memory value derived from one.

pub mod audit;
pub mod candidate;
pub mod config;
pub mod coverage;
pub mod frontier;
pub mod map;
pub mod mode;
pub mod round;
pub mod state;

pub use audit::{AuditDecision, AuditRecord};
pub use candidate::{
    CandidateKind, DiscoveredItem, FeatureCandidate, FeatureEvidence, JourneyCandidate,
    JourneyEvidenceEntry, JourneyStep, StepEvidence, WorkerPayload,
};
pub use config::{ExpectedFeatureUnit, OrchestrationConfig};
pub use coverage::{
    CompletionGates, CoverageFile, CoverageHistoryEntry, FeatureCoverageSummary,
    JourneyCoverageSummary, RoleFeatureTally,
};
pub use frontier::{FeatureFrontierItem, FrontierFile, JourneyFrontierItem};
pub use map::{AcceptedFeature, AcceptedJourney, FeatureMap, JourneyMap};
pub use mode::{AgentType, FeatureMode, JourneyMode};
pub use round::{
    round_slug, ManifestMergeSummary, ManifestTask, RoundManifest, RoundStatus, TaskItems,
    WorkerTask,
};
pub use state::{OrchestrationState, RoundHistoryEntry};
