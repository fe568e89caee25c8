//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use std::path::Path;

use crate::domain::errors::OrchestratorError;
use crate::domain::models::OrchestrationConfig;

/// Configuration loader for the orchestration workspace.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `docs/orchestration.config.json` (created by init)
    /// 3. Environment variables (`UXMAP_*` prefix, highest priority)
    ///
    /// A missing config file is fine; the defaults are complete.
    pub fn load(config_path: &Path) -> Result<OrchestrationConfig> {
        let config: OrchestrationConfig = Figment::new()
            .merge(Serialized::defaults(OrchestrationConfig::default()))
            .merge(Json::file(config_path))
            .merge(Env::prefixed("UXMAP_"))
            .extract()
            .context("Failed to extract orchestration configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &OrchestrationConfig) -> Result<(), OrchestratorError> {
        if config.roles.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "roles cannot be empty".to_string(),
            ));
        }
        if config.default_shard_size == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "defaultShardSize must be at least 1".to_string(),
            ));
        }
        if config.max_workers_per_round == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "maxWorkersPerRound must be at least 1".to_string(),
            ));
        }
        if config.stagnation_threshold == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "stagnationThreshold must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.minimum_confidence) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "minimumConfidence must be within 0..=1, got {}",
                config.minimum_confidence
            )));
        }
        if !(0.0..=100.0).contains(&config.target_route_coverage_pct) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "targetRouteCoveragePct must be within 0..=100, got {}",
                config.target_route_coverage_pct
            )));
        }
        if !(0.0..=100.0).contains(&config.target_feature_coverage_pct) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "targetFeatureCoveragePct must be within 0..=100, got {}",
                config.target_feature_coverage_pct
            )));
        }
        Ok(())
    }
}
