use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::info;

use crate::error::EngineResult;
use crate::scoring::{ScoringWeights, VotingWeights};
use crate::selection::check_epoch_interval;
use crate::slashing::SlashingParams;
use crate::voting::VotingParams;

/// Configuration for the incentive engine and its operator binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Validator merit weights
    pub scoring: ScoringWeights,
    /// Governance voting parameters
    pub voting: VotingParams,
    /// Slashing bounds and appeal policy
    pub slashing: SlashingParams,
    /// Epoch rotation
    pub epoch: EpochConfig,
    /// In-process audit trail
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochConfig {
    /// Minimum network time between epoch advances, in seconds
    pub interval_secs: u64,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Entries retained before the oldest are dropped
    pub max_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
        }
    }
}

/// Versioned snapshot of every governance-tunable parameter. The engine
/// swaps the whole struct on update and bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    pub version: u64,
    pub scoring: ScoringWeights,
    pub voting: VotingParams,
    pub slashing: SlashingParams,
    pub epoch_interval_secs: u64,
}

impl EngineParams {
    pub fn validate(&self) -> EngineResult<()> {
        self.scoring.validate()?;
        self.voting.validate()?;
        self.slashing.validate()?;
        check_epoch_interval(self.epoch_interval_secs)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineConfig::default().to_params()
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Load configuration from `MERIT_*` environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = env::var("MERIT_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Scoring weights
        if let Some(w) = env_parse("MERIT_WEIGHT_PERFORMANCE")? {
            config.scoring.performance = w;
        }
        if let Some(w) = env_parse("MERIT_WEIGHT_REPUTATION")? {
            config.scoring.reputation = w;
        }
        if let Some(w) = env_parse("MERIT_WEIGHT_UPTIME")? {
            config.scoring.uptime = w;
        }
        if let Some(w) = env_parse("MERIT_WEIGHT_STAKE")? {
            config.scoring.stake = w;
        }

        // Voting
        if let Some(w) = env_parse("MERIT_VOTING_WEIGHT_STAKE")? {
            config.voting.weights.stake = w;
        }
        if let Some(w) = env_parse("MERIT_VOTING_WEIGHT_REPUTATION")? {
            config.voting.weights.reputation = w;
        }
        if let Some(rate) = env_parse("MERIT_VOTING_DECAY_RATE")? {
            config.voting.decay_rate = rate;
        }
        if let Some(threshold) = env_parse("MERIT_VOTING_FRAUD_THRESHOLD")? {
            config.voting.fraud_threshold = threshold;
        }

        // Slashing
        if let Some(min) = env_parse("MERIT_SLASH_MIN_PENALTY")? {
            config.slashing.min_penalty = min;
        }
        if let Some(max) = env_parse("MERIT_SLASH_MAX_PENALTY")? {
            config.slashing.max_penalty = max;
        }
        if let Some(threshold) = env_parse("MERIT_SLASH_GOVERNANCE_THRESHOLD")? {
            config.slashing.governance_review_threshold = threshold;
        }
        if let Some(percent) = env_parse("MERIT_SLASH_APPEAL_RESTORE_PERCENT")? {
            config.slashing.appeal_restore_percent = percent;
        }

        if let Some(interval) = env_parse("MERIT_EPOCH_INTERVAL_SECS")? {
            config.epoch.interval_secs = interval;
        }

        if let Some(max) = env_parse("MERIT_AUDIT_MAX_ENTRIES")? {
            config.audit.max_entries = max;
        }

        config.validate()?;

        info!(
            weights = ?config.scoring,
            epoch_interval_secs = config.epoch.interval_secs,
            governance_review_threshold = config.slashing.governance_review_threshold,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate every invariant the engine enforces at update time
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => return Err(anyhow::anyhow!("Unknown log level: {}", other)),
        }

        if self.audit.max_entries == 0 {
            return Err(anyhow::anyhow!("Audit log must retain at least one entry"));
        }

        self.to_params()
            .validate()
            .context("Invalid engine parameters")?;

        Ok(())
    }

    pub fn to_params(&self) -> EngineParams {
        EngineParams {
            version: 1,
            scoring: self.scoring,
            voting: self.voting,
            slashing: self.slashing,
            epoch_interval_secs: self.epoch.interval_secs,
        }
    }
}
