//! In-memory oracles backed by concurrent maps. Used by the operator binary
//! and as deterministic test doubles.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{FraudOracle, ReputationOracle};

/// Reputation source with a per-identity override table and a fallback score.
pub struct InMemoryReputationOracle {
    scores: DashMap<String, u64>,
    default_score: u64,
    offline: AtomicBool,
}

impl InMemoryReputationOracle {
    pub fn new(default_score: u64) -> Self {
        Self {
            scores: DashMap::new(),
            default_score,
            offline: AtomicBool::new(false),
        }
    }

    pub fn set(&self, id: &str, score: u64) {
        self.scores.insert(id.to_string(), score);
    }

    /// Make every subsequent query fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Default for InMemoryReputationOracle {
    fn default() -> Self {
        Self::new(50)
    }
}

#[async_trait]
impl ReputationOracle for InMemoryReputationOracle {
    async fn reputation(&self, id: &str) -> Result<u64> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow!("reputation oracle unavailable"));
        }
        Ok(self
            .scores
            .get(id)
            .map(|s| *s)
            .unwrap_or(self.default_score))
    }
}

/// Fraud source holding a score per identity; anything at or above
/// `flag_threshold` is reported as flagged.
pub struct InMemoryFraudOracle {
    scores: DashMap<String, u64>,
    scans: DashMap<String, u32>,
    flag_threshold: u64,
}

impl InMemoryFraudOracle {
    pub fn new(flag_threshold: u64) -> Self {
        Self {
            scores: DashMap::new(),
            scans: DashMap::new(),
            flag_threshold,
        }
    }

    pub fn set_score(&self, id: &str, score: u64) {
        self.scores.insert(id.to_string(), score);
    }

    /// Number of anomaly scans requested for `id`.
    pub fn scans(&self, id: &str) -> u32 {
        self.scans.get(id).map(|n| *n).unwrap_or(0)
    }
}

impl Default for InMemoryFraudOracle {
    fn default() -> Self {
        Self::new(50)
    }
}

#[async_trait]
impl FraudOracle for InMemoryFraudOracle {
    async fn detect_anomalies(&self, id: &str) -> Result<()> {
        *self.scans.entry(id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn is_flagged(&self, id: &str) -> Result<bool> {
        Ok(self.fraud_score(id).await? >= self.flag_threshold)
    }

    async fn fraud_score(&self, id: &str) -> Result<u64> {
        Ok(self.scores.get(id).map(|s| *s).unwrap_or(0))
    }
}
