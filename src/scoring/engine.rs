use serde::{Deserialize, Serialize};

use super::ScoringWeights;
use crate::collaborators::{IntegrityHash, IntegrityHasher};
use crate::registry::{ValidatorRecord, ValidatorRegistry};

/// `⌊value·weight/100⌋`, computed wide so large stakes cannot overflow.
pub fn weighted(value: u64, weight: u32) -> u64 {
    let product = value as u128 * weight as u128 / 100;
    // weight ≤ 100 after validation, so the quotient never exceeds `value`.
    product.min(u64::MAX as u128) as u64
}

/// Scored view of one eligible validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub validator_id: String,
    pub performance: u64,
    pub reputation: u64,
    pub uptime: u64,
    pub stake: u64,
    pub total_score: u64,
    /// Advisory commitment over `(validator_id, total_score)`
    pub commitment: IntegrityHash,
}

/// Stateless scorer: weights plus a hasher for commitments.
pub struct ScoringEngine<'a> {
    weights: &'a ScoringWeights,
    hasher: &'a dyn IntegrityHasher,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(weights: &'a ScoringWeights, hasher: &'a dyn IntegrityHasher) -> Self {
        Self { weights, hasher }
    }

    /// Merit score ignoring disqualification.
    pub fn total_score(&self, record: &ValidatorRecord) -> u64 {
        weighted(record.performance_score, self.weights.performance)
            .saturating_add(weighted(record.reputation_score, self.weights.reputation))
            .saturating_add(weighted(record.uptime_score, self.weights.uptime))
            .saturating_add(weighted(record.stake, self.weights.stake))
    }

    /// `None` for disqualified validators; they are skipped, not scored as zero.
    pub fn score(&self, record: &ValidatorRecord) -> Option<ScoreCard> {
        if record.disqualified {
            return None;
        }

        let performance = weighted(record.performance_score, self.weights.performance);
        let reputation = weighted(record.reputation_score, self.weights.reputation);
        let uptime = weighted(record.uptime_score, self.weights.uptime);
        let stake = weighted(record.stake, self.weights.stake);
        let total_score = performance
            .saturating_add(reputation)
            .saturating_add(uptime)
            .saturating_add(stake);

        let commitment = self
            .hasher
            .commit(&[record.id.as_bytes(), &total_score.to_be_bytes()]);

        Some(ScoreCard {
            validator_id: record.id.clone(),
            performance,
            reputation,
            uptime,
            stake,
            total_score,
            commitment,
        })
    }

    /// Score cards for eligible validators in registration order. The result
    /// is not index-aligned with the registry.
    pub fn score_all(&self, registry: &ValidatorRegistry) -> Vec<ScoreCard> {
        registry.iter().filter_map(|r| self.score(r)).collect()
    }
}
