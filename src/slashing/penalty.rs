use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::registry::MAX_METRIC;

/// Governance-configurable slashing bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashingParams {
    /// Smallest nominal penalty accepted
    pub min_penalty: u64,

    /// Largest nominal penalty accepted
    pub max_penalty: u64,

    /// Adjusted penalties at or above this escalate to governance review
    pub governance_review_threshold: u64,

    /// Share of a slashed amount returned by a successful appeal
    pub appeal_restore_percent: u64,
}

impl Default for SlashingParams {
    fn default() -> Self {
        Self {
            min_penalty: 100,
            max_penalty: 5_000,
            governance_review_threshold: 2_500,
            appeal_restore_percent: 30,
        }
    }
}

impl SlashingParams {
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_penalty > self.max_penalty {
            return Err(EngineError::InvalidParameter {
                name: "penalty band",
                reason: format!(
                    "min_penalty {} exceeds max_penalty {}",
                    self.min_penalty, self.max_penalty
                ),
            });
        }
        if self.governance_review_threshold == 0 {
            return Err(EngineError::InvalidParameter {
                name: "governance review threshold",
                reason: "must be positive".to_string(),
            });
        }
        if self.appeal_restore_percent > 100 {
            return Err(EngineError::InvalidParameter {
                name: "appeal restore percent",
                reason: format!("{} exceeds 100", self.appeal_restore_percent),
            });
        }
        Ok(())
    }

    pub fn check_band(&self, requested: u64) -> EngineResult<()> {
        if requested < self.min_penalty || requested > self.max_penalty {
            return Err(EngineError::PenaltyOutOfRange {
                requested,
                min: self.min_penalty,
                max: self.max_penalty,
            });
        }
        Ok(())
    }
}

/// `⌊requested·(100 − reputation)/100⌋`. Reputation above 100 is treated as 100.
pub fn adjusted_penalty(requested: u64, reputation: u64) -> u64 {
    let discount = MAX_METRIC - reputation.min(MAX_METRIC);
    (requested as u128 * discount as u128 / 100) as u64
}

/// `⌊penalty·percent/100⌋`
pub fn restoration_amount(penalty: u64, percent: u64) -> u64 {
    (penalty as u128 * percent.min(100) as u128 / 100) as u64
}
