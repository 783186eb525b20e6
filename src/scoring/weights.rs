use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Every weight set must sum to exactly this value.
pub const WEIGHT_TOTAL: u32 = 100;

/// Weights for validator merit scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub performance: u32,
    pub reputation: u32,
    pub uptime: u32,
    pub stake: u32,
}

impl ScoringWeights {
    pub fn new(performance: u32, reputation: u32, uptime: u32, stake: u32) -> EngineResult<Self> {
        let weights = Self {
            performance,
            reputation,
            uptime,
            stake,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let sum = self
            .performance
            .saturating_add(self.reputation)
            .saturating_add(self.uptime)
            .saturating_add(self.stake);
        if sum != WEIGHT_TOTAL {
            return Err(EngineError::InvalidWeights { set: "scoring", sum });
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            performance: 40,
            reputation: 30,
            uptime: 20,
            stake: 10,
        }
    }
}

/// Weights for governance voting power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWeights {
    pub stake: u32,
    pub reputation: u32,
}

impl VotingWeights {
    pub fn new(stake: u32, reputation: u32) -> EngineResult<Self> {
        let weights = Self { stake, reputation };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let sum = self.stake.saturating_add(self.reputation);
        if sum != WEIGHT_TOTAL {
            return Err(EngineError::InvalidWeights { set: "voting", sum });
        }
        Ok(())
    }
}

impl Default for VotingWeights {
    fn default() -> Self {
        Self {
            stake: 50,
            reputation: 50,
        }
    }
}
