use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPool {
    /// Undistributed balance for the current epoch
    pub total_pool: u64,

    /// Epoch of the most recent distribution
    pub last_distributed_epoch: Option<u64>,

    /// Lifetime amount paid out to validators
    pub total_distributed: u64,

    /// Lifetime rounding dust dropped at reset
    pub total_dust: u64,
}

impl RewardPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&mut self, amount: u64) -> EngineResult<u64> {
        if amount == 0 {
            return Err(EngineError::InvalidParameter {
                name: "funding amount",
                reason: "must be positive".to_string(),
            });
        }
        self.total_pool = self
            .total_pool
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow("reward pool"))?;
        debug!(amount, total_pool = self.total_pool, "Reward pool funded");
        Ok(self.total_pool)
    }

    pub fn distributed_in(&self, epoch: u64) -> bool {
        self.last_distributed_epoch == Some(epoch)
    }
}
