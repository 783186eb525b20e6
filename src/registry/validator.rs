use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Upper bound for performance, reputation and uptime metrics.
pub const MAX_METRIC: u64 = 100;

/// Per-validator state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub id: String,

    /// Value at risk. Changed only by staking, slashing and appeals.
    pub stake: u64,

    pub performance_score: u64,
    pub reputation_score: u64,
    pub uptime_score: u64,

    pub offense_count: u32,

    /// Excluded from scoring, selection and rewards while set
    pub disqualified: bool,

    pub last_selected_epoch: Option<u64>,

    /// Rewards credited by distribution; kept apart from stake
    pub accrued_rewards: u64,

    pub registered_at: DateTime<Utc>,
}

impl ValidatorRecord {
    pub fn new(id: String, stake: u64, reputation: u64) -> Self {
        Self {
            id,
            stake,
            performance_score: 0,
            reputation_score: reputation,
            uptime_score: 0,
            offense_count: 0,
            disqualified: false,
            last_selected_epoch: None,
            accrued_rewards: 0,
            registered_at: Utc::now(),
        }
    }
}

pub fn check_metric(metric: &'static str, value: u64) -> EngineResult<()> {
    if value > MAX_METRIC {
        return Err(EngineError::MetricOutOfRange { metric, value });
    }
    Ok(())
}
