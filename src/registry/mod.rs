//! Validator Registry
//!
//! Authoritative record of every validator's stake, metrics, offense count
//! and disqualification status. Registration order is preserved because
//! selection breaks score ties in favour of the validator enumerated first.

mod validator;

pub use validator::{check_metric, ValidatorRecord, MAX_METRIC};

use crate::collaborators::StakeLedger;
use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    records: HashMap<String, ValidatorRecord>,
    order: Vec<String>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &str, stake: u64, reputation: u64) -> EngineResult<&ValidatorRecord> {
        if id.is_empty() {
            return Err(EngineError::InvalidParameter {
                name: "validator id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.records.contains_key(id) {
            return Err(EngineError::AlreadyRegistered(id.to_string()));
        }
        check_metric("reputation", reputation)?;

        let record = ValidatorRecord::new(id.to_string(), stake, reputation);
        self.order.push(id.to_string());
        debug!(validator = %id, stake, reputation, "Validator registered");
        Ok(self.records.entry(id.to_string()).or_insert(record))
    }

    pub fn get(&self, id: &str) -> Option<&ValidatorRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> EngineResult<&mut ValidatorRecord> {
        self.records
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownValidator(id.to_string()))
    }

    pub fn require(&self, id: &str) -> EngineResult<&ValidatorRecord> {
        self.records
            .get(id)
            .ok_or_else(|| EngineError::UnknownValidator(id.to_string()))
    }

    /// All records in registration order, disqualified ones included.
    pub fn iter(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Records eligible for scoring, selection and rewards.
    pub fn eligible(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.iter().filter(|r| !r.disqualified)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn add_stake(&mut self, id: &str, amount: u64) -> EngineResult<u64> {
        let record = self.get_mut(id)?;
        record.stake = record
            .stake
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow("stake"))?;
        Ok(record.stake)
    }

    pub fn set_metrics(&mut self, id: &str, performance: u64, uptime: u64) -> EngineResult<()> {
        check_metric("performance", performance)?;
        check_metric("uptime", uptime)?;
        let record = self.get_mut(id)?;
        record.performance_score = performance;
        record.uptime_score = uptime;
        Ok(())
    }

    pub fn set_reputation(&mut self, id: &str, reputation: u64) -> EngineResult<()> {
        check_metric("reputation", reputation)?;
        self.get_mut(id)?.reputation_score = reputation;
        Ok(())
    }

    pub fn set_disqualified(&mut self, id: &str, disqualified: bool) -> EngineResult<()> {
        self.get_mut(id)?.disqualified = disqualified;
        Ok(())
    }

    pub fn record_selection(&mut self, id: &str, epoch: u64) -> EngineResult<()> {
        self.get_mut(id)?.last_selected_epoch = Some(epoch);
        Ok(())
    }

    pub fn credit_reward(&mut self, id: &str, amount: u64) -> EngineResult<u64> {
        let record = self.get_mut(id)?;
        record.accrued_rewards = record
            .accrued_rewards
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow("accrued rewards"))?;
        Ok(record.accrued_rewards)
    }

    pub fn increment_offenses(&mut self, id: &str) -> EngineResult<u32> {
        let record = self.get_mut(id)?;
        record.offense_count = record.offense_count.saturating_add(1);
        Ok(record.offense_count)
    }

    /// Never drops below zero.
    pub fn decrement_offenses(&mut self, id: &str) -> EngineResult<u32> {
        let record = self.get_mut(id)?;
        record.offense_count = record.offense_count.saturating_sub(1);
        Ok(record.offense_count)
    }
}

impl StakeLedger for ValidatorRegistry {
    fn stake_of(&self, id: &str) -> EngineResult<u64> {
        Ok(self.require(id)?.stake)
    }

    fn slash_stake(&mut self, id: &str, amount: u64) -> EngineResult<()> {
        let record = self.get_mut(id)?;
        if record.stake < amount {
            return Err(EngineError::InsufficientStake {
                id: id.to_string(),
                available: record.stake,
                required: amount,
            });
        }
        record.stake -= amount;
        Ok(())
    }

    fn restore_stake(&mut self, id: &str, amount: u64) -> EngineResult<()> {
        self.add_stake(id, amount).map(|_| ())
    }
}
