use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{adjusted_penalty, restoration_amount, SlashReason, SlashingLog, SlashingParams, SlashingRecord};
use crate::collaborators::{IntegrityHasher, StakeLedger};
use crate::error::{EngineError, EngineResult};
use crate::registry::ValidatorRegistry;

/// Result of a slash request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SlashOutcome {
    /// Stake was reduced and a record appended
    Applied(SlashingRecord),

    /// Adjusted penalty too large to apply unilaterally. Nothing changed;
    /// the decision belongs to governance.
    GovernanceReview {
        validator_id: String,
        requested_penalty: u64,
        adjusted_penalty: u64,
        threshold: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealOutcome {
    pub record_id: u64,
    pub validator_id: String,
    pub restored: u64,
    pub stake: u64,
    pub offense_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SlashingEngine {
    params: SlashingParams,
    log: SlashingLog,
}

impl SlashingEngine {
    pub fn new(params: SlashingParams) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            log: SlashingLog::new(),
        })
    }

    pub fn params(&self) -> &SlashingParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SlashingParams) -> EngineResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn log(&self) -> &SlashingLog {
        &self.log
    }

    /// Apply a reputation-scaled penalty.
    ///
    /// Rejected without effect when the nominal penalty is outside the
    /// configured band or exceeds the validator's stake.
    pub fn slash(
        &mut self,
        registry: &mut ValidatorRegistry,
        hasher: &dyn IntegrityHasher,
        validator_id: &str,
        requested: u64,
        reason: SlashReason,
        at: DateTime<Utc>,
    ) -> EngineResult<SlashOutcome> {
        let reputation = registry.require(validator_id)?.reputation_score;
        self.params.check_band(requested)?;

        let stake = registry.stake_of(validator_id)?;
        if stake < requested {
            return Err(EngineError::InsufficientStake {
                id: validator_id.to_string(),
                available: stake,
                required: requested,
            });
        }

        let adjusted = adjusted_penalty(requested, reputation);
        if adjusted >= self.params.governance_review_threshold {
            warn!(
                validator = %validator_id,
                requested,
                adjusted,
                threshold = self.params.governance_review_threshold,
                "Slash escalated to governance review"
            );
            return Ok(SlashOutcome::GovernanceReview {
                validator_id: validator_id.to_string(),
                requested_penalty: requested,
                adjusted_penalty: adjusted,
                threshold: self.params.governance_review_threshold,
            });
        }

        registry.slash_stake(validator_id, adjusted)?;
        let offenses = registry.increment_offenses(validator_id)?;

        let record_id = self.log.next_id();
        let integrity_hash = hasher.commit(&[
            validator_id.as_bytes(),
            &adjusted.to_be_bytes(),
            reason.description().as_bytes(),
            &at.timestamp_millis().to_be_bytes(),
            &record_id.to_be_bytes(),
        ]);
        let record = self
            .log
            .append(validator_id, adjusted, at, reason, integrity_hash)
            .clone();

        info!(
            validator = %validator_id,
            requested,
            adjusted,
            offenses,
            record_id,
            "Slash applied"
        );
        Ok(SlashOutcome::Applied(record))
    }

    /// Restore part of one recorded penalty and forgive one offense.
    pub fn appeal(&mut self, registry: &mut ValidatorRegistry, record_id: u64) -> EngineResult<AppealOutcome> {
        let record = self.log.get(record_id)?;
        if self.log.is_appealed(record_id) {
            return Err(EngineError::AlreadyAppealed(record_id));
        }

        let validator_id = record.validator_id.clone();
        let validator = registry.require(&validator_id)?;
        if validator.offense_count == 0 {
            return Err(EngineError::NoOffenses(validator_id));
        }

        let restored = restoration_amount(record.penalty_amount, self.params.appeal_restore_percent);
        validator
            .stake
            .checked_add(restored)
            .ok_or(EngineError::ArithmeticOverflow("stake"))?;

        registry.restore_stake(&validator_id, restored)?;
        self.log.mark_appealed(record_id)?;
        let offense_count = registry.decrement_offenses(&validator_id)?;
        let stake = registry.stake_of(&validator_id)?;

        info!(
            validator = %validator_id,
            record_id,
            restored,
            offense_count,
            "Appeal granted"
        );
        Ok(AppealOutcome {
            record_id,
            validator_id,
            restored,
            stake,
            offense_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Sha256Hasher;

    fn setup(stake: u64, reputation: u64) -> (SlashingEngine, ValidatorRegistry, Sha256Hasher) {
        let mut registry = ValidatorRegistry::new();
        registry.register("v1", stake, reputation).unwrap();
        (
            SlashingEngine::new(SlashingParams::default()).unwrap(),
            registry,
            Sha256Hasher::new(),
        )
    }

    #[test]
    fn test_slash_applies_reputation_scaled_penalty() {
        let (mut engine, mut registry, hasher) = setup(10_000, 70);

        let outcome = engine
            .slash(&mut registry, &hasher, "v1", 1000, SlashReason::Downtime, Utc::now())
            .unwrap();

        let SlashOutcome::Applied(record) = outcome else {
            panic!("expected slash to apply");
        };
        assert_eq!(record.penalty_amount, 300);
        assert_eq!(registry.get("v1").unwrap().stake, 9_700);
        assert_eq!(registry.get("v1").unwrap().offense_count, 1);
        assert_eq!(engine.log().count_for("v1"), 1);
    }

    #[test]
    fn test_large_penalty_escalates_without_mutation() {
        let (mut engine, mut registry, hasher) = setup(10_000, 10);

        let outcome = engine
            .slash(&mut registry, &hasher, "v1", 5000, SlashReason::Equivocation, Utc::now())
            .unwrap();

        assert_eq!(
            outcome,
            SlashOutcome::GovernanceReview {
                validator_id: "v1".to_string(),
                requested_penalty: 5000,
                adjusted_penalty: 4500,
                threshold: 2500,
            }
        );
        let record = registry.get("v1").unwrap();
        assert_eq!(record.stake, 10_000);
        assert_eq!(record.offense_count, 0);
        assert!(engine.log().is_empty());
    }

    #[test]
    fn test_out_of_band_and_insufficient_stake_rejected() {
        let (mut engine, mut registry, hasher) = setup(500, 0);

        let err = engine
            .slash(&mut registry, &hasher, "v1", 50, SlashReason::Downtime, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::PenaltyOutOfRange { .. }));

        let err = engine
            .slash(&mut registry, &hasher, "v1", 600, SlashReason::Downtime, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStake { available: 500, required: 600, .. }));

        let err = engine
            .slash(&mut registry, &hasher, "ghost", 600, SlashReason::Downtime, Utc::now())
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownValidator("ghost".to_string()));

        assert_eq!(registry.get("v1").unwrap().stake, 500);
        assert!(engine.log().is_empty());
    }

    #[test]
    fn test_full_reputation_means_zero_penalty() {
        let (mut engine, mut registry, hasher) = setup(1_000, 100);
        let outcome = engine
            .slash(&mut registry, &hasher, "v1", 1000, SlashReason::Downtime, Utc::now())
            .unwrap();
        assert!(matches!(outcome, SlashOutcome::Applied(ref r) if r.penalty_amount == 0));
        assert_eq!(registry.get("v1").unwrap().stake, 1_000);
    }

    #[test]
    fn test_appeal_restores_thirty_percent_once() {
        let (mut engine, mut registry, hasher) = setup(10_000, 70);
        engine
            .slash(&mut registry, &hasher, "v1", 1000, SlashReason::Downtime, Utc::now())
            .unwrap();

        let outcome = engine.appeal(&mut registry, 0).unwrap();
        assert_eq!(outcome.restored, 90);
        assert_eq!(outcome.stake, 9_790);
        assert_eq!(outcome.offense_count, 0);

        assert_eq!(engine.appeal(&mut registry, 0).unwrap_err(), EngineError::AlreadyAppealed(0));
        assert_eq!(engine.appeal(&mut registry, 5).unwrap_err(), EngineError::UnknownSlashingRecord(5));
        assert_eq!(registry.get("v1").unwrap().stake, 9_790);
        // History is untouched by the appeal.
        assert_eq!(engine.log().get(0).unwrap().penalty_amount, 300);
    }

    #[test]
    fn test_stake_never_negative_across_sequences() {
        let (mut engine, mut registry, hasher) = setup(1_000, 0);
        for _ in 0..20 {
            let _ = engine.slash(&mut registry, &hasher, "v1", 400, SlashReason::Downtime, Utc::now());
        }
        // 1000 → 600 → 200, then every further request exceeds the stake.
        assert_eq!(registry.get("v1").unwrap().stake, 200);
        assert_eq!(registry.get("v1").unwrap().offense_count, 2);
    }
}
