//! Incentive Engine - Main Orchestrator
//!
//! Owns the registry, epoch clock, slashing history, reward pool and voting
//! model behind a single lock. Every mutating call holds the write half for
//! its whole critical section, so shared totals (pool balance, score sums)
//! can never be observed or spent twice mid-operation. Oracle reads happen
//! before the lock is taken; audit entries and events go out after it is
//! released.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborators::{
    AuditCategory, AuditSink, FraudOracle, IntegrityHasher, ReputationOracle,
};
use crate::config::EngineParams;
use crate::error::{EngineError, EngineResult};
use crate::registry::{ValidatorRecord, ValidatorRegistry, MAX_METRIC};
use crate::rewards::{RewardDistribution, RewardDistributor, RewardPool};
use crate::scoring::{ScoreCard, ScoringEngine, ScoringWeights, VotingWeights};
use crate::selection::{EpochClock, Selection, SelectionProcess};
use crate::slashing::{AppealOutcome, SlashOutcome, SlashReason, SlashingEngine, SlashingParams, SlashingRecord};
use crate::voting::{VoteReceipt, VoterRecord, VotingModel, VotingParams};

/// Proof of administrator authority, handed out once when the engine is
/// built. Gated calls compare it against the engine's own token.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCapability {
    token: Uuid,
}

impl AdminCapability {
    pub fn from_token(token: Uuid) -> Self {
        Self { token }
    }
}

impl fmt::Debug for AdminCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminCapability(***)")
    }
}

/// Injected external collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub reputation: Arc<dyn ReputationOracle>,
    pub fraud: Arc<dyn FraudOracle>,
    pub hasher: Arc<dyn IntegrityHasher>,
    pub audit: Arc<dyn AuditSink>,
}

/// Notifications broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    ValidatorSelected {
        validator_id: String,
        total_score: u64,
        epoch: u64,
    },
    EpochAdvanced {
        epoch: u64,
        at: DateTime<Utc>,
    },
    SlashApplied {
        validator_id: String,
        record_id: u64,
        penalty: u64,
    },
    GovernanceReviewRequired {
        validator_id: String,
        adjusted_penalty: u64,
        threshold: u64,
    },
    AppealGranted {
        validator_id: String,
        record_id: u64,
        restored: u64,
    },
    RewardsDistributed {
        epoch: u64,
        distributed: u64,
        dust: u64,
    },
    VoteCast {
        voter_id: String,
        power: u64,
    },
    VoteDelegated {
        from: String,
        to: String,
    },
    ParamsUpdated {
        version: u64,
    },
}

/// Result of asking the fraud oracle about a voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub voter_id: String,
    pub flagged: bool,
    pub fraud_score: u64,
    pub fraud_flags: u32,
    pub disqualified: bool,
}

struct EngineState {
    params: EngineParams,
    registry: ValidatorRegistry,
    clock: EpochClock,
    slashing: SlashingEngine,
    pool: RewardPool,
    voting: VotingModel,
}

pub struct IncentiveEngine {
    state: Arc<RwLock<EngineState>>,
    admin_token: Uuid,
    collaborators: Collaborators,
    events: broadcast::Sender<EngineEvent>,
}

impl IncentiveEngine {
    pub fn new(
        params: EngineParams,
        collaborators: Collaborators,
    ) -> EngineResult<(Self, AdminCapability)> {
        params.validate()?;

        let state = EngineState {
            registry: ValidatorRegistry::new(),
            clock: EpochClock::new(params.epoch_interval_secs)?,
            slashing: SlashingEngine::new(params.slashing)?,
            pool: RewardPool::new(),
            voting: VotingModel::new(params.voting)?,
            params,
        };

        let admin_token = Uuid::new_v4();
        let (events, _) = broadcast::channel(256);

        info!(version = state.params.version, "Incentive engine initialized");

        Ok((
            Self {
                state: Arc::new(RwLock::new(state)),
                admin_token,
                collaborators,
                events,
            },
            AdminCapability { token: admin_token },
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn authorize(&self, cap: &AdminCapability, operation: &'static str) -> EngineResult<()> {
        if cap.token != self.admin_token {
            warn!(operation, "Rejected call without administrator capability");
            return Err(EngineError::Unauthorized(operation));
        }
        Ok(())
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn audit(&self, category: AuditCategory, message: &str, amount: u64, subject: &str) {
        self.collaborators
            .audit
            .record(category, message, amount, subject)
            .await;
    }

    async fn fetch_reputation(&self, id: &str) -> EngineResult<u64> {
        let reputation = self
            .collaborators
            .reputation
            .reputation(id)
            .await
            .map_err(|e| EngineError::collaborator("reputation oracle", e))?;
        if reputation > MAX_METRIC {
            return Err(EngineError::collaborator(
                "reputation oracle",
                format!("reputation {} for {} outside 0..=100", reputation, id),
            ));
        }
        Ok(reputation)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn params(&self) -> EngineParams {
        self.state.read().await.params.clone()
    }

    pub async fn validator(&self, id: &str) -> Option<ValidatorRecord> {
        self.state.read().await.registry.get(id).cloned()
    }

    pub async fn validators(&self) -> Vec<ValidatorRecord> {
        self.state.read().await.registry.iter().cloned().collect()
    }

    pub async fn voter(&self, id: &str) -> Option<VoterRecord> {
        self.state.read().await.voting.voter(id).cloned()
    }

    pub async fn pool(&self) -> RewardPool {
        self.state.read().await.pool.clone()
    }

    pub async fn current_epoch(&self) -> u64 {
        self.state.read().await.clock.current_epoch()
    }

    /// Score cards for eligible validators in registration order.
    pub async fn ranking(&self) -> Vec<ScoreCard> {
        let state = self.state.read().await;
        let scorer = ScoringEngine::new(&state.params.scoring, self.collaborators.hasher.as_ref());
        scorer.score_all(&state.registry)
    }

    pub async fn score_of(&self, id: &str) -> EngineResult<Option<ScoreCard>> {
        let state = self.state.read().await;
        let record = state.registry.require(id)?;
        let scorer = ScoringEngine::new(&state.params.scoring, self.collaborators.hasher.as_ref());
        Ok(scorer.score(record))
    }

    pub async fn slashing_history(&self, id: &str, offset: usize, limit: usize) -> Vec<SlashingRecord> {
        self.state.read().await.slashing.log().page(id, offset, limit)
    }

    pub async fn voting_power(&self, id: &str) -> EngineResult<u64> {
        self.state.read().await.voting.voting_power(id)
    }

    pub async fn delegate_of(&self, id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .voting
            .delegate_of(id)
            .map(str::to_string)
    }

    pub async fn fraud_flags(&self, id: &str) -> u32 {
        self.state.read().await.voting.fraud_flags(id)
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Open to any caller. Reputation comes from the oracle; performance and
    /// uptime start at zero until reported.
    pub async fn register_validator(&self, id: &str, stake: u64) -> EngineResult<ValidatorRecord> {
        let reputation = self.fetch_reputation(id).await?;

        let record = {
            let mut state = self.state.write().await;
            state.registry.register(id, stake, reputation)?.clone()
        };

        info!(validator = %id, stake, reputation, "Validator registered");
        self.audit(AuditCategory::Registration, "validator registered", stake, id)
            .await;
        Ok(record)
    }

    pub async fn add_stake(&self, id: &str, amount: u64) -> EngineResult<u64> {
        let stake = {
            let mut state = self.state.write().await;
            state.registry.add_stake(id, amount)?
        };
        debug!(validator = %id, amount, stake, "Stake added");
        self.audit(AuditCategory::Registration, "stake added", amount, id)
            .await;
        Ok(stake)
    }

    pub async fn report_metrics(
        &self,
        cap: &AdminCapability,
        id: &str,
        performance: u64,
        uptime: u64,
    ) -> EngineResult<()> {
        self.authorize(cap, "report_metrics")?;
        {
            let mut state = self.state.write().await;
            state.registry.set_metrics(id, performance, uptime)?;
        }
        debug!(validator = %id, performance, uptime, "Metrics reported");
        self.audit(AuditCategory::Metrics, "metrics reported", performance, id)
            .await;
        Ok(())
    }

    /// Re-read every validator's reputation. All oracle reads complete
    /// before anything is written, so a failed read changes nothing.
    pub async fn refresh_reputation(&self, cap: &AdminCapability) -> EngineResult<usize> {
        self.authorize(cap, "refresh_reputation")?;

        let ids = self.state.read().await.registry.ids().to_vec();
        let mut fresh = HashMap::with_capacity(ids.len());
        for id in &ids {
            fresh.insert(id.clone(), self.fetch_reputation(id).await?);
        }

        {
            let mut state = self.state.write().await;
            for (id, reputation) in &fresh {
                state.registry.set_reputation(id, *reputation)?;
            }
        }

        info!(validators = fresh.len(), "Reputation refreshed");
        self.audit(
            AuditCategory::Metrics,
            "reputation refreshed",
            fresh.len() as u64,
            "*",
        )
        .await;
        Ok(fresh.len())
    }

    pub async fn set_disqualified(
        &self,
        cap: &AdminCapability,
        id: &str,
        disqualified: bool,
    ) -> EngineResult<()> {
        self.authorize(cap, "set_disqualified")?;
        {
            let mut state = self.state.write().await;
            state.registry.set_disqualified(id, disqualified)?;
        }
        let message = if disqualified {
            "validator disqualified"
        } else {
            "validator disqualification cleared"
        };
        warn!(validator = %id, disqualified, "Disqualification changed");
        self.audit(AuditCategory::Registration, message, 0, id).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Epochs and selection
    // ------------------------------------------------------------------

    pub async fn advance_epoch(&self, cap: &AdminCapability, at: DateTime<Utc>) -> EngineResult<u64> {
        self.authorize(cap, "advance_epoch")?;
        let epoch = {
            let mut state = self.state.write().await;
            state.clock.advance(at)?
        };
        self.audit(AuditCategory::Epoch, "epoch advanced", epoch, "*")
            .await;
        self.emit(EngineEvent::EpochAdvanced { epoch, at });
        Ok(epoch)
    }

    /// Pick the best eligible validator for the current epoch. `Ok(None)` is
    /// a normal outcome when nobody is eligible.
    pub async fn select_best(&self, cap: &AdminCapability) -> EngineResult<Option<Selection>> {
        self.authorize(cap, "select_best")?;
        let selection = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let epoch = state.clock.current_epoch();
            let scorer = ScoringEngine::new(&state.params.scoring, self.collaborators.hasher.as_ref());
            SelectionProcess::select_best(&mut state.registry, &scorer, epoch)?
        };

        if let Some(ref selection) = selection {
            self.audit(
                AuditCategory::Selection,
                &format!("selected for epoch {}", selection.epoch),
                selection.total_score,
                &selection.validator_id,
            )
            .await;
            self.emit(EngineEvent::ValidatorSelected {
                validator_id: selection.validator_id.clone(),
                total_score: selection.total_score,
                epoch: selection.epoch,
            });
        }
        Ok(selection)
    }

    // ------------------------------------------------------------------
    // Slashing
    // ------------------------------------------------------------------

    pub async fn slash(
        &self,
        cap: &AdminCapability,
        id: &str,
        penalty: u64,
        reason: SlashReason,
        at: DateTime<Utc>,
    ) -> EngineResult<SlashOutcome> {
        self.authorize(cap, "slash")?;
        let outcome = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            state.slashing.slash(
                &mut state.registry,
                self.collaborators.hasher.as_ref(),
                id,
                penalty,
                reason,
                at,
            )?
        };

        match &outcome {
            SlashOutcome::Applied(record) => {
                self.audit(
                    AuditCategory::Slashing,
                    record.reason.description(),
                    record.penalty_amount,
                    id,
                )
                .await;
                self.emit(EngineEvent::SlashApplied {
                    validator_id: id.to_string(),
                    record_id: record.id,
                    penalty: record.penalty_amount,
                });
            }
            SlashOutcome::GovernanceReview {
                adjusted_penalty,
                threshold,
                ..
            } => {
                self.audit(
                    AuditCategory::GovernanceReview,
                    "penalty requires governance review",
                    *adjusted_penalty,
                    id,
                )
                .await;
                self.emit(EngineEvent::GovernanceReviewRequired {
                    validator_id: id.to_string(),
                    adjusted_penalty: *adjusted_penalty,
                    threshold: *threshold,
                });
            }
        }
        Ok(outcome)
    }

    pub async fn appeal(&self, cap: &AdminCapability, record_id: u64) -> EngineResult<AppealOutcome> {
        self.authorize(cap, "appeal")?;
        let outcome = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            state.slashing.appeal(&mut state.registry, record_id)?
        };

        self.audit(
            AuditCategory::Appeal,
            &format!("appeal granted for record {}", record_id),
            outcome.restored,
            &outcome.validator_id,
        )
        .await;
        self.emit(EngineEvent::AppealGranted {
            validator_id: outcome.validator_id.clone(),
            record_id,
            restored: outcome.restored,
        });
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------

    pub async fn fund_pool(&self, cap: &AdminCapability, amount: u64) -> EngineResult<u64> {
        self.authorize(cap, "fund_pool")?;
        let total = {
            let mut state = self.state.write().await;
            state.pool.fund(amount)?
        };
        self.audit(AuditCategory::Rewards, "reward pool funded", amount, "*")
            .await;
        Ok(total)
    }

    pub async fn distribute(&self, cap: &AdminCapability) -> EngineResult<RewardDistribution> {
        self.authorize(cap, "distribute")?;
        let distribution = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let epoch = state.clock.current_epoch();
            let scorer = ScoringEngine::new(&state.params.scoring, self.collaborators.hasher.as_ref());
            RewardDistributor::distribute(&mut state.pool, &mut state.registry, &scorer, epoch)?
        };

        for payout in &distribution.payouts {
            self.audit(
                AuditCategory::Rewards,
                "reward paid",
                payout.amount,
                &payout.validator_id,
            )
            .await;
        }
        self.emit(EngineEvent::RewardsDistributed {
            epoch: distribution.epoch,
            distributed: distribution.distributed,
            dust: distribution.dust,
        });
        Ok(distribution)
    }

    // ------------------------------------------------------------------
    // Voting
    // ------------------------------------------------------------------

    pub async fn register_voter(&self, id: &str, stake: u64) -> EngineResult<VoterRecord> {
        let reputation = self.fetch_reputation(id).await?;
        let record = {
            let mut state = self.state.write().await;
            state.voting.register(id, stake, reputation)?.clone()
        };
        self.audit(AuditCategory::Registration, "voter registered", stake, id)
            .await;
        Ok(record)
    }

    pub async fn cast_vote(&self, id: &str, at: u64) -> EngineResult<VoteReceipt> {
        let receipt = {
            let mut state = self.state.write().await;
            state.voting.cast_vote(id, at)?
        };
        self.audit(AuditCategory::Voting, "vote cast", receipt.power, id)
            .await;
        self.emit(EngineEvent::VoteCast {
            voter_id: id.to_string(),
            power: receipt.power,
        });
        Ok(receipt)
    }

    pub async fn delegate_vote(&self, from: &str, to: &str) -> EngineResult<()> {
        {
            let mut state = self.state.write().await;
            state.voting.delegate(from, to)?;
        }
        self.audit(
            AuditCategory::Voting,
            &format!("delegated to {}", to),
            0,
            from,
        )
        .await;
        self.emit(EngineEvent::VoteDelegated {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    pub async fn flag_voter(&self, cap: &AdminCapability, id: &str) -> EngineResult<u32> {
        self.authorize(cap, "flag_voter")?;
        let flags = {
            let mut state = self.state.write().await;
            state.voting.flag(id)?
        };
        self.audit(AuditCategory::Fraud, "voter flagged", flags as u64, id)
            .await;
        Ok(flags)
    }

    /// Run the fraud oracle's anomaly scan on a voter and add a flag when it
    /// reports the voter as flagged.
    pub async fn screen_voter(&self, cap: &AdminCapability, id: &str) -> EngineResult<ScreeningResult> {
        self.authorize(cap, "screen_voter")?;
        if self.state.read().await.voting.voter(id).is_none() {
            return Err(EngineError::UnknownVoter(id.to_string()));
        }

        let fraud = &self.collaborators.fraud;
        fraud
            .detect_anomalies(id)
            .await
            .map_err(|e| EngineError::collaborator("fraud oracle", e))?;
        let flagged = fraud
            .is_flagged(id)
            .await
            .map_err(|e| EngineError::collaborator("fraud oracle", e))?;
        let fraud_score = fraud
            .fraud_score(id)
            .await
            .map_err(|e| EngineError::collaborator("fraud oracle", e))?;

        let (fraud_flags, disqualified) = {
            let mut state = self.state.write().await;
            let flags = if flagged {
                state.voting.flag(id)?
            } else {
                state.voting.fraud_flags(id)
            };
            (flags, state.voting.is_disqualified(id))
        };

        if flagged {
            self.audit(AuditCategory::Fraud, "fraud oracle flagged voter", fraud_score, id)
                .await;
        }
        debug!(voter = %id, flagged, fraud_score, fraud_flags, "Voter screened");
        Ok(ScreeningResult {
            voter_id: id.to_string(),
            flagged,
            fraud_score,
            fraud_flags,
            disqualified,
        })
    }

    // ------------------------------------------------------------------
    // Governance parameters
    // ------------------------------------------------------------------

    /// Validate a modified copy of the parameters, then swap it in whole.
    async fn update_params<F>(
        &self,
        cap: &AdminCapability,
        operation: &'static str,
        modify: F,
    ) -> EngineResult<EngineParams>
    where
        F: FnOnce(&mut EngineParams),
    {
        self.authorize(cap, operation)?;
        let params = {
            let mut state = self.state.write().await;
            let mut next = state.params.clone();
            modify(&mut next);
            next.version = state
                .params
                .version
                .checked_add(1)
                .ok_or(EngineError::ArithmeticOverflow("params version"))?;
            next.validate()?;

            state.slashing.set_params(next.slashing)?;
            state.voting.set_params(next.voting)?;
            state.clock.set_interval(next.epoch_interval_secs)?;
            state.params = next.clone();
            next
        };

        info!(version = params.version, operation, "Parameters updated");
        self.audit(AuditCategory::Configuration, operation, params.version, "*")
            .await;
        self.emit(EngineEvent::ParamsUpdated {
            version: params.version,
        });
        Ok(params)
    }

    pub async fn update_scoring_weights(
        &self,
        cap: &AdminCapability,
        weights: ScoringWeights,
    ) -> EngineResult<EngineParams> {
        self.update_params(cap, "update_scoring_weights", |p| p.scoring = weights)
            .await
    }

    pub async fn update_voting_weights(
        &self,
        cap: &AdminCapability,
        weights: VotingWeights,
    ) -> EngineResult<EngineParams> {
        self.update_params(cap, "update_voting_weights", |p| p.voting.weights = weights)
            .await
    }

    /// Replace weights, decay rate and fraud threshold together.
    pub async fn update_voting_params(
        &self,
        cap: &AdminCapability,
        voting: VotingParams,
    ) -> EngineResult<EngineParams> {
        self.update_params(cap, "update_voting_params", |p| p.voting = voting)
            .await
    }

    pub async fn update_slashing_params(
        &self,
        cap: &AdminCapability,
        slashing: SlashingParams,
    ) -> EngineResult<EngineParams> {
        self.update_params(cap, "update_slashing_params", |p| p.slashing = slashing)
            .await
    }

    pub async fn update_epoch_interval(
        &self,
        cap: &AdminCapability,
        interval_secs: u64,
    ) -> EngineResult<EngineParams> {
        self.update_params(cap, "update_epoch_interval", |p| {
            p.epoch_interval_secs = interval_secs
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AuditLog, InMemoryFraudOracle, InMemoryReputationOracle, Sha256Hasher};

    fn engine() -> (IncentiveEngine, AdminCapability, Arc<InMemoryReputationOracle>, AuditLog) {
        let reputation = Arc::new(InMemoryReputationOracle::new(50));
        let audit = AuditLog::new(1000);
        let collaborators = Collaborators {
            reputation: reputation.clone(),
            fraud: Arc::new(InMemoryFraudOracle::default()),
            hasher: Arc::new(Sha256Hasher::new()),
            audit: Arc::new(audit.clone()),
        };
        let (engine, cap) = IncentiveEngine::new(EngineParams::default(), collaborators).unwrap();
        (engine, cap, reputation, audit)
    }

    #[tokio::test]
    async fn test_forged_capability_rejected() {
        let (engine, _cap, _, _) = engine();
        engine.register_validator("v1", 1000).await.unwrap();

        let forged = AdminCapability::from_token(Uuid::new_v4());
        let err = engine
            .slash(&forged, "v1", 1000, SlashReason::Downtime, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Unauthorized("slash"));
        assert_eq!(engine.validator("v1").await.unwrap().stake, 1000);
    }

    #[tokio::test]
    async fn test_registration_pulls_reputation() {
        let (engine, _cap, reputation, audit) = engine();
        reputation.set("v1", 90);

        let record = engine.register_validator("v1", 1000).await.unwrap();
        assert_eq!(record.reputation_score, 90);
        assert_eq!(record.performance_score, 0);
        assert_eq!(audit.get_by_category(AuditCategory::Registration).await.len(), 1);
    }

    #[tokio::test]
    async fn test_oracle_out_of_range_is_collaborator_failure() {
        let (engine, _cap, reputation, _) = engine();
        reputation.set("v1", 150);

        let err = engine.register_validator("v1", 1000).await.unwrap_err();
        assert!(matches!(err, EngineError::Collaborator { collaborator: "reputation oracle", .. }));
        assert!(engine.validator("v1").await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_is_all_or_nothing() {
        let (engine, cap, reputation, _) = engine();
        engine.register_validator("a", 10).await.unwrap();
        engine.register_validator("b", 10).await.unwrap();

        reputation.set("a", 80);
        reputation.set("b", 101);
        assert!(engine.refresh_reputation(&cap).await.is_err());
        assert_eq!(engine.validator("a").await.unwrap().reputation_score, 50);

        reputation.set("b", 70);
        assert_eq!(engine.refresh_reputation(&cap).await.unwrap(), 2);
        assert_eq!(engine.validator("a").await.unwrap().reputation_score, 80);
        assert_eq!(engine.validator("b").await.unwrap().reputation_score, 70);
    }

    #[tokio::test]
    async fn test_rejected_weight_update_keeps_previous() {
        let (engine, cap, _, _) = engine();
        let before = engine.params().await;

        let bad = ScoringWeights {
            performance: 50,
            reputation: 50,
            uptime: 50,
            stake: 0,
        };
        let err = engine.update_scoring_weights(&cap, bad).await.unwrap_err();
        assert_eq!(err, EngineError::InvalidWeights { set: "scoring", sum: 150 });
        assert_eq!(engine.params().await, before);

        let good = ScoringWeights::new(25, 25, 25, 25).unwrap();
        let after = engine.update_scoring_weights(&cap, good).await.unwrap();
        assert_eq!(after.version, before.version + 1);
        assert_eq!(engine.params().await.scoring, good);
    }

    #[tokio::test]
    async fn test_epoch_interval_update_validated() {
        let (engine, cap, _, _) = engine();
        assert!(engine.update_epoch_interval(&cap, 49).await.is_err());
        assert_eq!(engine.update_epoch_interval(&cap, 50).await.unwrap().epoch_interval_secs, 50);
    }

    #[tokio::test]
    async fn test_events_broadcast() {
        let (engine, cap, _, _) = engine();
        let mut events = engine.subscribe();

        let at = Utc::now();
        engine.advance_epoch(&cap, at).await.unwrap();
        assert_eq!(events.recv().await.unwrap(), EngineEvent::EpochAdvanced { epoch: 1, at });
    }
}
