//! Integration tests for the validator merit engine
//!
//! These tests drive the public `IncentiveEngine` surface end to end with
//! in-process collaborators: selection, slashing and appeals, reward
//! distribution, voting, authorization and governance updates.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator_merit::{
    AdminCapability, AuditCategory, AuditLog, Collaborators, EngineError, EngineEvent,
    EngineParams, ErrorKind, IncentiveEngine, InMemoryFraudOracle, InMemoryReputationOracle,
    ScoringWeights, Sha256Hasher, SlashOutcome, SlashReason, VotingWeights,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    engine: IncentiveEngine,
    cap: AdminCapability,
    reputation: Arc<InMemoryReputationOracle>,
    fraud: Arc<InMemoryFraudOracle>,
    audit: AuditLog,
}

/// Engine with default parameters and in-memory collaborators
fn create_harness() -> Harness {
    create_harness_with(EngineParams::default())
}

fn create_harness_with(params: EngineParams) -> Harness {
    let reputation = Arc::new(InMemoryReputationOracle::new(50));
    let fraud = Arc::new(InMemoryFraudOracle::new(50));
    let audit = AuditLog::new(10_000);

    let collaborators = Collaborators {
        reputation: reputation.clone(),
        fraud: fraud.clone(),
        hasher: Arc::new(Sha256Hasher::new()),
        audit: Arc::new(audit.clone()),
    };
    let (engine, cap) = IncentiveEngine::new(params, collaborators).unwrap();

    Harness {
        engine,
        cap,
        reputation,
        fraud,
        audit,
    }
}

/// Register a validator with a given oracle reputation and reported metrics
async fn add_validator(
    h: &Harness,
    id: &str,
    stake: u64,
    reputation: u64,
    performance: u64,
    uptime: u64,
) {
    h.reputation.set(id, reputation);
    h.engine.register_validator(id, stake).await.unwrap();
    h.engine
        .report_metrics(&h.cap, id, performance, uptime)
        .await
        .unwrap();
}

/// Validator A from the reference scenario: 32 + 27 + 20 + 100 = 179
async fn add_validator_a(h: &Harness) {
    add_validator(h, "A", 1000, 90, 80, 100).await;
}

fn forged_cap() -> AdminCapability {
    AdminCapability::from_token(Uuid::new_v4())
}

// ============================================================================
// Selection
// ============================================================================

mod selection {
    use super::*;

    #[tokio::test]
    async fn test_reference_validator_scores_179_and_is_selected() {
        let h = create_harness();
        add_validator_a(&h).await;
        add_validator(&h, "B", 500, 40, 50, 60).await;

        let card = h.engine.score_of("A").await.unwrap().unwrap();
        assert_eq!(card.total_score, 179);

        let selection = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(selection.validator_id, "A");
        assert_eq!(selection.total_score, 179);

        let record = h.engine.validator("A").await.unwrap();
        assert_eq!(record.last_selected_epoch, Some(0));
    }

    #[tokio::test]
    async fn test_selection_is_idempotent() {
        let h = create_harness();
        add_validator_a(&h).await;
        add_validator(&h, "B", 1500, 70, 60, 90).await;

        let first = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        let second = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(first.validator_id, second.validator_id);
        assert_eq!(first.total_score, second.total_score);
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_registered() {
        let h = create_harness();
        add_validator(&h, "first", 1000, 50, 50, 50).await;
        add_validator(&h, "second", 1000, 50, 50, 50).await;

        let selection = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(selection.validator_id, "first");
    }

    #[tokio::test]
    async fn test_no_eligible_validator_is_not_an_error() {
        let h = create_harness();
        add_validator_a(&h).await;
        h.engine.set_disqualified(&h.cap, "A", true).await.unwrap();

        assert!(h.engine.select_best(&h.cap).await.unwrap().is_none());
        assert!(h.engine.ranking().await.is_empty());
        assert!(h.engine.score_of("A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disqualified_validator_skipped() {
        let h = create_harness();
        add_validator_a(&h).await;
        add_validator(&h, "B", 100, 10, 10, 10).await;
        h.engine.set_disqualified(&h.cap, "A", true).await.unwrap();

        let selection = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(selection.validator_id, "B");

        h.engine.set_disqualified(&h.cap, "A", false).await.unwrap();
        let selection = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(selection.validator_id, "A");
    }

    #[tokio::test]
    async fn test_epoch_interval_enforced() {
        let h = create_harness();
        let start = Utc::now();

        assert_eq!(h.engine.advance_epoch(&h.cap, start).await.unwrap(), 1);

        let err = h
            .engine
            .advance_epoch(&h.cap, start + Duration::seconds(599))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EpochIntervalNotElapsed { .. }));
        assert_eq!(h.engine.current_epoch().await, 1);

        let epoch = h
            .engine
            .advance_epoch(&h.cap, start + Duration::seconds(600))
            .await
            .unwrap();
        assert_eq!(epoch, 2);
    }

    #[tokio::test]
    async fn test_selection_records_current_epoch() {
        let h = create_harness();
        add_validator_a(&h).await;
        h.engine.advance_epoch(&h.cap, Utc::now()).await.unwrap();

        let selection = h.engine.select_best(&h.cap).await.unwrap().unwrap();
        assert_eq!(selection.epoch, 1);
        assert_eq!(
            h.engine.validator("A").await.unwrap().last_selected_epoch,
            Some(1)
        );
    }
}

// ============================================================================
// Slashing & Appeals
// ============================================================================

mod slashing {
    use super::*;

    #[tokio::test]
    async fn test_slash_scaled_by_reputation() {
        let h = create_harness();
        add_validator(&h, "V", 2000, 70, 50, 50).await;

        let outcome = h
            .engine
            .slash(&h.cap, "V", 1000, SlashReason::Downtime, Utc::now())
            .await
            .unwrap();

        let record = match outcome {
            SlashOutcome::Applied(record) => record,
            other => panic!("expected applied slash, got {:?}", other),
        };
        assert_eq!(record.penalty_amount, 300);
        assert_eq!(record.reason, SlashReason::Downtime);

        let validator = h.engine.validator("V").await.unwrap();
        assert_eq!(validator.stake, 1700);
        assert_eq!(validator.offense_count, 1);
        assert_eq!(h.engine.slashing_history("V", 0, 10).await, vec![record]);
    }

    #[tokio::test]
    async fn test_appeal_restores_thirty_percent() {
        let h = create_harness();
        add_validator(&h, "V", 2000, 70, 50, 50).await;

        let record_id = match h
            .engine
            .slash(&h.cap, "V", 1000, SlashReason::Equivocation, Utc::now())
            .await
            .unwrap()
        {
            SlashOutcome::Applied(record) => record.id,
            other => panic!("expected applied slash, got {:?}", other),
        };

        let outcome = h.engine.appeal(&h.cap, record_id).await.unwrap();
        assert_eq!(outcome.restored, 90);
        assert_eq!(outcome.stake, 1790);
        assert_eq!(outcome.offense_count, 0);

        // Each record can be appealed once.
        let err = h.engine.appeal(&h.cap, record_id).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyAppealed(record_id));
        assert_eq!(h.engine.validator("V").await.unwrap().stake, 1790);
    }

    #[tokio::test]
    async fn test_large_penalty_escalates_without_mutation() {
        let h = create_harness();
        add_validator(&h, "V", 10_000, 0, 50, 50).await;
        let mut events = h.engine.subscribe();

        let outcome = h
            .engine
            .slash(&h.cap, "V", 3000, SlashReason::InvalidBlock, Utc::now())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            SlashOutcome::GovernanceReview {
                adjusted_penalty: 3000,
                threshold: 2500,
                ..
            }
        ));
        let validator = h.engine.validator("V").await.unwrap();
        assert_eq!(validator.stake, 10_000);
        assert_eq!(validator.offense_count, 0);
        assert!(h.engine.slashing_history("V", 0, 10).await.is_empty());

        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::GovernanceReviewRequired {
                validator_id: "V".to_string(),
                adjusted_penalty: 3000,
                threshold: 2500,
            }
        );
        assert_eq!(
            h.audit
                .get_by_category(AuditCategory::GovernanceReview)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_penalty_band_and_stake_checks() {
        let h = create_harness();
        add_validator(&h, "V", 500, 50, 50, 50).await;

        let err = h
            .engine
            .slash(&h.cap, "V", 50, SlashReason::Downtime, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PenaltyOutOfRange { .. }));

        let err = h
            .engine
            .slash(&h.cap, "V", 1000, SlashReason::Downtime, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStake { .. }));
        assert_eq!(err.kind(), ErrorKind::PreconditionViolation);

        assert_eq!(h.engine.validator("V").await.unwrap().stake, 500);
    }

    #[tokio::test]
    async fn test_stake_never_negative_across_slash_sequence() {
        let h = create_harness();
        add_validator(&h, "V", 1000, 0, 50, 50).await;

        let mut applied = Vec::new();
        loop {
            match h
                .engine
                .slash(&h.cap, "V", 400, SlashReason::ProtocolViolation, Utc::now())
                .await
            {
                Ok(SlashOutcome::Applied(record)) => applied.push(record.id),
                Ok(other) => panic!("unexpected outcome {:?}", other),
                Err(EngineError::InsufficientStake { .. }) => break,
                Err(e) => panic!("unexpected error {}", e),
            }
        }
        assert_eq!(applied.len(), 2);
        assert_eq!(h.engine.validator("V").await.unwrap().stake, 200);

        for id in applied {
            h.engine.appeal(&h.cap, id).await.unwrap();
        }
        let validator = h.engine.validator("V").await.unwrap();
        assert_eq!(validator.stake, 200 + 120 + 120);
        assert_eq!(validator.offense_count, 0);
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let h = create_harness();
        add_validator(&h, "V", 10_000, 0, 50, 50).await;

        for _ in 0..5 {
            h.engine
                .slash(&h.cap, "V", 100, SlashReason::Downtime, Utc::now())
                .await
                .unwrap();
        }

        let page = h.engine.slashing_history("V", 1, 2).await;
        assert_eq!(page.len(), 2);
        assert!(page[0].id < page[1].id);
        assert!(h.engine.slashing_history("V", 5, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_record_appeal_rejected() {
        let h = create_harness();
        let err = h.engine.appeal(&h.cap, 42).await.unwrap_err();
        assert_eq!(err, EngineError::UnknownSlashingRecord(42));
    }
}

// ============================================================================
// Rewards
// ============================================================================

mod rewards {
    use super::*;

    #[tokio::test]
    async fn test_proportional_distribution_without_dust() {
        let h = create_harness();
        add_validator_a(&h).await;
        // 0 + 0 + 0 + floor(210 * 10 / 100) = 21
        add_validator(&h, "B", 210, 0, 0, 0).await;

        h.engine.fund_pool(&h.cap, 1000).await.unwrap();
        let distribution = h.engine.distribute(&h.cap).await.unwrap();

        assert_eq!(distribution.total_score, 200);
        let amounts: Vec<(String, u64)> = distribution
            .payouts
            .iter()
            .map(|p| (p.validator_id.clone(), p.amount))
            .collect();
        assert_eq!(
            amounts,
            vec![("A".to_string(), 895), ("B".to_string(), 105)]
        );
        assert_eq!(distribution.dust, 0);

        assert_eq!(h.engine.validator("A").await.unwrap().accrued_rewards, 895);
        assert_eq!(h.engine.validator("A").await.unwrap().stake, 1000);
        assert_eq!(h.engine.pool().await.total_pool, 0);
    }

    #[tokio::test]
    async fn test_rounding_dust_is_dropped() {
        let h = create_harness();
        for id in ["x", "y", "z"] {
            add_validator(&h, id, 100, 0, 0, 0).await;
        }

        h.engine.fund_pool(&h.cap, 1000).await.unwrap();
        let distribution = h.engine.distribute(&h.cap).await.unwrap();

        assert!(distribution.payouts.iter().all(|p| p.amount == 333));
        assert_eq!(distribution.distributed, 999);
        assert_eq!(distribution.dust, 1);

        let pool = h.engine.pool().await;
        assert_eq!(pool.total_pool, 0);
        assert_eq!(pool.total_dust, 1);
    }

    #[tokio::test]
    async fn test_one_distribution_per_epoch() {
        let h = create_harness();
        add_validator_a(&h).await;

        h.engine.fund_pool(&h.cap, 500).await.unwrap();
        h.engine.distribute(&h.cap).await.unwrap();

        h.engine.fund_pool(&h.cap, 500).await.unwrap();
        let err = h.engine.distribute(&h.cap).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyDistributed(0));
        assert_eq!(h.engine.pool().await.total_pool, 500);

        h.engine.advance_epoch(&h.cap, Utc::now()).await.unwrap();
        let distribution = h.engine.distribute(&h.cap).await.unwrap();
        assert_eq!(distribution.epoch, 1);
        assert_eq!(distribution.distributed, 500);
    }

    #[tokio::test]
    async fn test_empty_pool_and_zero_score_rejected() {
        let h = create_harness();
        add_validator(&h, "zero", 0, 0, 0, 0).await;

        assert_eq!(
            h.engine.distribute(&h.cap).await.unwrap_err(),
            EngineError::EmptyRewardPool
        );

        h.engine.fund_pool(&h.cap, 100).await.unwrap();
        assert_eq!(
            h.engine.distribute(&h.cap).await.unwrap_err(),
            EngineError::ZeroTotalScore
        );
        assert_eq!(h.engine.pool().await.total_pool, 100);
    }
}

// ============================================================================
// Voting
// ============================================================================

mod voting {
    use super::*;

    #[tokio::test]
    async fn test_vote_applies_decay_once() {
        let h = create_harness();
        h.reputation.set("alice", 80);
        h.engine.register_voter("alice", 1000).await.unwrap();

        // floor(1000 * 50 / 100) + floor(80 * 50 / 100)
        assert_eq!(h.engine.voting_power("alice").await.unwrap(), 540);

        let receipt = h.engine.cast_vote("alice", 10).await.unwrap();
        assert_eq!(receipt.power, 540);
        assert_eq!(receipt.reputation_after, 72);

        let err = h.engine.cast_vote("alice", 11).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyVoted("alice".to_string()));
        assert_eq!(h.engine.voter("alice").await.unwrap().reputation_score, 72);
    }

    #[tokio::test]
    async fn test_unregistered_voter_rejected() {
        let h = create_harness();
        let err = h.engine.cast_vote("ghost", 1).await.unwrap_err();
        assert_eq!(err, EngineError::UnknownVoter("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_delegation_single_hop_immutable() {
        let h = create_harness();
        for id in ["a", "b", "c"] {
            h.engine.register_voter(id, 100).await.unwrap();
        }

        assert_eq!(
            h.engine.delegate_vote("a", "a").await.unwrap_err(),
            EngineError::SelfDelegation("a".to_string())
        );
        assert!(h.engine.delegate_vote("a", "missing").await.is_err());

        h.engine.delegate_vote("a", "b").await.unwrap();
        assert_eq!(h.engine.delegate_of("a").await, Some("b".to_string()));

        assert_eq!(
            h.engine.delegate_vote("a", "c").await.unwrap_err(),
            EngineError::AlreadyDelegated("a".to_string())
        );

        // Power is not aggregated onto the delegatee.
        assert_eq!(
            h.engine.voting_power("b").await.unwrap(),
            h.engine.voting_power("c").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_fraud_flags_disqualify_voter() {
        let h = create_harness();
        h.engine.register_voter("mallory", 100).await.unwrap();

        for expected in 1..=3 {
            assert_eq!(h.engine.flag_voter(&h.cap, "mallory").await.unwrap(), expected);
        }

        let err = h.engine.cast_vote("mallory", 1).await.unwrap_err();
        assert!(matches!(err, EngineError::VoterDisqualified { flags: 3, .. }));
    }

    #[tokio::test]
    async fn test_screening_consults_fraud_oracle() {
        let h = create_harness();
        h.engine.register_voter("honest", 100).await.unwrap();
        h.engine.register_voter("suspect", 100).await.unwrap();
        h.fraud.set_score("suspect", 90);

        let clean = h.engine.screen_voter(&h.cap, "honest").await.unwrap();
        assert!(!clean.flagged);
        assert_eq!(clean.fraud_flags, 0);

        let result = h.engine.screen_voter(&h.cap, "suspect").await.unwrap();
        assert!(result.flagged);
        assert_eq!(result.fraud_score, 90);
        assert_eq!(result.fraud_flags, 1);
        assert_eq!(h.fraud.scans("suspect"), 1);
        assert_eq!(h.engine.fraud_flags("suspect").await, 1);
    }
}

// ============================================================================
// Authorization, Collaborators & Governance
// ============================================================================

mod governance {
    use super::*;

    #[tokio::test]
    async fn test_gated_operations_require_capability() {
        let h = create_harness();
        add_validator_a(&h).await;
        h.engine.register_voter("v", 100).await.unwrap();
        let forged = forged_cap();

        let results = vec![
            h.engine.select_best(&forged).await.map(|_| ()),
            h.engine.advance_epoch(&forged, Utc::now()).await.map(|_| ()),
            h.engine
                .slash(&forged, "A", 1000, SlashReason::Downtime, Utc::now())
                .await
                .map(|_| ()),
            h.engine.appeal(&forged, 0).await.map(|_| ()),
            h.engine.fund_pool(&forged, 100).await.map(|_| ()),
            h.engine.distribute(&forged).await.map(|_| ()),
            h.engine.report_metrics(&forged, "A", 1, 1).await,
            h.engine.set_disqualified(&forged, "A", true).await,
            h.engine.flag_voter(&forged, "v").await.map(|_| ()),
            h.engine
                .update_epoch_interval(&forged, 100)
                .await
                .map(|_| ()),
        ];

        for result in results {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthorizationViolation);
        }

        let record = h.engine.validator("A").await.unwrap();
        assert_eq!(record.stake, 1000);
        assert!(!record.disqualified);
        assert_eq!(h.engine.pool().await.total_pool, 0);
        assert_eq!(h.engine.params().await.version, 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_propagates() {
        let h = create_harness();
        h.reputation.set_offline(true);

        let err = h.engine.register_validator("V", 1000).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCollaboratorFailure);
        assert!(h.engine.validator("V").await.is_none());

        h.reputation.set_offline(false);
        h.engine.register_validator("V", 1000).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let h = create_harness();
        h.engine.register_validator("V", 1000).await.unwrap();
        let err = h.engine.register_validator("V", 5).await.unwrap_err();
        assert_eq!(err, EngineError::AlreadyRegistered("V".to_string()));
        assert_eq!(h.engine.validator("V").await.unwrap().stake, 1000);
    }

    #[tokio::test]
    async fn test_weight_updates_validated_and_versioned() {
        let h = create_harness();
        add_validator_a(&h).await;

        let bad = ScoringWeights {
            performance: 40,
            reputation: 30,
            uptime: 20,
            stake: 20,
        };
        assert!(h.engine.update_scoring_weights(&h.cap, bad).await.is_err());
        assert_eq!(h.engine.score_of("A").await.unwrap().unwrap().total_score, 179);

        let perf_only = ScoringWeights::new(100, 0, 0, 0).unwrap();
        let params = h.engine.update_scoring_weights(&h.cap, perf_only).await.unwrap();
        assert_eq!(params.version, 2);
        assert_eq!(h.engine.score_of("A").await.unwrap().unwrap().total_score, 80);

        let bad_voting = VotingWeights {
            stake: 70,
            reputation: 70,
        };
        assert!(h
            .engine
            .update_voting_weights(&h.cap, bad_voting)
            .await
            .is_err());
        assert_eq!(h.engine.params().await.version, 2);
    }

    #[tokio::test]
    async fn test_slashing_params_update_applies() {
        let h = create_harness();
        add_validator(&h, "V", 10_000, 0, 50, 50).await;

        let mut slashing = h.engine.params().await.slashing;
        slashing.governance_review_threshold = 5_000;
        h.engine
            .update_slashing_params(&h.cap, slashing)
            .await
            .unwrap();

        let outcome = h
            .engine
            .slash(&h.cap, "V", 3000, SlashReason::Downtime, Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, SlashOutcome::Applied(_)));
    }

    #[tokio::test]
    async fn test_events_and_audit_trail() {
        let h = create_harness();
        add_validator_a(&h).await;
        let mut events = h.engine.subscribe();

        h.engine.select_best(&h.cap).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::ValidatorSelected {
                validator_id: "A".to_string(),
                total_score: 179,
                epoch: 0,
            }
        );

        h.engine.fund_pool(&h.cap, 100).await.unwrap();
        h.engine.distribute(&h.cap).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::RewardsDistributed {
                epoch: 0,
                distributed: 100,
                dust: 0,
            }
        );

        let trail = h.audit.get_for_subject("A").await;
        assert!(trail.iter().any(|e| e.category == AuditCategory::Selection));
        assert!(trail.iter().any(|e| e.category == AuditCategory::Rewards));
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_at_construction() {
        let mut params = EngineParams::default();
        params.epoch_interval_secs = 10;

        let collaborators = Collaborators {
            reputation: Arc::new(InMemoryReputationOracle::default()),
            fraud: Arc::new(InMemoryFraudOracle::default()),
            hasher: Arc::new(Sha256Hasher::new()),
            audit: Arc::new(AuditLog::default()),
        };
        assert!(IncentiveEngine::new(params, collaborators).is_err());
    }
}
