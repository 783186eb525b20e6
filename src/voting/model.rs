use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::VoterRecord;
use crate::error::{EngineError, EngineResult};
use crate::registry::check_metric;
use crate::scoring::{weighted, VotingWeights};

/// Governance-configurable voting parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingParams {
    pub weights: VotingWeights,

    /// Percent of reputation removed by each vote
    pub decay_rate: u64,

    /// Voters with this many fraud flags or more are disqualified
    pub fraud_threshold: u32,
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            weights: VotingWeights::default(),
            decay_rate: 10,
            fraud_threshold: 3,
        }
    }
}

impl VotingParams {
    pub fn validate(&self) -> EngineResult<()> {
        self.weights.validate()?;
        if self.decay_rate > 100 {
            return Err(EngineError::InvalidParameter {
                name: "decay rate",
                reason: format!("{} exceeds 100", self.decay_rate),
            });
        }
        if self.fraud_threshold == 0 {
            return Err(EngineError::InvalidParameter {
                name: "fraud threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub voter_id: String,
    /// Power at the moment of voting, before decay
    pub power: u64,
    pub at: u64,
    pub reputation_after: u64,
}

#[derive(Debug, Clone, Default)]
pub struct VotingModel {
    params: VotingParams,
    voters: HashMap<String, VoterRecord>,
    delegations: HashMap<String, String>,
    fraud_flags: HashMap<String, u32>,
}

impl VotingModel {
    pub fn new(params: VotingParams) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    pub fn params(&self) -> &VotingParams {
        &self.params
    }

    pub fn set_params(&mut self, params: VotingParams) -> EngineResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn register(&mut self, id: &str, stake: u64, reputation: u64) -> EngineResult<&VoterRecord> {
        if id.is_empty() {
            return Err(EngineError::InvalidParameter {
                name: "voter id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.voters.contains_key(id) {
            return Err(EngineError::AlreadyRegistered(id.to_string()));
        }
        check_metric("reputation", reputation)?;

        debug!(voter = %id, stake, reputation, "Voter registered");
        Ok(self
            .voters
            .entry(id.to_string())
            .or_insert_with(|| VoterRecord::new(id.to_string(), stake, reputation)))
    }

    pub fn voter(&self, id: &str) -> Option<&VoterRecord> {
        self.voters.get(id)
    }

    fn require(&self, id: &str) -> EngineResult<&VoterRecord> {
        self.voters
            .get(id)
            .ok_or_else(|| EngineError::UnknownVoter(id.to_string()))
    }

    pub fn voting_power(&self, id: &str) -> EngineResult<u64> {
        let voter = self.require(id)?;
        Ok(self.power_of(voter))
    }

    fn power_of(&self, voter: &VoterRecord) -> u64 {
        weighted(voter.stake, self.params.weights.stake)
            .saturating_add(weighted(voter.reputation_score, self.params.weights.reputation))
    }

    pub fn fraud_flags(&self, id: &str) -> u32 {
        self.fraud_flags.get(id).copied().unwrap_or(0)
    }

    pub fn is_disqualified(&self, id: &str) -> bool {
        self.fraud_flags(id) >= self.params.fraud_threshold
    }

    /// Record a vote at `at` (block or epoch). Rejected for unknown voters,
    /// repeat voters and voters over the fraud threshold.
    pub fn cast_vote(&mut self, id: &str, at: u64) -> EngineResult<VoteReceipt> {
        let voter = self.require(id)?;
        if voter.has_voted {
            return Err(EngineError::AlreadyVoted(id.to_string()));
        }
        let flags = self.fraud_flags(id);
        if flags >= self.params.fraud_threshold {
            return Err(EngineError::VoterDisqualified {
                id: id.to_string(),
                flags,
                threshold: self.params.fraud_threshold,
            });
        }

        let power = self.power_of(voter);
        let decay_rate = self.params.decay_rate;
        let voter = self
            .voters
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownVoter(id.to_string()))?;
        let decay = voter.reputation_score * decay_rate / 100;
        voter.reputation_score = voter.reputation_score.saturating_sub(decay);
        voter.has_voted = true;
        voter.last_vote_at = Some(at);

        info!(voter = %id, power, at, reputation = voter.reputation_score, "Vote cast");
        Ok(VoteReceipt {
            voter_id: id.to_string(),
            power,
            at,
            reputation_after: voter.reputation_score,
        })
    }

    /// One hop, set once. Power is not forwarded to the delegatee.
    pub fn delegate(&mut self, from: &str, to: &str) -> EngineResult<()> {
        self.require(from)?;
        self.require(to)?;
        if from == to {
            return Err(EngineError::SelfDelegation(from.to_string()));
        }
        if self.delegations.contains_key(from) {
            return Err(EngineError::AlreadyDelegated(from.to_string()));
        }
        self.delegations.insert(from.to_string(), to.to_string());
        info!(from = %from, to = %to, "Vote delegated");
        Ok(())
    }

    pub fn delegate_of(&self, id: &str) -> Option<&str> {
        self.delegations.get(id).map(String::as_str)
    }

    /// Add one fraud flag; returns the new count.
    pub fn flag(&mut self, id: &str) -> EngineResult<u32> {
        self.require(id)?;
        let count = self.fraud_flags.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        if *count >= self.params.fraud_threshold {
            warn!(voter = %id, flags = *count, "Voter reached fraud threshold");
        }
        Ok(*count)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}
