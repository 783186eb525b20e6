use serde::{Deserialize, Serialize};
use tracing::info;

use super::RewardPool;
use crate::error::{EngineError, EngineResult};
use crate::registry::ValidatorRegistry;
use crate::scoring::{ScoreCard, ScoringEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub validator_id: String,
    pub score: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    pub epoch: u64,
    pub total_pool: u64,
    pub total_score: u128,
    pub payouts: Vec<Payout>,
    pub distributed: u64,
    /// `total_pool − distributed`; always below the number of payouts
    pub dust: u64,
}

/// `⌊pool·score/Σscore⌋` for every card.
pub fn compute_payouts(total_pool: u64, cards: &[ScoreCard]) -> EngineResult<(u128, Vec<Payout>)> {
    if total_pool == 0 {
        return Err(EngineError::EmptyRewardPool);
    }
    let total_score: u128 = cards.iter().map(|c| c.total_score as u128).sum();
    if total_score == 0 {
        return Err(EngineError::ZeroTotalScore);
    }

    let payouts = cards
        .iter()
        .map(|card| Payout {
            validator_id: card.validator_id.clone(),
            score: card.total_score,
            // share ≤ pool because score ≤ Σscore
            amount: (total_pool as u128 * card.total_score as u128 / total_score) as u64,
        })
        .collect();
    Ok((total_score, payouts))
}

pub struct RewardDistributor;

impl RewardDistributor {
    /// Pay the whole pool out to eligible validators and reset it to zero.
    /// At most one distribution per epoch.
    pub fn distribute(
        pool: &mut RewardPool,
        registry: &mut ValidatorRegistry,
        scorer: &ScoringEngine<'_>,
        epoch: u64,
    ) -> EngineResult<RewardDistribution> {
        if pool.distributed_in(epoch) {
            return Err(EngineError::AlreadyDistributed(epoch));
        }

        let cards = scorer.score_all(registry);
        let (total_score, payouts) = compute_payouts(pool.total_pool, &cards)?;

        // Check every credit before applying any of them.
        for payout in &payouts {
            let record = registry.require(&payout.validator_id)?;
            record
                .accrued_rewards
                .checked_add(payout.amount)
                .ok_or(EngineError::ArithmeticOverflow("accrued rewards"))?;
        }
        for payout in &payouts {
            registry.credit_reward(&payout.validator_id, payout.amount)?;
        }

        let total_pool = pool.total_pool;
        let distributed: u64 = payouts.iter().map(|p| p.amount).sum();
        let dust = total_pool - distributed;

        pool.total_pool = 0;
        pool.last_distributed_epoch = Some(epoch);
        pool.total_distributed = pool.total_distributed.saturating_add(distributed);
        pool.total_dust = pool.total_dust.saturating_add(dust);

        info!(
            epoch,
            total_pool,
            distributed,
            dust,
            recipients = payouts.len(),
            "Rewards distributed"
        );
        Ok(RewardDistribution {
            epoch,
            total_pool,
            total_score,
            payouts,
            distributed,
            dust,
        })
    }
}
