//! Epoch clock and best-validator selection
//!
//! Selection always reads live registry state. Advancing the epoch and
//! running a selection are separate calls; nothing links them atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::IntegrityHash;
use crate::error::{EngineError, EngineResult};
use crate::registry::ValidatorRegistry;
use crate::scoring::{ScoreCard, ScoringEngine};

/// Lower bound on the configurable epoch interval, in seconds of network time.
pub const MIN_EPOCH_INTERVAL_SECS: u64 = 50;

pub fn check_epoch_interval(interval_secs: u64) -> EngineResult<()> {
    if interval_secs < MIN_EPOCH_INTERVAL_SECS {
        return Err(EngineError::InvalidParameter {
            name: "epoch interval",
            reason: format!(
                "{}s is below the {}s minimum",
                interval_secs, MIN_EPOCH_INTERVAL_SECS
            ),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochClock {
    current_epoch: u64,
    interval_secs: u64,
    last_advanced_at: Option<DateTime<Utc>>,
}

impl EpochClock {
    pub fn new(interval_secs: u64) -> EngineResult<Self> {
        check_epoch_interval(interval_secs)?;
        Ok(Self {
            current_epoch: 0,
            interval_secs,
            last_advanced_at: None,
        })
    }

    pub fn current_epoch(&self) -> u64 {
        self.current_epoch
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn last_advanced_at(&self) -> Option<DateTime<Utc>> {
        self.last_advanced_at
    }

    pub fn set_interval(&mut self, interval_secs: u64) -> EngineResult<()> {
        check_epoch_interval(interval_secs)?;
        self.interval_secs = interval_secs;
        Ok(())
    }

    /// Move to the next epoch. The first advance is always allowed; later
    /// ones need at least `interval_secs` since the previous one.
    pub fn advance(&mut self, at: DateTime<Utc>) -> EngineResult<u64> {
        if let Some(last) = self.last_advanced_at {
            let elapsed = (at - last).num_seconds();
            if elapsed < 0 || (elapsed as u64) < self.interval_secs {
                return Err(EngineError::EpochIntervalNotElapsed {
                    elapsed,
                    required: self.interval_secs,
                });
            }
        }

        let next = self
            .current_epoch
            .checked_add(1)
            .ok_or(EngineError::ArithmeticOverflow("epoch counter"))?;
        self.current_epoch = next;
        self.last_advanced_at = Some(at);
        info!(epoch = next, "Epoch advanced");
        Ok(next)
    }
}

/// Outcome of a successful selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub validator_id: String,
    pub total_score: u64,
    pub epoch: u64,
    pub commitment: IntegrityHash,
}

/// Arg-max by total score. The running maximum starts at zero and only a
/// strictly greater score replaces it, so the first validator seen with the
/// top score wins and an all-zero field selects nobody.
pub fn pick_best(cards: &[ScoreCard]) -> Option<&ScoreCard> {
    let mut best: Option<&ScoreCard> = None;
    let mut best_score = 0u64;
    for card in cards {
        if card.total_score > best_score {
            best_score = card.total_score;
            best = Some(card);
        }
    }
    best
}

pub struct SelectionProcess;

impl SelectionProcess {
    /// Score every eligible validator, pick the best and stamp its
    /// `last_selected_epoch`. `Ok(None)` when nobody is eligible.
    pub fn select_best(
        registry: &mut ValidatorRegistry,
        scorer: &ScoringEngine<'_>,
        epoch: u64,
    ) -> EngineResult<Option<Selection>> {
        let cards = scorer.score_all(registry);
        let Some(best) = pick_best(&cards) else {
            debug!(epoch, candidates = cards.len(), "No eligible validator selected");
            return Ok(None);
        };

        let selection = Selection {
            validator_id: best.validator_id.clone(),
            total_score: best.total_score,
            epoch,
            commitment: best.commitment,
        };
        registry.record_selection(&selection.validator_id, epoch)?;

        info!(
            validator = %selection.validator_id,
            score = selection.total_score,
            epoch,
            "Validator selected"
        );
        Ok(Some(selection))
    }
}
