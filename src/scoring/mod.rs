//! Merit scoring
//!
//! `total = ⌊perf·Wp/100⌋ + ⌊rep·Wr/100⌋ + ⌊uptime·Wu/100⌋ + ⌊stake·Ws/100⌋`
//!
//! Each term truncates on its own, so a score can sit up to 3 units below
//! the exact weighted sum. That shortfall is part of the contract.

mod engine;
mod weights;

pub use engine::{weighted, ScoreCard, ScoringEngine};
pub use weights::{ScoringWeights, VotingWeights, WEIGHT_TOTAL};
