//! Epoch reward distribution
//!
//! The pool is split pro-rata by merit score. Each share truncates, and the
//! rounding dust is dropped when the pool resets to zero.

mod distributor;
mod pool;

pub use distributor::{compute_payouts, Payout, RewardDistribution, RewardDistributor};
pub use pool::RewardPool;
