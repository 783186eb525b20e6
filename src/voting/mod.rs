//! Governance voting power
//!
//! Mirrors the validator scorer with its own two-weight set:
//! `power = ⌊stake·Ws/100⌋ + ⌊reputation·Wr/100⌋`. Casting a vote decays the
//! voter's reputation; voters at or above the fraud-flag threshold may not
//! vote. Delegation is a single static hop that never aggregates power.

mod model;
mod voter;

pub use model::{VoteReceipt, VotingModel, VotingParams};
pub use voter::VoterRecord;
