use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: String,
    pub stake: u64,
    pub reputation_score: u64,

    /// Block or epoch of the last accepted vote
    pub last_vote_at: Option<u64>,

    /// Set on the first vote; never cleared here
    pub has_voted: bool,

    pub registered_at: DateTime<Utc>,
}

impl VoterRecord {
    pub fn new(id: String, stake: u64, reputation_score: u64) -> Self {
        Self {
            id,
            stake,
            reputation_score,
            last_vote_at: None,
            has_voted: false,
            registered_at: Utc::now(),
        }
    }
}
