//! Append-only slashing history
//!
//! Records live in a single arena indexed by record id; each validator keeps
//! a list of its record ids so history reads paginate without copying the
//! whole arena.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::collaborators::IntegrityHash;
use crate::error::{EngineError, EngineResult};

/// Reasons for slashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashReason {
    /// Signed two conflicting messages for the same slot
    Equivocation,

    /// Missed duties for an extended period
    Downtime,

    /// Produced or attested to an invalid block
    InvalidBlock,

    /// Any other protocol rule violation
    ProtocolViolation,

    Other(String),
}

impl SlashReason {
    pub fn description(&self) -> &str {
        match self {
            SlashReason::Equivocation => "Signed conflicting messages",
            SlashReason::Downtime => "Extended downtime",
            SlashReason::InvalidBlock => "Invalid block produced or attested",
            SlashReason::ProtocolViolation => "Protocol rule violation",
            SlashReason::Other(reason) => reason,
        }
    }
}

impl fmt::Display for SlashReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A recorded slash. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashingRecord {
    pub id: u64,
    pub validator_id: String,
    pub penalty_amount: u64,
    pub timestamp: DateTime<Utc>,
    pub reason: SlashReason,
    pub integrity_hash: IntegrityHash,
}

#[derive(Debug, Clone, Default)]
pub struct SlashingLog {
    records: Vec<SlashingRecord>,
    by_validator: HashMap<String, Vec<u64>>,
    appealed: HashSet<u64>,
}

impl SlashingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next appended record will receive.
    pub fn next_id(&self) -> u64 {
        self.records.len() as u64
    }

    pub(crate) fn append(
        &mut self,
        validator_id: &str,
        penalty_amount: u64,
        timestamp: DateTime<Utc>,
        reason: SlashReason,
        integrity_hash: IntegrityHash,
    ) -> &SlashingRecord {
        let id = self.next_id();
        self.by_validator
            .entry(validator_id.to_string())
            .or_default()
            .push(id);
        self.records.push(SlashingRecord {
            id,
            validator_id: validator_id.to_string(),
            penalty_amount,
            timestamp,
            reason,
            integrity_hash,
        });
        &self.records[id as usize]
    }

    pub fn get(&self, id: u64) -> EngineResult<&SlashingRecord> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.records.get(idx))
            .ok_or(EngineError::UnknownSlashingRecord(id))
    }

    pub fn is_appealed(&self, id: u64) -> bool {
        self.appealed.contains(&id)
    }

    pub(crate) fn mark_appealed(&mut self, id: u64) -> EngineResult<()> {
        self.get(id)?;
        if !self.appealed.insert(id) {
            return Err(EngineError::AlreadyAppealed(id));
        }
        Ok(())
    }

    pub fn count_for(&self, validator_id: &str) -> usize {
        self.by_validator.get(validator_id).map_or(0, Vec::len)
    }

    /// Oldest first, starting at `offset`, at most `limit` records.
    pub fn page(&self, validator_id: &str, offset: usize, limit: usize) -> Vec<SlashingRecord> {
        self.by_validator
            .get(validator_id)
            .map(|ids| {
                ids.iter()
                    .skip(offset)
                    .take(limit)
                    .filter_map(|id| self.records.get(*id as usize))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
