//! Engine error taxonomy
//!
//! Every rejection names the precondition that failed. Rejected calls never
//! leave partial state behind. A slash that exceeds the governance review
//! threshold is not an error; see [`crate::slashing::SlashOutcome`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Broad classification used by callers deciding whether to resubmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input or state; the caller may correct and resubmit.
    PreconditionViolation,
    /// Caller lacks the administrator capability.
    AuthorizationViolation,
    /// An oracle or ledger failed or returned inconsistent data.
    ExternalCollaboratorFailure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{set} weights must sum to 100, got {sum}")]
    InvalidWeights { set: &'static str, sum: u32 },

    #[error("penalty {requested} outside allowed band [{min}, {max}]")]
    PenaltyOutOfRange { requested: u64, min: u64, max: u64 },

    #[error("insufficient stake for {id}: has {available}, needs {required}")]
    InsufficientStake {
        id: String,
        available: u64,
        required: u64,
    },

    #[error("validator not registered: {0}")]
    UnknownValidator(String),

    #[error("voter not registered: {0}")]
    UnknownVoter(String),

    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("voter {0} has already voted this round")]
    AlreadyVoted(String),

    #[error("voter {id} disqualified: {flags} fraud flags (threshold {threshold})")]
    VoterDisqualified { id: String, flags: u32, threshold: u32 },

    #[error("voter {0} has already delegated")]
    AlreadyDelegated(String),

    #[error("voter {0} cannot delegate to itself")]
    SelfDelegation(String),

    #[error("reward pool is empty")]
    EmptyRewardPool,

    #[error("total validator score is zero")]
    ZeroTotalScore,

    #[error("rewards already distributed for epoch {0}")]
    AlreadyDistributed(u64),

    #[error("epoch interval not elapsed: {elapsed}s of {required}s")]
    EpochIntervalNotElapsed { elapsed: i64, required: u64 },

    #[error("slashing record not found: {0}")]
    UnknownSlashingRecord(u64),

    #[error("slashing record {0} has already been appealed")]
    AlreadyAppealed(u64),

    #[error("validator {0} has no offenses to appeal")]
    NoOffenses(String),

    #[error("{metric} must be within 0..=100, got {value}")]
    MetricOutOfRange { metric: &'static str, value: u64 },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("caller is not authorized for {0}")]
    Unauthorized(&'static str),

    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Unauthorized(_) => ErrorKind::AuthorizationViolation,
            EngineError::Collaborator { .. } => ErrorKind::ExternalCollaboratorFailure,
            _ => ErrorKind::PreconditionViolation,
        }
    }

    pub(crate) fn collaborator(collaborator: &'static str, err: impl std::fmt::Display) -> Self {
        EngineError::Collaborator {
            collaborator,
            reason: err.to_string(),
        }
    }
}
