//! External collaborators
//!
//! The engine consumes its environment through narrow, injectable contracts:
//!
//! ```text
//! ┌──────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │ ReputationOracle │   │ FraudOracle     │   │ IntegrityHasher │
//! │ (0..=100 scores) │   │ (advisory gate) │   │ (commitments)   │
//! └────────┬─────────┘   └────────┬────────┘   └────────┬────────┘
//!          └──────────────┬───────┴─────────────────────┘
//!                         ▼
//!                 ┌───────────────┐        ┌──────────────┐
//!                 │IncentiveEngine│───────►│ AuditSink    │
//!                 └───────┬───────┘        │ (fire+forget)│
//!                         ▼                └──────────────┘
//!                 ┌───────────────┐
//!                 │ StakeLedger   │
//!                 └───────────────┘
//! ```
//!
//! In-process implementations live alongside the traits so the engine can
//! run standalone and tests can swap in deterministic doubles.

mod audit;
mod hasher;
mod oracles;

pub use audit::{AuditCategory, AuditEntry, AuditLog, AuditSeverity};
pub use hasher::{IntegrityHash, Sha256Hasher};
pub use oracles::{InMemoryFraudOracle, InMemoryReputationOracle};

use crate::error::EngineResult;
use async_trait::async_trait;

/// Authoritative source and sink of validator stake.
pub trait StakeLedger {
    fn stake_of(&self, id: &str) -> EngineResult<u64>;

    /// Remove `amount` from `id`'s stake. Fails without effect if the stake
    /// is smaller than `amount`.
    fn slash_stake(&mut self, id: &str, amount: u64) -> EngineResult<()>;

    fn restore_stake(&mut self, id: &str, amount: u64) -> EngineResult<()>;
}

/// Supplies reputation scores in `0..=100`.
#[async_trait]
pub trait ReputationOracle: Send + Sync {
    async fn reputation(&self, id: &str) -> anyhow::Result<u64>;
}

/// Advisory fraud signals. `detect_anomalies` may have side effects on the
/// oracle's own state; the other calls are pure reads.
#[async_trait]
pub trait FraudOracle: Send + Sync {
    async fn detect_anomalies(&self, id: &str) -> anyhow::Result<()>;
    async fn is_flagged(&self, id: &str) -> anyhow::Result<bool>;
    async fn fraud_score(&self, id: &str) -> anyhow::Result<u64>;
}

/// Produces opaque commitments over field tuples. Never used for control flow.
pub trait IntegrityHasher: Send + Sync {
    fn commit(&self, fields: &[&[u8]]) -> IntegrityHash;
}

/// Durable audit trail. Implementations must swallow their own failures.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, category: AuditCategory, message: &str, amount: u64, subject: &str);
}
