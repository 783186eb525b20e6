//! Validator Merit Engine
//!
//! Merit-based validator incentives for a proof-of-stake network: weighted
//! scoring, per-epoch selection, reputation-scaled slashing with appeals,
//! proportional reward distribution and reputation-weighted voting.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs          - Crate root with re-exports
//! ├── main.rs         - JSON-line operator binary
//! ├── config.rs       - Environment configuration, versioned parameters
//! ├── error.rs        - EngineError taxonomy
//! ├── engine.rs       - IncentiveEngine orchestrator (lock, auth, events)
//! ├── collaborators/  - External seams and in-process implementations
//! │   ├── audit.rs    - Bounded audit log
//! │   ├── hasher.rs   - SHA-256 integrity commitments
//! │   └── oracles.rs  - In-memory reputation / fraud oracles
//! ├── registry/       - Validator records (stake ledger)
//! ├── scoring/        - Weight sets and the scoring engine
//! ├── selection.rs    - Epoch clock and best-validator selection
//! ├── slashing/       - Penalties, slashing log, appeals
//! ├── rewards/        - Reward pool and proportional distribution
//! └── voting/         - Voter records, voting power, delegation
//! ```

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod rewards;
pub mod scoring;
pub mod selection;
pub mod slashing;
pub mod voting;

pub use collaborators::{
    AuditCategory, AuditEntry, AuditLog, AuditSeverity, AuditSink, FraudOracle,
    InMemoryFraudOracle, InMemoryReputationOracle, IntegrityHash, IntegrityHasher,
    ReputationOracle, Sha256Hasher, StakeLedger,
};
pub use config::{EngineConfig, EngineParams};
pub use engine::{AdminCapability, Collaborators, EngineEvent, IncentiveEngine, ScreeningResult};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use registry::{ValidatorRecord, ValidatorRegistry};
pub use rewards::{Payout, RewardDistribution, RewardDistributor, RewardPool};
pub use scoring::{ScoreCard, ScoringEngine, ScoringWeights, VotingWeights};
pub use selection::{EpochClock, Selection, SelectionProcess};
pub use slashing::{
    AppealOutcome, SlashOutcome, SlashReason, SlashingEngine, SlashingLog, SlashingParams,
    SlashingRecord,
};
pub use voting::{VoteReceipt, VoterRecord, VotingModel, VotingParams};
