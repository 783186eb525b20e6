//! Reputation-scaled slashing
//!
//! ```text
//!            slash (adjusted < threshold)
//!   Active ─────────────────────────────► Active(offenses + 1)
//!     │                                        │
//!     │ slash (adjusted ≥ threshold)           │ appeal(record)
//!     ▼                                        ▼
//!   GovernanceReview (no state change)    Active(offenses − 1)
//! ```
//!
//! History is append-only. Appeals move stake back but never rewrite a
//! record; each record can be appealed once.

mod engine;
mod log;
mod penalty;

pub use engine::{AppealOutcome, SlashOutcome, SlashingEngine};
pub use log::{SlashReason, SlashingLog, SlashingRecord};
pub use penalty::{adjusted_penalty, restoration_amount, SlashingParams};
